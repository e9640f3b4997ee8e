use json_dict::PersistentMap;
use serde_json::json;

fn main() -> Result<(), json_dict::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("json_dict_example_basic.json");
    let _ = std::fs::remove_file(&path);
    let mut db = PersistentMap::open(&path)?;

    // set / get / delete, each one rewrites the file
    db.set("apples", 3)?;
    db.set("bananas", 5)?;
    db.set("basket", json!({ "color": "brown", "handles": 2 }))?;
    println!("apples  = {}", db.get("apples")?);
    println!("basket  = {}", db.get("basket")?);

    // update in place
    db.update("apples", |n| *n = json!(n.as_i64().unwrap_or(0) + 1))?;
    println!("apples after update = {}", db.get_as::<i64>("apples")?);

    // get_or_insert
    let oranges = db.get_or_insert("oranges", 0)?;
    println!("oranges (default 0) = {oranges}");

    db.delete("bananas")?;
    db.extend([("grapes", 12), ("lemons", 7)])?;

    println!("keys   = {:?}", db.keys().collect::<Vec<_>>());
    println!("len    = {}", db.len());

    // reopening sees exactly what was written
    drop(db);
    let db = PersistentMap::open(&path)?;
    println!("reopened: {}", serde_json::to_string(db.as_map()).unwrap_or_default());

    let _ = std::fs::remove_file(&path);
    Ok(())
}
