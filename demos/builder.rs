use json_dict::{PersistentMap, WritePolicy};

fn main() -> Result<(), json_dict::Error> {
    let path = std::env::temp_dir().join("json_dict_example_builder.json");
    std::fs::write(&path, r#"{"stale": true}"#)?;

    // throw away the stale file, seed it, write it indented
    let mut db = PersistentMap::builder()
        .path(&path)
        .replace(true)
        .initial([("name", "json-dict"), ("version", "0.1.0")])
        .pretty(true)
        .write_policy(WritePolicy::Atomic)
        .build()?;

    db.set("status", "ready")?;

    let contents = std::fs::read_to_string(&path)?;
    println!("On-disk JSON:\n{contents}");

    println!("\nDebug output: {db:?}");

    let _ = std::fs::remove_file(&path);
    Ok(())
}
