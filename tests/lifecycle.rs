use json_dict::{Error, PersistentMap, WritePolicy};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

fn on_disk(path: &Path) -> Value {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// ---- create -----------------------------------------------------------------

#[test]
fn open_missing_file_creates_empty_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let db = PersistentMap::open(&path).unwrap();
    assert!(db.is_empty());
    assert!(path.is_file());
    assert_eq!(on_disk(&path), json!({}));
}

#[test]
fn open_missing_file_writes_initial_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let db = PersistentMap::builder()
        .path(&path)
        .initial([("a", 1), ("b", 2)])
        .build()
        .unwrap();
    assert_eq!(db.len(), 2);
    assert_eq!(on_disk(&path), json!({ "a": 1, "b": 2 }));
}

#[test]
fn open_in_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope").join("db.json");

    let err = PersistentMap::open(&path).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

#[test]
fn path_accessor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let db = PersistentMap::open(&path).unwrap();
    assert_eq!(db.path(), Some(path.as_path()));
}

// ---- load -------------------------------------------------------------------

#[test]
fn persist_and_reload_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let contents = json!({
        "s": "text",
        "n": 1.5,
        "i": -7,
        "b": true,
        "z": null,
        "list": [1, "two", [3]],
        "nested": { "deep": { "x": 1 } }
    });
    {
        let mut db = PersistentMap::open(&path).unwrap();
        for (k, v) in contents.as_object().unwrap() {
            db.set(k.clone(), v).unwrap();
        }
    }
    let db = PersistentMap::open(&path).unwrap();
    assert_eq!(Value::Object(db.as_map().clone()), contents);
}

#[test]
fn reload_preserves_insertion_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    {
        let mut db = PersistentMap::open(&path).unwrap();
        db.set("c", 1).unwrap();
        db.set("a", 2).unwrap();
        db.set("b", 3).unwrap();
    }
    let db = PersistentMap::open(&path).unwrap();
    let keys: Vec<&str> = db.keys().map(String::as_str).collect();
    assert_eq!(keys, ["c", "a", "b"]);
}

#[test]
fn load_ignores_initial_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, r#"{"kept": 1}"#).unwrap();

    let db = PersistentMap::builder()
        .path(&path)
        .initial([("seed", 2)])
        .build()
        .unwrap();
    assert!(db.contains_key("kept"));
    assert!(!db.contains_key("seed"));
    assert_eq!(on_disk(&path), json!({ "kept": 1 }));
}

#[test]
fn empty_file_is_initialised_with_empty_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, b"").unwrap();

    let db = PersistentMap::open(&path).unwrap();
    assert!(db.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    assert_eq!(on_disk(&path), json!({}));
}

#[test]
fn empty_file_takes_initial_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, b"").unwrap();

    let db = PersistentMap::builder()
        .path(&path)
        .initial([("seed", 1)])
        .build()
        .unwrap();
    assert_eq!(db.len(), 1);
    assert_eq!(on_disk(&path), json!({ "seed": 1 }));
}

#[test]
fn empty_path_means_in_memory() {
    let mut db = PersistentMap::open("").unwrap();
    assert_eq!(db.path(), None);
    db.set("a", 1).unwrap();
    assert_eq!(db.get("a").unwrap(), &json!(1));
}

#[test]
fn array_document_is_malformed_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "[1,2,3]").unwrap();

    match PersistentMap::open(&path).unwrap_err() {
        Error::MalformedStore { path: p, found } => {
            assert_eq!(p, path);
            assert_eq!(found, "array");
        }
        other => panic!("expected MalformedStore, got {other:?}"),
    }
    // untouched
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2,3]");
}

#[test]
fn scalar_document_is_malformed_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "\"just a string\"").unwrap();

    let err = PersistentMap::open(&path).unwrap_err();
    assert!(matches!(err, Error::MalformedStore { found: "string", .. }));
}

#[test]
fn invalid_json_is_deserialize_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = PersistentMap::open(&path).unwrap_err();
    assert!(matches!(err, Error::Deserialize(_)), "got {err:?}");
}

#[test]
fn directory_path_is_invalid_and_not_written() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("store");
    std::fs::create_dir(&target).unwrap();

    let err = PersistentMap::open(&target).unwrap_err();
    assert!(matches!(err, Error::InvalidPath(ref p) if p == &target), "got {err:?}");
    assert!(target.is_dir());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
}

#[test]
fn directory_path_is_invalid_even_when_replacing() {
    let dir = TempDir::new().unwrap();

    let err = PersistentMap::builder()
        .path(dir.path())
        .replace(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}

// ---- replace ----------------------------------------------------------------

#[test]
fn replace_discards_existing_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, r#"{"old": "stuff", "more": [1, 2]}"#).unwrap();

    let db = PersistentMap::builder()
        .path(&path)
        .replace(true)
        .initial([("a", 1)])
        .build()
        .unwrap();
    assert_eq!(db.len(), 1);
    assert!(!db.contains_key("old"));
    assert_eq!(on_disk(&path), json!({ "a": 1 }));
}

#[test]
fn replace_without_initial_writes_empty_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, r#"{"old": 1}"#).unwrap();

    let db = PersistentMap::builder()
        .path(&path)
        .replace(true)
        .build()
        .unwrap();
    assert!(db.is_empty());
    assert_eq!(on_disk(&path), json!({}));
}

#[test]
fn replace_accepts_malformed_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "[1,2,3]").unwrap();

    let db = PersistentMap::builder()
        .path(&path)
        .replace(true)
        .build()
        .unwrap();
    assert!(db.is_empty());
    assert_eq!(on_disk(&path), json!({}));
}

// ---- write-through ----------------------------------------------------------

#[test]
fn set_then_delete_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let mut db = PersistentMap::open(&path).unwrap();
    db.set("a", 1).unwrap();
    drop(db);

    let mut db = PersistentMap::open(&path).unwrap();
    assert_eq!(Value::Object(db.as_map().clone()), json!({ "a": 1 }));
    db.delete("a").unwrap();
    drop(db);

    let db = PersistentMap::open(&path).unwrap();
    assert!(db.is_empty());
    assert_eq!(on_disk(&path), json!({}));
}

#[test]
fn every_mutation_is_on_disk_before_returning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut db = PersistentMap::open(&path).unwrap();

    db.set("k", "v1").unwrap();
    assert_eq!(on_disk(&path), json!({ "k": "v1" }));
    db.set("k", "v2").unwrap();
    assert_eq!(on_disk(&path), json!({ "k": "v2" }));
    db.extend([("x", 1), ("y", 2)]).unwrap();
    assert_eq!(on_disk(&path), json!({ "k": "v2", "x": 1, "y": 2 }));
    db.update("x", |v| *v = json!(10)).unwrap();
    assert_eq!(on_disk(&path)["x"], json!(10));
    db.clear().unwrap();
    assert_eq!(on_disk(&path), json!({}));
}

#[test]
fn in_place_policy_writes_through_too() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut db = PersistentMap::builder()
        .path(&path)
        .write_policy(WritePolicy::InPlace)
        .build()
        .unwrap();
    assert_eq!(db.write_policy(), WritePolicy::InPlace);

    db.set("a", [1, 2, 3]).unwrap();
    assert_eq!(on_disk(&path), json!({ "a": [1, 2, 3] }));
}

#[test]
fn atomic_policy_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut db = PersistentMap::open(&path).unwrap();
    for i in 0..10 {
        db.set(format!("k{i}"), i).unwrap();
    }
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, ["db.json"]);
}

#[test]
fn pretty_and_compact_output() {
    let dir = TempDir::new().unwrap();
    let pretty_path = dir.path().join("pretty.json");
    let compact_path = dir.path().join("compact.json");

    let mut pretty = PersistentMap::builder().path(&pretty_path).pretty(true).build().unwrap();
    let mut compact = PersistentMap::builder().path(&compact_path).build().unwrap();
    pretty.set("hello", 1).unwrap();
    compact.set("hello", 1).unwrap();

    let raw = std::fs::read_to_string(&pretty_path).unwrap();
    assert!(raw.contains('\n'));
    assert!(raw.contains("  "));
    let raw = std::fs::read_to_string(&compact_path).unwrap();
    assert!(!raw.contains('\n'));
}

#[cfg(unix)]
#[test]
fn writes_go_through_symlinks() {
    let dir = TempDir::new().unwrap();
    let real = dir.path().join("real.json");
    let link = dir.path().join("link.json");
    std::fs::write(&real, "{}").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let mut db = PersistentMap::open(&link).unwrap();
    db.set("a", 1).unwrap();

    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(on_disk(&real), json!({ "a": 1 }));
    drop(db);
    let db = PersistentMap::open(&real).unwrap();
    assert_eq!(db.get("a").unwrap(), &json!(1));
}

#[cfg(unix)]
#[test]
fn atomic_write_keeps_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{}").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let mut db = PersistentMap::open(&path).unwrap();
    db.set("a", 1).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

// ---- failures ---------------------------------------------------------------

#[test]
fn unencodable_value_fails_before_touching_anything() {
    use std::collections::HashMap;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut db = PersistentMap::open(&path).unwrap();
    db.set("a", 1).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut bad = HashMap::new();
    bad.insert((1, 2), "tuple keys are not JSON");
    let err = db.set("b", bad).unwrap_err();
    assert!(matches!(err, Error::Serialize(_)), "got {err:?}");

    assert!(!db.contains_key("b"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn failed_write_rolls_back_memory() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    let path = sub.join("db.json");

    let mut db = PersistentMap::open(&path).unwrap();
    db.set("a", 1).unwrap();
    db.set("b", 2).unwrap();
    std::fs::remove_dir_all(&sub).unwrap();

    assert!(matches!(db.set("a", 100), Err(Error::Io(_))));
    assert_eq!(db.get("a").unwrap(), &json!(1));

    assert!(matches!(db.set("c", 3), Err(Error::Io(_))));
    assert!(!db.contains_key("c"));

    assert!(matches!(db.delete("a"), Err(Error::Io(_))));
    assert!(db.contains_key("a"));

    assert!(matches!(db.clear(), Err(Error::Io(_))));
    assert_eq!(db.len(), 2);

    assert!(matches!(db.extend([("d", 4)]), Err(Error::Io(_))));
    assert!(!db.contains_key("d"));

    assert!(matches!(db.update("b", |v| *v = json!(20)), Err(Error::Io(_))));
    assert_eq!(db.get("b").unwrap(), &json!(2));
}
