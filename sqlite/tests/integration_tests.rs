//! Integration tests for the bbconf-sqlite crate.

use bbconf_core::DatabaseSettings;
use bbconf_sqlite::{Condition, Database, DbError, Row};
use serde_json::{Value, json};

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Opens a file-backed database named `bedbase` inside `dir`.
fn file_database(dir: &tempfile::TempDir) -> Database {
    let settings = DatabaseSettings {
        name: "bedbase".to_string(),
        ..DatabaseSettings::default()
    };
    Database::new(&settings, Some(dir.path()))
}

/// Inserts a bedfile with the required columns and returns its id.
fn insert_bed(db: &mut Database, name: &str) -> i64 {
    db.insert_row(
        "bedfiles",
        &object(json!({
            "name": name,
            "md5sum": format!("md5-{name}"),
            "bedfile_path": format!("/data/{name}.bed"),
        })),
    )
    .unwrap()
}

fn insert_bedset(db: &mut Database, name: &str) -> i64 {
    db.insert_row(
        "bedsets",
        &object(json!({"name": name, "md5sum": format!("md5-{name}")})),
    )
    .unwrap()
}

fn link(db: &mut Database, bed_id: i64, bedset_id: i64) {
    db.insert_link_row(&object(json!({"bedfile_id": bed_id, "bedset_id": bedset_id})))
        .unwrap();
}

// ============================================================================
// Table lifecycle
// ============================================================================

#[test]
fn test_create_insert_count_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = file_database(&dir);

    db.create_table("bedfiles", ["name VARCHAR(50) NOT NULL"]).unwrap();
    assert_eq!(db.count_rows("bedfiles").unwrap(), 0);

    let id = db
        .insert_row("bedfiles", &object(json!({"name": "x"})))
        .unwrap();
    assert_eq!(id, 1);
    assert_eq!(db.count_rows("bedfiles").unwrap(), 1);
    assert!(dir.path().join("bedbase").is_file());
}

#[test]
fn test_data_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut db = file_database(&dir);
        db.create_bedbase_tables().unwrap();
        insert_bed(&mut db, "a");
        db.close_connection().unwrap();
    }

    let mut db = file_database(&dir);
    assert!(db.table_exists("bedfiles").unwrap());
    let rows = db.select("bedfiles", Some(&["name"]), None).unwrap();
    assert_eq!(rows, vec![object(json!({"name": "a"}))]);
}

#[test]
fn test_drop_table_is_repeatable() {
    let mut db = Database::in_memory();
    db.create_table("bedfiles", "name TEXT").unwrap();
    db.drop_table("bedfiles").unwrap();
    db.drop_table("bedfiles").unwrap();
    assert!(!db.table_exists("bedfiles").unwrap());

    db.create_table("bedfiles", "name TEXT").unwrap();
    assert!(db.table_exists("bedfiles").unwrap());
}

#[test]
fn test_default_bedfile_columns() {
    let mut db = Database::in_memory();
    db.create_bedbase_tables().unwrap();
    let types = db.table_column_types("bedfiles").unwrap();
    assert_eq!(types[0], ("id".to_string(), "INTEGER".to_string()));
    assert!(types.contains(&("md5sum".to_string(), "VARCHAR(300)".to_string())));
    assert!(types.contains(&("gc_content".to_string(), "FLOAT".to_string())));
    assert!(types.contains(&("plots".to_string(), "JSONB".to_string())));
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[test]
fn test_connection_state_machine() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = file_database(&dir);

    assert!(!db.check_connection());
    assert!(db.establish_connection(false).unwrap());
    assert!(db.check_connection());
    db.close_connection().unwrap();
    assert!(!db.check_connection());
    db.close_connection().unwrap();

    // Operations reconnect on demand.
    assert!(!db.table_exists("bedfiles").unwrap());
    assert!(db.check_connection());
}

#[test]
fn test_unreachable_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = DatabaseSettings {
        name: "missing/dir/bedbase.sqlite".to_string(),
        ..DatabaseSettings::default()
    };
    let mut db = Database::new(&settings, Some(dir.path()));

    assert!(matches!(
        db.establish_connection(false),
        Err(DbError::Connection(_))
    ));
    assert!(!db.establish_connection(true).unwrap());
    assert!(!db.check_connection());
}

#[test]
fn test_not_a_database_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bedbase"), "this is not sqlite, just plain text padding the header out").unwrap();
    let mut db = file_database(&dir);

    assert!(matches!(
        db.establish_connection(false),
        Err(DbError::Connection(_))
    ));
    assert!(!db.check_connection());
}

#[test]
fn test_cursor_commits_and_rolls_back() {
    let mut db = Database::in_memory();
    db.create_table("t", ["x INTEGER"]).unwrap();

    db.db_cursor(|tx| {
        tx.execute("INSERT INTO t VALUES (1)", [])?;
        Ok(())
    })
    .unwrap();

    let failed: bbconf_sqlite::Result<()> = db.db_cursor(|tx| {
        tx.execute("INSERT INTO t VALUES (2)", [])?;
        tx.execute("INSERT INTO nowhere VALUES (3)", [])?;
        Ok(())
    });
    assert!(failed.is_err());
    assert_eq!(db.count_rows("t").unwrap(), 1);
}

#[test]
fn test_cursor_rolls_back_on_panic() {
    let mut db = Database::in_memory();
    db.create_table("t", ["x INTEGER"]).unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: bbconf_sqlite::Result<()> = db.db_cursor(|tx| {
            tx.execute("INSERT INTO t VALUES (1)", [])?;
            panic!("pipeline crashed mid-insert");
        });
    }));
    assert!(outcome.is_err());
    assert_eq!(db.count_rows("t").unwrap(), 0);
}

// ============================================================================
// Queries across the relationship table
// ============================================================================

#[test]
fn test_select_related_through_links() {
    let mut db = Database::in_memory();
    db.create_bedbase_tables().unwrap();

    let a = insert_bed(&mut db, "a");
    let b = insert_bed(&mut db, "b");
    insert_bed(&mut db, "c");
    let s1 = insert_bedset(&mut db, "s1");
    let s2 = insert_bedset(&mut db, "s2");
    insert_bedset(&mut db, "empty");
    link(&mut db, a, s1);
    link(&mut db, b, s1);
    link(&mut db, b, s2);

    let rows = db
        .select_related(&Condition::equals("name", "s1"), Some(&["name"]))
        .unwrap();
    assert_eq!(rows, vec![object(json!({"name": "a"})), object(json!({"name": "b"}))]);

    let rows = db
        .select_related(&Condition::new("name LIKE 's%'"), Some(&["id"]))
        .unwrap();
    assert_eq!(rows.len(), 2);

    assert!(
        db.select_related(&Condition::equals("name", "empty"), None)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_duplicate_link_is_insert_error() {
    let mut db = Database::in_memory();
    db.create_bedbase_tables().unwrap();
    let a = insert_bed(&mut db, "a");
    let s = insert_bedset(&mut db, "s");
    link(&mut db, a, s);

    let again = db.insert_link_row(&object(json!({"bedfile_id": a, "bedset_id": s})));
    assert!(matches!(again, Err(DbError::Insert(_))));
}

#[test]
fn test_duplicate_md5sum_is_insert_error() {
    let mut db = Database::in_memory();
    db.create_bedbase_tables().unwrap();
    insert_bed(&mut db, "a");

    let dup = db.insert_row(
        "bedfiles",
        &object(json!({"name": "other", "md5sum": "md5-a", "bedfile_path": "/x.bed"})),
    );
    assert!(matches!(dup, Err(DbError::Insert(_))));
    assert_eq!(db.count_rows("bedfiles").unwrap(), 1);
}

#[test]
fn test_deleting_bedset_cascades_to_links() {
    let mut db = Database::in_memory();
    db.create_bedbase_tables().unwrap();
    let a = insert_bed(&mut db, "a");
    let s = insert_bedset(&mut db, "s");
    link(&mut db, a, s);

    db.db_cursor(|tx| {
        tx.execute("DELETE FROM bedsets WHERE id = ?1", [s])?;
        Ok(())
    })
    .unwrap();
    assert_eq!(db.count_rows("bedset_bedfiles").unwrap(), 0);
    assert_eq!(db.count_rows("bedfiles").unwrap(), 1);
}
