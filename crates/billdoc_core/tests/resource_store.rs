use billdoc_core::{
    open_db_in_memory, Attachment, Binary, Document, Invoice, Money, Resource, ResourceKind,
    ResourceStore, SqliteResourceStore, StoreError, TypedId,
};
use rusqlite::params;

fn document_with_binary(binary_id: &str) -> Document {
    let mut doc = Document::new();
    doc.subject = Some("X110411319".to_string());
    doc.content.push(Attachment::binary(binary_id, "application/pdf"));
    doc
}

#[test]
fn create_assigns_id_when_missing_and_read_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    let outcome = store.create(&document_with_binary("b1")).unwrap();
    assert!(outcome.created);
    assert!(!outcome.id.is_empty());
    assert_eq!(outcome.resource.id.as_deref(), Some(outcome.id.as_str()));

    let loaded = store.read::<Document>(&outcome.id).unwrap().unwrap();
    assert_eq!(loaded, outcome.resource);
}

#[test]
fn create_keeps_explicit_id_and_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    let binary = Binary::with_id("b1", "application/pdf", "JVBERi0=");
    let outcome = store.create(&binary).unwrap();
    assert_eq!(outcome.id, "b1");

    let err = store.create(&binary).unwrap_err();
    match err {
        StoreError::AlreadyExists(target) => {
            assert_eq!(target, TypedId::new(ResourceKind::Binary, "b1").unwrap());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_id_under_different_kinds_does_not_collide() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    store.create(&Invoice::with_id("shared")).unwrap();
    let mut doc = document_with_binary("b1");
    doc.set_id(Some("shared".to_string()));
    store.create(&doc).unwrap();

    assert!(store.read::<Invoice>("shared").unwrap().is_some());
    assert!(store.read::<Document>("shared").unwrap().is_some());
    assert!(store.read::<Binary>("shared").unwrap().is_none());
}

#[test]
fn update_upserts_and_reports_creation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    let mut invoice = Invoice::with_id("inv-1");
    let first = store.update(&invoice).unwrap();
    assert!(first.created);

    invoice.total_gross = Some(Money::eur(12_345));
    let second = store.update(&invoice).unwrap();
    assert!(!second.created);

    let loaded = store.read::<Invoice>("inv-1").unwrap().unwrap();
    assert_eq!(loaded.total_gross, Some(Money::eur(12_345)));
}

#[test]
fn update_requires_explicit_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    let err = store.update(&document_with_binary("b1")).unwrap_err();
    assert!(matches!(err, StoreError::MissingId(ResourceKind::Document)));
}

#[test]
fn write_paths_reject_invalid_ids_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    let mut doc = document_with_binary("b1");
    doc.set_id(Some("not a valid id".to_string()));

    assert!(matches!(store.create(&doc), Err(StoreError::Invalid(_))));
    assert!(matches!(store.update(&doc), Err(StoreError::Invalid(_))));
    assert_eq!(count_rows(&conn), 0);
}

#[test]
fn delete_missing_target_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    store.create(&Invoice::with_id("inv-1")).unwrap();
    let target = TypedId::new(ResourceKind::Invoice, "inv-1").unwrap();

    store.delete(&target).unwrap();
    let err = store.delete(&target).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn read_rejects_body_with_mismatched_id() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO resources (kind, id, body) VALUES (?1, ?2, ?3);",
        params!["Invoice", "inv-1", r#"{"id":"inv-2","status":"issued"}"#],
    )
    .unwrap();
    let store = SqliteResourceStore::new(&conn);

    let err = store.read::<Invoice>("inv-1").unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn in_transaction_commits_on_ok_and_rolls_back_on_err() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteResourceStore::new(&conn);

    store
        .in_transaction(|tx| -> Result<(), StoreError> {
            tx.create(&Invoice::with_id("kept"))?;
            Ok(())
        })
        .unwrap();

    let result = store.in_transaction(|tx| -> Result<(), StoreError> {
        tx.create(&Invoice::with_id("discarded"))?;
        tx.delete(&TypedId::new(ResourceKind::Invoice, "kept")?)?;
        Err(StoreError::InvalidData("abort".to_string()))
    });
    assert!(result.is_err());

    assert!(store.read::<Invoice>("kept").unwrap().is_some());
    assert!(store.read::<Invoice>("discarded").unwrap().is_none());
    assert_eq!(count_rows(&conn), 1);
}

fn count_rows(conn: &rusqlite::Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM resources;", [], |row| row.get(0))
        .unwrap()
}
