use billdoc_core::{
    open_db_in_memory, Attachment, CoreContext, Document, DocumentRules, DocumentStatus,
    Resource, ResourceStore, Severity, SqliteResourceStore, StoreError, StoreOutcome,
    StoreResult, SubmissionError, SubmissionMode, SubmissionPipeline, TokenGenerator, TypedId,
};
use rusqlite::Connection;
use std::cell::Cell;

/// Store wrapper counting transactions and mutations.
struct CountingStore<'conn> {
    inner: SqliteResourceStore<'conn>,
    transactions: Cell<usize>,
    mutations: Cell<usize>,
}

impl<'conn> CountingStore<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteResourceStore::new(conn),
            transactions: Cell::new(0),
            mutations: Cell::new(0),
        }
    }

    fn touch(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

impl ResourceStore for CountingStore<'_> {
    fn create<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>> {
        self.touch();
        self.inner.create(resource)
    }

    fn read<R: Resource>(&self, id: &str) -> StoreResult<Option<R>> {
        self.inner.read(id)
    }

    fn update<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>> {
        self.touch();
        self.inner.update(resource)
    }

    fn delete(&self, target: &TypedId) -> StoreResult<()> {
        self.touch();
        self.inner.delete(target)
    }

    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.transactions.set(self.transactions.get() + 1);
        self.inner.in_transaction(|_| work(self))
    }
}

struct FixedToken(&'static str);

impl TokenGenerator for FixedToken {
    fn generate_unique_token(&self) -> String {
        self.0.to_string()
    }
}

fn submittable_document() -> Document {
    let mut doc = Document::new();
    doc.subject = Some("X110411319".to_string());
    doc.content.push(Attachment::binary("b-1", "application/pdf"));
    doc.related.push("Invoice/inv-1".to_string());
    doc
}

fn document_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM resources WHERE kind = 'DocumentReference';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn missing_document_returns_empty_outcome() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("t-1");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let outcome = pipeline.submit(None, SubmissionMode::Normal).unwrap();

    assert!(outcome.warnings.is_none());
    assert!(outcome.transformed.is_none());
    assert_eq!(store.transactions.get(), 0);
}

#[test]
fn blocking_validation_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("t-1");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let mut doc = submittable_document();
    doc.content.clear();
    doc.status = DocumentStatus::EnteredInError;

    let err = pipeline.submit(Some(&doc), SubmissionMode::Normal).unwrap_err();
    match &err {
        SubmissionError::ValidationFailed(failed) => {
            let severities: Vec<Severity> =
                failed.report.issues.iter().map(|issue| issue.severity).collect();
            assert_eq!(severities, vec![Severity::Fatal, Severity::Error]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_outcome().max_severity(), Some(Severity::Fatal));
    assert_eq!(store.transactions.get(), 0);
    assert_eq!(store.mutations.get(), 0);
    assert_eq!(document_count(&conn), 0);
}

#[test]
fn test_mode_validates_without_touching_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("t-1");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let outcome = pipeline
        .submit(Some(&submittable_document()), SubmissionMode::Test)
        .unwrap();

    let warnings = outcome.warnings.expect("advisory report");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings.issues[0].severity, Severity::Information);
    assert!(outcome.transformed.is_none());
    assert_eq!(store.transactions.get(), 0);
    assert_eq!(store.mutations.get(), 0);
    assert_eq!(document_count(&conn), 0);
}

#[test]
fn normal_mode_stores_original_and_transformed_copy() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("token-1");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let submitted = submittable_document();
    let outcome = pipeline
        .submit(Some(&submitted), SubmissionMode::Normal)
        .unwrap();

    assert!(outcome.warnings.is_some());
    let transformed = outcome.transformed.expect("transformed copy");
    assert_eq!(transformed.id.as_deref(), Some("token-1"));
    assert_eq!(transformed.content, submitted.content);
    assert_eq!(transformed.related, submitted.related);
    assert_eq!(store.transactions.get(), 1);
    assert_eq!(document_count(&conn), 2);

    let original_id = transformed.transforms_target().expect("transforms relation");
    assert_ne!(original_id.id, "token-1");
    let original = store
        .read::<Document>(&original_id.id)
        .unwrap()
        .expect("original persisted");
    assert!(original.transforms_target().is_none());
    assert_eq!(original.content, submitted.content);

    let persisted = store.read::<Document>("token-1").unwrap().unwrap();
    assert_eq!(persisted, transformed);
}

#[test]
fn normal_mode_keeps_explicit_original_id() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("token-3");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let mut doc = submittable_document();
    doc.set_id(Some("orig-1".to_string()));
    let transformed = pipeline
        .submit(Some(&doc), SubmissionMode::Normal)
        .unwrap()
        .transformed
        .unwrap();

    let original = store.read::<Document>("orig-1").unwrap();
    assert_eq!(original, Some(doc));
    assert_eq!(
        transformed.transforms_target(),
        Some(TypedId::document("orig-1").unwrap())
    );
    assert_eq!(document_count(&conn), 2);
}

#[test]
fn test_mode_blocks_invalid_document_without_touching_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("t-1");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let mut doc = submittable_document();
    doc.set_id(Some("bad".to_string()));
    doc.content.clear();

    let err = pipeline.submit(Some(&doc), SubmissionMode::Test).unwrap_err();
    assert!(matches!(err, SubmissionError::ValidationFailed(_)));
    assert_eq!(store.transactions.get(), 0);
    assert_eq!(store.mutations.get(), 0);
    assert!(store.read::<Document>("bad").unwrap().is_none());
}

#[test]
fn resubmitted_transform_relation_is_replaced() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);
    let tokens = FixedToken("token-2");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);

    let mut doc = submittable_document();
    doc.set_transforms(&TypedId::document("older").unwrap());

    let transformed = pipeline
        .submit(Some(&doc), SubmissionMode::Normal)
        .unwrap()
        .transformed
        .unwrap();

    let target = transformed.transforms_target().unwrap();
    assert_ne!(target.id, "older");
    assert_eq!(transformed.relates_to.len(), 1);
}

#[test]
fn token_collision_is_internal_and_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let store = CountingStore::new(&conn);

    let mut existing = submittable_document();
    existing.set_id(Some("taken".to_string()));
    store.create(&existing).unwrap();

    let tokens = FixedToken("taken");
    let pipeline = SubmissionPipeline::new(&store, &DocumentRules, &tokens);
    let err = pipeline
        .submit(Some(&submittable_document()), SubmissionMode::Normal)
        .unwrap_err();

    match &err {
        SubmissionError::Internal { target, .. } => {
            assert_eq!(target.as_ref(), Some(&TypedId::document("taken").unwrap()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_outcome().max_severity(), Some(Severity::Fatal));
    assert_eq!(document_count(&conn), 1);

    let untouched = store.read::<Document>("taken").unwrap().unwrap();
    assert_eq!(untouched, existing);
}

#[test]
fn mode_flag_selects_normal_only_on_exact_match() {
    assert_eq!(SubmissionMode::parse("normal"), SubmissionMode::Normal);
    assert_eq!(SubmissionMode::parse(" normal "), SubmissionMode::Normal);
    assert_eq!(SubmissionMode::parse("Normal"), SubmissionMode::Test);
    assert_eq!(SubmissionMode::parse("test"), SubmissionMode::Test);
    assert_eq!(SubmissionMode::parse(""), SubmissionMode::Test);
}

#[test]
fn context_wires_submission_over_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let context = CoreContext::new(
        SqliteResourceStore::new(&conn),
        DocumentRules,
        FixedToken("ctx-token"),
    );

    let outcome = context
        .submission()
        .submit(Some(&submittable_document()), SubmissionMode::Normal)
        .unwrap();

    assert_eq!(
        outcome.transformed.and_then(|doc| doc.id).as_deref(),
        Some("ctx-token")
    );
    assert!(context.store().read::<Document>("ctx-token").unwrap().is_some());
}
