//! Authoring lifecycle tests: validate, save, update, deactivate, delete,
//! and reload from disk.

use dyncontent::engine::{ContentEngine, RequestContext};
use dyncontent::registry::DataType;
use dyncontent::schema::types::{
    Aggregation, ColumnSpec, FieldSpec, FilterSpec, FilterType, Lang, LocalizedText, Operator,
    SchemaDefinition, SchemaKind,
};
use dyncontent::source::{MemorySource, SourceSchema};
use dyncontent::{DbOperations, EngineError, SchemaStore};
use std::sync::Arc;
use tempfile::tempdir;

fn source() -> MemorySource {
    MemorySource::new().with_source(
        SourceSchema::new("students", ["name", "gpa", "is_active"]),
        Vec::new(),
    )
}

fn engine_at(dir: &tempfile::TempDir) -> ContentEngine<MemorySource> {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = sled::open(dir.path()).expect("sled open");
    let db_ops = Arc::new(DbOperations::new(db).expect("db ops"));
    let store = SchemaStore::new(db_ops).expect("store");
    ContentEngine::new(store, source())
}

fn students_table() -> SchemaDefinition {
    let mut definition = SchemaDefinition::new(SchemaKind::Table, "students", "students");
    definition.labels = LocalizedText::new("Students", "الطلاب");
    definition.columns.push(ColumnSpec::new(
        "name",
        "name",
        DataType::Text,
        LocalizedText::new("Name", "الاسم"),
    ));
    definition
}

#[test]
fn save_rejects_invalid_definitions_with_first_issue() {
    let dir = tempdir().expect("tempdir");
    let engine = engine_at(&dir);

    let mut definition = students_table();
    definition.key = "Bad Key".to_string();
    let err = engine.save_definition(definition).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));

    assert!(engine
        .list_all_definitions(SchemaKind::Table)
        .expect("list")
        .is_empty());
}

#[test]
fn validate_definition_collects_every_issue() {
    let dir = tempdir().expect("tempdir");
    let engine = engine_at(&dir);

    let mut definition = students_table();
    definition.columns[0].field_name = "unknown_field".to_string();
    definition.fields.push(
        FieldSpec::new(
            "active",
            "is_active",
            DataType::Boolean,
            LocalizedText::en_only("Active"),
        )
        .with_aggregation(Aggregation::Sum),
    );
    definition.filters.push(FilterSpec::new(
        "name_like",
        "name",
        DataType::Boolean,
        FilterType::Text,
        Operator::Contains,
        LocalizedText::en_only("Name"),
    ));

    let issues = engine.validate_definition(&definition);
    assert!(issues.len() >= 3);
    assert!(issues.iter().any(|i| i.key == "name"));
    assert!(issues.iter().any(|i| i.key == "active"));
    assert!(issues.iter().any(|i| i.key == "name_like"));
}

#[test]
fn mistyped_filter_default_never_reaches_render_time() {
    let dir = tempdir().expect("tempdir");
    let engine = engine_at(&dir);

    let mut definition = students_table();
    let mut filter = FilterSpec::new(
        "name_like",
        "name",
        DataType::Text,
        FilterType::Text,
        Operator::Contains,
        LocalizedText::en_only("Name"),
    );
    filter.default_value = Some(serde_json::json!(5));
    definition.filters.push(filter);

    let err = engine.save_definition(definition).unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref key, .. } if key == "name_like"));
    assert!(engine
        .list_all_definitions(SchemaKind::Table)
        .expect("list")
        .is_empty());
}

#[test]
fn update_keeps_identity_and_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let id;
    {
        let engine = engine_at(&dir);
        let saved = engine.save_definition(students_table()).expect("save");
        id = saved.id;

        let mut updated = saved;
        updated.labels.en = "All students".to_string();
        let resaved = engine.save_definition(updated).expect("resave");
        assert_eq!(resaved.id, id);
    }

    let reopened = engine_at(&dir);
    let context = RequestContext::new(Vec::<String>::new(), Lang::En);
    let loaded = reopened
        .get_definition(SchemaKind::Table, "students", &context)
        .expect("get");
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.labels.en, "All students");
}

#[test]
fn delete_removes_from_store_and_disk() {
    let dir = tempdir().expect("tempdir");
    {
        let engine = engine_at(&dir);
        engine.save_definition(students_table()).expect("save");
        assert!(engine
            .delete_definition(SchemaKind::Table, "students")
            .expect("delete"));
        assert!(!engine
            .delete_definition(SchemaKind::Table, "students")
            .expect("second delete"));
    }

    let reopened = engine_at(&dir);
    let context = RequestContext::new(Vec::<String>::new(), Lang::En);
    let err = reopened
        .get_definition(SchemaKind::Table, "students", &context)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn listings_order_by_sort_order_then_key() {
    let dir = tempdir().expect("tempdir");
    let engine = engine_at(&dir);

    for (key, order) in [("zeta", 0), ("alpha", 0), ("first", -1)] {
        let mut definition = students_table();
        definition.key = key.to_string();
        definition.sort_order = order;
        engine.save_definition(definition).expect("save");
    }

    let context = RequestContext::new(Vec::<String>::new(), Lang::En);
    let listed = engine
        .list_definitions(SchemaKind::Table, &context)
        .expect("list");
    let keys: Vec<&str> = listed.iter().map(|d| d.key.as_str()).collect();
    assert_eq!(keys, vec!["first", "alpha", "zeta"]);
}
