//! Definition validation, run before every save.
//!
//! Validation is collect-all: the full issue list comes back in one pass so
//! an administrator can fix a definition in one round trip instead of
//! resubmitting once per error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::compiler;
use crate::registry;
use crate::schema::types::{SchemaDefinition, SchemaKind};
use crate::source::DataSource;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("static key pattern")
});

/// One problem found in a definition. `key` names the offending child spec,
/// or the definition's own key for top-level issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub key: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Validates a definition. When a data source is supplied, field paths are
/// also resolved against the target source's schema; without one, only
/// structural checks run.
pub fn validate(
    definition: &SchemaDefinition,
    source: Option<&dyn DataSource>,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_top_level(definition, &mut issues);
    check_child_keys(definition, &mut issues);
    check_columns(definition, &mut issues);
    check_fields(definition, &mut issues);
    check_filters(definition, &mut issues);
    check_charts(definition, &mut issues);

    if let Some(source) = source {
        check_field_resolution(definition, source, &mut issues);
    }

    issues
}

fn check_top_level(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    if !KEY_PATTERN.is_match(&definition.key) {
        issues.push(ValidationIssue::new(
            &definition.key,
            "key must be lowercase snake_case starting with a letter",
        ));
    }
    if definition.labels.en.is_empty() {
        issues.push(ValidationIssue::new(
            &definition.key,
            "English label is required",
        ));
    }
    if definition.target.is_empty() {
        issues.push(ValidationIssue::new(
            &definition.key,
            "target data source is required",
        ));
    }
    match definition.kind {
        SchemaKind::Table if definition.columns.is_empty() => issues.push(ValidationIssue::new(
            &definition.key,
            "a table needs at least one column",
        )),
        SchemaKind::Form | SchemaKind::Report if definition.fields.is_empty() => issues.push(
            ValidationIssue::new(&definition.key, "at least one field is required"),
        ),
        _ => {}
    }
}

fn check_child_keys(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    let mut seen = std::collections::HashSet::new();
    for key in definition.child_keys() {
        if !KEY_PATTERN.is_match(key) {
            issues.push(ValidationIssue::new(
                key,
                "key must be lowercase snake_case starting with a letter",
            ));
        }
        if !seen.insert(key) {
            issues.push(ValidationIssue::new(key, "duplicate key within definition"));
        }
    }
}

fn check_columns(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    for column in &definition.columns {
        if column.field_name.is_empty() {
            issues.push(ValidationIssue::new(&column.key, "field_name is required"));
        }
    }
}

fn check_fields(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    for field in &definition.fields {
        if field.field_name.is_empty() {
            issues.push(ValidationIssue::new(&field.key, "field_name is required"));
        }
        if let Some(aggregation) = field.aggregation {
            if aggregation.requires_numeric() && !field.data_type.is_numeric() {
                issues.push(ValidationIssue::new(
                    &field.key,
                    format!(
                        "aggregation '{}' needs a numeric data type, found '{}'",
                        aggregation, field.data_type
                    ),
                ));
            }
        }
        if (field.include_in_total || field.include_in_subtotal) && field.aggregation.is_none() {
            issues.push(ValidationIssue::new(
                &field.key,
                "totals require an aggregation function",
            ));
        }
    }
}

fn check_filters(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    for filter in &definition.filters {
        if filter.field_name.is_empty() {
            issues.push(ValidationIssue::new(&filter.key, "field_name is required"));
        }
        let descriptor = registry::describe(filter.data_type);
        if !descriptor.allows_operator(filter.operator) {
            issues.push(ValidationIssue::new(
                &filter.key,
                format!(
                    "operator '{}' is not valid for data type '{}'",
                    filter.operator, filter.data_type
                ),
            ));
        }
        if filter.filter_type.needs_options() {
            match (filter.options.is_empty(), filter.options_source.is_none()) {
                (true, true) => issues.push(ValidationIssue::new(
                    &filter.key,
                    "select filters need static options or an options source",
                )),
                (false, false) => issues.push(ValidationIssue::new(
                    &filter.key,
                    "select filters take static options or an options source, not both",
                )),
                _ => {}
            }
        }
        for option in &filter.options {
            if !(descriptor.validate)(&option.value) {
                issues.push(ValidationIssue::new(
                    &filter.key,
                    format!(
                        "option value {} does not match declared type '{}'",
                        option.value, filter.data_type
                    ),
                ));
            }
        }
        if let Some(default) = &filter.default_value {
            if !compiler::is_empty(default) {
                if let Err(error) = compiler::bind(filter, default) {
                    issues.push(ValidationIssue::new(
                        &filter.key,
                        format!("default value cannot bind: {}", error),
                    ));
                }
            }
        }
    }
}

fn check_charts(definition: &SchemaDefinition, issues: &mut Vec<ValidationIssue>) {
    for chart in &definition.charts {
        if chart.title.en.is_empty() {
            issues.push(ValidationIssue::new(
                &chart.key,
                "English chart title is required",
            ));
        }
        if chart.label_field.is_empty() || chart.data_field.is_empty() {
            issues.push(ValidationIssue::new(
                &chart.key,
                "label_field and data_field are required",
            ));
        }
    }
}

fn check_field_resolution(
    definition: &SchemaDefinition,
    source: &dyn DataSource,
    issues: &mut Vec<ValidationIssue>,
) {
    if source.schema(&definition.target).is_none() {
        issues.push(ValidationIssue::new(
            &definition.key,
            format!("unknown data source '{}'", definition.target),
        ));
        return;
    }

    let mut check = |key: &str, path: &str| {
        if !path.is_empty() && !resolves(source, &definition.target, path) {
            let error = crate::error::EngineError::UnresolvedField {
                field: path.to_string(),
                source_name: definition.target.clone(),
            };
            issues.push(ValidationIssue::new(key, error.to_string()));
        }
    };

    for column in &definition.columns {
        check(&column.key, &column.field_name);
    }
    for field in &definition.fields {
        check(&field.key, &field.field_name);
    }
    for filter in &definition.filters {
        check(&filter.key, &filter.field_name);
    }
    for chart in &definition.charts {
        check(&chart.key, &chart.label_field);
        check(&chart.key, &chart.data_field);
        if let Some(group_field) = &chart.group_field {
            check(&chart.key, group_field);
        }
    }
}

/// Walks a dotted path through relation links. Every segment but the last
/// must be a declared relation; the last must be a field of the source it
/// lands on.
fn resolves(source: &dyn DataSource, source_name: &str, path: &str) -> bool {
    let mut current = match source.schema(source_name) {
        Some(schema) => schema,
        None => return false,
    };
    let segments: Vec<&str> = path.split('.').collect();
    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        if last {
            return current.has_field(segment);
        }
        match current.relations.get(*segment) {
            Some(related) => match source.schema(related) {
                Some(schema) => current = schema,
                None => return false,
            },
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DataType;
    use crate::schema::types::{
        Aggregation, FieldSpec, FilterSpec, FilterType, LocalizedText, Operator,
    };
    use crate::source::{MemorySource, SourceSchema};

    fn base_report() -> SchemaDefinition {
        let mut definition = SchemaDefinition::new(SchemaKind::Report, "fee_report", "payments");
        definition.labels = LocalizedText::en_only("Fee report");
        definition.fields.push(FieldSpec::new(
            "amount",
            "amount",
            DataType::Currency,
            LocalizedText::en_only("Amount"),
        ));
        definition
    }

    #[test]
    fn clean_definition_passes() {
        assert!(validate(&base_report(), None).is_empty());
    }

    #[test]
    fn bad_key_and_missing_label_are_reported_together() {
        let mut definition = base_report();
        definition.key = "Fee Report".to_string();
        definition.labels = LocalizedText::default();
        let issues = validate(&definition, None);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn duplicate_child_keys_are_rejected() {
        let mut definition = base_report();
        definition.fields.push(FieldSpec::new(
            "amount",
            "amount",
            DataType::Currency,
            LocalizedText::en_only("Amount again"),
        ));
        let issues = validate(&definition, None);
        assert!(issues.iter().any(|i| i.message.contains("duplicate")));
    }

    #[test]
    fn sum_over_boolean_field_is_rejected() {
        let mut definition = base_report();
        definition.fields.push(
            FieldSpec::new(
                "paid",
                "is_paid",
                DataType::Boolean,
                LocalizedText::en_only("Paid"),
            )
            .with_aggregation(Aggregation::Sum),
        );
        let issues = validate(&definition, None);
        assert!(issues.iter().any(|i| i.key == "paid"));
    }

    #[test]
    fn count_over_boolean_field_is_fine() {
        let mut definition = base_report();
        definition.fields.push(
            FieldSpec::new(
                "paid",
                "is_paid",
                DataType::Boolean,
                LocalizedText::en_only("Paid"),
            )
            .with_aggregation(Aggregation::Count),
        );
        assert!(validate(&definition, None).is_empty());
    }

    #[test]
    fn operator_type_mismatch_is_rejected() {
        let mut definition = base_report();
        definition.filters.push(FilterSpec::new(
            "paid",
            "is_paid",
            DataType::Boolean,
            FilterType::Boolean,
            Operator::Contains,
            LocalizedText::en_only("Paid"),
        ));
        let issues = validate(&definition, None);
        assert!(issues.iter().any(|i| i.message.contains("operator")));
    }

    #[test]
    fn select_filter_without_options_is_rejected() {
        let mut definition = base_report();
        definition.filters.push(FilterSpec::new(
            "status",
            "status",
            DataType::Status,
            FilterType::Select,
            Operator::Equals,
            LocalizedText::en_only("Status"),
        ));
        let issues = validate(&definition, None);
        assert!(issues.iter().any(|i| i.key == "status"));
    }

    #[test]
    fn select_filter_with_both_option_sources_is_rejected() {
        let mut definition = base_report();
        let mut filter = FilterSpec::new(
            "status",
            "status",
            DataType::Status,
            FilterType::Select,
            Operator::Equals,
            LocalizedText::en_only("Status"),
        );
        filter.options.push(crate::schema::types::FilterOption {
            value: serde_json::json!("ACTIVE"),
            labels: LocalizedText::en_only("Active"),
        });
        filter.options_source =
            Some(crate::schema::types::OptionsSource::parse("statuses:code").unwrap());
        definition.filters.push(filter);

        let issues = validate(&definition, None);
        assert!(issues
            .iter()
            .any(|i| i.key == "status" && i.message.contains("not both")));
    }

    #[test]
    fn mistyped_default_value_is_rejected_at_save_time() {
        let mut definition = base_report();
        let mut filter = FilterSpec::new(
            "note",
            "note",
            DataType::Text,
            FilterType::Text,
            Operator::Contains,
            LocalizedText::en_only("Note"),
        );
        filter.default_value = Some(serde_json::json!(5));
        definition.filters.push(filter);

        let issues = validate(&definition, None);
        assert!(issues
            .iter()
            .any(|i| i.key == "note" && i.message.contains("default value")));
    }

    #[test]
    fn well_shaped_default_and_options_pass() {
        let mut definition = base_report();
        let mut filter = FilterSpec::new(
            "status",
            "status",
            DataType::Status,
            FilterType::Select,
            Operator::Equals,
            LocalizedText::en_only("Status"),
        );
        filter.options.push(crate::schema::types::FilterOption {
            value: serde_json::json!("ACTIVE"),
            labels: LocalizedText::en_only("Active"),
        });
        filter.default_value = Some(serde_json::json!("ACTIVE"));
        definition.filters.push(filter);
        assert!(validate(&definition, None).is_empty());
    }

    #[test]
    fn mistyped_option_value_is_rejected() {
        let mut definition = base_report();
        let mut filter = FilterSpec::new(
            "status",
            "status",
            DataType::Status,
            FilterType::Select,
            Operator::Equals,
            LocalizedText::en_only("Status"),
        );
        filter.options.push(crate::schema::types::FilterOption {
            value: serde_json::json!(3),
            labels: LocalizedText::en_only("Three"),
        });
        definition.filters.push(filter);

        let issues = validate(&definition, None);
        assert!(issues
            .iter()
            .any(|i| i.key == "status" && i.message.contains("option value")));
    }

    #[test]
    fn field_paths_resolve_through_relations() {
        let source = MemorySource::new().with_source(
            SourceSchema::new("payments", ["amount", "student_id"])
                .with_relation("student", "students"),
            Vec::new(),
        );
        let source = source.with_source(SourceSchema::new("students", ["name"]), Vec::new());

        let mut definition = base_report();
        definition.fields.push(FieldSpec::new(
            "student_name",
            "student.name",
            DataType::Text,
            LocalizedText::en_only("Student"),
        ));
        assert!(validate(&definition, Some(&source)).is_empty());

        definition.fields.push(FieldSpec::new(
            "bad",
            "student.gpa",
            DataType::Number,
            LocalizedText::en_only("GPA"),
        ));
        let issues = validate(&definition, Some(&source));
        assert!(issues.iter().any(|i| i.key == "bad"));
    }

    #[test]
    fn unknown_target_source_is_reported() {
        let source = MemorySource::new();
        let issues = validate(&base_report(), Some(&source));
        assert!(issues.iter().any(|i| i.message.contains("payments")));
    }
}
