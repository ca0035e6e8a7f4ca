//! Render projection engine.
//!
//! Turns a schema definition plus a raw record set into ordered, formatted,
//! localized output: rows of cells for tables, a field sequence for forms,
//! rows plus totals and chart series for reports. Output is stable: the
//! same definition, rows and language always yield byte-identical output.

pub mod format;
pub mod style;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{self, AggregateResult, AggregateValue, ChartSeries};
use crate::error::{EngineError, EngineResult};
use crate::schema::types::{
    Align, ChartType, ColumnSpec, FieldSpec, Lang, LegendPosition, SchemaDefinition, SchemaKind,
};
use crate::source::{resolve_path, Row};

pub use format::format_value;

/// Header metadata for one rendered table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedColumn {
    pub key: String,
    pub label: String,
    pub align: Align,
    pub width: Option<String>,
    pub is_frozen: bool,
    pub is_sortable: bool,
    pub is_exportable: bool,
}

/// One formatted cell. `raw` carries the unformatted value for clients that
/// sort or export locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCell {
    pub key: String,
    pub raw: Value,
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Status color token, for `status` cells only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRow {
    pub cells: Vec<RenderedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTable {
    pub columns: Vec<RenderedColumn>,
    pub rows: Vec<RenderedRow>,
}

/// One rendered form field, bound to the definition's single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedField {
    pub key: String,
    pub label: String,
    pub raw: Value,
    pub formatted: String,
    pub is_required: bool,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedForm {
    pub fields: Vec<RenderedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTotal {
    pub key: String,
    pub label: String,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSubtotal {
    /// Formatted group-key values, in group-key order.
    pub group: Vec<String>,
    pub row_count: usize,
    pub totals: Vec<RenderedTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedChart {
    pub key: String,
    pub title: String,
    pub chart_type: ChartType,
    pub series: ChartSeries,
    pub colors: Vec<String>,
    pub show_legend: bool,
    pub show_labels: bool,
    pub show_grid: bool,
    pub legend_position: LegendPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub columns: Vec<RenderedColumn>,
    pub rows: Vec<RenderedRow>,
    pub grand_totals: Vec<RenderedTotal>,
    pub subtotals: Vec<RenderedSubtotal>,
    pub charts: Vec<RenderedChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedOutput {
    Table(RenderedTable),
    Form(RenderedForm),
    Report(RenderedReport),
}

/// Projects a record set through a definition.
///
/// Tables render every row through their visible columns; forms bind their
/// field sequence to exactly one record; reports render rows through their
/// visible fields and add totals and chart series.
pub fn project(
    definition: &SchemaDefinition,
    rows: &[Row],
    lang: Lang,
) -> EngineResult<RenderedOutput> {
    match definition.kind {
        SchemaKind::Table => Ok(RenderedOutput::Table(project_table(definition, rows, lang))),
        SchemaKind::Form => {
            let record = rows.first().ok_or_else(|| EngineError::NotFound {
                kind: SchemaKind::Form,
                key: definition.key.clone(),
            })?;
            Ok(RenderedOutput::Form(project_form(definition, record, lang)))
        }
        SchemaKind::Report => Ok(RenderedOutput::Report(project_report(
            definition, rows, lang,
        ))),
    }
}

fn project_table(definition: &SchemaDefinition, rows: &[Row], lang: Lang) -> RenderedTable {
    let columns: Vec<&ColumnSpec> = definition
        .ordered_columns()
        .into_iter()
        .filter(|c| c.is_visible)
        .collect();

    let headers = columns
        .iter()
        .map(|c| RenderedColumn {
            key: c.key.clone(),
            label: c.labels.get(lang).to_string(),
            align: c.align,
            width: c.width.clone(),
            is_frozen: c.is_frozen,
            is_sortable: c.is_sortable,
            is_exportable: c.is_exportable,
        })
        .collect();

    let rendered_rows = rows
        .iter()
        .map(|row| RenderedRow {
            cells: columns.iter().map(|c| project_cell(c, row, lang)).collect(),
        })
        .collect();

    RenderedTable {
        columns: headers,
        rows: rendered_rows,
    }
}

fn project_cell(column: &ColumnSpec, row: &Row, lang: Lang) -> RenderedCell {
    let raw = resolve_path(row, &column.field_name)
        .cloned()
        .unwrap_or(Value::Null);
    let formatted = format_value(column.data_type, &raw, &column.format_options, lang);
    let style = style::first_match(&column.conditional_styles, &raw).map(str::to_string);
    let color = if column.data_type == crate::registry::DataType::Status {
        Some(style::status_color(&column.status_colors, &raw))
    } else {
        None
    };
    RenderedCell {
        key: column.key.clone(),
        raw,
        formatted,
        style,
        color,
    }
}

fn project_form(definition: &SchemaDefinition, record: &Row, lang: Lang) -> RenderedForm {
    let fields = definition
        .ordered_fields()
        .into_iter()
        .filter(|f| f.is_visible)
        .map(|f| {
            let raw = resolve_path(record, &f.field_name)
                .cloned()
                .or_else(|| f.default_value.clone())
                .unwrap_or(Value::Null);
            let formatted = format_value(f.data_type, &raw, &f.format_options, lang);
            RenderedField {
                key: f.key.clone(),
                label: f.labels.get(lang).to_string(),
                raw,
                formatted,
                is_required: f.is_required,
                is_readonly: f.is_readonly,
            }
        })
        .collect();
    RenderedForm { fields }
}

fn project_report(definition: &SchemaDefinition, rows: &[Row], lang: Lang) -> RenderedReport {
    let fields: Vec<&FieldSpec> = definition
        .ordered_fields()
        .into_iter()
        .filter(|f| f.is_visible)
        .collect();

    let columns = fields
        .iter()
        .map(|f| RenderedColumn {
            key: f.key.clone(),
            label: f.labels.get(lang).to_string(),
            align: Align::Left,
            width: None,
            is_frozen: false,
            is_sortable: false,
            is_exportable: true,
        })
        .collect();

    let rendered_rows = rows
        .iter()
        .map(|row| RenderedRow {
            cells: fields
                .iter()
                .map(|f| {
                    let raw = resolve_path(row, &f.field_name)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let formatted = format_value(f.data_type, &raw, &f.format_options, lang);
                    RenderedCell {
                        key: f.key.clone(),
                        raw,
                        formatted,
                        style: None,
                        color: None,
                    }
                })
                .collect(),
        })
        .collect();

    let aggregates = aggregate::aggregate(rows, &definition.fields);
    let (grand_totals, subtotals) = render_totals(definition, &aggregates, lang);

    let charts = definition
        .ordered_charts()
        .into_iter()
        .filter(|c| c.is_visible)
        .map(|c| RenderedChart {
            key: c.key.clone(),
            title: c.title.get(lang).to_string(),
            chart_type: c.chart_type,
            series: aggregate::build_series(rows, c),
            colors: c.colors.clone(),
            show_legend: c.show_legend,
            show_labels: c.show_labels,
            show_grid: c.show_grid,
            legend_position: c.legend_position,
        })
        .collect();

    RenderedReport {
        columns,
        rows: rendered_rows,
        grand_totals,
        subtotals,
        charts,
    }
}

fn render_totals(
    definition: &SchemaDefinition,
    aggregates: &AggregateResult,
    lang: Lang,
) -> (Vec<RenderedTotal>, Vec<RenderedSubtotal>) {
    let ordered = definition.ordered_fields();

    let grand_totals = ordered
        .iter()
        .filter(|f| f.include_in_total)
        .filter_map(|f| {
            aggregates.grand_totals.get(&f.key).map(|value| RenderedTotal {
                key: f.key.clone(),
                label: f.labels.get(lang).to_string(),
                formatted: format_aggregate(f, *value, lang),
            })
        })
        .collect();

    let group_keys = definition.group_key_fields();
    let subtotals = aggregates
        .subtotals
        .iter()
        .map(|subtotal| {
            let group = subtotal
                .group
                .iter()
                .map(|(key, value)| {
                    let field = group_keys.iter().find(|f| &f.key == key);
                    match field {
                        Some(f) => format_value(f.data_type, value, &f.format_options, lang),
                        None => value.to_string(),
                    }
                })
                .collect();
            let totals = ordered
                .iter()
                .filter(|f| f.include_in_subtotal)
                .filter_map(|f| {
                    subtotal.values.get(&f.key).map(|value| RenderedTotal {
                        key: f.key.clone(),
                        label: f.labels.get(lang).to_string(),
                        formatted: format_aggregate(f, *value, lang),
                    })
                })
                .collect();
            RenderedSubtotal {
                group,
                row_count: subtotal.row_count,
                totals,
            }
        })
        .collect();

    (grand_totals, subtotals)
}

fn format_aggregate(field: &FieldSpec, value: AggregateValue, lang: Lang) -> String {
    match value {
        AggregateValue::NoData => format::PLACEHOLDER.to_string(),
        AggregateValue::Number(n) => {
            format_value(field.data_type, &Value::from(n), &field.format_options, lang)
        }
        AggregateValue::Count(c) => format_value(
            crate::registry::DataType::Number,
            &Value::from(c),
            &field.format_options,
            lang,
        ),
    }
}
