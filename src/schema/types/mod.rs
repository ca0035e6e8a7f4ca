pub mod chart;
pub mod column;
pub mod definition;
pub mod field;
pub mod filter;

pub use chart::{ChartSpec, ChartType, LegendPosition};
pub use column::{Align, ColumnSpec, StyleCondition, StyleRule};
pub use definition::{Lang, LocalizedText, SchemaDefinition, SchemaKind};
pub use field::{Aggregation, FieldSpec};
pub use filter::{FilterOption, FilterSpec, FilterType, Operator, OptionsSource};
