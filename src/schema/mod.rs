pub mod mapping;
pub mod types;

pub use mapping::{ColumnIndex, ColumnMapping, NodeListFormat, SchemaMapping};
pub use types::InputField;
