pub mod config;
pub mod error;
pub mod process;
pub mod schema;
pub mod table;
pub mod window;

pub use config::SanitizeConfig;
pub use error::{RecordError, ResourceParseError, SanitizeError};
pub use process::pipeline::{sanitize, sanitize_with, Rejection, RejectReason, Sanitized};
pub use process::RawTable;
pub use schema::SchemaMapping;
pub use table::{Job, JobTable, Purpose, ResourceSet};
pub use window::{select_window, Window};
