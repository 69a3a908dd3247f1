use thiserror::Error;

/// Failures that abort a whole sanitization run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizeError {
    #[error("schema mismatch: dialect `{dialect}` requires column `{column}`, which is missing from the input")]
    SchemaMismatch { dialect: String, column: String },

    #[error("schema mismatch: dialect `{dialect}` maps no column to field `{field}`")]
    UnmappedField { dialect: String, field: String },

    /// Stretch was computed for a job whose requested time is zero. The filter
    /// chain excludes such rows, so reaching this means the chain is broken.
    #[error("division by zero computing stretch for job `{job_id}` (requested_time == 0)")]
    DivisionByZero { job_id: String },
}

/// Failures confined to a single row. The row is dropped and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("column `{column}`: malformed timestamp `{value}`")]
    MalformedTimestamp { column: String, value: String },

    #[error("column `{column}`: malformed integer `{value}`")]
    MalformedInteger { column: String, value: String },

    #[error("column `{column}`: malformed wallclock limit `{value}`")]
    MalformedWallclock { column: String, value: String },

    #[error("column `{column}`: missing value")]
    MissingValue { column: String },

    #[error(transparent)]
    Resource(#[from] ResourceParseError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse resource entry `{entry}` in `{input}`")]
pub struct ResourceParseError {
    pub entry: String,
    pub input: String,
}
