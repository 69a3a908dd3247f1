use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::process::{filters::FilterChain, purpose::PurposeRules};
use crate::schema::SchemaMapping;

/// What to do with rows that repeat an earlier job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    KeepAll,
    KeepFirst,
    KeepLast,
}

/// Settings of one sanitization run. Passed by value into the pipeline; there
/// is no process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Label stamped on every cleaned job.
    pub workload_name: String,
    /// Cell value meaning "not known yet".
    pub sentinel: String,
    pub duplicates: DuplicatePolicy,
    pub purpose_rules: PurposeRules,
    /// Run per-row work on the rayon pool.
    pub parallel: bool,
    /// Dialect to use instead of a built-in one.
    pub dialect: Option<SchemaMapping>,
    #[serde(skip)]
    pub filters: FilterChain,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        SanitizeConfig {
            workload_name: "w0".into(),
            sentinel: "Unknown".into(),
            duplicates: DuplicatePolicy::default(),
            purpose_rules: PurposeRules::default(),
            parallel: true,
            dialect: None,
            filters: FilterChain::standard(),
        }
    }
}

impl SanitizeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing sanitize config")
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {:?}", path))
    }
}
