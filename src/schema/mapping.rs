//! Scheduler-export dialects: which source column feeds which input field.
//!
//! A dialect is plain data. New dialects are added as another table of the same
//! shape, or loaded from YAML through [`SchemaMapping`]'s serde impls.

use serde::{Deserialize, Serialize};

use super::{types::FIELD_COUNT, InputField};
use crate::error::SanitizeError;
use crate::process::utils::clean_str;

/// `sacct` export as produced by the 2022 accounting dumps.
const SACCT_2022: &[(&str, InputField)] = &[
    ("JobIDRaw", InputField::JobId),
    ("State", InputField::State),
    ("Timelimit", InputField::WallclockLimit),
    ("NNodes", InputField::RequestedNodes),
    ("Submit", InputField::Submit),
    ("Start", InputField::Start),
    ("End", InputField::End),
    ("NodeList", InputField::NodeList),
    ("Reservation", InputField::Reservation),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub field: InputField,
}

/// How a dialect writes its allocated-node list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeListFormat {
    /// Characters stripped from both ends of the raw value (host prefix, brackets).
    #[serde(default)]
    pub framing: String,
    /// Entry separators rewritten to whitespace before parsing.
    #[serde(default)]
    pub separators: Vec<char>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    pub dialect: String,
    pub columns: Vec<ColumnMapping>,
    #[serde(default)]
    pub node_list: NodeListFormat,
}

impl SchemaMapping {
    pub fn sacct_2022() -> Self {
        Self::from_table(
            "sacct-2022",
            SACCT_2022,
            NodeListFormat {
                framing: "fg[]sn".into(),
                separators: vec!['|'],
            },
        )
    }

    /// Dialect whose source names are the cleaned-table column names, so a
    /// cleaned table rendered with `JobTable::to_raw_table` can be re-sanitized.
    pub fn canonical() -> Self {
        let columns = InputField::ALL
            .iter()
            .map(|f| ColumnMapping {
                source: f.canonical_name().to_string(),
                field: *f,
            })
            .collect();
        SchemaMapping {
            dialect: "canonical".into(),
            columns,
            node_list: NodeListFormat::default(),
        }
    }

    /// Look up a built-in dialect by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "sacct-2022" => Some(Self::sacct_2022()),
            "canonical" => Some(Self::canonical()),
            _ => None,
        }
    }

    fn from_table(dialect: &str, table: &[(&str, InputField)], node_list: NodeListFormat) -> Self {
        SchemaMapping {
            dialect: dialect.to_string(),
            columns: table
                .iter()
                .map(|(source, field)| ColumnMapping {
                    source: source.to_string(),
                    field: *field,
                })
                .collect(),
            node_list,
        }
    }

    pub fn source_name(&self, field: InputField) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.source.as_str())
    }

    /// Locate every input field in `headers`. Fails on the first field the
    /// dialect leaves unmapped, or whose source column is absent.
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnIndex, SanitizeError> {
        let cleaned: Vec<String> = headers.iter().map(|h| clean_str(h)).collect();
        let mut slots = [0usize; FIELD_COUNT];

        for field in InputField::ALL {
            let source = self
                .source_name(field)
                .ok_or_else(|| SanitizeError::UnmappedField {
                    dialect: self.dialect.clone(),
                    field: field.canonical_name().to_string(),
                })?;
            let pos = cleaned.iter().position(|h| h == source).ok_or_else(|| {
                SanitizeError::SchemaMismatch {
                    dialect: self.dialect.clone(),
                    column: source.to_string(),
                }
            })?;
            slots[field.slot()] = pos;
        }

        Ok(ColumnIndex { slots })
    }
}

/// Header positions of each input field, resolved against one raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    slots: [usize; FIELD_COUNT],
}

impl ColumnIndex {
    pub fn position(&self, field: InputField) -> usize {
        self.slots[field.slot()]
    }

    /// Cell for `field` in `row`; short rows read as empty.
    pub fn cell<'a>(&self, row: &'a [String], field: InputField) -> &'a str {
        row.get(self.position(field)).map(String::as_str).unwrap_or("")
    }
}
