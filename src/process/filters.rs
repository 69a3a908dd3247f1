//! Per-row validity chain.
//!
//! Normalization stages rewrite the record and always keep it; rejection
//! stages inspect the (normalized) record and may drop it. A stage only fails
//! when a value it has to interpret cannot be parsed.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    date_parser::{format_timestamp, parse_timestamp},
    wallclock::parse_wallclock,
};
use crate::error::RecordError;
use crate::schema::{ColumnIndex, InputField, SchemaMapping};

static CANCELLED_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CANCELLED by \d+").expect("static regex"));

/// One raw row read through a resolved mapping. Owned, so normalization never
/// touches the caller's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub row: usize,
    pub job_id: String,
    pub state: String,
    pub wallclock_limit: String,
    pub requested_nodes: String,
    pub submit: String,
    pub start: String,
    pub end: String,
    pub node_list: String,
    pub reservation: String,
    /// Finish time taken from the caller's `now`. Set together with `end`, and
    /// read in its place so sub-second precision survives.
    pub resolved_end: Option<NaiveDateTime>,
}

impl RawRecord {
    pub fn from_row(row: usize, cells: &[String], index: &ColumnIndex) -> Self {
        let cell = |f| index.cell(cells, f).to_string();
        RawRecord {
            row,
            job_id: cell(InputField::JobId),
            state: cell(InputField::State),
            wallclock_limit: cell(InputField::WallclockLimit),
            requested_nodes: cell(InputField::RequestedNodes),
            submit: cell(InputField::Submit),
            start: cell(InputField::Start),
            end: cell(InputField::End),
            node_list: cell(InputField::NodeList),
            reservation: cell(InputField::Reservation),
            resolved_end: None,
        }
    }

    /// Typed finish time: the resolved `now` if the end was defaulted, the
    /// parsed cell otherwise.
    pub fn finish(&self, ctx: &FilterContext<'_>) -> Result<NaiveDateTime, RecordError> {
        match self.resolved_end {
            Some(end) => Ok(end),
            None => ctx.timestamp(InputField::End, &self.end),
        }
    }
}

/// What the stages need besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Replaces unresolved finish times.
    pub now: NaiveDateTime,
    /// Marks a value the scheduler did not know yet.
    pub sentinel: &'a str,
    pub mapping: &'a SchemaMapping,
}

impl FilterContext<'_> {
    pub fn column(&self, field: InputField) -> String {
        self.mapping
            .source_name(field)
            .unwrap_or_else(|| field.canonical_name())
            .to_string()
    }

    pub fn timestamp(&self, field: InputField, value: &str) -> Result<NaiveDateTime, RecordError> {
        if value.trim().is_empty() {
            return Err(RecordError::MissingValue {
                column: self.column(field),
            });
        }
        parse_timestamp(value).ok_or_else(|| RecordError::MalformedTimestamp {
            column: self.column(field),
            value: value.to_string(),
        })
    }

    pub fn node_count(&self, value: &str) -> Result<u32, RecordError> {
        value
            .trim()
            .parse()
            .map_err(|_| RecordError::MalformedInteger {
                column: self.column(InputField::RequestedNodes),
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    DefaultEndTime,
    NormalizeCancellation,
    ZeroResources,
    ZeroWallclock,
    DegenerateInterval,
    UnknownTimestamp,
    NullStart,
    EndBeforeStart,
}

impl FilterStage {
    pub const STANDARD: [FilterStage; 8] = [
        FilterStage::DefaultEndTime,
        FilterStage::NormalizeCancellation,
        FilterStage::ZeroResources,
        FilterStage::ZeroWallclock,
        FilterStage::DegenerateInterval,
        FilterStage::UnknownTimestamp,
        FilterStage::NullStart,
        FilterStage::EndBeforeStart,
    ];

    pub fn is_normalization(&self) -> bool {
        matches!(
            self,
            FilterStage::DefaultEndTime | FilterStage::NormalizeCancellation
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::DefaultEndTime => "default_end_time",
            FilterStage::NormalizeCancellation => "normalize_cancellation",
            FilterStage::ZeroResources => "zero_resources",
            FilterStage::ZeroWallclock => "zero_wallclock",
            FilterStage::DegenerateInterval => "degenerate_interval",
            FilterStage::UnknownTimestamp => "unknown_timestamp",
            FilterStage::NullStart => "null_start",
            FilterStage::EndBeforeStart => "end_before_start",
        }
    }

    pub fn apply(&self, rec: &mut RawRecord, ctx: &FilterContext<'_>) -> Result<Verdict, RecordError> {
        let keep_if = |ok: bool| if ok { Verdict::Keep } else { Verdict::Drop };

        let verdict = match self {
            FilterStage::DefaultEndTime => {
                if rec.end == ctx.sentinel {
                    rec.end = format_timestamp(&ctx.now);
                    rec.resolved_end = Some(ctx.now);
                }
                Verdict::Keep
            }
            FilterStage::NormalizeCancellation => {
                let state = CANCELLED_BY.replace(&rec.state, "CANCELLED").into_owned();
                rec.state = state;
                Verdict::Keep
            }
            FilterStage::ZeroResources => keep_if(ctx.node_count(&rec.requested_nodes)? != 0),
            FilterStage::ZeroWallclock => {
                let limit = parse_wallclock(&rec.wallclock_limit).ok_or_else(|| {
                    RecordError::MalformedWallclock {
                        column: ctx.column(InputField::WallclockLimit),
                        value: rec.wallclock_limit.clone(),
                    }
                })?;
                keep_if(!limit.is_zero())
            }
            FilterStage::DegenerateInterval => match rec.resolved_end {
                Some(end) => keep_if(parse_timestamp(&rec.start) != Some(end)),
                None => keep_if(rec.end != rec.start),
            },
            FilterStage::UnknownTimestamp => keep_if(
                [&rec.end, &rec.start, &rec.submit]
                    .iter()
                    .all(|v| v.as_str() != ctx.sentinel),
            ),
            FilterStage::NullStart => keep_if(!rec.start.trim().is_empty()),
            FilterStage::EndBeforeStart => {
                let start = ctx.timestamp(InputField::Start, &rec.start)?;
                keep_if(rec.finish(ctx)? > start)
            }
        };
        Ok(verdict)
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered filter stages. Normalizations always run before rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl FilterChain {
    pub fn standard() -> Self {
        FilterChain {
            stages: FilterStage::STANDARD.to_vec(),
        }
    }

    pub fn new(stages: impl IntoIterator<Item = FilterStage>) -> Self {
        let (mut ordered, rest): (Vec<_>, Vec<_>) =
            stages.into_iter().partition(FilterStage::is_normalization);
        ordered.extend(rest);
        FilterChain { stages: ordered }
    }

    /// Same chain minus `stage`.
    pub fn without(mut self, stage: FilterStage) -> Self {
        self.stages.retain(|s| *s != stage);
        self
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Run every stage in order. `Ok(Some(stage))` names the stage that dropped
    /// the record; `Ok(None)` means it survived.
    pub fn run(&self, rec: &mut RawRecord, ctx: &FilterContext<'_>) -> Result<Option<FilterStage>, RecordError> {
        for stage in &self.stages {
            if stage.apply(rec, ctx)? == Verdict::Drop {
                return Ok(Some(*stage));
            }
        }
        Ok(None)
    }
}
