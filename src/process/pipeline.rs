//! Raw accounting rows → cleaned [`JobTable`].
//!
//! The run is one pure pass: resolve the mapping, apply the duplicate policy,
//! push every row through the filter chain, then type the survivors and derive
//! their timings. Rows are kept or dropped whole; every dropped row is reported
//! with its reason next to the cleaned table.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use super::{
    derive::derive_timings,
    filters::{FilterContext, FilterStage, RawRecord},
    resources::parse_node_list,
};
use crate::config::{DuplicatePolicy, SanitizeConfig};
use crate::error::{RecordError, SanitizeError};
use crate::process::RawTable;
use crate::schema::{InputField, SchemaMapping};
use crate::table::{Job, JobTable};

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Another row with the same job id was kept instead.
    Duplicate,
    Filtered(FilterStage),
    Malformed(RecordError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Zero-based data row index in the raw table.
    pub row: usize,
    pub job_id: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sanitized {
    pub table: JobTable,
    /// Sorted by row.
    pub rejections: Vec<Rejection>,
}

impl Sanitized {
    pub fn malformed_count(&self) -> usize {
        self.rejections
            .iter()
            .filter(|r| matches!(r.reason, RejectReason::Malformed(_)))
            .count()
    }

    pub fn filtered_count(&self) -> usize {
        self.rejections.len() - self.malformed_count()
    }
}

enum RowOutcome {
    Kept(Job),
    Rejected(Rejection),
    Fault(SanitizeError),
}

/// [`sanitize_with`] using the default configuration.
pub fn sanitize(
    raw: &RawTable,
    mapping: &SchemaMapping,
    now: NaiveDateTime,
) -> Result<Sanitized, SanitizeError> {
    sanitize_with(raw, mapping, now, &SanitizeConfig::default())
}

/// Clean `raw` as exported in `mapping`'s dialect. `now` stands in for finish
/// times the scheduler has not resolved yet.
///
/// Fails only on a schema mismatch (before any row is looked at) or on an
/// internal consistency fault; per-row problems end up in
/// [`Sanitized::rejections`].
#[instrument(level = "info", skip_all, fields(dialect = %mapping.dialect, rows = raw.len()))]
pub fn sanitize_with(
    raw: &RawTable,
    mapping: &SchemaMapping,
    now: NaiveDateTime,
    config: &SanitizeConfig,
) -> Result<Sanitized, SanitizeError> {
    let index = mapping.resolve(&raw.headers)?;

    let records: Vec<RawRecord> = raw
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| RawRecord::from_row(row, cells, &index))
        .collect();
    let (records, mut rejections) = apply_duplicate_policy(records, config.duplicates);

    let ctx = FilterContext {
        now,
        sentinel: &config.sentinel,
        mapping,
    };
    let outcomes: Vec<RowOutcome> = if config.parallel {
        records
            .into_par_iter()
            .map(|rec| process_record(rec, &ctx, config))
            .collect()
    } else {
        records
            .into_iter()
            .map(|rec| process_record(rec, &ctx, config))
            .collect()
    };

    let mut jobs = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            RowOutcome::Kept(job) => jobs.push(job),
            RowOutcome::Rejected(rejection) => rejections.push(rejection),
            RowOutcome::Fault(err) => return Err(err),
        }
    }
    rejections.sort_by_key(|r| r.row);

    let sanitized = Sanitized {
        table: JobTable::new(jobs),
        rejections,
    };
    info!(
        kept = sanitized.table.len(),
        filtered = sanitized.filtered_count(),
        malformed = sanitized.malformed_count(),
        "sanitized"
    );
    Ok(sanitized)
}

fn apply_duplicate_policy(
    records: Vec<RawRecord>,
    policy: DuplicatePolicy,
) -> (Vec<RawRecord>, Vec<Rejection>) {
    let keep: Box<dyn Fn(&RawRecord) -> bool> = match policy {
        DuplicatePolicy::KeepAll => return (records, Vec::new()),
        DuplicatePolicy::KeepFirst => {
            let mut seen = HashSet::new();
            let first: HashSet<usize> = records
                .iter()
                .filter(|r| seen.insert(r.job_id.as_str()))
                .map(|r| r.row)
                .collect();
            Box::new(move |r| first.contains(&r.row))
        }
        DuplicatePolicy::KeepLast => {
            let last: HashMap<&str, usize> =
                records.iter().map(|r| (r.job_id.as_str(), r.row)).collect();
            let last: HashSet<usize> = last.into_values().collect();
            Box::new(move |r| last.contains(&r.row))
        }
    };

    let (kept, dropped): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| keep(r));
    let rejections = dropped
        .into_iter()
        .map(|r| {
            debug!(row = r.row, job_id = %r.job_id, "dropping duplicate job id");
            Rejection {
                row: r.row,
                job_id: r.job_id,
                reason: RejectReason::Duplicate,
            }
        })
        .collect();
    (kept, rejections)
}

fn process_record(mut rec: RawRecord, ctx: &FilterContext<'_>, config: &SanitizeConfig) -> RowOutcome {
    let reason = match config.filters.run(&mut rec, ctx) {
        Ok(None) => match build_job(&rec, ctx, config) {
            Ok(job) => return RowOutcome::Kept(job),
            Err(RowFailure::Fault(err)) => return RowOutcome::Fault(err),
            Err(RowFailure::Malformed(err)) => RejectReason::Malformed(err),
        },
        Ok(Some(stage)) => RejectReason::Filtered(stage),
        Err(err) => RejectReason::Malformed(err),
    };

    match &reason {
        RejectReason::Malformed(err) => {
            warn!(row = rec.row, job_id = %rec.job_id, error = %err, "malformed record")
        }
        _ => debug!(row = rec.row, job_id = %rec.job_id, ?reason, "record rejected"),
    }
    RowOutcome::Rejected(Rejection {
        row: rec.row,
        job_id: rec.job_id,
        reason,
    })
}

enum RowFailure {
    Malformed(RecordError),
    Fault(SanitizeError),
}

impl From<RecordError> for RowFailure {
    fn from(err: RecordError) -> Self {
        RowFailure::Malformed(err)
    }
}

/// Type a record that passed the chain and derive its timings.
fn build_job(rec: &RawRecord, ctx: &FilterContext<'_>, config: &SanitizeConfig) -> Result<Job, RowFailure> {
    let submission_time = ctx.timestamp(InputField::Submit, &rec.submit)?;
    let starting_time = ctx.timestamp(InputField::Start, &rec.start)?;
    let finish_time = rec.finish(ctx)?;
    let requested_number_of_resources = ctx.node_count(&rec.requested_nodes)?;
    let allocated_resources =
        parse_node_list(&rec.node_list, &ctx.mapping.node_list).map_err(RecordError::from)?;

    let timings = derive_timings(&rec.job_id, submission_time, starting_time, finish_time)
        .map_err(RowFailure::Fault)?;

    Ok(Job {
        job_id: rec.job_id.clone(),
        workload_name: config.workload_name.clone(),
        submission_time,
        requested_number_of_resources,
        requested_time: timings.requested_time,
        success: rec.state.clone(),
        starting_time,
        execution_time: timings.execution_time,
        finish_time,
        waiting_time: timings.waiting_time,
        turnaround_time: timings.turnaround_time,
        stretch: timings.stretch,
        allocated_resources,
        purpose: config.purpose_rules.classify(&rec.reservation),
    })
}
