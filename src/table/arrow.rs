// src/table/arrow.rs

use arrow::{
    array::{
        ArrayRef, DurationSecondArray, Float64Array, ListBuilder, StringArray,
        TimestampSecondArray, UInt32Array, UInt32Builder,
    },
    datatypes::{DataType, Field, Schema, TimeUnit},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;

use super::{Job, JobTable, COLUMNS};

/// Arrow schema of the cleaned table, one field per entry of [`COLUMNS`].
///
/// Timestamps are zone-less seconds, durations are seconds and
/// `allocated_resources` is a list of resource identifiers.
pub fn job_schema() -> Schema {
    let ts = || DataType::Timestamp(TimeUnit::Second, None);
    let dur = || DataType::Duration(TimeUnit::Second);
    let types = [
        DataType::Utf8,
        DataType::Utf8,
        ts(),
        DataType::UInt32,
        dur(),
        DataType::Utf8,
        ts(),
        dur(),
        ts(),
        dur(),
        dur(),
        DataType::Float64,
        DataType::List(Arc::new(Field::new("item", DataType::UInt32, true))),
        DataType::Utf8,
    ];
    Schema::new(
        COLUMNS
            .iter()
            .zip(types)
            .map(|(name, ty)| Field::new(*name, ty, false))
            .collect::<Vec<_>>(),
    )
}

fn strings<'a>(jobs: &'a [Job], f: impl Fn(&'a Job) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(jobs.iter().map(f)))
}

fn stamps(jobs: &[Job], f: impl Fn(&Job) -> NaiveDateTime) -> ArrayRef {
    Arc::new(TimestampSecondArray::from_iter_values(
        jobs.iter().map(|j| f(j).and_utc().timestamp()),
    ))
}

fn durations(jobs: &[Job], f: impl Fn(&Job) -> Duration) -> ArrayRef {
    Arc::new(DurationSecondArray::from_iter_values(
        jobs.iter().map(|j| f(j).num_seconds()),
    ))
}

impl JobTable {
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let jobs = self.jobs.as_slice();

        let mut resources = ListBuilder::new(UInt32Builder::new());
        for job in jobs {
            for id in job.allocated_resources.iter() {
                resources.values().append_value(id);
            }
            resources.append(true);
        }

        let columns: Vec<ArrayRef> = vec![
            strings(jobs, |j| j.job_id.as_str()),
            strings(jobs, |j| j.workload_name.as_str()),
            stamps(jobs, |j| j.submission_time),
            Arc::new(UInt32Array::from_iter_values(
                jobs.iter().map(|j| j.requested_number_of_resources),
            )),
            durations(jobs, |j| j.requested_time),
            strings(jobs, |j| j.success.as_str()),
            stamps(jobs, |j| j.starting_time),
            durations(jobs, |j| j.execution_time),
            stamps(jobs, |j| j.finish_time),
            durations(jobs, |j| j.waiting_time),
            durations(jobs, |j| j.turnaround_time),
            Arc::new(Float64Array::from_iter_values(jobs.iter().map(|j| j.stretch))),
            Arc::new(resources.finish()),
            strings(jobs, |j| j.purpose.as_str()),
        ];

        RecordBatch::try_new(Arc::new(job_schema()), columns)
    }
}
