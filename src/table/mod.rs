//! The cleaned job table handed to renderers.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::{collections::BTreeSet, fmt};

use crate::process::{date_parser::format_timestamp, wallclock::format_wallclock};
use crate::schema::InputField;

pub mod arrow;

/// Column order of the cleaned table.
pub const COLUMNS: [&str; 14] = [
    "job_id",
    "workload_name",
    "submission_time",
    "requested_number_of_resources",
    "requested_time",
    "success",
    "starting_time",
    "execution_time",
    "finish_time",
    "waiting_time",
    "turnaround_time",
    "stretch",
    "allocated_resources",
    "purpose",
];

/// Set of allocated resource identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResourceSet(BTreeSet<u32>);

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Maximal runs of consecutive identifiers, as inclusive `(first, last)` pairs.
    pub fn intervals(&self) -> Vec<(u32, u32)> {
        let mut out: Vec<(u32, u32)> = Vec::new();
        for id in self.iter() {
            match out.last_mut() {
                Some((_, last)) if last.checked_add(1) == Some(id) => *last = id,
                _ => out.push((id, id)),
            }
        }
        out
    }
}

impl FromIterator<u32> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        ResourceSet(iter.into_iter().collect())
    }
}

/// Space-separated `a-b` ranges, e.g. `0-3 7`.
impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (a, b)) in self.intervals().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if a == b {
                write!(f, "{}", a)?;
            } else {
                write!(f, "{}-{}", a, b)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Reservation,
    Job,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Reservation => "reservation",
            Purpose::Job => "job",
        }
    }
}

fn duration_seconds<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

/// One cleaned job. Field order is the table's column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub job_id: String,
    pub workload_name: String,
    pub submission_time: NaiveDateTime,
    pub requested_number_of_resources: u32,
    #[serde(serialize_with = "duration_seconds")]
    pub requested_time: Duration,
    pub success: String,
    pub starting_time: NaiveDateTime,
    #[serde(serialize_with = "duration_seconds")]
    pub execution_time: Duration,
    pub finish_time: NaiveDateTime,
    #[serde(serialize_with = "duration_seconds")]
    pub waiting_time: Duration,
    #[serde(serialize_with = "duration_seconds")]
    pub turnaround_time: Duration,
    pub stretch: f64,
    pub allocated_resources: ResourceSet,
    pub purpose: Purpose,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobTable {
    pub jobs: Vec<Job>,
}

impl JobTable {
    pub fn new(jobs: Vec<Job>) -> Self {
        JobTable { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    /// Longest execution time in the table; zero when empty.
    pub fn max_execution_time(&self) -> Duration {
        self.jobs
            .iter()
            .map(|j| j.execution_time)
            .max()
            .unwrap_or_else(Duration::zero)
    }

    /// Render the table in the `canonical` dialect so it can be fed back to
    /// the sanitizer.
    pub fn to_raw_table(&self) -> crate::RawTable {
        let headers = InputField::ALL
            .iter()
            .map(|f| f.canonical_name().to_string())
            .collect();
        let mut raw = crate::RawTable::new(headers);
        for job in &self.jobs {
            let row = InputField::ALL
                .iter()
                .map(|f| match f {
                    InputField::JobId => job.job_id.clone(),
                    InputField::State => job.success.clone(),
                    InputField::WallclockLimit => format_wallclock(job.requested_time),
                    InputField::RequestedNodes => job.requested_number_of_resources.to_string(),
                    InputField::Submit => format_timestamp(&job.submission_time),
                    InputField::Start => format_timestamp(&job.starting_time),
                    InputField::End => format_timestamp(&job.finish_time),
                    InputField::NodeList => job.allocated_resources.to_string(),
                    InputField::Reservation => job.purpose.as_str().to_string(),
                })
                .collect();
            raw.push_row(row);
        }
        raw
    }
}

impl<'a> IntoIterator for &'a JobTable {
    type Item = &'a Job;
    type IntoIter = std::slice::Iter<'a, Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}
