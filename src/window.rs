//! Time-window selection over a cleaned table.

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::SanitizeError;
use crate::process::{date_parser::parse_timestamp, RawTable};
use crate::schema::{InputField, SchemaMapping};
use crate::table::JobTable;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Window { start, end }
    }

    /// The `length` leading up to `end`. `None` when the start falls outside
    /// the representable range.
    pub fn trailing(end: NaiveDateTime, length: Duration) -> Option<Self> {
        Some(Window {
            start: end.checked_sub_signed(length)?,
            end,
        })
    }

    /// Grown by `margin` on both sides, saturating at the calendar limits.
    pub fn expanded(&self, margin: Duration) -> Self {
        Window {
            start: self
                .start
                .checked_sub_signed(margin)
                .unwrap_or(NaiveDateTime::MIN),
            end: self.end.checked_add_signed(margin).unwrap_or(NaiveDateTime::MAX),
        }
    }

    /// Whether `[start, finish)` overlaps this window.
    pub fn intersects(&self, start: NaiveDateTime, finish: NaiveDateTime) -> bool {
        start < self.end && finish > self.start
    }
}

/// Jobs that could be visible in `[window_start, window_end)`.
///
/// The window is widened by the longest execution time in `table` before the
/// overlap test, so bars are never cut at the edge of the visible range.
pub fn select_window(
    table: &JobTable,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> JobTable {
    let max_duration = table.max_execution_time();
    let expanded = Window::new(window_start, window_end).expanded(max_duration);

    let jobs: Vec<_> = table
        .iter()
        .filter(|j| expanded.intersects(j.starting_time, j.finish_time))
        .cloned()
        .collect();
    debug!(
        total = table.len(),
        selected = jobs.len(),
        max_duration_secs = max_duration.num_seconds(),
        start = %expanded.start,
        end = %expanded.end,
        "window selected"
    );
    JobTable::new(jobs)
}

/// Latest instant the export speaks for: the finish time of its last record,
/// or that record's start when the finish is still `sentinel`.
///
/// `Ok(None)` for an empty export or an unreadable last record.
pub fn reference_end(
    raw: &RawTable,
    mapping: &SchemaMapping,
    sentinel: &str,
) -> Result<Option<NaiveDateTime>, SanitizeError> {
    let index = mapping.resolve(&raw.headers)?;
    let Some(last) = raw.rows.last() else {
        return Ok(None);
    };

    let end = index.cell(last, InputField::End);
    let value = if end == sentinel {
        index.cell(last, InputField::Start)
    } else {
        end
    };
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        warn!(value, "last record has no usable end time");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::read_csv;
    use crate::table::{Job, Purpose, ResourceSet};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn job(id: &str, start: i64, finish: i64) -> Job {
        let execution_time = Duration::seconds(finish - start);
        Job {
            job_id: id.into(),
            workload_name: "w0".into(),
            submission_time: at(start),
            requested_number_of_resources: 1,
            requested_time: execution_time,
            success: "COMPLETED".into(),
            starting_time: at(start),
            execution_time,
            finish_time: at(finish),
            waiting_time: Duration::zero(),
            turnaround_time: execution_time,
            stretch: 1.0,
            allocated_resources: ResourceSet::new(),
            purpose: Purpose::Job,
        }
    }

    fn ids(table: &JobTable) -> Vec<&str> {
        table.iter().map(|j| j.job_id.as_str()).collect()
    }

    #[test]
    fn test_window_is_expanded_by_longest_job() {
        let table = JobTable::new(vec![
            job("edge", 95, 105),
            job("early", 60, 70),
            job("inside", 150, 160),
            job("late", 250, 255),
        ]);
        let selected = select_window(&table, at(100), at(200));
        assert_eq!(ids(&selected), vec!["edge", "inside"]);
    }

    #[test]
    fn test_expansion_reaches_jobs_just_outside() {
        let table = JobTable::new(vec![
            job("long", 0, 50),
            job("before", 60, 70),
            job("after", 240, 245),
            job("far", 251, 260),
        ]);
        // longest job is 50s, so the test window becomes [50, 250)
        let selected = select_window(&table, at(100), at(200));
        assert_eq!(ids(&selected), vec!["before", "after"]);
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let w = Window::new(at(10), at(20));
        assert!(!w.intersects(at(0), at(10)));
        assert!(!w.intersects(at(20), at(30)));
        assert!(w.intersects(at(19), at(30)));
    }

    #[test]
    fn test_empty_table_selects_nothing() {
        assert!(select_window(&JobTable::default(), at(0), at(100)).is_empty());
    }

    #[test]
    fn test_trailing_window() {
        let w = Window::trailing(at(7_200), Duration::hours(1));
        assert_eq!(w, Some(Window::new(at(3_600), at(7_200))));
    }

    #[test]
    fn test_trailing_window_out_of_range() {
        let length = Duration::try_hours(3_000_000_000).unwrap();
        assert_eq!(Window::trailing(at(0), length), None);

        let w = Window::new(at(0), at(10)).expanded(length);
        assert_eq!(w.start, NaiveDateTime::MIN);
        assert_eq!(w.end, NaiveDateTime::MAX);
    }

    #[test]
    fn test_reference_end_prefers_last_finish() {
        let text = "JobIDRaw,State,Timelimit,NNodes,Submit,Start,End,NodeList,Reservation
1,COMPLETED,10,1,2023-01-01T00:00:00,2023-01-01T00:00:10,2023-01-01T00:00:20,fg1,
2,RUNNING,10,1,2023-01-01T00:00:00,2023-01-01T00:00:30,Unknown,fg1,
";
        let raw = read_csv(Cursor::new(text)).unwrap();
        let mapping = SchemaMapping::sacct_2022();
        assert_eq!(reference_end(&raw, &mapping, "Unknown").unwrap(), Some(at(30)));

        let mut finished = raw.clone();
        finished.rows.truncate(1);
        assert_eq!(reference_end(&finished, &mapping, "Unknown").unwrap(), Some(at(20)));

        finished.rows.clear();
        assert_eq!(reference_end(&finished, &mapping, "Unknown").unwrap(), None);
    }
}
