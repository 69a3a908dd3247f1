use chrono::{Duration, NaiveDateTime};
use tracing::error;

use crate::error::SanitizeError;

/// Timing metrics of one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub execution_time: Duration,
    pub waiting_time: Duration,
    pub turnaround_time: Duration,
    /// Same as `execution_time`: the export's wallclock request is not used.
    pub requested_time: Duration,
    pub stretch: f64,
}

pub fn derive_timings(
    job_id: &str,
    submission: NaiveDateTime,
    start: NaiveDateTime,
    finish: NaiveDateTime,
) -> Result<Timings, SanitizeError> {
    let execution_time = finish - start;
    let waiting_time = start - submission;
    let turnaround_time = finish - submission;
    let requested_time = execution_time;

    if requested_time == Duration::zero() {
        error!(job_id, "requested_time is zero after filtering");
        return Err(SanitizeError::DivisionByZero {
            job_id: job_id.to_string(),
        });
    }
    let stretch = seconds(turnaround_time) / seconds(requested_time);

    Ok(Timings {
        execution_time,
        waiting_time,
        turnaround_time,
        requested_time,
        stretch,
    })
}

fn seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_stretch_example() {
        let t = t0();
        let timings = derive_timings(
            "1",
            t,
            t + Duration::seconds(5),
            t + Duration::seconds(25),
        )
        .unwrap();
        assert_eq!(timings.waiting_time, Duration::seconds(5));
        assert_eq!(timings.execution_time, Duration::seconds(20));
        assert_eq!(timings.turnaround_time, Duration::seconds(25));
        assert_eq!(timings.requested_time, timings.execution_time);
        assert!((timings.stretch - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_no_wait_gives_unit_stretch() {
        let t = t0();
        let timings = derive_timings("2", t, t, t + Duration::hours(3)).unwrap();
        assert_eq!(timings.waiting_time, Duration::zero());
        assert!((timings.stretch - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_requested_time_is_a_fault() {
        let t = t0();
        let err = derive_timings("3", t, t, t).unwrap_err();
        assert_eq!(
            err,
            SanitizeError::DivisionByZero {
                job_id: "3".into()
            }
        );
    }
}
