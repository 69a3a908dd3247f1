//! Scheduler wallclock limits (`Timelimit`).
//!
//! Accepted notations: `M`, `M:S`, `H:M:S`, `D-H`, `D-H:M`, `D-H:M:S`, plus the
//! `UNLIMITED` and `Partition_Limit` keywords. An empty cell means no limit was
//! recorded.

use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wallclock {
    Limited(Duration),
    Unlimited,
    Unset,
}

impl Wallclock {
    pub fn is_zero(&self) -> bool {
        matches!(self, Wallclock::Limited(d) if *d == Duration::zero())
    }
}

pub fn parse_wallclock(raw: &str) -> Option<Wallclock> {
    let v = raw.trim();
    if v.is_empty() {
        return Some(Wallclock::Unset);
    }
    if v.eq_ignore_ascii_case("UNLIMITED") || v.eq_ignore_ascii_case("Partition_Limit") {
        return Some(Wallclock::Unlimited);
    }

    let (days, clock) = match v.split_once('-') {
        Some((d, rest)) => (Some(parse_part(d)?), rest),
        None => (None, v),
    };

    let parts = clock
        .split(':')
        .map(parse_part)
        .collect::<Option<Vec<i64>>>()?;

    let (h, m, s) = match (days.is_some(), parts.as_slice()) {
        (false, [m]) => (0, *m, 0),
        (false, [m, s]) => (0, *m, *s),
        (_, [h, m, s]) => (*h, *m, *s),
        (true, [h]) => (*h, 0, 0),
        (true, [h, m]) => (*h, *m, 0),
        _ => return None,
    };

    let secs = days
        .unwrap_or(0)
        .checked_mul(86_400)?
        .checked_add(h.checked_mul(3_600)?)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)?;
    Duration::try_seconds(secs).map(Wallclock::Limited)
}

fn parse_part(p: &str) -> Option<i64> {
    if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    p.parse().ok()
}

/// Render a duration in the `D-HH:MM:SS` notation (`HH:MM:SS` under one day).
pub fn format_wallclock(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (days, rem) = (total / 86_400, total % 86_400);
    let (h, m, s) = (rem / 3_600, (rem % 3_600) / 60, rem % 60);
    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, h, m, s)
    } else {
        format!("{:02}:{:02}:{:02}", h, m, s)
    }
}
