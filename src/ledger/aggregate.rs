use super::session::WorkSession;
use crate::utils::time::round_hours;

/// Total worked hours across `sessions`, rounded to two places.
///
/// Uses each session's stored `total_hours` as-is; breaks are not
/// re-examined. Filtering (by employee, by date) is the caller's job.
pub fn total_hours<'a, I>(sessions: I) -> f64
where
    I: IntoIterator<Item = &'a WorkSession>,
{
    let sum: f64 = sessions.into_iter().map(|s| s.total_hours).sum();
    round_hours(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session_with(total_hours: f64) -> WorkSession {
        let mut session =
            WorkSession::open(None, 7, Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(), "HQ")
                .unwrap();
        session.total_hours = total_hours;
        session
    }

    #[test]
    fn empty_input_is_zero() {
        let none: Vec<WorkSession> = Vec::new();
        assert_eq!(total_hours(&none), 0.0);
    }

    #[test]
    fn sums_stored_totals() {
        let sessions = vec![session_with(1.5), session_with(2.25)];
        assert_eq!(total_hours(&sessions), 3.75);
    }

    #[test]
    fn does_not_recompute_from_breaks() {
        // Stored figure wins even though the session has no clock-out.
        let sessions = vec![session_with(4.0)];
        assert_eq!(total_hours(&sessions), 4.0);
    }

    #[test]
    fn open_sessions_contribute_nothing() {
        let open = WorkSession::open(None, 7, Utc::now(), "HQ").unwrap();
        let sessions = vec![open, session_with(3.0)];
        assert_eq!(total_hours(&sessions), 3.0);
    }

    #[test]
    fn rounds_accumulated_float_error() {
        let sessions = vec![session_with(0.1), session_with(0.2)];
        assert_eq!(total_hours(&sessions), 0.3);
    }
}
