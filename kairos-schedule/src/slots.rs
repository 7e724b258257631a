use crate::calendar::EffectiveDay;
use crate::models::BookingPolicy;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use kairos_shared::TimeRange;

/// Advance-booking limits applied while generating candidates.
#[derive(Debug, Clone, Copy)]
pub struct BookingWindow {
    pub min_advance_hours: u32,
    pub max_advance_days: u32,
}

impl From<&BookingPolicy> for BookingWindow {
    fn from(policy: &BookingPolicy) -> Self {
        Self {
            min_advance_hours: policy.min_advance_hours,
            max_advance_days: policy.max_advance_days,
        }
    }
}

/// Lazy, finite walk over candidate start times for one resolved day.
///
/// Candidates advance in `granularity_minutes` steps from the open time while
/// the full service interval still fits before close. A candidate touching
/// any part of a break is dropped outright, not shortened. Candidates before
/// `now + min_advance_hours` are dropped, and a date past the max-advance
/// horizon yields nothing at all.
pub struct CandidateSlots {
    cursor: Option<NaiveDateTime>,
    close_at: NaiveDateTime,
    breaks: Vec<TimeRange>,
    duration: Duration,
    step: Duration,
    earliest: NaiveDateTime,
}

impl CandidateSlots {
    pub fn new(
        day: &EffectiveDay,
        date: NaiveDate,
        duration_minutes: u32,
        granularity_minutes: u32,
        window: BookingWindow,
        now: NaiveDateTime,
    ) -> Self {
        let empty = Self {
            cursor: None,
            close_at: now,
            breaks: Vec::new(),
            duration: Duration::zero(),
            step: Duration::zero(),
            earliest: now,
        };

        if granularity_minutes == 0 || duration_minutes == 0 {
            return empty;
        }
        let (open, close) = match (day.is_open, day.open_time, day.close_time) {
            (true, Some(open), Some(close)) => (open, close),
            _ => return empty,
        };
        let horizon = now.date() + Duration::days(i64::from(window.max_advance_days));
        if date > horizon {
            return empty;
        }

        let breaks = day
            .breaks
            .iter()
            .map(|b| TimeRange::new(date.and_time(b.start), date.and_time(b.end)))
            .collect();

        Self {
            cursor: Some(date.and_time(open)),
            close_at: date.and_time(close),
            breaks,
            duration: Duration::minutes(i64::from(duration_minutes)),
            step: Duration::minutes(i64::from(granularity_minutes)),
            earliest: now + Duration::hours(i64::from(window.min_advance_hours)),
        }
    }
}

impl Iterator for CandidateSlots {
    type Item = TimeRange;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.cursor?;
            if start + self.duration > self.close_at {
                self.cursor = None;
                return None;
            }
            self.cursor = Some(start + self.step);

            if start < self.earliest {
                continue;
            }
            let candidate = TimeRange::new(start, start + self.duration);
            if self.breaks.iter().any(|b| candidate.overlaps(b)) {
                continue;
            }
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BreakPeriod;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn early_now() -> NaiveDateTime {
        // Well before the working day, with no advance constraints in play
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn wide_window() -> BookingWindow {
        BookingWindow { min_advance_hours: 0, max_advance_days: 365 }
    }

    fn standard_day(breaks: Vec<BreakPeriod>) -> EffectiveDay {
        EffectiveDay::open(t(9, 0), t(17, 0), breaks)
    }

    #[test]
    fn test_grid_respects_close_time() {
        let day = standard_day(vec![]);
        let starts: Vec<NaiveTime> =
            CandidateSlots::new(&day, monday(), 60, 30, wide_window(), early_now())
                .map(|r| r.start.time())
                .collect();

        // 09:00 through 16:00 in 30-minute steps; 16:30 would end at 17:30
        assert_eq!(starts.first(), Some(&t(9, 0)));
        assert_eq!(starts.last(), Some(&t(16, 0)));
        assert_eq!(starts.len(), 15);
        assert!(!starts.contains(&t(16, 30)));
    }

    #[test]
    fn test_slots_never_cross_close() {
        let day = standard_day(vec![]);
        for slot in CandidateSlots::new(&day, monday(), 45, 15, wide_window(), early_now()) {
            assert!(slot.end <= monday().and_time(t(17, 0)));
        }
    }

    #[test]
    fn test_break_overlap_drops_candidate() {
        let day = standard_day(vec![BreakPeriod { start: t(12, 0), end: t(13, 0), label: None }]);
        let starts: Vec<NaiveTime> =
            CandidateSlots::new(&day, monday(), 60, 30, wide_window(), early_now())
                .map(|r| r.start.time())
                .collect();

        // Anything whose hour touches 12:00-13:00 is gone: 11:30 (ends
        // 12:30), 12:00, 12:30. 11:00 ends exactly at the break start and
        // 13:00 starts exactly at its end, so both survive.
        assert!(starts.contains(&t(11, 0)));
        assert!(!starts.contains(&t(11, 30)));
        assert!(!starts.contains(&t(12, 0)));
        assert!(!starts.contains(&t(12, 30)));
        assert!(starts.contains(&t(13, 0)));
    }

    #[test]
    fn test_closed_day_yields_nothing() {
        let day = EffectiveDay::closed(Some("Holiday: Christmas".to_string()));
        let mut slots = CandidateSlots::new(&day, monday(), 60, 30, wide_window(), early_now());
        assert!(slots.next().is_none());
    }

    #[test]
    fn test_min_advance_drops_near_candidates() {
        let day = standard_day(vec![]);
        // Querying mid-morning of the same day with a 2h minimum lead
        let now = monday().and_hms_opt(10, 15, 0).unwrap();
        let window = BookingWindow { min_advance_hours: 2, max_advance_days: 365 };
        let starts: Vec<NaiveTime> = CandidateSlots::new(&day, monday(), 60, 30, window, now)
            .map(|r| r.start.time())
            .collect();

        // Earliest bookable start is 12:15, so the grid resumes at 12:30
        assert_eq!(starts.first(), Some(&t(12, 30)));
    }

    #[test]
    fn test_max_advance_horizon_empties_far_dates() {
        let day = standard_day(vec![]);
        let window = BookingWindow { min_advance_hours: 0, max_advance_days: 7 };
        let far = monday() + Duration::days(30);
        let mut slots = CandidateSlots::new(&day, far, 60, 30, window, early_now());
        assert!(slots.next().is_none());
    }

    #[test]
    fn test_service_longer_than_day_yields_nothing() {
        let day = EffectiveDay::open(t(9, 0), t(10, 0), vec![]);
        let mut slots = CandidateSlots::new(&day, monday(), 90, 30, wide_window(), early_now());
        assert!(slots.next().is_none());
    }
}
