use crate::models::{BreakPeriod, ProviderSchedule};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

/// Fully resolved open/closed state for one calendar date, after layering
/// the weekly schedule, holidays and date-specific exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveDay {
    pub is_open: bool,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub breaks: Vec<BreakPeriod>,
    pub closure_reason: Option<String>,
}

impl EffectiveDay {
    pub fn closed(reason: Option<String>) -> Self {
        Self {
            is_open: false,
            open_time: None,
            close_time: None,
            breaks: Vec::new(),
            closure_reason: reason,
        }
    }

    pub fn open(open_time: NaiveTime, close_time: NaiveTime, breaks: Vec<BreakPeriod>) -> Self {
        Self {
            is_open: true,
            open_time: Some(open_time),
            close_time: Some(close_time),
            breaks,
            closure_reason: None,
        }
    }
}

impl ProviderSchedule {
    /// Resolve the effective day for `date`.
    ///
    /// Precedence is Exception > Holiday > weekly schedule, with no partial
    /// merge between layers: an exception replaces the result outright, a
    /// matching holiday closes the day regardless of weekly hours, and a
    /// weekday with no weekly entry is closed.
    pub fn resolve(&self, date: NaiveDate) -> EffectiveDay {
        if let Some(ex) = self.exceptions.iter().find(|e| e.date == date) {
            // Defensive: a half-set exception should have been rejected at
            // write time; the read path treats it as a closure.
            return match (ex.open_time, ex.close_time) {
                (Some(open), Some(close)) => EffectiveDay::open(open, close, ex.breaks.clone()),
                _ => EffectiveDay::closed(Some(ex.reason.clone())),
            };
        }

        if let Some(holiday) = self.holidays.iter().find(|h| h.matches(date)) {
            return EffectiveDay::closed(Some(format!("Holiday: {}", holiday.reason)));
        }

        let dow = date.weekday().num_days_from_sunday() as u8;
        match self.weekly.iter().find(|d| d.day_of_week == dow) {
            Some(day) if day.is_open => match (day.open_time, day.close_time) {
                (Some(open), Some(close)) => EffectiveDay::open(open, close, day.breaks.clone()),
                _ => EffectiveDay::closed(None),
            },
            _ => EffectiveDay::closed(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySchedule, Holiday, HolidayRecurrence, ScheduleException};
    use uuid::Uuid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn weekday_schedule() -> ProviderSchedule {
        let mut schedule = ProviderSchedule::new(Uuid::new_v4());
        for dow in 1..=5 {
            schedule.weekly.push(DaySchedule {
                day_of_week: dow,
                is_open: true,
                open_time: Some(t(9, 0)),
                close_time: Some(t(17, 0)),
                breaks: vec![BreakPeriod { start: t(12, 0), end: t(13, 0), label: Some("Lunch".into()) }],
            });
        }
        schedule
    }

    #[test]
    fn test_weekly_day_resolves_open() {
        let schedule = weekday_schedule();
        // 2026-03-02 is a Monday
        let day = schedule.resolve(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        assert!(day.is_open);
        assert_eq!(day.open_time, Some(t(9, 0)));
        assert_eq!(day.close_time, Some(t(17, 0)));
        assert_eq!(day.breaks.len(), 1);
    }

    #[test]
    fn test_missing_weekday_is_closed() {
        let schedule = weekday_schedule();
        // Sunday has no weekly entry
        let day = schedule.resolve(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        assert!(!day.is_open);
        assert_eq!(day.closure_reason, None);
    }

    #[test]
    fn test_holiday_closes_with_reason() {
        let mut schedule = weekday_schedule();
        schedule.holidays.push(Holiday {
            date: NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
            recurrence: HolidayRecurrence::Yearly,
            reason: "Christmas".to_string(),
        });

        // 2026-12-25 is a Friday, normally open
        let day = schedule.resolve(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());
        assert!(!day.is_open);
        assert_eq!(day.closure_reason.as_deref(), Some("Holiday: Christmas"));
    }

    #[test]
    fn test_exception_overrides_holiday_and_weekly() {
        let mut schedule = weekday_schedule();
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        schedule.holidays.push(Holiday {
            date,
            recurrence: HolidayRecurrence::None,
            reason: "Christmas".to_string(),
        });
        schedule.exceptions.push(ScheduleException {
            date,
            open_time: Some(t(10, 0)),
            close_time: Some(t(14, 0)),
            breaks: vec![],
            reason: "Open for emergencies".to_string(),
        });

        // Precedence: the exception's hours win outright, and the weekly
        // break list does not leak through.
        let day = schedule.resolve(date);
        assert!(day.is_open);
        assert_eq!(day.open_time, Some(t(10, 0)));
        assert_eq!(day.close_time, Some(t(14, 0)));
        assert!(day.breaks.is_empty());
        assert_eq!(day.closure_reason, None);
    }

    #[test]
    fn test_closure_exception_overrides_open_day() {
        let mut schedule = weekday_schedule();
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        schedule.exceptions.push(ScheduleException {
            date,
            open_time: None,
            close_time: None,
            breaks: vec![],
            reason: "Deep clean".to_string(),
        });

        let day = schedule.resolve(date);
        assert!(!day.is_open);
        assert_eq!(day.closure_reason.as_deref(), Some("Deep clean"));
    }

    #[test]
    fn test_exception_break_list_is_kept() {
        let mut schedule = weekday_schedule();
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        schedule.exceptions.push(ScheduleException {
            date,
            open_time: Some(t(8, 0)),
            close_time: Some(t(12, 0)),
            breaks: vec![BreakPeriod { start: t(10, 0), end: t(10, 30), label: None }],
            reason: "Half day".to_string(),
        });

        let day = schedule.resolve(date);
        assert_eq!(day.breaks.len(), 1);
        assert_eq!(day.breaks[0].start, t(10, 0));
    }
}
