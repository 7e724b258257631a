use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pause inside a working day (lunch, cleaning, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub label: Option<String>,
}

/// Base weekly working hours for one day of the week.
///
/// `day_of_week` is 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day_of_week: u8,
    pub is_open: bool,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub breaks: Vec<BreakPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolidayRecurrence {
    None,
    Yearly,
    Monthly,
}

/// A closure day, matched against queried dates by pattern rule.
/// Holidays never carry hours, only closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub recurrence: HolidayRecurrence,
    pub reason: String,
}

impl Holiday {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self.recurrence {
            HolidayRecurrence::None => self.date == date,
            HolidayRecurrence::Yearly => {
                self.date.month() == date.month() && self.date.day() == date.day()
            }
            HolidayRecurrence::Monthly => self.date.day() == date.day(),
        }
    }
}

/// Date-specific override with the highest precedence.
///
/// Both times null means fully closed that date; non-null times replace the
/// weekly hours outright, with a fresh break list unless one is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    pub date: NaiveDate,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    #[serde(default)]
    pub breaks: Vec<BreakPeriod>,
    pub reason: String,
}

impl ScheduleException {
    pub fn is_closure(&self) -> bool {
        self.open_time.is_none() && self.close_time.is_none()
    }
}

/// Booking-policy parameters. An immutable copy is taken onto each booking
/// at creation time, so later edits to a service never retroactively change
/// existing bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPolicy {
    pub min_advance_hours: u32,
    pub max_advance_days: u32,
    pub cancellation_window_hours: u32,
    pub cancellation_fee_percent: f64,
    pub allow_rescheduling: bool,
    pub reschedule_window_hours: u32,
    pub deposit_required: bool,
    pub deposit_percent: f64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_advance_hours: 0,
            max_advance_days: 90,
            cancellation_window_hours: 24,
            cancellation_fee_percent: 0.0,
            allow_rescheduling: true,
            reschedule_window_hours: 24,
            deposit_required: false,
            deposit_percent: 0.0,
        }
    }
}

/// A bookable service offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub policy: BookingPolicy,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Flat, provider-keyed schedule record: weekly hours plus the holiday and
/// exception layers the calendar resolver works from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSchedule {
    pub provider_id: Uuid,
    pub weekly: Vec<DaySchedule>,
    pub holidays: Vec<Holiday>,
    pub exceptions: Vec<ScheduleException>,
}

impl ProviderSchedule {
    pub fn new(provider_id: Uuid) -> Self {
        Self {
            provider_id,
            weekly: Vec::new(),
            holidays: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// Reject inconsistent schedule data before it is stored. The read path
    /// (calendar resolution) assumes these invariants hold.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for day in &self.weekly {
            if day.day_of_week > 6 {
                return Err(ScheduleError::BadWeekday(day.day_of_week));
            }
            if !day.is_open {
                continue;
            }
            let (open, close) = match (day.open_time, day.close_time) {
                (Some(o), Some(c)) => (o, c),
                _ => return Err(ScheduleError::MissingHours { day: day.day_of_week }),
            };
            if open >= close {
                return Err(ScheduleError::InvalidHours { day: day.day_of_week });
            }
            validate_breaks(&day.breaks, open, close, day.day_of_week)?;
        }

        for ex in &self.exceptions {
            match (ex.open_time, ex.close_time) {
                (None, None) => {}
                (Some(open), Some(close)) => {
                    if open >= close {
                        return Err(ScheduleError::InvalidExceptionHours { date: ex.date });
                    }
                    validate_breaks(&ex.breaks, open, close, ex.date.weekday().num_days_from_sunday() as u8)?;
                }
                _ => return Err(ScheduleError::HalfOpenException { date: ex.date }),
            }
        }

        Ok(())
    }
}

fn validate_breaks(
    breaks: &[BreakPeriod],
    open: NaiveTime,
    close: NaiveTime,
    day: u8,
) -> Result<(), ScheduleError> {
    let mut previous_end: Option<NaiveTime> = None;
    for b in breaks {
        if b.start >= b.end {
            return Err(ScheduleError::InvalidBreak { day });
        }
        if b.start < open || b.end > close {
            return Err(ScheduleError::BreakOutsideHours { day });
        }
        if let Some(prev) = previous_end {
            if b.start < prev {
                return Err(ScheduleError::OverlappingBreaks { day });
            }
        }
        previous_end = Some(b.end);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("day of week {0} out of range")]
    BadWeekday(u8),

    #[error("open day {day} is missing open or close time")]
    MissingHours { day: u8 },

    #[error("open time must precede close time on day {day}")]
    InvalidHours { day: u8 },

    #[error("break with zero or negative length on day {day}")]
    InvalidBreak { day: u8 },

    #[error("break falls outside open hours on day {day}")]
    BreakOutsideHours { day: u8 },

    #[error("breaks overlap or are unsorted on day {day}")]
    OverlappingBreaks { day: u8 },

    #[error("exception for {date} sets only one of open/close")]
    HalfOpenException { date: NaiveDate },

    #[error("exception for {date} has open time after close time")]
    InvalidExceptionHours { date: NaiveDate },
}

impl From<ScheduleError> for kairos_core::EngineError {
    fn from(err: ScheduleError) -> Self {
        kairos_core::EngineError::Inconsistency(err.to_string())
    }
}
