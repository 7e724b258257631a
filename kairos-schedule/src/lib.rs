pub mod calendar;
pub mod models;
pub mod repository;
pub mod slots;

pub use calendar::EffectiveDay;
pub use models::{
    BookingPolicy, BreakPeriod, DaySchedule, Holiday, HolidayRecurrence, ProviderSchedule,
    ScheduleError, ScheduleException, Service, StaffMember,
};
pub use repository::ScheduleRepository;
pub use slots::{BookingWindow, CandidateSlots};
