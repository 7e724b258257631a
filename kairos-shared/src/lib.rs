pub mod events;
pub mod time;

pub use events::DomainEvent;
pub use time::TimeRange;
