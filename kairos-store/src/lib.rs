pub mod app_config;
pub mod events;
pub mod memory;

pub use events::TracingPublisher;
pub use memory::{InMemoryBookingRepository, InMemoryScheduleRepository};
