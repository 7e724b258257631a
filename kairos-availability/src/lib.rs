pub mod arbiter;
pub mod engine;
pub mod models;
pub mod projection;

pub use arbiter::SlotHoldArbiter;
pub use engine::SchedulingEngine;
pub use models::{DateAvailability, HoldError, HoldRejection, HoldState, Slot, SlotCheck, SlotHold};
pub use projection::AvailabilityProjector;
