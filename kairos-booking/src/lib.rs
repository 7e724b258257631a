pub mod lifecycle;
pub mod models;
pub mod repository;

pub use lifecycle::{CancellationOutcome, CancelledBy, TransitionError};
pub use models::{Booking, BookingHistoryEntry, BookingStatus};
pub use repository::BookingRepository;
