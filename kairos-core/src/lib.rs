pub mod error;
pub mod events;
pub mod version;

pub use error::EngineError;
pub use events::{CollectingPublisher, EventPublisher};
pub use version::Versioned;
