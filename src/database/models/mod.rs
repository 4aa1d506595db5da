pub mod contract;
pub mod document;
pub mod events;
pub mod location;
pub(crate) mod macros;
pub mod outbox;
pub mod schedule;
pub mod shift;
pub mod shift_template;
pub mod time;

// Re-export all models for easy importing
pub use contract::*;
pub use document::*;
pub use events::*;
pub use location::*;
pub use outbox::*;
pub use schedule::*;
pub use shift::*;
pub use shift_template::*;
pub use time::*;
