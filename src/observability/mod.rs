//! Observability
//!
//! Structured JSON logging of lifecycle events. Logging is read-only: it never
//! changes engine state and a failed write to stderr is ignored.
//!
//! ```ignore
//! use epochkv::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::CheckpointComplete, &[("generation", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Logs `event` at its own severity with extra key/value fields.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
