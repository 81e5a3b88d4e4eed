//! Observability for restkind
//!
//! Structured JSON logging of typed events. Observability never fails a request
//! and never alters execution.
//!
//! ```ignore
//! use restkind::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RequestComplete, &[("method", "GET"), ("status", "200")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
