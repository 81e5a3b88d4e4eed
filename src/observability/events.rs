//! Observable events
//!
//! Every log line carries one of these as its `event` field.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Server bound and accepting requests
    ServerStart,
    /// Server stopped accepting requests
    ServerStop,
    /// Configuration file loaded
    ConfigLoaded,

    // Requests
    /// Request answered with a document or list
    RequestComplete,
    /// Request answered with an error envelope
    RequestFailed,

    // Query construction
    /// A filter predicate was added to a list query
    FilterAdded,

    // Document codec
    /// A value could not be represented as a property and was dropped
    PropertyDropped,
    /// A property path collided with a scalar while rebuilding a document
    PathConflict,
    /// A reserved key was stripped from an incoming body
    DisallowedKey,

    // Identity
    /// Credentials were present but could not be turned into an identity
    IdentityRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServerStart => "RESTKIND_SERVER_START",
            Event::ServerStop => "RESTKIND_SERVER_STOP",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RequestComplete => "REQUEST_COMPLETE",
            Event::RequestFailed => "REQUEST_FAILED",
            Event::FilterAdded => "QUERY_FILTER_ADDED",
            Event::PropertyDropped => "PROPERTY_DROPPED",
            Event::PathConflict => "PROPERTY_PATH_CONFLICT",
            Event::DisallowedKey => "DISALLOWED_KEY",
            Event::IdentityRejected => "IDENTITY_REJECTED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::FilterAdded => Severity::Trace,
            Event::ServerStart
            | Event::ServerStop
            | Event::ConfigLoaded
            | Event::RequestComplete => Severity::Info,
            Event::PropertyDropped
            | Event::PathConflict
            | Event::DisallowedKey
            | Event::IdentityRejected => Severity::Warn,
            Event::RequestFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
