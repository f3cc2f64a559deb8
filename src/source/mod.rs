//! Signal sources.
//!
//! The pipeline never touches a container format directly. It asks a
//! [`SignalSource`] for a [`Session`] by identifier and treats any failure as
//! a reason to skip that session.

pub mod json;

use crate::core::session::{Session, SessionError};
use std::fmt;

pub use json::{discover_sessions, JsonSessionSource, SessionFile};

/// Loads recorded sessions by identifier.
pub trait SignalSource {
    fn load(&self, session_id: &str) -> Result<Session, SourceError>;
}

/// Errors that can occur while loading a session.
#[derive(Debug)]
pub enum SourceError {
    NotFound(String),
    IoError(String),
    ParseError(String),
    Invalid(SessionError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(path) => write!(f, "Session data not found: {path}"),
            SourceError::IoError(e) => write!(f, "IO error: {e}"),
            SourceError::ParseError(e) => write!(f, "Parse error: {e}"),
            SourceError::Invalid(e) => write!(f, "Invalid session: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<SessionError> for SourceError {
    fn from(e: SessionError) -> Self {
        SourceError::Invalid(e)
    }
}
