//! # Error Definitions
//!
//! Two categories:
//!
//! - `RegistrationConflict`: a programming-time conflict between registrations.
//!   Callers treat it as fatal; `Registry::register` panics with it.
//! - `Error`: recoverable failures of marshal and unmarshal, expected at
//!   integration boundaries (e.g. an envelope from a peer with different
//!   registrations).

use crate::codec::PayloadError;

/// Conflicting registrations. Not recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationConflict {
    /// The type is already bound to a different URL.
    UrlMismatch {
        type_name: &'static str,
        existing: String,
        attempted: String,
    },
    /// The URL is already bound to a different type.
    UrlTaken {
        url: String,
        existing: &'static str,
        attempted: &'static str,
    },
    /// No usable name segments were supplied.
    EmptyName { type_name: &'static str },
}

impl std::fmt::Display for RegistrationConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UrlMismatch { type_name, existing, attempted } => write!(
                f,
                "type {} already registered as {:?}, cannot register it as {:?}",
                type_name, existing, attempted
            ),
            Self::UrlTaken { url, existing, attempted } => write!(
                f,
                "url {:?} already registered to type {}, cannot register it to {}",
                url, existing, attempted
            ),
            Self::EmptyName { type_name } => write!(f, "type {} registered with an empty name", type_name),
        }
    }
}

impl std::error::Error for RegistrationConflict {}

/// Recoverable marshal and unmarshal failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The value's type is not registered and the value does not name itself.
    UnregisteredType { type_name: &'static str },
    /// No type is registered under the URL.
    NotFound(String),
    /// The payload codec failed for a value of the given URL.
    Payload { type_url: String, source: PayloadError },
    /// The envelope holds a different type than the one requested.
    TypeMismatch { expected: String, found: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnregisteredType { type_name } => write!(f, "type not registered: {}", type_name),
            Self::NotFound(url) => write!(f, "type url not found: {}", url),
            Self::Payload { type_url, source } => write!(f, "payload error for {}: {}", type_url, source),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
