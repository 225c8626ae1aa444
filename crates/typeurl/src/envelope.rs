//! # Envelope
//!
//! The self-describing unit produced by marshaling: a type URL plus the encoded
//! payload, shaped like a protocol-buffer `Any`. The envelope is serde-derived
//! so it can ride whatever transport format the caller already uses.

use std::borrow::Cow;

use serde::Deserialize;
use serde::Serialize;

use crate::codec::PayloadError;
use crate::message::Message;

/// Raised when an envelope is asked to decode itself from bare payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct MissingTypeUrl;

impl std::fmt::Display for MissingTypeUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "an envelope cannot be rebuilt from its payload alone")
    }
}

impl std::error::Error for MissingTypeUrl {}

/// Read access to any `{type_url, value}` container.
///
/// Lets foreign containers (e.g. generated protobuf `Any` types) be unmarshaled
/// without first copying them into an `Envelope`.
pub trait AnyLike {
    fn url(&self) -> &str;
    fn payload(&self) -> &[u8];
}

/// A type URL tagged payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Envelope {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Envelope {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// Copies a foreign container into an envelope.
    pub fn from_any<A: AnyLike + ?Sized>(any: &A) -> Self {
        Self::new(any.url(), any.payload().to_vec())
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.type_url, self.value)
    }
}

impl AnyLike for Envelope {
    fn url(&self) -> &str {
        &self.type_url
    }

    fn payload(&self) -> &[u8] {
        &self.value
    }
}

/// An envelope names the type it carries and its payload is the bytes it
/// already holds, so marshaling an envelope reproduces it.
impl Message for Envelope {
    fn encode_payload(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(self.value.clone())
    }

    fn decode_payload(_bytes: &[u8]) -> Result<Self, PayloadError> {
        Err(PayloadError::decode("envelope", MissingTypeUrl))
    }

    fn type_url(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.type_url.as_str()))
    }
}
