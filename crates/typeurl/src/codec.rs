//! # Payload codecs
//!
//! The byte encoding behind an envelope's `value`. This crate does not define a
//! format of its own: a `PayloadCodec` is a thin adapter over an existing serde
//! format, selected per type when `Message` is implemented.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// The underlying error of a payload codec, shared so `PayloadError` stays `Clone`.
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// Failures reported by a payload codec.
///
/// The codec's own error is kept as the `source`, so callers can downcast to
/// e.g. `serde_json::Error`.
#[derive(Debug, Clone)]
pub enum PayloadError {
    /// The value could not be encoded.
    Encode { codec: &'static str, source: Cause },
    /// The bytes could not be decoded into the target type.
    Decode { codec: &'static str, source: Cause },
}

impl PayloadError {
    pub fn encode(codec: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Encode { codec, source: Arc::new(source) }
    }

    pub fn decode(codec: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode { codec, source: Arc::new(source) }
    }

    pub fn codec(&self) -> &'static str {
        match self {
            Self::Encode { codec, .. } | Self::Decode { codec, .. } => *codec,
        }
    }
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode { codec, source } => write!(f, "{} encode failed: {}", codec, source),
            Self::Decode { codec, source } => write!(f, "{} decode failed: {}", codec, source),
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(&**source),
        }
    }
}

/// Same direction, same codec and same rendered cause.
impl PartialEq for PayloadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Encode { codec: a, source: x }, Self::Encode { codec: b, source: y })
            | (Self::Decode { codec: a, source: x }, Self::Decode { codec: b, source: y }) => {
                a == b && x.to_string() == y.to_string()
            }
            _ => false,
        }
    }
}

impl Eq for PayloadError {}

/// An existing structured encoder/decoder used for envelope payloads.
pub trait PayloadCodec {
    /// Short name used in error reports.
    const NAME: &'static str;

    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PayloadError>;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError>;
}

/// JSON payloads via `serde_json`. The default for `message!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl PayloadCodec for Json {
    const NAME: &'static str = "json";

    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(value).map_err(|e| PayloadError::encode(Self::NAME, e))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError> {
        serde_json::from_slice(bytes).map_err(|e| PayloadError::decode(Self::NAME, e))
    }
}

/// Compact binary payloads via `postcard`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postcard;

impl PayloadCodec for Postcard {
    const NAME: &'static str = "postcard";

    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PayloadError> {
        postcard::to_allocvec(value).map_err(|e| PayloadError::encode(Self::NAME, e))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError> {
        postcard::from_bytes(bytes).map_err(|e| PayloadError::decode(Self::NAME, e))
    }
}
