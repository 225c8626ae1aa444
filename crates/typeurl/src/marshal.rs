//! # Envelope Codec
//!
//! Marshal, unmarshal and type checks on top of a `Registry`.
//!
//! ## Invariants
//!
//! - **Round trip**: for a registered `T`, `unmarshal_any(marshal_any(v))` is a
//!   fresh `T` equal to `v`.
//! - **Idempotent marshal**: marshaling an envelope returns that same envelope.
//!   `marshal_any` hands back the very same `Arc`, with no re-encode and no copy.
//! - **Resolution order**: a value's own type URL, then the registry.

use std::sync::Arc;

use tracing::debug;
use tracing::trace;

use crate::envelope::AnyLike;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::error::Result;
use crate::message::AsAny;
use crate::message::Message;
use crate::registry::Registry;

impl Registry {
    /// Returns the type URL `value` marshals to.
    ///
    /// # Errors
    /// `Error::UnregisteredType` if the value neither names itself nor has a
    /// registered type.
    pub fn type_url_of(&self, value: &dyn Message) -> Result<String> {
        if let Some(url) = value.type_url() {
            return Ok(url.into_owned());
        }
        let identity = value.type_identity();
        self.resolve(identity).ok_or(Error::UnregisteredType { type_name: identity.name() })
    }

    /// Marshals `value` into a new envelope.
    pub fn marshal(&self, value: &dyn Message) -> Result<Envelope> {
        let type_url = self.type_url_of(value)?;
        let bytes = value.encode_payload().map_err(|source| Error::Payload {
            type_url: type_url.clone(),
            source,
        })?;
        trace!(%type_url, len = bytes.len(), "marshaled value");
        Ok(Envelope::new(type_url, bytes))
    }

    /// Marshals `value` into a shared envelope.
    ///
    /// If `value` already is an envelope, the same `Arc` is returned. Only a
    /// directly held `Envelope` counts: an envelope wrapped again, as
    /// `Arc<Arc<Envelope>>` or `Arc<Box<Envelope>>`, marshals through the
    /// pointer's `Message` impl into a new, equal envelope.
    pub fn marshal_any(&self, value: Arc<dyn Message>) -> Result<Arc<Envelope>> {
        if let Ok(envelope) = AsAny::into_any_arc(Arc::clone(&value)).downcast::<Envelope>() {
            return Ok(envelope);
        }
        self.marshal(&*value).map(Arc::new)
    }

    /// Decodes the value carried by `envelope` into a fresh instance of its
    /// registered type.
    ///
    /// # Errors
    /// - `Error::NotFound` if no type is registered under the envelope's URL.
    /// - `Error::Payload` if decoding fails; the codec error is the source.
    pub fn unmarshal_any<A: AnyLike + ?Sized>(&self, envelope: &A) -> Result<Box<dyn Message>> {
        self.unmarshal_by_type_url(envelope.url(), envelope.payload())
    }

    /// Like `unmarshal_any`, for a URL and payload held separately.
    pub fn unmarshal_by_type_url(&self, type_url: &str, value: &[u8]) -> Result<Box<dyn Message>> {
        let Some(decode) = self.decoder(type_url) else {
            debug!(%type_url, "no type registered for url");
            return Err(Error::NotFound(type_url.to_string()));
        };
        decode(value).map_err(|source| Error::Payload {
            type_url: type_url.to_string(),
            source,
        })
    }

    /// Decodes `envelope` straight into a `T`.
    ///
    /// # Errors
    /// `Error::TypeMismatch` if the envelope's URL is not the one `T` marshals to.
    pub fn unmarshal_to<T: Message, A: AnyLike + ?Sized>(&self, envelope: &A) -> Result<T> {
        let found = envelope.url();
        if let Some(owner) = self.resolve_name(found) {
            if owner != T::identity() {
                return Err(Error::TypeMismatch {
                    expected: self.resolve(T::identity()).unwrap_or_else(|| T::identity().name().to_string()),
                    found: found.to_string(),
                });
            }
        }

        let value = T::decode_payload(envelope.payload()).map_err(|source| Error::Payload {
            type_url: found.to_string(),
            source,
        })?;

        let expected = self.type_url_of(&value)?;
        if expected != found {
            return Err(Error::TypeMismatch {
                expected,
                found: found.to_string(),
            });
        }
        Ok(value)
    }

    /// Returns true if `envelope` carries the type `sample` would marshal to.
    ///
    /// Never fails: an unregistered sample is simply not a match.
    pub fn is<A: AnyLike + ?Sized>(&self, envelope: &A, sample: &dyn Message) -> bool {
        match self.type_url_of(sample) {
            Ok(url) => url == envelope.url(),
            Err(_) => false,
        }
    }
}
