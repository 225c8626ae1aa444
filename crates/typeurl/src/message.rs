//! # Messages
//!
//! `Message` is what the envelope codec marshals: a value that can encode its
//! payload, decode a fresh instance of its type, and optionally report its own
//! type URL.
//!
//! ## Invariants
//!
//! - **One layer of indirection**: `Box<T>` and `Arc<T>` report `T`'s identity,
//!   URL and payload, and decode to a plain `T`. Registering either registers `T`.
//! - **Self-naming wins**: when `type_url` returns `Some`, the registry is not
//!   consulted for that value.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use crate::codec::PayloadError;
use crate::identity::TypeIdentity;

/// Type erasure helpers, implemented for every `Send + Sync + 'static` type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A value that can be carried in an envelope.
///
/// Usually implemented through the `message!` macro for serde types.
pub trait Message: AsAny + std::fmt::Debug {
    /// Encodes the payload bytes of this value.
    fn encode_payload(&self) -> Result<Vec<u8>, PayloadError>;

    /// Decodes a new value of this type from payload bytes.
    fn decode_payload(bytes: &[u8]) -> Result<Self, PayloadError>
    where
        Self: Sized;

    /// The self-naming capability. Types that know their own wire name return
    /// it here and bypass the registry.
    fn type_url(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// The registry key for this value.
    fn type_identity(&self) -> TypeIdentity {
        TypeIdentity::of::<Self>()
    }

    /// The registry key for this type.
    fn identity() -> TypeIdentity
    where
        Self: Sized,
    {
        TypeIdentity::of::<Self>()
    }

    /// Decodes a new value of this type, erased.
    fn decode_boxed(bytes: &[u8]) -> Result<Box<dyn Message>, PayloadError>
    where
        Self: Sized,
    {
        Ok(Box::new(Self::decode_payload(bytes)?))
    }
}

impl dyn Message {
    /// Returns true if the erased value is a `T`.
    pub fn is<T: Message>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    /// Takes ownership of the erased value as a `T`.
    pub fn downcast<T: Message>(self: Box<Self>) -> Option<Box<T>> {
        AsAny::into_any(self).downcast::<T>().ok()
    }
}

impl<T: Message> Message for Box<T> {
    fn encode_payload(&self) -> Result<Vec<u8>, PayloadError> {
        (**self).encode_payload()
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, PayloadError> {
        T::decode_payload(bytes).map(Box::new)
    }

    fn type_url(&self) -> Option<Cow<'_, str>> {
        (**self).type_url()
    }

    fn type_identity(&self) -> TypeIdentity {
        (**self).type_identity()
    }

    fn identity() -> TypeIdentity {
        T::identity()
    }

    fn decode_boxed(bytes: &[u8]) -> Result<Box<dyn Message>, PayloadError> {
        T::decode_boxed(bytes)
    }
}

impl<T: Message> Message for Arc<T> {
    fn encode_payload(&self) -> Result<Vec<u8>, PayloadError> {
        (**self).encode_payload()
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, PayloadError> {
        T::decode_payload(bytes).map(Arc::new)
    }

    fn type_url(&self) -> Option<Cow<'_, str>> {
        (**self).type_url()
    }

    fn type_identity(&self) -> TypeIdentity {
        (**self).type_identity()
    }

    fn identity() -> TypeIdentity {
        T::identity()
    }

    fn decode_boxed(bytes: &[u8]) -> Result<Box<dyn Message>, PayloadError> {
        T::decode_boxed(bytes)
    }
}

/// Implements `Message` for a serde type.
///
/// ```ignore
/// message!(Test);                          // JSON payload, registry-named
/// message!(Test, Postcard);                // postcard payload, registry-named
/// message!(Ping, Json, "example.com/Ping"); // self-naming
/// ```
#[macro_export]
macro_rules! message {
    ($ty:ty) => {
        $crate::message!($ty, $crate::codec::Json);
    };
    ($ty:ty, $codec:ty) => {
        impl $crate::Message for $ty {
            fn encode_payload(&self) -> ::std::result::Result<::std::vec::Vec<u8>, $crate::PayloadError> {
                <$codec as $crate::PayloadCodec>::encode(self)
            }

            fn decode_payload(bytes: &[u8]) -> ::std::result::Result<Self, $crate::PayloadError> {
                <$codec as $crate::PayloadCodec>::decode(bytes)
            }
        }
    };
    ($ty:ty, $codec:ty, $url:expr) => {
        impl $crate::Message for $ty {
            fn encode_payload(&self) -> ::std::result::Result<::std::vec::Vec<u8>, $crate::PayloadError> {
                <$codec as $crate::PayloadCodec>::encode(self)
            }

            fn decode_payload(bytes: &[u8]) -> ::std::result::Result<Self, $crate::PayloadError> {
                <$codec as $crate::PayloadCodec>::decode(bytes)
            }

            fn type_url(&self) -> ::std::option::Option<::std::borrow::Cow<'_, str>> {
                ::std::option::Option::Some(::std::borrow::Cow::Borrowed($url))
            }
        }
    };
}
