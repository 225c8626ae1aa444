//! # Typeurl
//!
//! A type registry and a polymorphic envelope codec. Values of registered
//! concrete types are marshaled into a self-describing `Envelope`
//! (`{type_url, value}`, shaped like a protocol-buffer `Any`) and later decoded
//! back into a freshly typed value.
//!
//! ## Philosophy
//!
//! - **Typed dispatch only**: payload bytes come from existing serde formats.
//!   This crate adds the type URL, never a format of its own.
//! - **Explicit registries**: a `Registry` is an ordinary value you can build,
//!   share and inject. The process-wide default behind the free functions is a
//!   convenience, not a requirement.
//! - **Conflicts are fatal**: binding one type to two URLs (or one URL to two
//!   types) is a programming error. `register` panics, `try_register` reports.
//!
//! ## Example
//!
//! ```ignore
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Test { name: String, age: i64 }
//! typeurl::message!(Test);
//!
//! typeurl::register::<Test>(&["test"]);
//! let envelope = typeurl::marshal_any(Arc::new(Test { name: "koye".into(), age: 6 }))?;
//! let value = typeurl::unmarshal_any(&*envelope)?;
//! assert!(typeurl::is(&*envelope, &Test::default()));
//! ```

use std::sync::Arc;
use std::sync::LazyLock;

pub mod codec;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod message;
pub mod registry;

mod marshal;

#[cfg(test)]
mod tests;

pub use codec::Json;
pub use codec::PayloadCodec;
pub use codec::PayloadError;
pub use codec::Postcard;
pub use envelope::AnyLike;
pub use envelope::Envelope;
pub use error::Error;
pub use error::RegistrationConflict;
pub use error::Result;
pub use identity::TypeIdentity;
pub use identity::join_names;
pub use message::Message;
pub use registry::Registry;

// ============================================================================
//  DEFAULT REGISTRY
// ============================================================================

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide default registry used by the free functions below.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Registers `T` in the default registry. Panics on a conflict.
pub fn register<T: Message>(names: &[&str]) {
    GLOBAL.register::<T>(names)
}

/// Registers the type of `sample` in the default registry. Panics on a conflict.
pub fn register_value<T: Message>(sample: &T, names: &[&str]) {
    GLOBAL.register_value(sample, names)
}

pub fn try_register<T: Message>(names: &[&str]) -> std::result::Result<(), RegistrationConflict> {
    GLOBAL.try_register::<T>(names)
}

pub fn type_url_of(value: &dyn Message) -> Result<String> {
    GLOBAL.type_url_of(value)
}

pub fn marshal(value: &dyn Message) -> Result<Envelope> {
    GLOBAL.marshal(value)
}

pub fn marshal_any(value: Arc<dyn Message>) -> Result<Arc<Envelope>> {
    GLOBAL.marshal_any(value)
}

pub fn unmarshal_any<A: AnyLike + ?Sized>(envelope: &A) -> Result<Box<dyn Message>> {
    GLOBAL.unmarshal_any(envelope)
}

pub fn unmarshal_by_type_url(type_url: &str, value: &[u8]) -> Result<Box<dyn Message>> {
    GLOBAL.unmarshal_by_type_url(type_url, value)
}

pub fn unmarshal_to<T: Message, A: AnyLike + ?Sized>(envelope: &A) -> Result<T> {
    GLOBAL.unmarshal_to::<T, A>(envelope)
}

pub fn is<A: AnyLike + ?Sized>(envelope: &A, sample: &dyn Message) -> bool {
    GLOBAL.is(envelope, sample)
}
