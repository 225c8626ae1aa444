//! # Type Registry
//!
//! Binds concrete types to type URLs and back. Populated once at startup by
//! explicit registration calls, then read by every marshal and unmarshal.
//!
//! ## Invariants
//!
//! - **Injective both ways**: a type maps to exactly one URL and a URL to
//!   exactly one type. Any registration that would break either direction is a
//!   `RegistrationConflict` and leaves the registry unchanged.
//! - **Idempotent**: registering a type again under the same URL is a no-op.
//! - **Lock order**: writers lock the type map entry before the URL map entry;
//!   readers never hold both at once.
//!
//! Uses DashMap so that lookups after startup only take shard read locks.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::codec::PayloadError;
use crate::error::RegistrationConflict;
use crate::identity::TypeIdentity;
use crate::identity::join_names;
use crate::message::Message;

/// Builds a fresh, type-erased value of a registered type from payload bytes.
pub(crate) type DecodeFn = fn(&[u8]) -> Result<Box<dyn Message>, PayloadError>;

struct Registration {
    url: String,
    decode: DecodeFn,
}

/// Maps concrete types to type URLs and back.
pub struct Registry {
    types: DashMap<TypeIdentity, Registration>,
    urls: DashMap<String, TypeIdentity>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
            urls: DashMap::new(),
        }
    }

    /// Registers `T` under the URL formed by joining `names`.
    ///
    /// # Panics
    /// On a `RegistrationConflict`. Conflicting registrations are programming
    /// errors; use `try_register` to observe them instead.
    pub fn register<T: Message>(&self, names: &[&str]) {
        if let Err(conflict) = self.try_register::<T>(names) {
            panic!("typeurl: {}", conflict);
        }
    }

    /// Registers the type of `sample` under the URL formed by joining `names`.
    ///
    /// `Box<T>` and `Arc<T>` samples register `T`.
    pub fn register_value<T: Message>(&self, _sample: &T, names: &[&str]) {
        self.register::<T>(names);
    }

    /// Registers `T`, reporting conflicts instead of panicking.
    pub fn try_register<T: Message>(&self, names: &[&str]) -> Result<(), RegistrationConflict> {
        self.insert(T::identity(), join_names(names), T::decode_boxed)
    }

    fn insert(&self, identity: TypeIdentity, url: String, decode: DecodeFn) -> Result<(), RegistrationConflict> {
        if url.is_empty() {
            warn!(type_name = identity.name(), "rejected registration with an empty name");
            return Err(RegistrationConflict::EmptyName { type_name: identity.name() });
        }

        let slot = match self.types.entry(identity) {
            Entry::Occupied(existing) => {
                let existing = &existing.get().url;
                if *existing == url {
                    trace!(type_name = identity.name(), %url, "type already registered");
                    return Ok(());
                }
                warn!(type_name = identity.name(), %existing, attempted = %url, "conflicting registration");
                return Err(RegistrationConflict::UrlMismatch {
                    type_name: identity.name(),
                    existing: existing.clone(),
                    attempted: url,
                });
            }
            Entry::Vacant(slot) => slot,
        };

        match self.urls.entry(url.clone()) {
            Entry::Occupied(owner) => {
                let owner = *owner.get();
                warn!(%url, existing = owner.name(), attempted = identity.name(), "type url already taken");
                Err(RegistrationConflict::UrlTaken {
                    url,
                    existing: owner.name(),
                    attempted: identity.name(),
                })
            }
            Entry::Vacant(reverse) => {
                reverse.insert(identity);
                debug!(type_name = identity.name(), %url, "registered type");
                slot.insert(Registration { url, decode });
                Ok(())
            }
        }
    }

    /// Returns the URL registered for `identity`.
    pub fn resolve(&self, identity: TypeIdentity) -> Option<String> {
        self.types.get(&identity).map(|r| r.url.clone())
    }

    /// Returns the type registered under `url`.
    pub fn resolve_name(&self, url: &str) -> Option<TypeIdentity> {
        self.urls.get(url).map(|r| *r.value())
    }

    pub(crate) fn decoder(&self, url: &str) -> Option<DecodeFn> {
        let identity = self.resolve_name(url)?;
        self.types.get(&identity).map(|r| r.decode)
    }

    pub fn contains<T: Message>(&self) -> bool {
        self.types.contains_key(&T::identity())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// A snapshot of all registrations, sorted by URL.
    pub fn entries(&self) -> Vec<(TypeIdentity, String)> {
        let mut entries: Vec<_> = self.types.iter().map(|r| (*r.key(), r.url.clone())).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    /// Drops every registration. Meant for tests; not safe to interleave with
    /// registration from other threads.
    pub fn clear(&self) {
        self.types.clear();
        self.urls.clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries().into_iter().map(|(identity, url)| (url, identity.name())))
            .finish()
    }
}
