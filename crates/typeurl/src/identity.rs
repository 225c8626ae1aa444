//! # Type identity and type URLs
//!
//! `TypeIdentity` is the registry key: the exact concrete type of a value.
//! Equality and hashing go through `TypeId` only, the name is carried along
//! for diagnostics.

use std::any::TypeId;
use std::hash::Hash;
use std::hash::Hasher;

/// The exact concrete type of a value.
#[derive(Clone, Copy, Debug)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    /// Returns the identity of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler-provided type name. Not guaranteed stable across builds,
    /// never use it as a type URL.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Joins candidate name segments into a single type URL.
///
/// The first segment is the base, the rest are appended as `/`-separated path
/// segments, and the result is cleaned like a slash-separated path: empty
/// segments and runs of `/` collapse, `.` is dropped, `..` removes the segment
/// before it, and a leading `/` is kept. So `["test", "two"]`,
/// `["test/", "/two"]` and `["test", "", "two"]` all produce `"test/two"`,
/// `["a//b", "c"]` produces `"a/b/c"` and `["/", "two"]` produces `"/two"`.
///
/// A name that cleans away to nothing (`[]`, `[""]`, `["."]`) yields `""`,
/// which registration rejects.
pub fn join_names(names: &[&str]) -> String {
    let joined = names.iter().filter(|name| !name.is_empty()).copied().collect::<Vec<_>>().join("/");
    let rooted = joined.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let cleaned = parts.join("/");
    if rooted { format!("/{}", cleaned) } else { cleaned }
}
