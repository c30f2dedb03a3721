//! Type identities used as binding keys.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Canonical key for a (possibly generic) type.
///
/// Identities compare structurally: two identities are equal when their
/// `TypeId`s are equal, which already covers type arguments
/// (`Vec<String>` and `Vec<u32>` never collide). The stored type name is
/// only used for diagnostics and never takes part in equality or hashing.
///
/// A namespaced identity tags an inner identity with the identity of the
/// namespace that owns it. `Config` in namespace `A` and `Config` in
/// namespace `B` are different keys, and both differ from plain `Config`.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::TypeIdentity;
///
/// struct Config;
/// struct ModuleA;
/// struct ModuleB;
///
/// let plain = TypeIdentity::of::<Config>();
/// let in_a = plain.namespaced_in(&TypeIdentity::of::<ModuleA>());
/// let in_b = plain.namespaced_in(&TypeIdentity::of::<ModuleB>());
///
/// assert_ne!(plain, in_a);
/// assert_ne!(in_a, in_b);
/// assert_eq!(in_a, TypeIdentity::namespaced::<Config, ModuleA>());
/// assert_eq!(in_a.inner(), &plain);
/// ```
#[derive(Debug, Clone)]
pub enum TypeIdentity {
    /// Plain type with its `TypeId` and `type_name` for diagnostics
    Type(TypeId, &'static str),
    /// Inner identity qualified by a namespace identity
    Namespaced {
        inner: Arc<TypeIdentity>,
        namespace: Arc<TypeIdentity>,
    },
}

impl TypeIdentity {
    /// Identity of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeIdentity::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Identity of `T` inside namespace `N`.
    pub fn namespaced<T: ?Sized + 'static, N: ?Sized + 'static>() -> Self {
        Self::of::<T>().namespaced_in(&Self::of::<N>())
    }

    /// Qualifies this identity with `namespace`.
    pub fn namespaced_in(&self, namespace: &TypeIdentity) -> Self {
        TypeIdentity::Namespaced {
            inner: Arc::new(self.clone()),
            namespace: Arc::new(namespace.clone()),
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(self, TypeIdentity::Namespaced { .. })
    }

    /// The unqualified identity (itself for plain identities).
    pub fn inner(&self) -> &TypeIdentity {
        match self {
            TypeIdentity::Type(..) => self,
            TypeIdentity::Namespaced { inner, .. } => inner,
        }
    }

    /// The owning namespace, if any.
    pub fn namespace(&self) -> Option<&TypeIdentity> {
        match self {
            TypeIdentity::Type(..) => None,
            TypeIdentity::Namespaced { namespace, .. } => Some(namespace),
        }
    }

    /// Full `type_name` of the unqualified type.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeIdentity::Type(_, name) => name,
            TypeIdentity::Namespaced { inner, .. } => inner.type_name(),
        }
    }

    /// Short rendering without module paths, e.g. `Vec<String>` or
    /// `Config@ModuleA` for namespaced identities.
    pub fn simple_description(&self) -> String {
        match self {
            TypeIdentity::Type(_, name) => short_type_name(name),
            TypeIdentity::Namespaced { inner, namespace } => {
                format!("{}@{}", inner.simple_description(), namespace.simple_description())
            }
        }
    }
}

impl PartialEq for TypeIdentity {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeIdentity::Type(a, _), TypeIdentity::Type(b, _)) => a == b,
            (
                TypeIdentity::Namespaced { inner: a, namespace: ns_a },
                TypeIdentity::Namespaced { inner: b, namespace: ns_b },
            ) => a == b && ns_a == ns_b,
            _ => false,
        }
    }
}

impl Eq for TypeIdentity {}

impl std::hash::Hash for TypeIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            // Name is ignored, TypeId alone decides identity
            TypeIdentity::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            TypeIdentity::Namespaced { inner, namespace } => {
                1u8.hash(state);
                inner.hash(state);
                namespace.hash(state);
            }
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.simple_description())
    }
}

/// Helper for creating plain identities.
#[inline]
pub fn identity_of<T: ?Sized + 'static>() -> TypeIdentity {
    TypeIdentity::of::<T>()
}

/// Strips module paths from a `type_name`, keeping generic structure.
pub(crate) fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for c in name.chars() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*') {
            out.push_str(last_path_segment(&segment));
            segment.clear();
            out.push(c);
        } else {
            segment.push(c);
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<u32, alloc::string::String>"),
            "HashMap<u32, String>"
        );
        assert_eq!(short_type_name("u8"), "u8");
    }

    #[test]
    fn test_generic_arguments_are_part_of_identity() {
        assert_ne!(identity_of::<Vec<String>>(), identity_of::<Vec<u32>>());
        assert_eq!(identity_of::<Vec<String>>(), identity_of::<Vec<String>>());
    }

    #[test]
    fn test_namespaced_identities_hash_apart() {
        struct A;
        struct B;
        let mut set = HashSet::new();
        set.insert(identity_of::<String>());
        set.insert(TypeIdentity::namespaced::<String, A>());
        set.insert(TypeIdentity::namespaced::<String, B>());
        set.insert(TypeIdentity::namespaced::<String, A>());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_name_does_not_affect_equality() {
        let a = TypeIdentity::Type(TypeId::of::<u32>(), "u32");
        let b = TypeIdentity::Type(TypeId::of::<u32>(), "renamed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_simple_description_of_namespaced() {
        struct Namespace;
        let id = TypeIdentity::namespaced::<String, Namespace>();
        assert_eq!(id.simple_description(), "String@Namespace");
        assert!(id.is_namespaced());
        assert_eq!(id.namespace(), Some(&identity_of::<Namespace>()));
        assert_eq!(id.type_name(), "alloc::string::String");
    }
}
