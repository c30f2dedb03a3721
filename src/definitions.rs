//! Finalized, immutable scope definitions.

use std::fmt;
use std::sync::Arc;

use crate::key::TypeIdentity;
use crate::registration::{Binding, FastMap, Registry};

/// Ordered list of scope types from the root to a scope.
///
/// ```rust
/// use ferrous_inject::{ScopePath, TypeIdentity};
///
/// struct Request;
/// struct Transaction;
///
/// assert_eq!(ScopePath::root().render(), "/");
/// let path = ScopePath::root()
///     .child(TypeIdentity::of::<Request>())
///     .child(TypeIdentity::of::<Transaction>());
/// assert_eq!(path.render(), "/Request/Transaction");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScopePath(Vec<TypeIdentity>);

impl ScopePath {
    pub fn root() -> Self {
        ScopePath(Vec::new())
    }

    /// This path extended by `scope`.
    pub fn child(&self, scope: TypeIdentity) -> Self {
        let mut segments = self.0.clone();
        segments.push(scope);
        ScopePath(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[TypeIdentity] {
        &self.0
    }

    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return "/".to_string();
        }
        self.0
            .iter()
            .map(|segment| format!("/{}", segment.simple_description()))
            .collect()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Validated bindings of one scope plus its declared child scopes.
pub(crate) struct ScopeDefinition {
    pub(crate) scope_key: Option<TypeIdentity>,
    pub(crate) path: ScopePath,
    pub(crate) registry: Registry,
    pub(crate) children: FastMap<TypeIdentity, Arc<ScopeDefinition>>,
    /// Child scope types in declaration order
    pub(crate) child_order: Vec<TypeIdentity>,
}

impl ScopeDefinition {
    #[inline]
    pub(crate) fn binding(&self, identity: &TypeIdentity) -> Option<&Binding> {
        self.registry.get(identity)
    }

    pub(crate) fn child(&self, scope: &TypeIdentity) -> Option<&Arc<ScopeDefinition>> {
        self.children.get(scope)
    }

    /// Every declared scope at and below this definition, rendered as paths.
    pub(crate) fn all_scope_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths(&self, out: &mut Vec<String>) {
        for key in &self.child_order {
            if let Some(child) = self.children.get(key) {
                out.push(child.path.render());
                child.collect_paths(out);
            }
        }
    }

    /// Human readable dump of all bindings, one section per scope.
    pub(crate) fn describe(&self, out: &mut String) {
        use std::fmt::Write;

        let _ = writeln!(out, "scope {}:", self.path);
        for binding in self.registry.iter() {
            let deps = binding
                .dependencies
                .iter()
                .map(TypeIdentity::simple_description)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                "  {} ({:?}) <- [{}]{}",
                binding.target,
                binding.reuse_policy,
                deps,
                if binding.closer.is_some() { " closeable" } else { "" }
            );
            #[cfg(feature = "diagnostics")]
            let _ = writeln!(out, "    type: {}", binding.target.type_name());
        }
        for key in &self.child_order {
            if let Some(child) = self.children.get(key) {
                child.describe(out);
            }
        }
    }
}

impl fmt::Debug for ScopeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeDefinition")
            .field("path", &self.path.render())
            .field("bindings", &self.registry.len())
            .field("children", &self.child_order)
            .finish()
    }
}
