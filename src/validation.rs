//! Finalization of builder declarations into validated scope definitions.
//!
//! Finalization runs once per [`ContainerBuilder::build`](crate::ContainerBuilder::build)
//! and rejects configurations that could never resolve:
//!
//! - the same scope type declared at two different scope paths
//! - a dependency that is not bound in the declaring scope or any ancestor,
//!   other than the container itself
//! - dependency cycles, following the same lookup rules as resolution

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::collection::ScopeBuilder;
use crate::definitions::{ScopeDefinition, ScopePath};
use crate::error::{DiError, DiResult};
use crate::key::TypeIdentity;
use crate::provider::Container;
use crate::registration::{CloseFn, FastMap};

/// A binding as seen from a scope chain: (level in the chain, identity).
type Node = (usize, TypeIdentity);

/// Validates the declaration tree and freezes it into definitions.
///
/// `closers` are attached to every binding whose value type has one.
pub(crate) fn finalize(
    root: ScopeBuilder,
    closers: &FastMap<TypeId, CloseFn>,
) -> DiResult<Arc<ScopeDefinition>> {
    let mut seen = HashMap::new();
    check_scope_uniqueness(&root, &mut seen)?;

    let definition = build_definition(root, closers);
    let mut chain = Vec::new();
    validate_scope(&definition, &mut chain)?;
    Ok(definition)
}

fn check_scope_uniqueness(
    scope: &ScopeBuilder,
    seen: &mut HashMap<TypeIdentity, ScopePath>,
) -> DiResult<()> {
    for child in &scope.scopes {
        if let Some(key) = child.path.segments().last() {
            match seen.get(key) {
                Some(existing) if existing != &child.path => {
                    return Err(DiError::ScopeAlreadyUsed {
                        scope_type: key.clone(),
                        path: existing.render(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(key.clone(), child.path.clone());
                }
            }
        }
        check_scope_uniqueness(child, seen)?;
    }
    Ok(())
}

fn build_definition(builder: ScopeBuilder, closers: &FastMap<TypeId, CloseFn>) -> Arc<ScopeDefinition> {
    let ScopeBuilder {
        path,
        mut registry,
        scopes,
    } = builder;

    for binding in registry.iter_mut() {
        if let Some(value_type) = binding.value_type {
            binding.closer = closers.get(&value_type).cloned();
        }
    }

    let mut children = FastMap::default();
    let mut child_order = Vec::with_capacity(scopes.len());
    for child in scopes {
        if let Some(key) = child.path.segments().last().cloned() {
            child_order.push(key.clone());
            children.insert(key, build_definition(child, closers));
        }
    }

    Arc::new(ScopeDefinition {
        scope_key: path.segments().last().cloned(),
        path,
        registry,
        children,
        child_order,
    })
}

fn validate_scope<'a>(
    definition: &'a ScopeDefinition,
    chain: &mut Vec<&'a ScopeDefinition>,
) -> DiResult<()> {
    chain.push(definition);
    check_unresolved(chain)?;
    check_cycles(chain)?;
    for key in &definition.child_order {
        if let Some(child) = definition.children.get(key) {
            validate_scope(child, chain)?;
        }
    }
    chain.pop();
    Ok(())
}

/// Nearest level at or above `from` that binds `identity`.
fn lookup_level(chain: &[&ScopeDefinition], from: usize, identity: &TypeIdentity) -> Option<usize> {
    (0..=from)
        .rev()
        .find(|&level| chain[level].registry.contains_key(identity))
}

fn check_unresolved(chain: &[&ScopeDefinition]) -> DiResult<()> {
    let level = chain.len() - 1;
    let current = chain[level];
    for binding in current.registry.iter() {
        for dependency in &binding.dependencies {
            if lookup_level(chain, level, dependency).is_none()
                && !Container::is_self_identity(dependency)
            {
                return Err(DiError::UnresolvedDependency {
                    missing: dependency.clone(),
                    required_by: Some(binding.target.clone()),
                    scope: current.path.render(),
                });
            }
        }
    }
    Ok(())
}

fn check_cycles(chain: &[&ScopeDefinition]) -> DiResult<()> {
    let level = chain.len() - 1;
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    for binding in chain[level].registry.iter() {
        dfs_cycles(chain, (level, binding.target.clone()), &mut visited, &mut path)?;
    }
    Ok(())
}

fn dfs_cycles(
    chain: &[&ScopeDefinition],
    current: Node,
    visited: &mut HashSet<Node>,
    path: &mut Vec<Node>,
) -> DiResult<()> {
    if let Some(cycle_start) = path.iter().position(|node| node == &current) {
        let cycle = path[cycle_start..]
            .iter()
            .map(|(_, identity)| identity.clone())
            .chain(std::iter::once(current.1))
            .collect();
        return Err(DiError::CyclicDependency(cycle));
    }

    if !visited.insert(current.clone()) {
        return Ok(());
    }

    let level = current.0;
    let Some(binding) = chain[level].binding(&current.1) else {
        return Ok(());
    };

    path.push(current.clone());
    for dependency in &binding.dependencies {
        // Dependencies resolve in the view of the scope that owns the binding
        if let Some(dependency_level) = lookup_level(chain, level, dependency) {
            dfs_cycles(chain, (dependency_level, dependency.clone()), visited, path)?;
        }
    }
    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::identity_of;
    use crate::lifetime::ReusePolicy;
    use crate::registration::Instance;

    struct A;
    struct B;
    struct C;
    struct Request;

    fn noop(builder: &mut ScopeBuilder, target: TypeIdentity, deps: Vec<TypeIdentity>) {
        builder.register(target, deps, ReusePolicy::Singleton, |_| Ok(Arc::new(()) as Instance));
    }

    #[test]
    fn test_cycle_path_repeats_first_element() {
        let mut root = ScopeBuilder::root();
        noop(&mut root, identity_of::<A>(), vec![identity_of::<B>()]);
        noop(&mut root, identity_of::<B>(), vec![identity_of::<C>()]);
        noop(&mut root, identity_of::<C>(), vec![identity_of::<A>()]);

        let err = finalize(root, &FastMap::default()).unwrap_err();
        match err {
            DiError::CyclicDependency(path) => assert_eq!(
                path,
                vec![identity_of::<A>(), identity_of::<B>(), identity_of::<C>(), identity_of::<A>()]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_child_binding_can_depend_on_parent() {
        let mut root = ScopeBuilder::root();
        noop(&mut root, identity_of::<A>(), vec![]);
        root.with_scope::<Request, _>(|scope| {
            noop(scope, identity_of::<B>(), vec![identity_of::<A>(), identity_of::<Request>()]);
        });

        let definition = finalize(root, &FastMap::default()).unwrap();
        let child = definition.child(&identity_of::<Request>()).unwrap();
        assert_eq!(child.path.render(), "/Request");
        assert!(child.binding(&identity_of::<B>()).is_some());
    }

    #[test]
    fn test_parent_binding_cannot_see_child() {
        let mut root = ScopeBuilder::root();
        noop(&mut root, identity_of::<A>(), vec![identity_of::<B>()]);
        root.with_scope::<Request, _>(|scope| {
            noop(scope, identity_of::<B>(), vec![]);
        });

        let err = finalize(root, &FastMap::default()).unwrap_err();
        assert!(matches!(
            err,
            DiError::UnresolvedDependency { ref missing, ref scope, .. }
                if *missing == identity_of::<B>() && scope == "/"
        ));
    }

    #[test]
    fn test_shadowing_in_child_is_not_a_cycle() {
        // The child's A shadows the parent's A
        let mut root = ScopeBuilder::root();
        noop(&mut root, identity_of::<A>(), vec![]);
        root.with_scope::<Request, _>(|scope| {
            noop(scope, identity_of::<B>(), vec![identity_of::<A>()]);
            noop(scope, identity_of::<A>(), vec![identity_of::<C>()]);
            noop(scope, identity_of::<C>(), vec![]);
        });

        assert!(finalize(root, &FastMap::default()).is_ok());
    }
}
