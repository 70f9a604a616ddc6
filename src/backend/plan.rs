//! Whole-tree validation and requirement ownership, computed before anything is emitted.
//!
//! Emission never starts on a graph that fails here, so a failed write leaves nothing half-built behind. The plan also
//! decides which generated struct stores each component requirement: the nearest graph (the binding's own or an
//! ancestor) that declares it.

use std::collections::{BTreeSet, HashMap};

use crate::backend::errors::GraphValidationError;
use crate::backend::options::EmitOptions;
use crate::graph::{
    Binding, BindingGraph, BindingKind, BindingOwner, ComponentMethodKind, Key, KeyFactory, MultibindingCollection, TypeRef,
};

/// Validated requirement ownership for a component tree.
#[derive(Debug, Clone, Default)]
pub struct RequirementPlan {
    owned: HashMap<Vec<usize>, BTreeSet<TypeRef>>,
}

impl RequirementPlan {
    /// Validate the tree rooted at `root` and compute requirement ownership.
    #[tracing::instrument(skip_all, fields(component = %root.component_type()))]
    pub fn build(
        root: &BindingGraph,
        key_factory: &dyn KeyFactory,
        options: &EmitOptions,
    ) -> Result<Self, GraphValidationError> {
        let mut walker = Walker {
            key_factory,
            options,
            owned: HashMap::new(),
        };
        walker.visit(&mut vec![root], &mut Vec::new())?;
        Ok(Self { owned: walker.owned })
    }

    /// Whether the graph at `path` stores requirement `ty`.
    pub fn owns(&self, path: &[usize], ty: &TypeRef) -> bool {
        self.owned.get(path).is_some_and(|set| set.contains(ty))
    }

    /// Requirements stored by the graph at `path`.
    pub fn owned_by(&self, path: &[usize]) -> impl Iterator<Item = &TypeRef> {
        self.owned.get(path).into_iter().flatten()
    }
}

struct Walker<'a> {
    key_factory: &'a dyn KeyFactory,
    options: &'a EmitOptions,
    owned: HashMap<Vec<usize>, BTreeSet<TypeRef>>,
}

impl<'a> Walker<'a> {
    /// `chain` holds the ancestors of the current graph followed by the graph itself; `path` is its child-index path.
    fn visit<'g>(&mut self, chain: &mut Vec<&'g BindingGraph>, path: &mut Vec<usize>) -> Result<(), GraphValidationError> {
        let Some(&graph) = chain.last() else {
            return Ok(());
        };
        let ancestors = &chain[..chain.len() - 1];

        for binding in graph.bindings() {
            if self.options.strict_validation && ancestors.iter().any(|a| a.binding(&binding.key).is_some()) {
                return Err(GraphValidationError::DuplicateBinding {
                    key: binding.key.clone(),
                    component: graph.component_type().clone(),
                });
            }

            check_shape(binding)?;

            for dependency in binding.dependency_keys() {
                self.require_key(chain, graph.component_type(), dependency, || format!("`{}`", binding.key))?;
            }

            if let Some(ty) = binding.requirement_type() {
                let depth = chain
                    .iter()
                    .rposition(|g| g.requirement(ty).is_some())
                    .ok_or_else(|| GraphValidationError::MissingRequirement {
                        requirement: ty.clone(),
                        binding: binding.key.clone(),
                        component: graph.component_type().clone(),
                    })?;
                self.owned.entry(path[..depth].to_vec()).or_default().insert(ty.clone());
            }
        }

        for method in &graph.descriptor().methods {
            match &method.kind {
                ComponentMethodKind::Provision { key } => {
                    self.require_key(chain, graph.component_type(), key, || format!("method `{}`", method.name))?;
                }
                ComponentMethodKind::SubcomponentFactory { child, .. } => {
                    child_graph(graph, &method.name, *child)?;
                }
                ComponentMethodKind::SubcomponentBuilder { child } => {
                    let child_graph = child_graph(graph, &method.name, *child)?;
                    if child_graph.descriptor().builder_spec.is_none() {
                        return Err(GraphValidationError::InvalidSubcomponent {
                            method: method.name.clone(),
                            child: *child,
                            component: graph.component_type().clone(),
                            reason: "which declares no builder".to_string(),
                        });
                    }
                }
            }
        }

        for (index, child) in graph.subgraphs().iter().enumerate() {
            chain.push(child);
            path.push(index);
            let result = self.visit(chain, path);
            path.pop();
            chain.pop();
            result?;
        }
        Ok(())
    }

    fn require_key(
        &self,
        chain: &[&BindingGraph],
        component: &TypeRef,
        key: &Key,
        requested_by: impl FnOnce() -> String,
    ) -> Result<(), GraphValidationError> {
        if chain.iter().any(|g| g.binding(key).is_some()) || self.key_factory.optional_underlying(key).is_some() {
            return Ok(());
        }
        Err(GraphValidationError::MissingBinding {
            key: key.clone(),
            requested_by: requested_by(),
            component: component.clone(),
        })
    }
}

/// Per-kind structural checks that do not need the rest of the graph.
fn check_shape(binding: &Binding) -> Result<(), GraphValidationError> {
    let invalid = |reason: &str| GraphValidationError::InvalidBinding {
        key: binding.key.clone(),
        reason: reason.to_string(),
    };
    match (&binding.kind, &binding.owner) {
        (BindingKind::Provision { .. }, BindingOwner::Module { .. }) => Ok(()),
        (BindingKind::Provision { .. }, _) => Err(invalid("provider methods must be owned by a module")),
        (BindingKind::DependencyMethod { .. }, BindingOwner::Dependency { .. }) => Ok(()),
        (BindingKind::DependencyMethod { .. }, _) => Err(invalid("dependency methods must be owned by a dependency")),
        (
            BindingKind::Multibinding {
                collection: MultibindingCollection::Map { keys },
            },
            _,
        ) if keys.len() != binding.dependencies.len() => Err(invalid(&format!(
            "{} map keys for {} contributions",
            keys.len(),
            binding.dependencies.len()
        ))),
        _ => Ok(()),
    }
}

fn child_graph<'g>(
    graph: &'g BindingGraph,
    method: &str,
    child: usize,
) -> Result<&'g BindingGraph, GraphValidationError> {
    graph.subgraphs().get(child).ok_or_else(|| GraphValidationError::InvalidSubcomponent {
        method: method.to_string(),
        child,
        component: graph.component_type().clone(),
        reason: format!("but it declares {} subcomponents", graph.subgraphs().len()),
    })
}
