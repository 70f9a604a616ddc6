//! Resolved binding graphs: the input of component emission.
//!
//! A [`BindingGraph`] is produced once per component by the resolution front-end and is read-only afterwards. It
//! maps each key bound *locally* in the component to its [`Binding`], lists the [`ComponentRequirement`]s the
//! component declares, and owns one child graph per declared subcomponent (in declaration order).
//!
//! ## Notes
//!
//! - Keys referenced by a binding must resolve in the same graph or an ancestor graph. The emitter re-checks this
//!   before writing anything and treats a violation as fatal.
//! - Graphs (de)serialize through a flat representation (`bindings` as a list) so they can be loaded from JSON.

pub mod binding;
pub mod descriptor;
pub mod introspect;
pub mod key;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use binding::{Binding, BindingKind, BindingOwner, MultibindingCollection, Scope};
pub use descriptor::{
    BuildMethodSpec, BuilderSpec, ComponentDescriptor, ComponentMethod, ComponentMethodKind, ComponentRequirement,
    FactoryParam, RequirementKind, SetterSpec,
};
pub use introspect::{DeclaredIntrospector, RequirementIntrospector, can_instantiate_all_requirements};
pub use key::{CanonicalKeyFactory, Key, KeyFactory, TypeRef};

/// Immutable, resolved mapping from key to binding for one component, plus its subcomponent graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GraphRepr", into = "GraphRepr")]
pub struct BindingGraph {
    descriptor: ComponentDescriptor,
    bindings: BTreeMap<Key, Binding>,
    requirements: Vec<ComponentRequirement>,
    subgraphs: Vec<BindingGraph>,
}

impl BindingGraph {
    pub fn new(descriptor: ComponentDescriptor) -> Self {
        Self {
            descriptor,
            bindings: BTreeMap::new(),
            requirements: Vec::new(),
            subgraphs: Vec::new(),
        }
    }

    /// Add a local binding. A later binding for the same key replaces the earlier one.
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.insert(binding.key.clone(), binding);
        self
    }

    /// Declare a requirement. Requirements are unique per type: re-declaring a type is a no-op.
    pub fn with_requirement(mut self, requirement: ComponentRequirement) -> Self {
        if self.requirement(&requirement.ty).is_none() {
            self.requirements.push(requirement);
        }
        self
    }

    pub fn with_subgraph(mut self, subgraph: BindingGraph) -> Self {
        self.subgraphs.push(subgraph);
        self
    }

    pub fn with_method(mut self, method: ComponentMethod) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    pub fn with_builder_spec(mut self, spec: BuilderSpec) -> Self {
        self.descriptor.builder_spec = Some(spec);
        self
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    pub fn component_type(&self) -> &TypeRef {
        &self.descriptor.component_type
    }

    /// Local bindings, ordered by key.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Local binding for `key`, if any.
    pub fn binding(&self, key: &Key) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn requirements(&self) -> &[ComponentRequirement] {
        &self.requirements
    }

    pub fn requirement(&self, ty: &TypeRef) -> Option<&ComponentRequirement> {
        self.requirements.iter().find(|r| &r.ty == ty)
    }

    pub fn subgraphs(&self) -> &[BindingGraph] {
        &self.subgraphs
    }

    /// Child graph at `path` (a sequence of subgraph indices from this graph).
    pub fn descendant(&self, path: &[usize]) -> Option<&BindingGraph> {
        path.iter().try_fold(self, |graph, &index| graph.subgraphs.get(index))
    }

    /// Every type spelling this graph and its subgraphs mention, in no particular order.
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        let mut out = Vec::new();
        self.collect_type_refs(&mut out);
        out
    }

    fn collect_type_refs<'g>(&'g self, out: &mut Vec<&'g TypeRef>) {
        let descriptor = &self.descriptor;
        out.push(&descriptor.component_type);
        if let Some(spec) = &descriptor.builder_spec {
            out.push(&spec.builder_type);
            out.push(&spec.build_method.return_type);
            out.extend(spec.setters.iter().map(|s| &s.param_type));
        }
        for method in &descriptor.methods {
            match &method.kind {
                ComponentMethodKind::Provision { key } => out.push(&key.ty),
                ComponentMethodKind::SubcomponentFactory { params, .. } => out.extend(params.iter().map(|p| &p.ty)),
                ComponentMethodKind::SubcomponentBuilder { .. } => {}
            }
        }
        out.extend(self.requirements.iter().map(|r| &r.ty));
        for binding in self.bindings.values() {
            out.push(&binding.key.ty);
            out.extend(binding.dependencies.iter().map(|k| &k.ty));
            match &binding.kind {
                BindingKind::OptionalWrapper { underlying: key } | BindingKind::Delegate { target: key } => {
                    out.push(&key.ty)
                }
                _ => {}
            }
            if let BindingOwner::Module { ty } | BindingOwner::Dependency { ty } = &binding.owner {
                out.push(ty);
            }
        }
        for subgraph in &self.subgraphs {
            subgraph.collect_type_refs(out);
        }
    }
}

/// Flat serialized form of a [`BindingGraph`].
#[derive(Serialize, Deserialize)]
struct GraphRepr {
    descriptor: ComponentDescriptor,
    #[serde(default)]
    bindings: Vec<Binding>,
    #[serde(default)]
    requirements: Vec<ComponentRequirement>,
    #[serde(default)]
    subgraphs: Vec<BindingGraph>,
}

impl From<GraphRepr> for BindingGraph {
    fn from(repr: GraphRepr) -> Self {
        let graph = repr
            .requirements
            .into_iter()
            .fold(BindingGraph::new(repr.descriptor), BindingGraph::with_requirement);
        let graph = repr.bindings.into_iter().fold(graph, BindingGraph::with_binding);
        repr.subgraphs.into_iter().fold(graph, BindingGraph::with_subgraph)
    }
}

impl From<BindingGraph> for GraphRepr {
    fn from(graph: BindingGraph) -> Self {
        Self {
            descriptor: graph.descriptor,
            bindings: graph.bindings.into_values().collect(),
            requirements: graph.requirements,
            subgraphs: graph.subgraphs,
        }
    }
}
