//! Requirement introspection: does a requirement need a caller-supplied instance?

use super::BindingGraph;
use super::descriptor::{ComponentRequirement, RequirementKind};

/// Tells whether a requirement type is constructible without caller input.
pub trait RequirementIntrospector {
    fn requires_passed_instance(&self, requirement: &ComponentRequirement) -> bool;
}

/// Default introspector: trusts the `needs_instance` flag the front-end recorded on each module.
///
/// Component dependencies and bound instances always need an instance, whatever their flag says.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredIntrospector;

impl RequirementIntrospector for DeclaredIntrospector {
    fn requires_passed_instance(&self, requirement: &ComponentRequirement) -> bool {
        match requirement.kind {
            RequirementKind::Module => requirement.needs_instance,
            RequirementKind::Dependency | RequirementKind::BoundInstance => true,
        }
    }
}

/// `true` if every requirement of `graph` can be constructed without caller input.
pub fn can_instantiate_all_requirements(graph: &BindingGraph, introspector: &dyn RequirementIntrospector) -> bool {
    !graph
        .requirements()
        .iter()
        .any(|requirement| introspector.requires_passed_instance(requirement))
}
