//! Requirement storage: one constructor-initialized field per requirement a generated struct owns.

use proc_macro2::TokenStream;

use super::{EmitContext, StructScope, type_tokens};
use crate::backend::errors::EmitError;
use crate::backend::model::{FieldRole, FieldSpec, GeneratedComponentModel};
use crate::graph::{BindingGraph, ComponentRequirement, TypeRef};

/// A requirement stored on a generated struct.
#[derive(Debug, Clone)]
pub struct RequirementField {
    pub requirement: ComponentRequirement,
    pub field: String,
}

/// Requirement fields of one generated struct, in requirement declaration order.
#[derive(Debug, Clone, Default)]
pub struct RequirementFields {
    fields: Vec<RequirementField>,
}

impl RequirementFields {
    pub fn field_for(&self, ty: &TypeRef) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| &f.requirement.ty == ty)
            .map(|f| f.field.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequirementField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Allocates requirement fields for the graph at one path of the tree.
pub struct RequirementFieldAllocator;

impl RequirementFieldAllocator {
    /// Add a field for every requirement the plan assigns to `path`. Requirements owned by an ancestor are left to
    /// the ancestor and read through `self.parent`.
    pub(crate) fn allocate(
        ctx: &EmitContext<'_>,
        model: &mut GeneratedComponentModel,
        graph: &BindingGraph,
        path: &[usize],
    ) -> Result<RequirementFields, EmitError> {
        let mut fields = Vec::new();
        for requirement in graph.requirements() {
            if !ctx.plan.owns(path, &requirement.ty) {
                continue;
            }
            let name = model.unique_field_name(&wiregen_core::names::identifier_base(requirement.ty.as_str()))?;
            model.add_field(FieldSpec::param(
                name.clone(),
                type_tokens(&requirement.ty)?,
                FieldRole::Requirement,
            ));
            tracing::trace!(requirement = %requirement.ty, field = %name, "allocated requirement field");
            fields.push(RequirementField {
                requirement: requirement.clone(),
                field: name,
            });
        }
        Ok(RequirementFields { fields })
    }
}

/// Expression reading requirement `ty` from the nearest scope that stores it.
pub(crate) fn requirement_expr(scope: &StructScope<'_>, ty: &TypeRef) -> Option<TokenStream> {
    scope.ancestry().find_map(|(receiver, s)| {
        let field = s.requirement_fields.field_for(ty)?;
        let field = proc_macro2::Ident::new(field, proc_macro2::Span::call_site());
        Some(quote::quote! { #receiver.#field })
    })
}
