//! The orchestrator: one generated struct per graph of a component tree.
//!
//! `write` validates the whole tree first ([`RequirementPlan`]), names every subcomponent ([`SubcomponentNamer`]),
//! then emits structs depth-first. Each struct goes through the same steps:
//!
//! 1. parent reference (subcomponents) and requirement fields
//! 2. accessor names for every local binding, then their bodies and storage
//! 3. nested subcomponent structs, which see this struct read-only through their [`StructScope`]
//! 4. the component trait impl: provision methods, subcomponent factory and builder methods
//! 5. release dispatch, builder, static entry points, constructor

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;
use wiregen_core::names;

use super::binding_expressions::BindingExpressionResolver;
use super::builder::{BuilderEmitter, BuilderTarget, Coverage, match_requirements};
use super::naming::{self, SubcomponentNamer};
use super::requirement_fields::{RequirementFieldAllocator, RequirementFields};
use super::{EmitContext, StructScope, ident, type_tokens};
use crate::backend::errors::{EmitError, GraphValidationError};
use crate::backend::model::{FieldRole, FieldSpec, GeneratedComponentModel, MethodSpec, TypeDefinition, parent_lifetime};
use crate::backend::options::EmitOptions;
use crate::backend::plan::RequirementPlan;
use crate::graph::{
    BindingGraph, ComponentMethod, ComponentMethodKind, FactoryParam, KeyFactory, RequirementIntrospector,
    can_instantiate_all_requirements,
};

/// Emits the generated struct tree of one top-level component.
pub struct ComponentEmitter<'a> {
    options: &'a EmitOptions,
    key_factory: &'a dyn KeyFactory,
    introspector: &'a dyn RequirementIntrospector,
}

/// A finished struct plus what its parent needs to construct it.
struct WrittenStruct {
    definition: TypeDefinition,
    requirement_fields: RequirementFields,
    builder: Option<String>,
}

impl<'a> ComponentEmitter<'a> {
    pub fn new(
        options: &'a EmitOptions,
        key_factory: &'a dyn KeyFactory,
        introspector: &'a dyn RequirementIntrospector,
    ) -> Self {
        Self {
            options,
            key_factory,
            introspector,
        }
    }

    /// Emit the generated struct for `graph` (with its builder and every nested subcomponent).
    ///
    /// Fails without producing anything if the graph does not validate.
    #[tracing::instrument(skip_all, fields(component = %graph.component_type()))]
    pub fn write(&self, graph: &BindingGraph) -> Result<TypeDefinition, EmitError> {
        let plan = RequirementPlan::build(graph, self.key_factory, self.options)?;
        let name = component_name(graph);
        let namer = SubcomponentNamer::for_root(graph, &name)?;
        let ctx = EmitContext {
            options: self.options,
            key_factory: self.key_factory,
            introspector: self.introspector,
            plan: &plan,
            namer: &namer,
        };
        let written = write_struct(&ctx, graph, &[], name, None)?;
        tracing::debug!(
            name = %written.definition.name,
            subcomponents = namer.len(),
            "component written"
        );
        Ok(written.definition)
    }
}

/// Struct name of a top-level component (`crate::app::App` -> `WiredApp`).
pub fn component_name(graph: &BindingGraph) -> String {
    let simple = names::to_upper_camel_case(graph.component_type().simple_name());
    format!("{}{}", conventions::GENERATED_COMPONENT_PREFIX, simple)
}

fn write_struct<'s>(
    ctx: &EmitContext<'_>,
    graph: &'s BindingGraph,
    path: &[usize],
    name: String,
    parent: Option<&'s StructScope<'s>>,
) -> Result<WrittenStruct, EmitError> {
    let top_level = parent.is_none();
    let mut model = if top_level {
        GeneratedComponentModel::for_component(name.clone())
    } else {
        GeneratedComponentModel::for_subcomponent(name.clone())
    };
    if top_level {
        model.reserve_method_name(conventions::BUILDER_METHOD)?;
        model.reserve_method_name(conventions::CREATE_METHOD)?;
    }
    if ctx.options.release_manager {
        model.reserve_method_name(conventions::RELEASE_ALL_METHOD)?;
    }

    if let Some(parent) = parent {
        let lifetime = parent_lifetime();
        let parent_type = &parent.type_tokens;
        model.add_field(FieldSpec::param(
            conventions::PARENT_FIELD,
            quote! { &#lifetime #parent_type },
            FieldRole::Parent,
        ));
    }
    let requirement_fields = RequirementFieldAllocator::allocate(ctx, &mut model, graph, path)?;
    let accessors = BindingExpressionResolver::declare_accessors(&mut model, graph)?;
    let scope = StructScope {
        graph,
        type_tokens: model.type_tokens(),
        requirement_fields,
        accessors,
        parent,
    };

    let mut resolver = BindingExpressionResolver::new(*ctx, &scope);
    for binding in graph.bindings() {
        resolver.emit_binding(&mut model, binding)?;
    }

    let mut children = Vec::with_capacity(graph.subgraphs().len());
    for (index, child) in graph.subgraphs().iter().enumerate() {
        let child_path = [path, &[index]].concat();
        let child_name = ctx
            .namer
            .name_for(&child_path)
            .ok_or_else(|| GraphValidationError::InvalidSubcomponent {
                method: String::new(),
                child: index,
                component: graph.component_type().clone(),
                reason: "which was never named".to_string(),
            })?
            .to_string();
        children.push(write_struct(ctx, child, &child_path, child_name, Some(&scope))?);
    }

    let trait_name = graph.component_type().to_string();
    let trait_path = type_tokens(graph.component_type())?;
    model.ensure_trait_impl(&trait_name, trait_path.clone());
    for method in &graph.descriptor().methods {
        ident(&method.name)?;
        let spec = match &method.kind {
            ComponentMethodKind::Provision { key } => MethodSpec::new(method.name.clone())
                .returns(type_tokens(&key.ty)?)
                .body(resolver.resolve(&mut model, key)?),
            ComponentMethodKind::SubcomponentFactory { child, params } => {
                let (child_graph, written) = child_of(graph, &children, method, *child)?;
                factory_method(ctx, graph, method, child_graph, written, params)?
            }
            ComponentMethodKind::SubcomponentBuilder { child } => {
                let (child_graph, written) = child_of(graph, &children, method, *child)?;
                builder_method(graph, method, child_graph, written)?
            }
        };
        model.add_trait_method(&trait_name, trait_path.clone(), spec);
    }
    resolver.finish(&mut model)?;

    let mut builder = None;
    if top_level || graph.descriptor().builder_spec.is_some() {
        let builder_name = if top_level {
            ctx.namer.root_builder().to_string()
        } else {
            naming::builder_name(&name)
        };
        let emitted = BuilderEmitter::emit(ctx, BuilderTarget {
            graph,
            component_name: &name,
            builder_name,
            requirement_fields: &scope.requirement_fields,
            parent_type: parent.map(|p| p.type_tokens.clone()),
        })?;
        if top_level {
            model.add_method(emitted.builder_method());
            if can_instantiate_all_requirements(graph, ctx.introspector) {
                model.add_method(emitted.create_method());
            }
        }
        builder = Some(emitted.definition.name.clone());
        model.add_nested_type(emitted.definition);
    }

    for child in children {
        model.add_nested_type(child.definition);
    }
    model.add_constructor();

    let StructScope { requirement_fields, .. } = scope;
    Ok(WrittenStruct {
        definition: model.finalize(),
        requirement_fields,
        builder,
    })
}

fn child_of<'g, 'w>(
    graph: &'g BindingGraph,
    children: &'w [WrittenStruct],
    method: &ComponentMethod,
    child: usize,
) -> Result<(&'g BindingGraph, &'w WrittenStruct), GraphValidationError> {
    match (graph.subgraphs().get(child), children.get(child)) {
        (Some(child_graph), Some(written)) => Ok((child_graph, written)),
        _ => Err(GraphValidationError::InvalidSubcomponent {
            method: method.name.clone(),
            child,
            component: graph.component_type().clone(),
            reason: format!("but it declares {} subcomponents", graph.subgraphs().len()),
        }),
    }
}

/// `fn name(&self, params..) -> impl ChildTrait + '_ { Child::new(self, ..) }`
///
/// Parameters map onto the child's requirements by type; owned requirements without a parameter are defaulted.
fn factory_method(
    ctx: &EmitContext<'_>,
    graph: &BindingGraph,
    method: &ComponentMethod,
    child_graph: &BindingGraph,
    child: &WrittenStruct,
    params: &[FactoryParam],
) -> Result<MethodSpec, EmitError> {
    let api = format!("{}::{}", graph.component_type(), method.name);
    let supplied: Vec<_> = params.iter().map(|p| (p.name.clone(), p.ty.clone())).collect();
    let matched = match_requirements(ctx, &api, child_graph, &supplied, Coverage::InstancesOnly)?;

    let mut spec = MethodSpec::new(method.name.clone());
    for param in params {
        ident(&param.name)?;
        spec = spec.param(param.name.clone(), type_tokens(&param.ty)?);
    }

    let args = child
        .requirement_fields
        .iter()
        .map(|field| match matched.get(&field.requirement.ty) {
            Some(&index) => ident(&params[index].name).map(|name| quote! { #name }),
            None => Ok(quote! { ::core::default::Default::default() }),
        })
        .collect::<Result<Vec<TokenStream>, EmitError>>()?;

    let child_struct = format_ident!("{}", child.definition.name);
    let child_trait = type_tokens(child_graph.component_type())?;
    Ok(spec
        .returns(quote! { impl #child_trait + '_ })
        .body(quote! { #child_struct::new(self, #(#args),*) }))
}

/// `fn name(&self) -> impl ChildBuilderTrait + '_ { ChildBuilder::new(self) }`
fn builder_method(
    graph: &BindingGraph,
    method: &ComponentMethod,
    child_graph: &BindingGraph,
    child: &WrittenStruct,
) -> Result<MethodSpec, EmitError> {
    let (Some(spec), Some(builder)) = (child_graph.descriptor().builder_spec.as_ref(), child.builder.as_deref()) else {
        return Err(GraphValidationError::InvalidSubcomponent {
            method: method.name.clone(),
            child: graph.subgraphs().iter().position(|g| std::ptr::eq(g, child_graph)).unwrap_or_default(),
            component: graph.component_type().clone(),
            reason: "which declares no builder".to_string(),
        }
        .into());
    };
    let builder_trait = type_tokens(&spec.builder_type)?;
    let builder = format_ident!("{}", builder);
    Ok(MethodSpec::new(method.name.clone())
        .returns(quote! { impl #builder_trait + '_ })
        .body(quote! { #builder::new(self) }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::{Binding, CanonicalKeyFactory, ComponentDescriptor, ComponentRequirement, DeclaredIntrospector, Key};

    fn write(graph: &BindingGraph) -> Result<TypeDefinition, EmitError> {
        let options = EmitOptions::default();
        ComponentEmitter::new(&options, &CanonicalKeyFactory, &DeclaredIntrospector).write(graph)
    }

    #[test]
    fn test_component_name() {
        let graph = BindingGraph::new(ComponentDescriptor::new("crate::app::App"));
        assert_eq!(component_name(&graph), "WiredApp");
    }

    #[test]
    fn test_inherited_requirement_is_read_through_parent() {
        let graph = BindingGraph::new(ComponentDescriptor::new("crate::App"))
            .with_requirement(ComponentRequirement::module_instance("ModuleA"))
            .with_binding(Binding::provision(Key::of("Foo"), "ModuleA", "foo", vec![]))
            .with_method(ComponentMethod::subcomponent_factory("sub", 0, vec![]))
            .with_subgraph(
                BindingGraph::new(ComponentDescriptor::new("crate::Sub"))
                    .with_binding(Binding::provision(Key::of("Bar"), "ModuleA", "bar", vec![Key::of("Foo")])),
            );
        let def = write(&graph).unwrap();
        let sub = def.nested("Sub").unwrap();
        assert!(sub.field("module_a").is_none());
        assert_eq!(
            sub.method("provide_bar").unwrap().body.to_string(),
            "self . parent . module_a . bar (self . parent . provide_foo ())"
        );
        let factory = def.trait_impl("crate::App").unwrap().method("sub").unwrap();
        assert_eq!(factory.body.to_string(), "Sub :: new (self ,)");
    }

    #[test]
    fn test_trait_impl_is_always_present() {
        let def = write(&BindingGraph::new(ComponentDescriptor::new("crate::App"))).unwrap();
        assert!(def.trait_impl("crate::App").is_some_and(|t| t.methods.is_empty()));
        assert_eq!(def.method_names(), vec!["new", "builder", "create"]);
    }

    #[test]
    fn test_validation_failure_produces_nothing() {
        let graph = BindingGraph::new(ComponentDescriptor::new("crate::App"))
            .with_method(ComponentMethod::provision("foo", Key::of("Foo")));
        assert!(matches!(write(&graph), Err(EmitError::GraphValidation(_))));
    }
}
