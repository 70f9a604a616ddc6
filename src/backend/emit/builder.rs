//! Builder structs, static entry points, and requirement conformance.
//!
//! A builder stores one `Option<T>` slot per requirement of its component. Without a declared builder trait it gets
//! inherent `pub fn <requirement>(mut self, value: T) -> Self` setters and
//! `pub fn build(self) -> Result<Component, wiregen_runtime::BuildError>`. With a declared builder trait it implements
//! that trait instead, copying setter names, parameter types and the build method's name and return type.
//!
//! ## Notes
//! - The declared setters must map one-to-one onto the requirements by parameter type ([`match_requirements`] with
//!   [`Coverage::Every`]). A missing setter is an error even for a default-constructible requirement.
//! - The declared build return type decides failure handling: a `Result<..>` return reports a missing requirement as
//!   `Err(From::from(BuildError))`, anything else panics with the `BuildError` message.
//! - A `Box<dyn Component>` build return needs a dyn-compatible component trait, which rules out subcomponent factory
//!   and builder methods (they return `impl Trait + '_`).

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;
use wiregen_core::names;

use super::requirement_fields::RequirementFields;
use super::{EmitContext, ident, type_tokens};
use crate::backend::errors::{ArityMismatchError, EmitError};
use crate::backend::model::{
    FieldRole, FieldSpec, GeneratedComponentModel, MethodSpec, Receiver, TypeDefinition, parent_lifetime,
};
use crate::graph::{BindingGraph, BuilderSpec, TypeRef};

/// Which requirements a supplied parameter list has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Coverage {
    /// Every requirement (declared builder traits).
    Every,
    /// Only requirements needing a caller-supplied instance; the rest are defaulted (subcomponent factory methods).
    InstancesOnly,
}

/// Map each supplied `(label, type)` onto the requirement of the same canonical type.
///
/// Returns, per requirement type, the index of the entry supplying it. Entries matching no requirement (or one
/// already matched) and uncovered requirements make an [`ArityMismatchError`].
pub(crate) fn match_requirements(
    ctx: &EmitContext<'_>,
    api: &str,
    graph: &BindingGraph,
    supplied: &[(String, TypeRef)],
    coverage: Coverage,
) -> Result<HashMap<TypeRef, usize>, ArityMismatchError> {
    let canonical = |ty: &TypeRef| ctx.key_factory.for_type(ty, None).ty;
    let by_canonical: HashMap<TypeRef, &TypeRef> = graph
        .requirements()
        .iter()
        .map(|r| (canonical(&r.ty), &r.ty))
        .collect();

    let mut matched: HashMap<TypeRef, usize> = HashMap::new();
    let mut extra = Vec::new();
    for (index, (label, ty)) in supplied.iter().enumerate() {
        match by_canonical.get(&canonical(ty)) {
            Some(&requirement) if !matched.contains_key(requirement) => {
                matched.insert(requirement.clone(), index);
            }
            _ => extra.push(label.clone()),
        }
    }

    let missing: Vec<TypeRef> = graph
        .requirements()
        .iter()
        .filter(|r| !matched.contains_key(&r.ty))
        .filter(|r| coverage == Coverage::Every || ctx.introspector.requires_passed_instance(r))
        .map(|r| r.ty.clone())
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(matched)
    } else {
        Err(ArityMismatchError::new(api, graph.component_type().clone(), missing, extra))
    }
}

/// What the generated component needs from its builder.
pub(crate) struct BuilderTarget<'a> {
    pub graph: &'a BindingGraph,
    /// Generated struct the builder constructs.
    pub component_name: &'a str,
    pub builder_name: String,
    /// Constructor parameters of the component after `parent`, in order.
    pub requirement_fields: &'a RequirementFields,
    /// Type of the parent struct, for subcomponent builders.
    pub parent_type: Option<TokenStream>,
}

/// A generated builder plus what the component's entry points need to call it.
#[derive(Debug)]
pub struct EmittedBuilder {
    pub definition: TypeDefinition,
    pub build_method: String,
    trait_path: Option<TokenStream>,
    shape: ReturnShape,
}

impl EmittedBuilder {
    /// `pub fn builder() -> Builder` (or `-> impl BuilderTrait`).
    pub fn builder_method(&self) -> MethodSpec {
        let builder = format_ident!("{}", self.definition.name);
        let returns = match &self.trait_path {
            Some(path) => quote! { impl #path },
            None => quote! { #builder },
        };
        MethodSpec::new(conventions::BUILDER_METHOD)
            .public()
            .receiver(Receiver::Static)
            .returns(returns)
            .body(quote! { #builder::new() })
    }

    /// `pub fn create() -> Component`: build with every requirement defaulted.
    ///
    /// Only valid when no requirement needs a caller-supplied instance, so the build cannot fail.
    pub fn create_method(&self) -> MethodSpec {
        let builder = format_ident!("{}", self.definition.name);
        let build = format_ident!("{}", self.build_method);
        let call = match &self.trait_path {
            Some(path) => quote! { <#builder as #path>::#build(#builder::new()) },
            None => quote! { #builder::new().#build() },
        };
        let body = if self.shape.fallible {
            quote! {
                match #call {
                    ::core::result::Result::Ok(component) => component,
                    ::core::result::Result::Err(_) => ::core::unreachable!("every requirement is default-constructible"),
                }
            }
        } else {
            call
        };
        MethodSpec::new(conventions::CREATE_METHOD)
            .public()
            .receiver(Receiver::Static)
            .returns(self.shape.success.clone())
            .body(body)
    }
}

/// Declared build return type, taken apart.
#[derive(Debug, Clone)]
struct ReturnShape {
    declared: TokenStream,
    /// Type a successful build yields (`T` of `Result<T, E>`, else the declared type).
    success: TokenStream,
    fallible: bool,
    /// `Box<dyn Component>`. Only compiles for a dyn-compatible component trait: subcomponent factory and builder
    /// methods return `impl Trait + '_`, so a trait declaring any of them cannot be boxed.
    boxed: bool,
}

impl ReturnShape {
    fn of_default(component: TokenStream) -> Self {
        Self {
            declared: quote! { ::core::result::Result<#component, ::wiregen_runtime::BuildError> },
            success: component,
            fallible: true,
            boxed: false,
        }
    }

    fn of_declared(ty: &TypeRef) -> Result<Self, EmitError> {
        let parsed = ty.parse().map_err(|e| EmitError::InvalidType {
            spelling: ty.to_string(),
            reason: e.to_string(),
        })?;
        let declared = quote! { #parsed };
        let (success, fallible) = match generic_args_of(&parsed, "Result").and_then(|args| args.first().cloned()) {
            Some(ok) => (ok, true),
            None => (parsed, false),
        };
        Ok(Self {
            declared,
            boxed: generic_args_of(&success, "Box").is_some(),
            success: quote! { #success },
            fallible,
        })
    }

    fn wrap(&self, component: TokenStream) -> TokenStream {
        let component = if self.boxed {
            quote! { ::std::boxed::Box::new(#component) }
        } else {
            component
        };
        if self.fallible {
            quote! { ::core::result::Result::Ok(#component) }
        } else {
            component
        }
    }

    fn fail(&self, requirement: &str, converted: bool) -> TokenStream {
        let error = quote! { ::wiregen_runtime::BuildError::missing_requirement(#requirement) };
        match (self.fallible, converted) {
            (true, true) => quote! { return ::core::result::Result::Err(::core::convert::From::from(#error)) },
            (true, false) => quote! { return ::core::result::Result::Err(#error) },
            (false, _) => quote! { #error.raise() },
        }
    }
}

/// Type arguments of `ty` when it is a path type whose last segment is `name`.
fn generic_args_of(ty: &syn::Type, name: &str) -> Option<Vec<syn::Type>> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != name {
        return None;
    }
    match &last.arguments {
        syn::PathArguments::AngleBracketed(args) => Some(
            args.args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(t) => Some(t.clone()),
                    _ => None,
                })
                .collect(),
        ),
        _ => Some(Vec::new()),
    }
}

pub struct BuilderEmitter;

impl BuilderEmitter {
    /// Emit the builder struct for `target`, conforming to its declared builder trait when there is one.
    pub(crate) fn emit(ctx: &EmitContext<'_>, target: BuilderTarget<'_>) -> Result<EmittedBuilder, EmitError> {
        let spec = target.graph.descriptor().builder_spec.as_ref();
        let mut model = GeneratedComponentModel::for_builder(target.builder_name.clone(), target.parent_type.is_some());

        let build_method = spec
            .map(|s| s.build_method.name.clone())
            .unwrap_or_else(|| conventions::DEFAULT_BUILD_METHOD.to_string());
        ident(&build_method)?;
        model.reserve_method_name(&build_method)?;

        if let Some(parent_type) = &target.parent_type {
            let lifetime = parent_lifetime();
            model.add_field(FieldSpec::param(
                conventions::PARENT_FIELD,
                quote! { &#lifetime #parent_type },
                FieldRole::Parent,
            ));
        }

        let mut slots = Vec::with_capacity(target.graph.requirements().len());
        for requirement in target.graph.requirements() {
            let slot = model.unique_field_name(&names::identifier_base(requirement.ty.as_str()))?;
            let ty = type_tokens(&requirement.ty)?;
            model.add_field(FieldSpec::initialized(
                slot.clone(),
                quote! { ::core::option::Option<#ty> },
                FieldRole::BuilderSlot,
                quote! { ::core::option::Option::None },
            ));
            slots.push(slot);
        }

        let (shape, trait_path) = match spec {
            Some(spec) => {
                let shape = ReturnShape::of_declared(&spec.build_method.return_type)?;
                let trait_path = type_tokens(&spec.builder_type)?;
                emit_declared_setters(ctx, &mut model, &target, spec, &slots, &trait_path)?;
                (shape, Some(trait_path))
            }
            None => {
                let component = format_ident!("{}", target.component_name);
                let shape = ReturnShape::of_default(quote! { #component });
                emit_default_setters(&mut model, &target, &slots)?;
                (shape, None)
            }
        };

        let build = MethodSpec::new(build_method.clone())
            .receiver(Receiver::Owned)
            .returns(shape.declared.clone())
            .body(build_body(ctx, &target, &slots, &shape, trait_path.is_some()));
        match &trait_path {
            Some(path) => {
                let trait_name = spec.map(|s| s.builder_type.to_string()).unwrap_or_default();
                model.add_trait_method(&trait_name, path.clone(), build);
            }
            None => model.add_method(build.public()),
        }

        model.add_constructor();

        tracing::debug!(builder = %target.builder_name, setters = slots.len(), declared = spec.is_some(), "emitted builder");
        Ok(EmittedBuilder {
            definition: model.finalize(),
            build_method,
            trait_path,
            shape,
        })
    }
}

fn emit_default_setters(
    model: &mut GeneratedComponentModel,
    target: &BuilderTarget<'_>,
    slots: &[String],
) -> Result<(), EmitError> {
    for (requirement, slot) in target.graph.requirements().iter().zip(slots) {
        let name = model.unique_method_name(slot)?;
        model.add_method(setter(name, slot, type_tokens(&requirement.ty)?).public());
    }
    Ok(())
}

fn emit_declared_setters(
    ctx: &EmitContext<'_>,
    model: &mut GeneratedComponentModel,
    target: &BuilderTarget<'_>,
    spec: &BuilderSpec,
    slots: &[String],
    trait_path: &TokenStream,
) -> Result<(), EmitError> {
    let supplied: Vec<(String, TypeRef)> = spec
        .setters
        .iter()
        .map(|s| (format!("fn {}({})", s.name, s.param_type), s.param_type.clone()))
        .collect();
    let matched = match_requirements(ctx, spec.builder_type.as_str(), target.graph, &supplied, Coverage::Every)?;

    let trait_name = spec.builder_type.to_string();
    for (requirement, slot) in target.graph.requirements().iter().zip(slots) {
        let Some(&index) = matched.get(&requirement.ty) else {
            continue;
        };
        let declared = &spec.setters[index];
        ident(&declared.name)?;
        let method = setter(declared.name.clone(), slot, type_tokens(&declared.param_type)?);
        model.add_trait_method(&trait_name, trait_path.clone(), method);
    }
    Ok(())
}

fn setter(name: String, slot: &str, ty: TokenStream) -> MethodSpec {
    let slot = format_ident!("{}", slot);
    MethodSpec::new(name)
        .receiver(Receiver::OwnedMut)
        .param("value", ty)
        .returns(quote! { Self })
        .body(quote! {
            self.#slot = ::core::option::Option::Some(value);
            self
        })
}

fn build_body(
    ctx: &EmitContext<'_>,
    target: &BuilderTarget<'_>,
    slots: &[String],
    shape: &ReturnShape,
    converted: bool,
) -> TokenStream {
    let mut statements = Vec::new();
    for (requirement, slot) in target.graph.requirements().iter().zip(slots) {
        let slot = format_ident!("{}", slot);
        let needs_instance = ctx.introspector.requires_passed_instance(requirement);
        let fail = shape.fail(requirement.ty.as_str(), converted);
        let stored = target.requirement_fields.field_for(&requirement.ty).is_some();
        let statement = match (stored, needs_instance) {
            (true, true) => quote! {
                let #slot = match self.#slot {
                    ::core::option::Option::Some(value) => value,
                    ::core::option::Option::None => #fail,
                };
            },
            (true, false) => quote! { let #slot = self.#slot.unwrap_or_default(); },
            (false, true) => quote! {
                if self.#slot.is_none() {
                    #fail;
                }
            },
            (false, false) => continue,
        };
        statements.push(statement);
    }

    let component = format_ident!("{}", target.component_name);
    let parent = target.parent_type.as_ref().map(|_| {
        let parent = format_ident!("{}", conventions::PARENT_FIELD);
        quote! { self.#parent, }
    });
    let args = target.requirement_fields.iter().map(|field| {
        let slot = slot_for(target, slots, &field.requirement.ty);
        format_ident!("{}", slot)
    });
    let value = shape.wrap(quote! { #component::new(#parent #(#args),*) });
    quote! {
        #(#statements)*
        #value
    }
}

fn slot_for<'a>(target: &BuilderTarget<'_>, slots: &'a [String], ty: &TypeRef) -> &'a str {
    target
        .graph
        .requirements()
        .iter()
        .position(|r| &r.ty == ty)
        .and_then(|index| slots.get(index))
        .map_or("value", String::as_str)
}
