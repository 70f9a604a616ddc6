//! Per-key expressions, storage and accessors.
//!
//! Every locally bound key gets a private accessor `provide_<key>(&self) -> K` on its generated struct. An expression
//! for a key is always a call of the nearest accessor (`self.provide_foo()`, or `self.parent.provide_foo()` for an
//! inherited key), so scoping policy lives in exactly one place: the accessor body.
//!
//! Accessor names are declared for the whole graph before any body is emitted. Bodies can then refer to each other
//! in any order.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;

use super::optional_factories::OptionalBindingFactory;
use super::release_manager::ScopedReferenceReleaseManager;
use super::requirement_fields::requirement_expr;
use super::{EmitContext, StructScope, expr_tokens, ident, type_tokens};
use crate::backend::errors::{EmitError, GraphValidationError};
use crate::backend::model::{FieldRole, FieldSpec, GeneratedComponentModel, MethodSpec};
use crate::backend::options::ThreadSafety;
use crate::graph::{Binding, BindingGraph, BindingKind, BindingOwner, Key, MultibindingCollection, Scope, TypeRef};

/// Resolves keys to expressions inside one generated struct and emits that struct's accessors.
pub struct BindingExpressionResolver<'s> {
    ctx: EmitContext<'s>,
    scope: &'s StructScope<'s>,
    optionals: OptionalBindingFactory,
    releases: ScopedReferenceReleaseManager,
}

impl<'s> BindingExpressionResolver<'s> {
    pub(crate) fn new(ctx: EmitContext<'s>, scope: &'s StructScope<'s>) -> Self {
        Self {
            ctx,
            scope,
            optionals: OptionalBindingFactory::new(),
            releases: ScopedReferenceReleaseManager::new(),
        }
    }

    /// Claim an accessor name for every local binding of `graph`, in key order.
    pub fn declare_accessors(
        model: &mut GeneratedComponentModel,
        graph: &BindingGraph,
    ) -> Result<HashMap<Key, String>, EmitError> {
        let mut accessors = HashMap::new();
        for binding in graph.bindings() {
            let name = model.unique_method_name(&format!(
                "{}{}",
                conventions::ACCESSOR_PREFIX,
                binding.key.identifier_base()
            ))?;
            accessors.insert(binding.key.clone(), name);
        }
        Ok(accessors)
    }

    /// Expression yielding the value of `key`, valid inside any method of the current struct.
    pub fn resolve(&mut self, model: &mut GeneratedComponentModel, key: &Key) -> Result<TokenStream, EmitError> {
        let scope = self.scope;
        for (receiver, s) in scope.ancestry() {
            if let Some(accessor) = s.accessors.get(key) {
                let accessor = format_ident!("{}", accessor);
                return Ok(quote! { #receiver.#accessor() });
            }
        }
        if let Some(underlying) = self.ctx.key_factory.optional_underlying(key) {
            return self.resolve_optional(model, &underlying);
        }
        Err(GraphValidationError::MissingBinding {
            key: key.clone(),
            requested_by: "an emitted expression".to_string(),
            component: scope.graph.component_type().clone(),
        }
        .into())
    }

    /// Call of the `Option<K>` factory for `underlying`, emitting it on first use.
    fn resolve_optional(
        &mut self,
        model: &mut GeneratedComponentModel,
        underlying: &Key,
    ) -> Result<TokenStream, EmitError> {
        if let Some(call) = self.optionals.existing(underlying) {
            return Ok(call);
        }
        let present = if self.scope.binds(underlying) {
            Some(self.resolve(model, underlying)?)
        } else {
            None
        };
        let value_ty = type_tokens(&underlying.ty)?;
        self.optionals.create(model, underlying, &value_ty, present)
    }

    /// Emit the accessor (and storage, for scoped bindings) of a local binding.
    pub fn emit_binding(&mut self, model: &mut GeneratedComponentModel, binding: &Binding) -> Result<(), EmitError> {
        let Some(accessor) = self.scope.accessors.get(&binding.key).cloned() else {
            return Err(GraphValidationError::MissingBinding {
                key: binding.key.clone(),
                requested_by: "its own accessor".to_string(),
                component: self.scope.graph.component_type().clone(),
            }
            .into());
        };
        let value_ty = type_tokens(&binding.key.ty)?;

        let body = match &binding.kind {
            BindingKind::Delegate { target } => {
                if binding.scope.is_scoped() {
                    tracing::debug!(key = %binding.key, target = %target, "delegate aliases its target; scope ignored");
                }
                self.resolve(model, target)?
            }
            _ => {
                let production = self.production(model, binding)?;
                self.apply_scope(model, binding, &value_ty, production)?
            }
        };

        model.add_method(MethodSpec::new(accessor).returns(value_ty).body(body));
        Ok(())
    }

    /// Emit the release dispatch for every releasable holder registered so far.
    pub fn finish(self, model: &mut GeneratedComponentModel) -> Result<(), EmitError> {
        self.releases.emit_dispatch(model)
    }

    /// Expression computing a fresh instance of `binding`.
    fn production(&mut self, model: &mut GeneratedComponentModel, binding: &Binding) -> Result<TokenStream, EmitError> {
        let mut args = Vec::with_capacity(binding.dependencies.len());
        for dependency in &binding.dependencies {
            args.push(self.resolve(model, dependency)?);
        }

        let expr = match &binding.kind {
            BindingKind::Injection { constructor } => {
                let ty = type_tokens(&binding.key.ty)?;
                let constructor = ident(constructor)?;
                quote! { <#ty>::#constructor(#(#args),*) }
            }
            BindingKind::Provision { method, is_static } => {
                let module = owner_type(binding)?;
                let method = ident(method)?;
                if *is_static {
                    let module = type_tokens(module)?;
                    quote! { <#module>::#method(#(#args),*) }
                } else {
                    let instance = self.requirement(binding, module)?;
                    quote! { #instance.#method(#(#args),*) }
                }
            }
            BindingKind::BoundInstance => {
                let instance = self.requirement(binding, &binding.key.ty)?;
                quote! { ::core::clone::Clone::clone(&#instance) }
            }
            BindingKind::DependencyMethod { method } => {
                let dependency = owner_type(binding)?;
                let instance = self.requirement(binding, dependency)?;
                let method = ident(method)?;
                quote! { #instance.#method() }
            }
            BindingKind::Multibinding { .. } if args.is_empty() => {
                quote! { ::core::default::Default::default() }
            }
            BindingKind::Multibinding {
                collection: MultibindingCollection::Set,
            } => quote! { [#(#args),*].into_iter().collect() },
            BindingKind::Multibinding {
                collection: MultibindingCollection::Map { keys },
            } => {
                let keys = keys.iter().map(|k| expr_tokens(k)).collect::<Result<Vec<_>, _>>()?;
                quote! { [#((#keys, #args)),*].into_iter().collect() }
            }
            BindingKind::OptionalWrapper { underlying } => self.resolve_optional(model, underlying)?,
            BindingKind::Delegate { target } => self.resolve(model, target)?,
        };
        Ok(expr)
    }

    /// Wrap `production` according to the binding's scope.
    fn apply_scope(
        &mut self,
        model: &mut GeneratedComponentModel,
        binding: &Binding,
        value_ty: &TokenStream,
        production: TokenStream,
    ) -> Result<TokenStream, EmitError> {
        let options = self.ctx.options;
        match &binding.scope {
            Scope::Unscoped => Ok(production),
            Scope::Memoized => memoize(model, binding, value_ty, options.memoization, production),
            Scope::Releasable { name } if options.release_manager => {
                self.releases
                    .register(model, binding, name, value_ty, options.releasable, production)
            }
            Scope::Releasable { name } => {
                tracing::debug!(key = %binding.key, scope = %name, "release manager disabled; memoizing instead");
                memoize(model, binding, value_ty, options.memoization, production)
            }
        }
    }

    fn requirement(&self, binding: &Binding, ty: &TypeRef) -> Result<TokenStream, EmitError> {
        requirement_expr(self.scope, ty).ok_or_else(|| {
            GraphValidationError::MissingRequirement {
                requirement: ty.clone(),
                binding: binding.key.clone(),
                component: self.scope.graph.component_type().clone(),
            }
            .into()
        })
    }
}

/// Per-instance storage: the empty cell is the uninitialized state, the accessor clones the stored value.
fn memoize(
    model: &mut GeneratedComponentModel,
    binding: &Binding,
    value_ty: &TokenStream,
    policy: ThreadSafety,
    production: TokenStream,
) -> Result<TokenStream, EmitError> {
    let field = model.unique_field_name(&format!(
        "{}{}",
        binding.key.identifier_base(),
        conventions::MEMOIZED_FIELD_SUFFIX
    ))?;
    let cell = match policy {
        ThreadSafety::SingleThreaded => quote! { ::std::cell::OnceCell },
        ThreadSafety::Synchronized => quote! { ::std::sync::OnceLock },
    };
    model.add_field(FieldSpec::initialized(
        field.clone(),
        quote! { #cell<#value_ty> },
        FieldRole::Memoized,
        quote! { #cell::new() },
    ));
    let field = format_ident!("{}", field);
    Ok(quote! { ::core::clone::Clone::clone(self.#field.get_or_init(|| #production)) })
}

fn owner_type(binding: &Binding) -> Result<&TypeRef, EmitError> {
    match &binding.owner {
        BindingOwner::Module { ty } | BindingOwner::Dependency { ty } => Ok(ty),
        BindingOwner::Component => Err(GraphValidationError::InvalidBinding {
            key: binding.key.clone(),
            reason: "no owning module or dependency".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::emit::naming::SubcomponentNamer;
    use crate::backend::emit::requirement_fields::RequirementFieldAllocator;
    use crate::backend::model::TypeDefinition;
    use crate::backend::options::EmitOptions;
    use crate::backend::plan::RequirementPlan;
    use crate::graph::{CanonicalKeyFactory, ComponentDescriptor, ComponentRequirement, DeclaredIntrospector};

    /// Emit every local binding of a top-level graph and return the finished definition.
    fn emit(graph: &BindingGraph, options: &EmitOptions) -> TypeDefinition {
        let plan = RequirementPlan::build(graph, &CanonicalKeyFactory, options).unwrap();
        let namer = SubcomponentNamer::for_root(graph, "WiredApp").unwrap();
        let ctx = EmitContext {
            options,
            key_factory: &CanonicalKeyFactory,
            introspector: &DeclaredIntrospector,
            plan: &plan,
            namer: &namer,
        };
        let mut model = GeneratedComponentModel::for_component("WiredApp");
        model.reserve_method_name(conventions::RELEASE_ALL_METHOD).unwrap();
        let requirement_fields = RequirementFieldAllocator::allocate(&ctx, &mut model, graph, &[]).unwrap();
        let accessors = BindingExpressionResolver::declare_accessors(&mut model, graph).unwrap();
        let scope = StructScope {
            graph,
            type_tokens: quote! { WiredApp },
            requirement_fields,
            accessors,
            parent: None,
        };
        let mut resolver = BindingExpressionResolver::new(ctx, &scope);
        for binding in graph.bindings() {
            resolver.emit_binding(&mut model, binding).unwrap();
        }
        resolver.finish(&mut model).unwrap();
        model.finalize()
    }

    fn body(def: &TypeDefinition, method: &str) -> String {
        def.method(method).unwrap().body.to_string()
    }

    fn app() -> BindingGraph {
        BindingGraph::new(ComponentDescriptor::new("crate::App"))
    }

    #[test]
    fn test_unscoped_injection_recomputes() {
        let graph = app()
            .with_binding(Binding::injection(Key::of("Foo"), vec![Key::of("Bar")]))
            .with_binding(Binding::injection(Key::of("Bar"), vec![]));
        let def = emit(&graph, &EmitOptions::default());
        assert_eq!(body(&def, "provide_foo"), "< Foo > :: new (self . provide_bar ())");
        assert!(def.fields.is_empty());
    }

    #[test]
    fn test_memoized_binding_uses_cell_policy() {
        let graph = app().with_binding(Binding::injection(Key::of("Foo"), vec![]).with_scope(Scope::Memoized));

        let def = emit(&graph, &EmitOptions::default());
        let field = def.field("foo_instance").unwrap();
        assert_eq!(field.ty.to_string(), ":: std :: cell :: OnceCell < Foo >");
        assert!(body(&def, "provide_foo").contains("get_or_init"));

        let def = emit(&graph, &EmitOptions::new().with_memoization(ThreadSafety::Synchronized));
        assert_eq!(def.field("foo_instance").unwrap().ty.to_string(), ":: std :: sync :: OnceLock < Foo >");
    }

    #[test]
    fn test_delegate_aliases_target_without_storage() {
        let graph = app()
            .with_binding(Binding::injection(Key::of("Arc<ServiceImpl>"), vec![]).with_scope(Scope::Memoized))
            .with_binding(Binding::delegate(Key::of("Arc<dyn Service>"), Key::of("Arc<ServiceImpl>")).with_scope(Scope::Memoized));
        let def = emit(&graph, &EmitOptions::default());
        assert_eq!(def.fields_with_role(FieldRole::Memoized).count(), 1);
        assert_eq!(body(&def, "provide_service"), "self . provide_service_impl ()");
    }

    #[test]
    fn test_requirement_backed_bindings() {
        let graph = app()
            .with_requirement(ComponentRequirement::module_instance("ModuleA"))
            .with_requirement(ComponentRequirement::dependency("crate::Platform"))
            .with_requirement(ComponentRequirement::bound_instance("Config"))
            .with_binding(Binding::provision(Key::of("Foo"), "ModuleA", "foo", vec![]))
            .with_binding(Binding::static_provision(Key::of("Bar"), "ModuleA", "bar", vec![]))
            .with_binding(Binding::dependency_method(Key::of("Clock"), "crate::Platform", "clock"))
            .with_binding(Binding::bound_instance(Key::of("Config")));
        let def = emit(&graph, &EmitOptions::default());
        assert_eq!(body(&def, "provide_foo"), "self . module_a . foo ()");
        assert_eq!(body(&def, "provide_bar"), "< ModuleA > :: bar ()");
        assert_eq!(body(&def, "provide_clock"), "self . platform . clock ()");
        assert_eq!(body(&def, "provide_config"), ":: core :: clone :: Clone :: clone (& self . config)");
    }

    #[test]
    fn test_optional_present_and_absent() {
        let graph = app()
            .with_binding(Binding::injection(Key::of("Foo"), vec![Key::of("Option<Bar>"), Key::of("Option<Baz>")]))
            .with_binding(Binding::injection(Key::of("Bar"), vec![]));
        let def = emit(&graph, &EmitOptions::default());
        assert_eq!(
            body(&def, "provide_foo"),
            "< Foo > :: new (self . optional_bar () , self . optional_baz ())"
        );
        assert!(body(&def, "optional_bar").contains("Some (self . provide_bar ())"));
        assert!(body(&def, "optional_baz").contains("None"));
    }

    #[test]
    fn test_multibindings() {
        let graph = app()
            .with_binding(Binding::injection(Key::qualified("Box<dyn Plugin>", "a"), vec![]))
            .with_binding(Binding::multibound_set(Key::of("Vec<Box<dyn Plugin>>"), vec![Key::qualified(
                "Box<dyn Plugin>",
                "a",
            )]))
            .with_binding(Binding::multibound_map(Key::of("HashMap<&'static str, Box<dyn Plugin>>"), vec![(
                "\"a\"".to_string(),
                Key::qualified("Box<dyn Plugin>", "a"),
            )]))
            .with_binding(Binding::multibound_set(Key::of("Vec<u8>"), vec![]));
        let def = emit(&graph, &EmitOptions::default());
        assert_eq!(body(&def, "provide_vec_plugin"), "[self . provide_a_plugin ()] . into_iter () . collect ()");
        assert_eq!(
            body(&def, "provide_hash_map_str_plugin"),
            "[(\"a\" , self . provide_a_plugin ())] . into_iter () . collect ()"
        );
        assert_eq!(body(&def, "provide_vec_u8"), ":: core :: default :: Default :: default ()");
    }

    #[test]
    fn test_releasable_binding_registers_holder() {
        let graph = app().with_binding(
            Binding::injection(Key::of("Foo"), vec![]).with_scope(Scope::Releasable { name: "request".into() }),
        );
        let def = emit(&graph, &EmitOptions::default());
        assert!(def.field("foo_ref").is_some());
        assert!(def.has_method("release_all_references"));
        assert!(def.has_method("release_request_references"));

        let def = emit(&graph, &EmitOptions::new().with_release_manager(false));
        assert!(def.field("foo_ref").is_none());
        assert!(def.field("foo_instance").is_some());
        assert!(!def.has_method("release_all_references"));
    }
}
