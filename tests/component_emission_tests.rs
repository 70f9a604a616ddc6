//! End-to-end emission tests
//!
//! These drive `ComponentCodegen` with hand-built resolved graphs and check the emitted definitions (and, where the
//! surface matters, the rendered source).

use wiregen::backend::model::{FieldRole, TypeDefinition, TypeKind};
use wiregen::backend::{ComponentCodegen, EmitError, EmitOptions, ThreadSafety};
use wiregen::graph::{
    Binding, BindingGraph, BuildMethodSpec, BuilderSpec, ComponentDescriptor, ComponentMethod, ComponentRequirement,
    FactoryParam, Key, Scope,
};

fn app() -> BindingGraph {
    BindingGraph::new(ComponentDescriptor::new("crate::App"))
}

fn write(graph: &BindingGraph) -> TypeDefinition {
    ComponentCodegen::new().try_write(graph).expect("graph should emit")
}

fn render(graph: &BindingGraph) -> String {
    ComponentCodegen::new()
        .with_options(EmitOptions::new().without_header())
        .try_generate(graph)
        .expect("graph should render")
}

fn builder(def: &TypeDefinition) -> &TypeDefinition {
    def.nested_of_kind(TypeKind::Builder).expect("component should have a builder")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_no_requirements_gets_create_and_empty_builder() {
    let graph = app().with_binding(Binding::injection(Key::of("Foo"), vec![]));
    let def = write(&graph);

    assert_eq!(def.name, "WiredApp");
    assert!(def.has_method("create"));
    assert!(def.has_method("builder"));
    assert_eq!(def.method("provide_foo").unwrap().body.to_string(), "< Foo > :: new ()");

    let builder = builder(&def);
    assert_eq!(builder.name, "Builder");
    assert_eq!(builder.fields_with_role(FieldRole::BuilderSlot).count(), 0);
    assert_eq!(builder.method_names(), vec!["new", "build"]);

    let source = render(&graph);
    assert!(source.contains("pub fn create() -> WiredApp"));
    assert!(source.contains("pub fn builder() -> Builder"));
}

#[test]
fn test_instance_requirement_needs_setter_and_has_no_create() {
    let graph = app()
        .with_requirement(ComponentRequirement::module_instance("ModuleA"))
        .with_binding(Binding::provision(Key::of("Foo"), "ModuleA", "foo", vec![]));
    let def = write(&graph);

    assert!(!def.has_method("create"));
    assert!(def.field("module_a").is_some_and(|f| f.role == FieldRole::Requirement));

    let builder = builder(&def);
    assert_eq!(builder.method_names(), vec!["new", "module_a", "build"]);
    let build = builder.method("build").unwrap();
    assert!(build.body.to_string().contains("missing_requirement (\"ModuleA\")"));
    assert_eq!(
        build.return_type.as_ref().unwrap().to_string(),
        ":: core :: result :: Result < WiredApp , :: wiregen_runtime :: BuildError >"
    );

    let source = render(&graph);
    assert!(source.contains("pub fn module_a(mut self, value: ModuleA) -> Self"));
    assert!(!source.contains("pub fn create"));
}

#[test]
fn test_sibling_subcomponents_named_sub_are_disambiguated() {
    let graph = app()
        .with_method(ComponentMethod::subcomponent_factory("first", 0, vec![]))
        .with_method(ComponentMethod::subcomponent_factory("second", 1, vec![]))
        .with_subgraph(BindingGraph::new(ComponentDescriptor::new("crate::a::Sub")))
        .with_subgraph(BindingGraph::new(ComponentDescriptor::new("crate::b::Sub")));
    let def = write(&graph);

    let names: Vec<_> = def.nested_types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Builder", "Sub", "Sub2"]);

    let imp = def.trait_impl("crate::App").unwrap();
    assert_eq!(imp.method("first").unwrap().body.to_string(), "Sub :: new (self ,)");
    assert_eq!(imp.method("second").unwrap().body.to_string(), "Sub2 :: new (self ,)");

    assert_eq!(render(&graph), render(&graph));
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_declared_builder_keeps_declared_names() {
    let graph = app()
        .with_requirement(ComponentRequirement::module_instance("ModuleA"))
        .with_binding(Binding::provision(Key::of("Foo"), "ModuleA", "foo", vec![]))
        .with_builder_spec(
            BuilderSpec::new("crate::AppBuilder", BuildMethodSpec::new("assemble", "Box<dyn crate::App>"))
                .with_setter("with_module", "ModuleA"),
        );
    let def = write(&graph);

    let builder = builder(&def);
    let imp = builder.trait_impl("crate::AppBuilder").unwrap();
    let names: Vec<_> = imp.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["with_module", "assemble"]);

    let assemble = imp.method("assemble").unwrap().body.to_string();
    assert!(assemble.contains(":: std :: boxed :: Box :: new (WiredApp :: new (module_a))"));
    assert!(assemble.contains(". raise ()"));
    assert_eq!(
        def.method("builder").unwrap().return_type.as_ref().unwrap().to_string(),
        "impl crate :: AppBuilder"
    );
}

#[test]
fn test_create_calls_declared_build_method() {
    let graph = app()
        .with_requirement(ComponentRequirement::module("ModuleB"))
        .with_builder_spec(
            BuilderSpec::new(
                "crate::AppBuilder",
                BuildMethodSpec::new("finish", "Result<impl crate::App, crate::Error>"),
            )
            .with_setter("module_b", "ModuleB"),
        );
    let def = write(&graph);

    let create = def.method("create").unwrap();
    let body = create.body.to_string();
    assert!(body.contains("< Builder as crate :: AppBuilder > :: finish (Builder :: new ())"));
    assert!(body.contains("unreachable !"));
    assert_eq!(create.return_type.as_ref().unwrap().to_string(), "impl crate :: App");
}

#[test]
fn test_declared_builder_must_match_requirements() {
    let graph = app()
        .with_requirement(ComponentRequirement::module_instance("ModuleA"))
        .with_builder_spec(
            BuilderSpec::new("crate::AppBuilder", BuildMethodSpec::new("build", "impl crate::App"))
                .with_setter("other", "Other"),
        );
    let err = ComponentCodegen::new().try_write(&graph).unwrap_err();
    let EmitError::ArityMismatch(err) = err else {
        panic!("expected an arity mismatch, got {err:?}");
    };
    assert_eq!(err.api, "crate::AppBuilder");
    assert_eq!(err.missing, vec![wiregen::graph::TypeRef::from("ModuleA")]);
    assert_eq!(err.extra, vec!["fn other(Other)".to_string()]);
}

#[test]
fn test_subcomponent_builder_method() {
    let child = BindingGraph::new(ComponentDescriptor::new("crate::Session"))
        .with_requirement(ComponentRequirement::bound_instance("UserId"))
        .with_binding(Binding::bound_instance(Key::of("UserId")))
        .with_builder_spec(
            BuilderSpec::new("crate::SessionBuilder", BuildMethodSpec::new("build", "impl crate::Session + 'p"))
                .with_setter("user", "UserId"),
        );
    let graph = app()
        .with_method(ComponentMethod::subcomponent_builder("session", 0))
        .with_subgraph(child);
    let def = write(&graph);

    let method = def.trait_impl("crate::App").unwrap().method("session").unwrap();
    assert_eq!(method.body.to_string(), "SessionBuilder :: new (self)");
    assert_eq!(
        method.return_type.as_ref().unwrap().to_string(),
        "impl crate :: SessionBuilder + '_"
    );

    let session = def.nested("Session").unwrap();
    let session_builder = session.nested("SessionBuilder").unwrap();
    assert!(session_builder.has_parent_lifetime);
    assert_eq!(
        session_builder.constructor_params().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["parent"]
    );
}

#[test]
fn test_subcomponent_builder_without_spec_is_rejected() {
    let graph = app()
        .with_method(ComponentMethod::subcomponent_builder("session", 0))
        .with_subgraph(BindingGraph::new(ComponentDescriptor::new("crate::Session")));
    assert!(matches!(
        ComponentCodegen::new().try_write(&graph),
        Err(EmitError::GraphValidation(_))
    ));
}

#[test]
fn test_factory_parameters_supply_child_requirements() {
    let child = BindingGraph::new(ComponentDescriptor::new("crate::Request"))
        .with_requirement(ComponentRequirement::bound_instance("RequestId"))
        .with_requirement(ComponentRequirement::module_instance("RequestModule"))
        .with_binding(Binding::bound_instance(Key::of("RequestId")))
        .with_binding(Binding::provision(Key::of("Handler"), "RequestModule", "handler", vec![Key::of("RequestId")]));
    let graph = app()
        .with_method(ComponentMethod::subcomponent_factory("request", 0, vec![
            FactoryParam::new("module", "RequestModule"),
            FactoryParam::new("id", "RequestId"),
        ]))
        .with_subgraph(child);
    let def = write(&graph);

    let factory = def.trait_impl("crate::App").unwrap().method("request").unwrap();
    assert_eq!(factory.param_names(), vec!["module", "id"]);
    assert_eq!(factory.body.to_string(), "Request :: new (self , id , module)");

    let missing = app()
        .with_method(ComponentMethod::subcomponent_factory("request", 0, vec![FactoryParam::new("id", "RequestId")]))
        .with_subgraph(
            BindingGraph::new(ComponentDescriptor::new("crate::Request"))
                .with_requirement(ComponentRequirement::module_instance("RequestModule")),
        );
    assert!(matches!(
        ComponentCodegen::new().try_write(&missing),
        Err(EmitError::ArityMismatch(_))
    ));
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_memoized_binding_is_stored_once_unscoped_is_not() {
    let graph = app()
        .with_binding(Binding::injection(Key::of("Cache"), vec![]).with_scope(Scope::Memoized))
        .with_binding(Binding::injection(Key::of("Request"), vec![Key::of("Cache")]));
    let def = write(&graph);

    let stored: Vec<_> = def.fields_with_role(FieldRole::Memoized).map(|f| f.name.as_str()).collect();
    assert_eq!(stored, vec!["cache_instance"]);
    assert_eq!(
        def.method("provide_cache").unwrap().body.to_string(),
        ":: core :: clone :: Clone :: clone (self . cache_instance . get_or_init (|| < Cache > :: new ()))"
    );
    assert_eq!(
        def.method("provide_request").unwrap().body.to_string(),
        "< Request > :: new (self . provide_cache ())"
    );
}

#[test]
fn test_synchronized_policy_uses_sync_storage() {
    let graph = app()
        .with_binding(Binding::injection(Key::of("Cache"), vec![]).with_scope(Scope::Memoized))
        .with_binding(
            Binding::injection(Key::of("Session"), vec![]).with_scope(Scope::Releasable { name: "session".into() }),
        );
    let options = EmitOptions::new().with_thread_safety(ThreadSafety::Synchronized);
    let def = ComponentCodegen::new().with_options(options).try_write(&graph).unwrap();

    assert_eq!(
        def.field("cache_instance").unwrap().ty.to_string(),
        ":: std :: sync :: OnceLock < Cache >"
    );
    assert_eq!(
        def.field("session_ref").unwrap().ty.to_string(),
        ":: wiregen_runtime :: SyncReleasableCell < Session >"
    );
}

#[test]
fn test_release_methods_per_struct() {
    let child = BindingGraph::new(ComponentDescriptor::new("crate::Sub"))
        .with_binding(Binding::injection(Key::of("Local"), vec![]).with_scope(Scope::Releasable { name: "Screen".into() }));
    let graph = app()
        .with_binding(Binding::injection(Key::of("Cache"), vec![]).with_scope(Scope::Releasable { name: "memory".into() }))
        .with_method(ComponentMethod::subcomponent_factory("sub", 0, vec![]))
        .with_subgraph(child);
    let def = write(&graph);

    assert!(def.has_method("release_all_references"));
    assert!(def.has_method("release_memory_references"));
    assert!(!def.has_method("release_screen_references"));

    let sub = def.nested("Sub").unwrap();
    assert!(sub.has_method("release_all_references"));
    assert!(sub.has_method("release_screen_references"));
    assert!(
        sub.method("release_screen_references")
            .unwrap()
            .body
            .to_string()
            .contains("local_ref")
    );
}

#[test]
fn test_disabled_release_manager_memoizes() {
    let graph = app()
        .with_binding(Binding::injection(Key::of("Cache"), vec![]).with_scope(Scope::Releasable { name: "memory".into() }));
    let options = EmitOptions::new().with_release_manager(false);
    let def = ComponentCodegen::new().with_options(options).try_write(&graph).unwrap();

    assert!(def.field("cache_instance").is_some());
    assert_eq!(def.fields_with_role(FieldRole::Releasable).count(), 0);
    assert!(!def.method_names().iter().any(|m| m.starts_with("release_")));
}

#[test]
fn test_scope_named_all_is_a_naming_collision() {
    let graph = app()
        .with_binding(Binding::injection(Key::of("Cache"), vec![]).with_scope(Scope::Releasable { name: "all".into() }));
    assert!(matches!(
        ComponentCodegen::new().try_write(&graph),
        Err(EmitError::NamingCollision(_))
    ));
}

// ============================================================================
// Optional bindings
// ============================================================================

#[test]
fn test_optional_toggle_only_changes_wrapper_branch() {
    let base = app()
        .with_binding(Binding::injection(Key::of("Foo"), vec![Key::of("Option<Bar>")]))
        .with_binding(Binding::injection(Key::of("Baz"), vec![Key::of("Option<Bar>")]));
    let with_bar = write(&base.clone().with_binding(Binding::injection(Key::of("Bar"), vec![])));
    let without_bar = write(&base);

    let summary = |def: &TypeDefinition| -> Vec<(String, String, String)> {
        def.methods
            .iter()
            .filter(|m| m.name != "provide_bar")
            .map(|m| {
                let ret = m.return_type.as_ref().map(ToString::to_string).unwrap_or_default();
                let body = if m.name == "optional_bar" { String::new() } else { m.body.to_string() };
                (m.name.clone(), ret, body)
            })
            .collect()
    };
    assert_eq!(summary(&with_bar), summary(&without_bar));

    let present = with_bar.method("optional_bar").unwrap().body.to_string();
    let absent = without_bar.method("optional_bar").unwrap().body.to_string();
    assert_eq!(present, ":: core :: option :: Option :: Some (self . provide_bar ())");
    assert_eq!(absent, ":: core :: option :: Option :: None");

    // One factory, shared by both use sites.
    assert_eq!(
        with_bar.method_names().iter().filter(|m| m.starts_with("optional_")).count(),
        1
    );
}

#[test]
fn test_optional_binding_sees_ancestor_binding() {
    let child = BindingGraph::new(ComponentDescriptor::new("crate::Sub"))
        .with_binding(Binding::optional(Key::of("Option<Bar>"), Key::of("Bar")));
    let graph = app()
        .with_binding(Binding::injection(Key::of("Bar"), vec![]))
        .with_method(ComponentMethod::subcomponent_factory("sub", 0, vec![]))
        .with_subgraph(child);
    let def = write(&graph);

    let sub = def.nested("Sub").unwrap();
    assert_eq!(
        sub.method("optional_bar").unwrap().body.to_string(),
        ":: core :: option :: Option :: Some (self . parent . provide_bar ())"
    );
    assert_eq!(sub.method("provide_option_bar").unwrap().body.to_string(), "self . optional_bar ()");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_sibling_bindings_are_not_visible() {
    let graph = app()
        .with_method(ComponentMethod::subcomponent_factory("left", 0, vec![]))
        .with_method(ComponentMethod::subcomponent_factory("right", 1, vec![]))
        .with_subgraph(
            BindingGraph::new(ComponentDescriptor::new("crate::Left"))
                .with_binding(Binding::injection(Key::of("Shared"), vec![])),
        )
        .with_subgraph(
            BindingGraph::new(ComponentDescriptor::new("crate::Right"))
                .with_binding(Binding::injection(Key::of("User"), vec![Key::of("Shared")])),
        );
    let err = ComponentCodegen::new().try_write(&graph).unwrap_err();
    assert!(err.to_string().contains("no binding for `Shared`"), "{err}");
}

#[test]
fn test_strict_validation_rejects_shadowing() {
    let graph = app()
        .with_binding(Binding::injection(Key::of("Foo"), vec![]))
        .with_method(ComponentMethod::subcomponent_factory("sub", 0, vec![]))
        .with_subgraph(
            BindingGraph::new(ComponentDescriptor::new("crate::Sub"))
                .with_binding(Binding::injection(Key::of("Foo"), vec![])),
        );
    assert!(ComponentCodegen::new().try_write(&graph).is_ok());

    let strict = ComponentCodegen::new().with_options(EmitOptions::new().with_strict_validation(true));
    assert!(matches!(strict.try_write(&graph), Err(EmitError::GraphValidation(_))));
}

#[test]
fn test_failing_component_does_not_affect_siblings() {
    let broken = app().with_binding(Binding::injection(Key::of("Foo"), vec![Key::of("Missing")]));
    let fine = BindingGraph::new(ComponentDescriptor::new("crate::Other"))
        .with_binding(Binding::injection(Key::of("Foo"), vec![]));
    let results = ComponentCodegen::new().generate_all(&[broken, fine.clone()]);

    assert!(matches!(results[0], Err(EmitError::GraphValidation(_))));
    assert_eq!(results[1].as_ref().unwrap(), &ComponentCodegen::new().try_generate(&fine).unwrap());
}

#[test]
fn test_rendered_module_shape() {
    let source = ComponentCodegen::new()
        .try_generate(&app().with_binding(Binding::injection(Key::of("Foo"), vec![])))
        .unwrap();
    assert!(source.starts_with("// Generated by wiregen v"));
    assert!(source.contains("pub mod wired_app {"));
    assert!(source.contains("use super::*;"));
    assert!(source.contains("impl crate::App for WiredApp"));
    assert!(source.contains("#[allow("));
}
