//! Graph loading and the `emit` / `check` commands, driven by `tests/fixtures/components.json`.

use std::path::Path;

use wiregen::backend::{ComponentCodegen, EmitError, EmitOptions};
use wiregen::cli::ExitCode;
use wiregen::cli::commands::{check_file, emit_file, load_graphs};

const FIXTURE: &str = "tests/fixtures/components.json";

#[test]
fn test_fixture_loads_every_graph() {
    let graphs = load_graphs(Path::new(FIXTURE)).unwrap();
    assert_eq!(graphs.len(), 2);
    assert_eq!(graphs[0].component_type().as_str(), "crate::App");
    assert_eq!(graphs[0].subgraphs().len(), 1);
    assert_eq!(graphs[1].component_type().as_str(), "crate::Broken");
}

#[test]
fn test_fixture_generates_independently() {
    let graphs = load_graphs(Path::new(FIXTURE)).unwrap();
    let results = ComponentCodegen::new().generate_all(&graphs);

    let source = results[0].as_ref().unwrap();
    assert!(source.contains("pub struct WiredApp"));
    assert!(source.contains("pub struct Session<'p>"));
    assert!(source.contains("pub fn create() -> WiredApp"));
    assert!(source.contains("::wiregen_runtime::ReleasableCell<Greeter>"));
    assert!(matches!(results[1], Err(EmitError::GraphValidation(_))));
}

#[test]
fn test_check_reports_failing_component() {
    let err = check_file(Path::new(FIXTURE), EmitOptions::default()).unwrap_err();
    assert_eq!(err.exit_code, ExitCode::FAILURE);
    assert!(err.message.contains("crate::Broken"), "{}", err.message);
    assert!(err.message.contains("Missing"), "{}", err.message);
    assert!(!err.message.contains("crate::App`"), "{}", err.message);
}

#[test]
fn test_emit_missing_file_is_an_error() {
    let err = emit_file(Path::new("tests/fixtures/does_not_exist.json"), EmitOptions::default()).unwrap_err();
    assert!(err.message.starts_with("Error reading"));
}

#[test]
fn test_json_dependencies_must_be_supplied_by_the_caller() {
    let json = r#"{
        "descriptor": {"component_type": "crate::App"},
        "requirements": [
            {"ty": "crate::Platform", "kind": "dependency"},
            {"ty": "Config", "kind": "bound_instance"}
        ],
        "bindings": [
            {
                "key": {"ty": "Clock"},
                "kind": {"type": "dependency_method", "method": "clock"},
                "owner": {"kind": "dependency", "ty": "crate::Platform"}
            },
            {"key": {"ty": "Config"}, "kind": {"type": "bound_instance"}}
        ]
    }"#;
    let graphs = wiregen::cli::commands::parse_graphs(json).unwrap();
    let def = ComponentCodegen::new().try_write(&graphs[0]).unwrap();
    assert!(!def.has_method("create"));

    let builder = def.nested("Builder").unwrap();
    let build = builder.method("build").unwrap().body.to_string();
    assert!(build.contains("missing_requirement (\"crate::Platform\")"), "{build}");
    assert!(build.contains("missing_requirement (\"Config\")"), "{build}");
    assert!(!build.contains("unwrap_or_default"), "{build}");
}
