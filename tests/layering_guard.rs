//! Layering guardrails to keep the emitter independent of the runtime crate.
//!
//! The emitter (`wiregen` crate) only *names* `wiregen_runtime` items in generated code; it may use the runtime as a
//! **dev-dependency** (for tests that mirror generated containers). This test scans the root `Cargo.toml` and fails if
//! `wiregen_runtime` appears in `[dependencies]`.

#[test]
fn emitter_does_not_depend_on_runtime_in_main_dependencies() {
    let manifest = include_str!("../Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            if line == "[dependencies]" {
                in_dependencies = true;
                continue;
            }
            // Any new section after `[dependencies]` ends the scan window.
            if in_dependencies {
                break;
            }
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if line_no_comment.starts_with("wiregen_runtime") {
            panic!("`wiregen_runtime` must not appear in [dependencies]; use [dev-dependencies] instead");
        }
    }
}

#[test]
fn runtime_paths_in_generated_code_match_runtime_exports() {
    // Generated code names these items by absolute path.
    let _ = wiregen_runtime::ReleasableCell::<u8>::new();
    let _ = wiregen_runtime::SyncReleasableCell::<u8>::new();
    let _ = wiregen_runtime::BuildError::missing_requirement("ModuleA");
    fn assert_releasable<T: wiregen_runtime::Releasable>() {}
    assert_releasable::<wiregen_runtime::ReleasableCell<u8>>();
}
