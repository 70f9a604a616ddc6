//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::backend::{ComponentCodegen, EmitError, EmitOptions};
use crate::graph::BindingGraph;

use super::{CliError, CliResult, ExitCode};

/// A graph file holds one top-level graph or several.
#[derive(Deserialize)]
#[serde(untagged)]
enum GraphFile {
    Many(Vec<BindingGraph>),
    One(Box<BindingGraph>),
}

/// Load every top-level graph from a JSON file.
pub fn load_graphs(path: &Path) -> CliResult<Vec<BindingGraph>> {
    let source = fs::read_to_string(path)
        .map_err(|e| CliError::failure(format!("Error reading {}: {}", path.display(), e)))?;
    parse_graphs(&source).map_err(|e| CliError::failure(format!("Error parsing {}: {}", path.display(), e)))
}

/// Parse one graph or an array of graphs.
pub fn parse_graphs(source: &str) -> Result<Vec<BindingGraph>, serde_json::Error> {
    Ok(match serde_json::from_str::<GraphFile>(source)? {
        GraphFile::Many(graphs) => graphs,
        GraphFile::One(graph) => vec![*graph],
    })
}

/// Print the generated module of every graph. Graphs that fail are reported after the others are printed.
pub fn emit_file(path: &Path, options: EmitOptions) -> CliResult<ExitCode> {
    let graphs = load_graphs(path)?;
    let codegen = ComponentCodegen::new().with_options(options);

    let mut failures = Vec::new();
    for (graph, result) in graphs.iter().zip(codegen.generate_all(&graphs)) {
        match result {
            Ok(source) => println!("{source}"),
            Err(e) => failures.push(render_error(graph, e)),
        }
    }
    finish(failures)
}

/// Validate and emit every graph without printing.
pub fn check_file(path: &Path, options: EmitOptions) -> CliResult<ExitCode> {
    let graphs = load_graphs(path)?;
    let codegen = ComponentCodegen::new().with_options(options);

    let failures: Vec<String> = graphs
        .iter()
        .filter_map(|graph| codegen.check(graph).err().map(|e| render_error(graph, e)))
        .collect();
    if failures.is_empty() {
        println!("{} component(s) OK", graphs.len());
    }
    finish(failures)
}

fn finish(failures: Vec<String>) -> CliResult<ExitCode> {
    if failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::failure(failures.join("\n")))
    }
}

/// Render an emission error with its diagnostic code and help.
fn render_error(graph: &BindingGraph, error: EmitError) -> String {
    let report = miette::Report::new(error);
    format!("error in `{}`:\n{:?}", graph.component_type(), report)
}
