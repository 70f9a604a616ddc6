//! Component code generation facade
//!
//! This module provides `ComponentCodegen`, the single API for turning resolved graphs into Rust source:
//!
//! ```text
//! BindingGraph → RequirementPlan → ComponentEmitter → TypeDefinition → render_module (syn + prettyplease) → source
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wiregen::backend::ComponentCodegen;
//!
//! // Fallible API (recommended):
//! let codegen = ComponentCodegen::new();
//! let source = codegen.try_generate(&graph)?;
//!
//! // Convenience API (returns an error comment on failure):
//! let source = codegen.generate(&graph);
//! ```
//!
//! ## Error Handling
//!
//! The `try_*` methods return `Result<_, EmitError>`. Every top-level graph is generated independently:
//! [`ComponentCodegen::generate_all`] reports one result per graph, and a failure never affects the others.

use super::emit::ComponentEmitter;
use super::errors::EmitError;
use super::model::TypeDefinition;
use super::options::EmitOptions;
use super::render::render_module;
use crate::graph::{BindingGraph, CanonicalKeyFactory, DeclaredIntrospector, KeyFactory, RequirementIntrospector};

/// Generates component source with pluggable key canonicalization and requirement introspection.
pub struct ComponentCodegen {
    options: EmitOptions,
    key_factory: Box<dyn KeyFactory>,
    introspector: Box<dyn RequirementIntrospector>,
}

impl Default for ComponentCodegen {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentCodegen {
    /// Default options, [`CanonicalKeyFactory`] and [`DeclaredIntrospector`].
    pub fn new() -> Self {
        Self {
            options: EmitOptions::default(),
            key_factory: Box::new(CanonicalKeyFactory::new()),
            introspector: Box::new(DeclaredIntrospector),
        }
    }

    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_key_factory(mut self, key_factory: Box<dyn KeyFactory>) -> Self {
        self.key_factory = key_factory;
        self
    }

    pub fn with_introspector(mut self, introspector: Box<dyn RequirementIntrospector>) -> Self {
        self.introspector = introspector;
        self
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    fn emitter(&self) -> ComponentEmitter<'_> {
        ComponentEmitter::new(&self.options, self.key_factory.as_ref(), self.introspector.as_ref())
    }

    /// Emit the finished (unrendered) definition for `graph`.
    pub fn try_write(&self, graph: &BindingGraph) -> Result<TypeDefinition, EmitError> {
        self.emitter().write(graph)
    }

    /// Validate and emit `graph` without rendering it.
    pub fn check(&self, graph: &BindingGraph) -> Result<(), EmitError> {
        self.try_write(graph).map(|_| ())
    }

    /// Generate the formatted Rust module for `graph`.
    #[tracing::instrument(skip_all, fields(component = %graph.component_type()))]
    pub fn try_generate(&self, graph: &BindingGraph) -> Result<String, EmitError> {
        let definition = self.try_write(graph)?;
        render_module(&definition, &self.options)
    }

    /// Generate source for `graph`, or an error comment if generation fails.
    ///
    /// **Note**: prefer [`try_generate`](Self::try_generate) outside of debugging.
    pub fn generate(&self, graph: &BindingGraph) -> String {
        match self.try_generate(graph) {
            Ok(source) => source,
            Err(e) => format!("// Generation error: {e}\n"),
        }
    }

    /// Generate every top-level graph independently, one result per graph in input order.
    pub fn generate_all(&self, graphs: &[BindingGraph]) -> Vec<Result<String, EmitError>> {
        graphs.iter().map(|graph| self.try_generate(graph)).collect()
    }
}
