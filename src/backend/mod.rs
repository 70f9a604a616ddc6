//! wiregen backend
//!
//! This module turns resolved binding graphs into Rust source for concrete dependency-injection containers.
//!
//! The pipeline is:
//! 1. `plan` validates the whole component tree and decides which struct stores each requirement
//! 2. `emit` builds a [`model::TypeDefinition`] per component (struct, builder, nested subcomponents)
//! 3. `render` formats the definition as a Rust module
//!
//! ## Module Organization
//!
//! - `options.rs` - Feature flags (`EmitOptions`)
//! - `errors.rs` - Emission error taxonomy
//! - `model.rs` - In-progress and finished type models
//! - `plan.rs` - Validation and requirement ownership
//! - `emit/` - Emission collaborators and the `ComponentEmitter` orchestrator
//! - `render.rs` - `syn` + `prettyplease` rendering
//! - `codegen.rs` - The `ComponentCodegen` facade

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]

pub mod codegen;
pub mod emit;
pub mod errors;
pub mod model;
pub mod options;
pub mod plan;
pub mod render;

pub use codegen::ComponentCodegen;
pub use emit::ComponentEmitter;
pub use errors::{ArityMismatchError, EmitError, GraphValidationError, NamingCollisionError};
pub use model::TypeDefinition;
pub use options::{EmitOptions, ThreadSafety};
