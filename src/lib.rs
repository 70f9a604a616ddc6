#![forbid(unsafe_code)]
//! wiregen: code generation for compile-time dependency injection
//!
//! wiregen consumes a fully resolved binding graph and emits the Rust source of a concrete container: a struct with
//! one accessor per binding, memoized and releasable scoped storage, a builder that can mirror a user-declared builder
//! trait, and nested subcomponent structs. The generated code links against the small `wiregen_runtime` crate.
//!
//! - [`graph`]: the resolved input model (keys, bindings, requirements, descriptors)
//! - [`backend`]: validation, emission and rendering
//! - [`cli`]: the `wiregen` debugging binary
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Generated code**: Generated builders report missing requirements through `wiregen_runtime::BuildError`; the
//!   one-shot `create()` method only exists when that cannot happen.

pub mod backend;
pub mod cli;
pub mod graph;
pub mod version;

pub use backend::{ComponentCodegen, EmitError, EmitOptions, TypeDefinition};
pub use graph::BindingGraph;
