//! Provide the shared, pure naming vocabulary used by the wiregen emitter.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that turn type spellings
//! and qualifiers into Rust identifiers, plus the well-known member names every generated container uses.
//!
//! ## Notes
//!
//! - No IO, no global state, and no emitter-specific types: everything here is a function of its string inputs.
//! - Identifiers produced here are never Rust keywords, so callers may build them with `format_ident!` directly.

pub mod lang;
pub mod names;
