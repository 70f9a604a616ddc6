//! Rust vocabulary the emitter needs to stay away from, and the names it always uses.

pub mod conventions;
pub mod rust_keywords;
