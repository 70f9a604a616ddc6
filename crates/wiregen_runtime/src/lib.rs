//! Runtime support for wiregen-generated component containers.
//!
//! Generated code depends on this crate for the few things that cannot be expressed with `std` alone: releasable
//! holders for manually clearable scoped instances, and the error raised when a builder is missing a requirement.

#![deny(clippy::unwrap_used)]

pub mod cells;
pub mod errors;

pub use cells::{Releasable, ReleasableCell, SyncReleasableCell};
pub use errors::BuildError;
