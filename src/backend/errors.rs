//! Define error types for component emission.
//!
//! Every error here is fatal to the single `write` in progress: nothing partial is ever rendered, and sibling
//! top-level writes are unaffected.
//!
//! ## Notes
//!
//! - Prefer actionable messages: name the key, requirement or method involved and the component it belongs to.
//! - Errors implement `miette::Diagnostic` so the CLI can render them with codes and help text.

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::{Key, TypeRef};

/// Error during component emission.
#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    GraphValidation(#[from] GraphValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ArityMismatch(#[from] ArityMismatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NamingCollision(#[from] NamingCollisionError),

    #[error("invalid type `{spelling}`: {reason}")]
    #[diagnostic(code(wiregen::invalid_type), help("types are written the way they would appear in Rust source"))]
    InvalidType { spelling: String, reason: String },

    #[error("invalid identifier `{name}`: {reason}")]
    #[diagnostic(code(wiregen::invalid_identifier))]
    InvalidIdentifier { name: String, reason: String },

    #[error("invalid expression `{source_text}`: {reason}")]
    #[diagnostic(code(wiregen::invalid_expression))]
    InvalidExpression { source_text: String, reason: String },

    #[error("syn parse error: {0}")]
    #[diagnostic(code(wiregen::syn_parse))]
    SynParse(String),
}

/// The resolved graph is inconsistent with what emission needs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphValidationError {
    #[error("no binding for `{key}` (requested by {requested_by}) in `{component}` or its ancestors")]
    #[diagnostic(
        code(wiregen::graph::missing_binding),
        help("the resolution phase must bind every requested key before emission")
    )]
    MissingBinding {
        key: Key,
        requested_by: String,
        component: TypeRef,
    },

    #[error("binding for `{binding}` reads requirement `{requirement}`, which `{component}` and its ancestors do not declare")]
    #[diagnostic(code(wiregen::graph::missing_requirement))]
    MissingRequirement {
        requirement: TypeRef,
        binding: Key,
        component: TypeRef,
    },

    #[error("invalid binding for `{key}`: {reason}")]
    #[diagnostic(code(wiregen::graph::invalid_binding))]
    InvalidBinding { key: Key, reason: String },

    #[error("method `{method}` of `{component}` refers to subcomponent #{child}, {reason}")]
    #[diagnostic(code(wiregen::graph::invalid_subcomponent))]
    InvalidSubcomponent {
        method: String,
        child: usize,
        component: TypeRef,
        reason: String,
    },

    #[error("`{key}` is bound in `{component}` and again in an ancestor")]
    #[diagnostic(
        code(wiregen::graph::duplicate_binding),
        help("strict validation rejects subcomponent bindings that shadow an ancestor binding")
    )]
    DuplicateBinding { key: Key, component: TypeRef },
}

/// A declared builder (or subcomponent factory method) does not map one-to-one onto the requirement set.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("`{api}` does not match the requirements of `{component}`: {details}")]
#[diagnostic(
    code(wiregen::arity_mismatch),
    help("declare exactly one setter (or parameter) per requirement that needs a caller-supplied instance")
)]
pub struct ArityMismatchError {
    /// Builder trait or factory method being checked.
    pub api: String,
    pub component: TypeRef,
    /// Requirements needing an instance that nothing supplies.
    pub missing: Vec<TypeRef>,
    /// Setters/parameters that match no requirement, or a requirement already matched.
    pub extra: Vec<String>,
    details: String,
}

impl ArityMismatchError {
    pub fn new(api: impl Into<String>, component: TypeRef, missing: Vec<TypeRef>, extra: Vec<String>) -> Self {
        let mut parts = Vec::new();
        if !missing.is_empty() {
            let names: Vec<_> = missing.iter().map(TypeRef::as_str).collect();
            parts.push(format!("nothing supplies {}", names.join(", ")));
        }
        if !extra.is_empty() {
            parts.push(format!("unmatched {}", extra.join(", ")));
        }
        Self {
            api: api.into(),
            component,
            missing,
            extra,
            details: parts.join("; "),
        }
    }
}

/// The numeric-suffix disambiguation ran out of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("could not find a free name for `{base}` after {attempts} attempts")]
#[diagnostic(code(wiregen::naming_collision))]
pub struct NamingCollisionError {
    pub base: String,
    pub attempts: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_mismatch_details() {
        let err = ArityMismatchError::new(
            "crate::AppBuilder",
            TypeRef::from("crate::App"),
            vec![TypeRef::from("ModuleA")],
            vec!["fn extra(Unknown)".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "`crate::AppBuilder` does not match the requirements of `crate::App`: nothing supplies ModuleA; \
             unmatched fn extra(Unknown)"
        );
    }

    #[test]
    fn test_emit_error_is_transparent_over_graph_errors() {
        let err: EmitError = GraphValidationError::MissingBinding {
            key: Key::of("Foo"),
            requested_by: "`Bar`".to_string(),
            component: TypeRef::from("crate::App"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "no binding for `Foo` (requested by `Bar`) in `crate::App` or its ancestors"
        );
        assert!(matches!(err, EmitError::GraphValidation(_)));
    }
}
