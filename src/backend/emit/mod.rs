//! Emit generated component models from resolved binding graphs.
//!
//! This module defines the shared emission context and wires together the focused collaborators; the orchestration
//! lives in [`component`].
//!
//! ## Notes
//! - Emission builds `proc_macro2` token streams with `quote!`; nothing here formats text. Rendering happens later in
//!   [`crate::backend::render`].
//! - Every generated struct of one component tree lands in the same Rust module, so private accessors and fields of an
//!   ancestor are reachable from its subcomponents through `self.parent`.
//!
//! ## See also
//! - [`naming`]: collision-free names for fields, methods and nested structs
//! - [`requirement_fields`]: requirement storage
//! - [`binding_expressions`]: per-key expressions, storage and accessors
//! - [`release_manager`]: releasable holders and release dispatch
//! - [`optional_factories`]: present/absent `Option<K>` factories
//! - [`builder`]: builder structs and requirement conformance
//! - [`component`]: the orchestrator

pub mod binding_expressions;
pub mod builder;
pub mod component;
pub mod naming;
pub mod optional_factories;
pub mod release_manager;
pub mod requirement_fields;

pub use component::ComponentEmitter;

use std::collections::HashMap;

use proc_macro2::{Ident, TokenStream};
use quote::{ToTokens, quote};

use super::errors::EmitError;
use super::options::EmitOptions;
use super::plan::RequirementPlan;
use crate::graph::{BindingGraph, Key, KeyFactory, RequirementIntrospector, TypeRef};
use requirement_fields::RequirementFields;

/// Read-only collaborators shared by every struct of one write.
#[derive(Clone, Copy)]
pub(crate) struct EmitContext<'a> {
    pub options: &'a EmitOptions,
    pub key_factory: &'a dyn KeyFactory,
    pub introspector: &'a dyn RequirementIntrospector,
    pub plan: &'a RequirementPlan,
    pub namer: &'a naming::SubcomponentNamer,
}

/// What one generated struct exposes to the expressions emitted inside it and inside its subcomponents.
///
/// A subcomponent's scope links to its parent's, so an inherited key or requirement is reached through
/// `self.parent` once per level.
pub(crate) struct StructScope<'s> {
    pub graph: &'s BindingGraph,
    /// The struct's type as written in generated code (`WiredApp`, `Sub<'p>`).
    pub type_tokens: TokenStream,
    pub requirement_fields: RequirementFields,
    /// Accessor method per locally bound key.
    pub accessors: HashMap<Key, String>,
    pub parent: Option<&'s StructScope<'s>>,
}

impl<'s> StructScope<'s> {
    /// Walk this scope and its ancestors, pairing each with the receiver expression that reaches it.
    pub fn ancestry(&self) -> impl Iterator<Item = (TokenStream, &StructScope<'s>)> {
        let parent_field = Ident::new(wiregen_core::lang::conventions::PARENT_FIELD, proc_macro2::Span::call_site());
        std::iter::successors(Some((quote! { self }, self)), move |(receiver, scope)| {
            scope.parent.map(|parent| (quote! { #receiver.#parent_field }, parent))
        })
    }

    /// Whether `key` is bound here or in an ancestor.
    pub fn binds(&self, key: &Key) -> bool {
        self.ancestry().any(|(_, scope)| scope.accessors.contains_key(key))
    }
}

/// Parse a type spelling into tokens.
pub(crate) fn type_tokens(ty: &TypeRef) -> Result<TokenStream, EmitError> {
    ty.parse().map(|t| t.to_token_stream()).map_err(|e| EmitError::InvalidType {
        spelling: ty.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an identifier; user-declared method and parameter names must be plain Rust identifiers.
pub(crate) fn ident(name: &str) -> Result<Ident, EmitError> {
    syn::parse_str::<Ident>(name).map_err(|e| EmitError::InvalidIdentifier {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a Rust expression (map-key expressions of multibound maps).
pub(crate) fn expr_tokens(source: &str) -> Result<TokenStream, EmitError> {
    syn::parse_str::<syn::Expr>(source)
        .map(|e| e.to_token_stream())
        .map_err(|e| EmitError::InvalidExpression {
            source_text: source.to_string(),
            reason: e.to_string(),
        })
}
