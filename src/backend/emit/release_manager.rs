//! Releasable scoped references: holder fields, accessors that refill a cleared holder, and release dispatch.
//!
//! Every holder a struct declares is registered here. Once all bindings are emitted, [`ScopedReferenceReleaseManager::emit_dispatch`]
//! adds `release_all_references` (clears every holder) and one `release_<scope>_references` per scope name.

use std::collections::BTreeMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;
use wiregen_core::names;

use crate::backend::errors::EmitError;
use crate::backend::model::{FieldRole, FieldSpec, GeneratedComponentModel, MethodSpec};
use crate::backend::options::ThreadSafety;
use crate::graph::Binding;

/// Holders registered on one generated struct, grouped by release method.
#[derive(Debug, Default)]
pub struct ScopedReferenceReleaseManager {
    holders: Vec<String>,
    by_scope: BTreeMap<String, Vec<String>>,
}

impl ScopedReferenceReleaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the holder field for a releasable `binding` and return the accessor body reading it.
    ///
    /// `production` is the expression computing a fresh instance; it runs again after the holder is released.
    pub fn register(
        &mut self,
        model: &mut GeneratedComponentModel,
        binding: &Binding,
        scope_name: &str,
        value_ty: &TokenStream,
        policy: ThreadSafety,
        production: TokenStream,
    ) -> Result<TokenStream, EmitError> {
        let field = model.unique_field_name(&format!(
            "{}{}",
            binding.key.identifier_base(),
            conventions::RELEASABLE_FIELD_SUFFIX
        ))?;
        let cell = match policy {
            ThreadSafety::SingleThreaded => quote! { ::wiregen_runtime::ReleasableCell },
            ThreadSafety::Synchronized => quote! { ::wiregen_runtime::SyncReleasableCell },
        };
        model.add_field(FieldSpec::initialized(
            field.clone(),
            quote! { #cell<#value_ty> },
            FieldRole::Releasable,
            quote! { #cell::new() },
        ));

        let method = release_method_name(scope_name);
        self.holders.push(field.clone());
        self.by_scope.entry(method).or_default().push(field.clone());
        tracing::trace!(key = %binding.key, field = %field, scope = scope_name, "registered releasable holder");

        let field = format_ident!("{}", field);
        Ok(quote! { self.#field.get_or_init(|| #production) })
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Emit the release methods. Names are public API, so a clash is a [`crate::backend::errors::NamingCollisionError`]
    /// instead of a silent rename.
    pub fn emit_dispatch(self, model: &mut GeneratedComponentModel) -> Result<(), EmitError> {
        if self.holders.is_empty() {
            return Ok(());
        }
        model.add_method(release_method(conventions::RELEASE_ALL_METHOD, &self.holders));
        for (method, fields) in &self.by_scope {
            model.reserve_method_name(method)?;
            model.add_method(release_method(method, fields));
        }
        Ok(())
    }
}

/// `release_<scope>_references`
pub fn release_method_name(scope_name: &str) -> String {
    let snake = names::to_snake_case(scope_name);
    let snake = if snake.is_empty() { "scoped".to_string() } else { snake };
    conventions::scoped_release_method(&snake)
}

fn release_method(name: &str, fields: &[String]) -> MethodSpec {
    let fields = fields.iter().map(|f| format_ident!("{}", f));
    MethodSpec::new(name).public().body(quote! {
        #( ::wiregen_runtime::Releasable::release(&self.#fields); )*
    })
}
