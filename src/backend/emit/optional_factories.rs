//! `Option<K>` factories.
//!
//! Each underlying key gets one private `optional_<k>(&self) -> Option<K>` method per generated struct, created the
//! first time an `Option<K>` is resolved there. Whether it returns `Some` or `None` is decided at emission time, and
//! the method name does not depend on it.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;

use crate::backend::errors::EmitError;
use crate::backend::model::{GeneratedComponentModel, MethodSpec};
use crate::graph::Key;

#[derive(Debug, Default)]
pub struct OptionalBindingFactory {
    methods: HashMap<Key, String>,
}

impl OptionalBindingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call expression of the factory already emitted for `underlying`, if any.
    pub fn existing(&self, underlying: &Key) -> Option<TokenStream> {
        self.methods.get(underlying).map(|name| call(name))
    }

    /// Emit the factory for `underlying` and return its call expression.
    ///
    /// `present` is the expression resolving `K`, or `None` when nothing in scope binds it.
    pub fn create(
        &mut self,
        model: &mut GeneratedComponentModel,
        underlying: &Key,
        value_ty: &TokenStream,
        present: Option<TokenStream>,
    ) -> Result<TokenStream, EmitError> {
        if let Some(existing) = self.existing(underlying) {
            return Ok(existing);
        }
        let name = model.unique_method_name(&format!(
            "{}{}",
            conventions::OPTIONAL_FACTORY_PREFIX,
            underlying.identifier_base()
        ))?;
        let body = match present {
            Some(value) => quote! { ::core::option::Option::Some(#value) },
            None => {
                tracing::debug!(key = %underlying, "no binding in scope, emitting absent optional");
                quote! { ::core::option::Option::None }
            }
        };
        model.add_method(
            MethodSpec::new(name.clone())
                .returns(quote! { ::core::option::Option<#value_ty> })
                .body(body),
        );
        self.methods.insert(underlying.clone(), name.clone());
        Ok(call(&name))
    }
}

fn call(name: &str) -> TokenStream {
    let name = format_ident!("{}", name);
    quote! { self.#name() }
}
