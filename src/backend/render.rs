//! Render a finished [`TypeDefinition`] to Rust source.
//!
//! The whole struct tree becomes one module:
//!
//! ```text
//! pub mod wired_app {
//!     use super::*;
//!     pub struct WiredApp { .. }
//!     impl WiredApp { .. }
//!     impl crate::App for WiredApp { .. }
//!     pub struct Builder { .. }
//!     ..
//! }
//! ```
//!
//! Tokens are parsed back with `syn` and formatted with `prettyplease`, so a malformed model is an error here rather
//! than uncompilable output.

use proc_macro2::TokenStream;
use quote::quote;
use wiregen_core::names;

use super::emit::ident;
use super::errors::EmitError;
use super::model::{MethodSpec, Receiver, TypeDefinition, Visibility, parent_lifetime};
use super::options::EmitOptions;
use crate::version::WIREGEN_VERSION;

/// Module name of a rendered definition (`WiredApp` -> `wired_app`).
pub fn module_name(definition: &TypeDefinition) -> String {
    names::escape_identifier(&names::to_snake_case(&definition.name))
}

/// Render `definition` and everything nested in it as a formatted Rust module.
#[tracing::instrument(skip_all, fields(component = %definition.name))]
pub fn render_module(definition: &TypeDefinition, options: &EmitOptions) -> Result<String, EmitError> {
    let module = ident(&module_name(definition))?;
    let mut items = Vec::new();
    collect_items(definition, &mut items)?;

    let allows = options
        .add_lint_allows
        .then(|| quote! { #[allow(dead_code, unused_imports, unused_variables, clippy::all)] });
    let tokens = quote! {
        #allows
        pub mod #module {
            use super::*;
            #(#items)*
        }
    };

    let file: syn::File = syn::parse2(tokens).map_err(|e| EmitError::SynParse(e.to_string()))?;
    let formatted = prettyplease::unparse(&file);
    tracing::debug!(bytes = formatted.len(), "rendered module");

    if options.emit_header {
        Ok(format!("// Generated by wiregen v{WIREGEN_VERSION}. Do not edit.\n\n{formatted}"))
    } else {
        Ok(formatted)
    }
}

/// Struct, inherent impl and trait impls of `definition`, then of its nested types (depth-first).
fn collect_items(definition: &TypeDefinition, items: &mut Vec<TokenStream>) -> Result<(), EmitError> {
    let name = ident(&definition.name)?;
    let generics = definition.has_parent_lifetime.then(|| {
        let lifetime = parent_lifetime();
        quote! { <#lifetime> }
    });

    let fields = definition
        .fields
        .iter()
        .map(|field| {
            let field_name = ident(&field.name)?;
            let ty = &field.ty;
            Ok(quote! { #field_name: #ty })
        })
        .collect::<Result<Vec<_>, EmitError>>()?;
    items.push(quote! {
        pub struct #name #generics {
            #(#fields),*
        }
    });

    let methods = methods_tokens(&definition.methods, true)?;
    items.push(quote! {
        impl #generics #name #generics {
            #(#methods)*
        }
    });

    for imp in &definition.trait_impls {
        let path = &imp.trait_path;
        let methods = methods_tokens(&imp.methods, false)?;
        items.push(quote! {
            impl #generics #path for #name #generics {
                #(#methods)*
            }
        });
    }

    for nested in &definition.nested_types {
        collect_items(nested, items)?;
    }
    Ok(())
}

fn methods_tokens(methods: &[MethodSpec], inherent: bool) -> Result<Vec<TokenStream>, EmitError> {
    methods.iter().map(|m| method_tokens(m, inherent)).collect()
}

fn method_tokens(method: &MethodSpec, inherent: bool) -> Result<TokenStream, EmitError> {
    let name = ident(&method.name)?;
    let visibility = (inherent && method.visibility == Visibility::Public).then(|| quote! { pub });
    let receiver = match method.receiver {
        Receiver::Static => None,
        Receiver::Ref => Some(quote! { &self }),
        Receiver::Owned => Some(quote! { self }),
        Receiver::OwnedMut => Some(quote! { mut self }),
    };
    let params = method
        .params
        .iter()
        .map(|(param, ty)| {
            let param = ident(param)?;
            Ok(quote! { #param: #ty })
        })
        .collect::<Result<Vec<_>, EmitError>>()?;
    let inputs = receiver.into_iter().chain(params);
    let output = method.return_type.as_ref().map(|ty| quote! { -> #ty });
    let body = &method.body;
    Ok(quote! {
        #visibility fn #name(#(#inputs),*) #output {
            #body
        }
    })
}
