//! The in-progress and finished models of a generated type.
//!
//! [`GeneratedComponentModel`] is the build context of one `write`: every emitter collaborator receives it by
//! `&mut` and adds fields, methods, trait-impl methods and nested types to it. [`GeneratedComponentModel::finalize`]
//! consumes the model and yields the immutable [`TypeDefinition`] handed to the renderer, so a model can be
//! finalized at most once and never outlives its write.
//!
//! Method bodies and types are kept as `proc_macro2::TokenStream`s (as built with `quote!`); names are plain strings
//! so definitions stay easy to inspect in tests.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wiregen_core::lang::conventions;

use super::emit::naming::UniqueNames;
use super::errors::NamingCollisionError;

/// What a generated type is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Component,
    Subcomponent,
    Builder,
}

/// Why a field exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Reference to the struct a subcomponent was created from.
    Parent,
    /// A component requirement instance.
    Requirement,
    /// Per-instance memoized binding storage.
    Memoized,
    /// Releasable binding holder.
    Releasable,
    /// A builder's pending requirement value.
    BuilderSlot,
}

/// How the private constructor initializes a field.
#[derive(Debug, Clone)]
pub enum FieldInit {
    /// From the constructor parameter of the same name.
    Param,
    /// From a fixed expression.
    Expr(TokenStream),
}

/// Struct field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TokenStream,
    pub role: FieldRole,
    pub init: FieldInit,
}

impl FieldSpec {
    /// A field initialized from a constructor parameter.
    pub fn param(name: impl Into<String>, ty: TokenStream, role: FieldRole) -> Self {
        Self {
            name: name.into(),
            ty,
            role,
            init: FieldInit::Param,
        }
    }

    /// A field initialized from a fixed expression.
    pub fn initialized(name: impl Into<String>, ty: TokenStream, role: FieldRole, init: TokenStream) -> Self {
        Self {
            name: name.into(),
            ty,
            role,
            init: FieldInit::Expr(init),
        }
    }
}

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Method receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Associated function (no receiver).
    Static,
    /// `&self`
    Ref,
    /// `self`
    Owned,
    /// `mut self`
    OwnedMut,
}

/// A method of a generated type or trait impl.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: String,
    pub visibility: Visibility,
    pub receiver: Receiver,
    pub params: Vec<(String, TokenStream)>,
    pub return_type: Option<TokenStream>,
    pub body: TokenStream,
}

impl MethodSpec {
    /// A private `&self` method with no parameters, no return type and an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Private,
            receiver: Receiver::Ref,
            params: Vec::new(),
            return_type: None,
            body: TokenStream::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub fn receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TokenStream) -> Self {
        self.params.push((name.into(), ty));
        self
    }

    pub fn returns(mut self, ty: TokenStream) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn body(mut self, body: TokenStream) -> Self {
        self.body = body;
        self
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Methods implementing one trait.
#[derive(Debug, Clone)]
pub struct TraitImpl {
    /// Display spelling of the trait (`crate::AppComponent`).
    pub trait_name: String,
    pub trait_path: TokenStream,
    pub methods: Vec<MethodSpec>,
}

impl TraitImpl {
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A finished generated type.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    /// Whether the type carries the parent lifetime (`Sub<'p>`).
    pub has_parent_lifetime: bool,
    pub fields: Vec<FieldSpec>,
    pub methods: Vec<MethodSpec>,
    pub trait_impls: Vec<TraitImpl>,
    pub nested_types: Vec<TypeDefinition>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.role == role)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn trait_impl(&self, trait_name: &str) -> Option<&TraitImpl> {
        self.trait_impls.iter().find(|t| t.trait_name == trait_name)
    }

    pub fn nested(&self, name: &str) -> Option<&TypeDefinition> {
        self.nested_types.iter().find(|t| t.name == name)
    }

    /// Find a type by name anywhere in this definition's nesting tree (including itself).
    pub fn find_type(&self, name: &str) -> Option<&TypeDefinition> {
        if self.name == name {
            return Some(self);
        }
        self.nested_types.iter().find_map(|t| t.find_type(name))
    }

    /// First nested type of the given kind.
    pub fn nested_of_kind(&self, kind: TypeKind) -> Option<&TypeDefinition> {
        self.nested_types.iter().find(|t| t.kind == kind)
    }

    /// Constructor parameters, in field order.
    pub fn constructor_params(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| matches!(f.init, FieldInit::Param))
    }
}

/// Mutable in-progress model of one generated type.
#[derive(Debug)]
pub struct GeneratedComponentModel {
    name: String,
    kind: TypeKind,
    has_parent_lifetime: bool,
    fields: Vec<FieldSpec>,
    field_names: UniqueNames,
    methods: Vec<MethodSpec>,
    method_names: UniqueNames,
    trait_impls: Vec<TraitImpl>,
    nested_types: Vec<TypeDefinition>,
}

impl GeneratedComponentModel {
    fn new(name: impl Into<String>, kind: TypeKind, has_parent_lifetime: bool) -> Self {
        let mut method_names = UniqueNames::new();
        method_names.reserve(conventions::CONSTRUCTOR_METHOD);
        let mut field_names = UniqueNames::new();
        if has_parent_lifetime {
            field_names.reserve(conventions::PARENT_FIELD);
        }
        Self {
            name: name.into(),
            kind,
            has_parent_lifetime,
            fields: Vec::new(),
            field_names,
            methods: Vec::new(),
            method_names,
            trait_impls: Vec::new(),
            nested_types: Vec::new(),
        }
    }

    /// Model of a top-level component struct.
    pub fn for_component(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Component, false)
    }

    /// Model of a subcomponent struct (carries the parent lifetime).
    pub fn for_subcomponent(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Subcomponent, true)
    }

    /// Model of a builder struct.
    pub fn for_builder(name: impl Into<String>, has_parent_lifetime: bool) -> Self {
        Self::new(name, TypeKind::Builder, has_parent_lifetime)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn has_parent_lifetime(&self) -> bool {
        self.has_parent_lifetime
    }

    /// The type as written in generated code (`WiredApp`, `Sub<'p>`).
    pub fn type_tokens(&self) -> TokenStream {
        type_tokens(&self.name, self.has_parent_lifetime)
    }

    /// Claim a field name derived from `base`, disambiguated against the fields already claimed.
    pub fn unique_field_name(&mut self, base: &str) -> Result<String, NamingCollisionError> {
        self.field_names.claim(base)
    }

    /// Claim a method name derived from `base`, disambiguated against the methods already claimed.
    pub fn unique_method_name(&mut self, base: &str) -> Result<String, NamingCollisionError> {
        self.method_names.claim(base)
    }

    /// Reserve a method name verbatim (public API names cannot be renamed).
    pub fn reserve_method_name(&mut self, name: &str) -> Result<(), NamingCollisionError> {
        if self.method_names.reserve(name) {
            Ok(())
        } else {
            Err(NamingCollisionError {
                base: name.to_string(),
                attempts: 1,
            })
        }
    }

    pub fn add_field(&mut self, field: FieldSpec) {
        self.field_names.reserve(&field.name);
        self.fields.push(field);
    }

    pub fn add_method(&mut self, method: MethodSpec) {
        self.method_names.reserve(&method.name);
        self.methods.push(method);
    }

    /// Ensure an (initially empty) impl of `trait_path` exists.
    pub fn ensure_trait_impl(&mut self, trait_name: &str, trait_path: TokenStream) {
        if !self.trait_impls.iter().any(|t| t.trait_name == trait_name) {
            self.trait_impls.push(TraitImpl {
                trait_name: trait_name.to_string(),
                trait_path,
                methods: Vec::new(),
            });
        }
    }

    /// Add a method to the impl of `trait_name` (created on first use).
    pub fn add_trait_method(&mut self, trait_name: &str, trait_path: TokenStream, method: MethodSpec) {
        self.ensure_trait_impl(trait_name, trait_path);
        if let Some(imp) = self.trait_impls.iter_mut().find(|t| t.trait_name == trait_name) {
            imp.methods.push(method);
        }
    }

    pub fn add_nested_type(&mut self, definition: TypeDefinition) {
        self.nested_types.push(definition);
    }

    /// Add the private `new` constructor, taking every [`FieldInit::Param`] field in field order.
    ///
    /// Call once all fields are known.
    pub fn add_constructor(&mut self) {
        let inits = self.fields.iter().map(|field| {
            let name = format_ident!("{}", field.name);
            match &field.init {
                FieldInit::Param => quote! { #name },
                FieldInit::Expr(init) => quote! { #name: #init },
            }
        });
        let body = quote! { Self { #(#inits),* } };
        let constructor = self
            .fields
            .iter()
            .filter(|f| matches!(f.init, FieldInit::Param))
            .fold(
                MethodSpec::new(conventions::CONSTRUCTOR_METHOD).receiver(Receiver::Static),
                |method, field| method.param(field.name.clone(), field.ty.clone()),
            )
            .returns(quote! { Self })
            .body(body);
        self.methods.insert(0, constructor);
    }

    /// Consume the model into its finished definition.
    pub fn finalize(self) -> TypeDefinition {
        TypeDefinition {
            name: self.name,
            kind: self.kind,
            has_parent_lifetime: self.has_parent_lifetime,
            fields: self.fields,
            methods: self.methods,
            trait_impls: self.trait_impls,
            nested_types: self.nested_types,
        }
    }
}

/// `Name` or `Name<'p>`.
pub fn type_tokens(name: &str, has_parent_lifetime: bool) -> TokenStream {
    let ident = format_ident!("{}", name);
    if has_parent_lifetime {
        let lifetime = parent_lifetime();
        quote! { #ident<#lifetime> }
    } else {
        quote! { #ident }
    }
}

/// The parent lifetime (`'p`).
pub fn parent_lifetime() -> syn::Lifetime {
    syn::Lifetime::new(conventions::PARENT_LIFETIME, proc_macro2::Span::call_site())
}
