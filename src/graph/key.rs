//! Canonical dependency keys and the key factory seam.
//!
//! A [`Key`] is a type spelling plus an optional qualifier. Keys are compared by value, so every producer of keys
//! (the resolution front-end, tests, the emitter itself when it unwraps `Option<K>`) must agree on one spelling per
//! type. [`CanonicalKeyFactory`] provides that spelling by round-tripping the type through `syn`.

use std::fmt;

use quote::ToTokens;
use serde::{Deserialize, Serialize};

/// The Rust spelling of a type (`crate::db::Database`, `Arc<dyn Service>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(spelling: impl Into<String>) -> Self {
        Self(spelling.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the outermost type (`crate::app::App` -> `App`).
    pub fn simple_name(&self) -> &str {
        wiregen_core::names::simple_name(&self.0)
    }

    /// Parse the spelling as a Rust type.
    pub fn parse(&self) -> syn::Result<syn::Type> {
        syn::parse_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(spelling: &str) -> Self {
        Self::new(spelling)
    }
}

impl From<String> for TypeRef {
    fn from(spelling: String) -> Self {
        Self(spelling)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a dependency: a type plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl Key {
    /// An unqualified key.
    pub fn of(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            qualifier: None,
        }
    }

    /// A qualified key.
    pub fn qualified(ty: impl Into<TypeRef>, qualifier: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// Identifier base used to name storage and accessors for this key.
    pub fn identifier_base(&self) -> String {
        wiregen_core::names::qualified_identifier_base(self.qualifier.as_deref(), self.ty.as_str())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "@{} {}", q, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Maps declarations to canonical keys.
///
/// The emitter only needs two capabilities from the front-end's key factory: canonicalizing a type spelling, and
/// recognizing optional-of-K wrapper keys.
pub trait KeyFactory {
    /// Canonical key for a type and qualifier.
    fn for_type(&self, ty: &TypeRef, qualifier: Option<&str>) -> Key;

    /// If `key` is an `Option<K>` wrapper, the key of `K` (same qualifier).
    fn optional_underlying(&self, key: &Key) -> Option<Key>;
}

/// Default [`KeyFactory`]: canonical spelling is the `syn`-parsed type printed back without token spacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalKeyFactory;

impl CanonicalKeyFactory {
    pub fn new() -> Self {
        Self
    }
}

impl KeyFactory for CanonicalKeyFactory {
    fn for_type(&self, ty: &TypeRef, qualifier: Option<&str>) -> Key {
        // Unparsable spellings stay as written; emission reports them when it needs tokens.
        let spelling = match ty.parse() {
            Ok(parsed) => canonical_spelling(&parsed),
            Err(_) => ty.as_str().trim().to_string(),
        };
        Key {
            ty: TypeRef::new(spelling),
            qualifier: qualifier.map(str::to_string),
        }
    }

    fn optional_underlying(&self, key: &Key) -> Option<Key> {
        let syn::Type::Path(path) = key.ty.parse().ok()? else {
            return None;
        };
        if path.qself.is_some() {
            return None;
        }
        let last = path.path.segments.last()?;
        if last.ident != "Option" {
            return None;
        }
        let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
            return None;
        };
        let mut types = args.args.iter().filter_map(|arg| match arg {
            syn::GenericArgument::Type(t) => Some(t),
            _ => None,
        });
        let inner = types.next()?;
        if types.next().is_some() {
            return None;
        }
        Some(Key {
            ty: TypeRef::new(canonical_spelling(inner)),
            qualifier: key.qualifier.clone(),
        })
    }
}

/// Print a parsed type the way people write it (`Arc<dyn Service>`, not `Arc < dyn Service >`).
pub fn canonical_spelling(ty: &syn::Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let compact = raw
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&");
    compact.trim().to_string()
}
