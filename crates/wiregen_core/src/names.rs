//! Turn type spellings and qualifiers into deterministic Rust identifiers.
//!
//! All helpers here are pure string functions. The emitter relies on them being deterministic: the same spelling
//! always yields the same identifier, so identical graphs always produce identical generated code.
//!
//! ## Examples
//! ```rust
//! use wiregen_core::names;
//!
//! assert_eq!(names::simple_name("crate::app::AppComponent"), "AppComponent");
//! assert_eq!(names::to_snake_case("HTTPClient"), "http_client");
//! assert_eq!(names::identifier_base("Arc<dyn crate::Service>"), "service");
//! ```

use crate::lang::rust_keywords;

/// Smart-pointer wrappers that do not contribute to a derived identifier.
const TRANSPARENT_WRAPPERS: &[&str] = &["Arc", "Rc", "Box", "Cell", "RefCell", "Mutex", "RwLock"];

/// Fallback identifier when a spelling contains no usable word.
const FALLBACK_IDENTIFIER: &str = "value";

/// Last path segment of the outermost type, without generic arguments or reference/trait-object prefixes.
pub fn simple_name(spelling: &str) -> &str {
    let mut head = spelling.split('<').next().unwrap_or(spelling).trim();
    for prefix in ["&", "mut ", "dyn ", "impl "] {
        head = head.trim_start_matches(prefix).trim_start();
    }
    head.rsplit("::").next().unwrap_or(head).trim()
}

/// Convert an identifier-ish string to `snake_case`.
///
/// Acronyms are kept together (`HTTPClient` -> `http_client`); any character that cannot appear in an identifier
/// becomes a single underscore.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') && !out.is_empty() {
                    out.push('_');
                }
            }
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Convert an identifier-ish string to `UpperCamelCase`.
pub fn to_upper_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}

/// Derive a `snake_case` identifier from a full type spelling.
///
/// Path prefixes (`crate::db::`), keywords (`dyn`, `impl`), lifetimes and transparent smart pointers (`Arc`, `Box`,
/// ...) are skipped; every remaining word contributes, so `HashMap<String, u32>` becomes `hash_map_string_u32`.
pub fn identifier_base(spelling: &str) -> String {
    let bytes = spelling.as_bytes();
    let mut words: Vec<String> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &spelling[start..i];
            let is_lifetime = start > 0 && bytes[start - 1] == b'\'';
            let is_path_prefix = spelling[i..].trim_start().starts_with("::");
            if is_lifetime || is_path_prefix || rust_keywords::is_keyword(word) || TRANSPARENT_WRAPPERS.contains(&word)
            {
                continue;
            }
            let snake = to_snake_case(word);
            if !snake.is_empty() {
                words.push(snake);
            }
        } else {
            i += 1;
        }
    }

    if words.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }
    escape_identifier(&words.join("_"))
}

/// Identifier base for a (qualifier, type) pair: the qualifier, when present, prefixes the type's base.
pub fn qualified_identifier_base(qualifier: Option<&str>, spelling: &str) -> String {
    let base = identifier_base(spelling);
    match qualifier.map(to_snake_case).filter(|q| !q.is_empty()) {
        Some(q) => escape_identifier(&format!("{q}_{base}")),
        None => base,
    }
}

/// Make a generated identifier safe to use verbatim: keywords get a trailing underscore, a leading digit gets a
/// leading underscore.
pub fn escape_identifier(name: &str) -> String {
    if rust_keywords::is_keyword(name) {
        return format!("{name}_");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{name}");
    }
    name.to_string()
}
