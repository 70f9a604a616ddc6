//! Well-known member and type names of generated containers.

/// Prefix of every generated top-level component struct (`AppComponent` -> `WiredAppComponent`).
pub const GENERATED_COMPONENT_PREFIX: &str = "Wired";

/// Static entry point returning a fresh builder.
pub const BUILDER_METHOD: &str = "builder";

/// One-shot static creation method, emitted only when no requirement needs a caller-supplied instance.
pub const CREATE_METHOD: &str = "create";

/// Terminal method of a synthesized builder.
pub const DEFAULT_BUILD_METHOD: &str = "build";

/// Name of the synthesized builder of a top-level component.
pub const DEFAULT_BUILDER_TYPE: &str = "Builder";

/// Suffix appended to a subcomponent struct name to name its builder.
pub const BUILDER_TYPE_SUFFIX: &str = "Builder";

/// Private constructor of every generated struct.
pub const CONSTRUCTOR_METHOD: &str = "new";

/// Field linking a subcomponent to the struct it was created from.
pub const PARENT_FIELD: &str = "parent";

/// Lifetime parameter of subcomponent structs and their builders.
pub const PARENT_LIFETIME: &str = "'p";

/// Dispatch method clearing every releasable holder of a generated struct.
pub const RELEASE_ALL_METHOD: &str = "release_all_references";

/// Prefix of binding accessor methods.
pub const ACCESSOR_PREFIX: &str = "provide_";

/// Prefix of optional factory methods.
pub const OPTIONAL_FACTORY_PREFIX: &str = "optional_";

/// Suffix of per-instance memoization fields.
pub const MEMOIZED_FIELD_SUFFIX: &str = "_instance";

/// Suffix of releasable holder fields.
pub const RELEASABLE_FIELD_SUFFIX: &str = "_ref";

/// Name of a per-scope release dispatch method (`release_<scope>_references`).
pub fn scoped_release_method(scope_snake: &str) -> String {
    format!("release_{scope_snake}_references")
}

