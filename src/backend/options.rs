//! Emission options
//!
//! The feature-flag surface of the emitter. Every flag has a named field, a default, and a `with_*` builder method.

use serde::{Deserialize, Serialize};

/// Emission configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Emit holders and release dispatch for releasable scopes. When off, releasable bindings are memoized like
    /// per-instance scoped bindings and no release methods exist.
    pub release_manager: bool,
    /// Additionally reject local bindings that shadow a binding of an ancestor graph.
    pub strict_validation: bool,
    /// Thread-safety policy of per-instance memoized accessors.
    pub memoization: ThreadSafety,
    /// Thread-safety policy of releasable accessors.
    pub releasable: ThreadSafety,
    /// Emit `#[allow(..)]` for lints generated code commonly trips (unused fields, unused imports).
    pub add_lint_allows: bool,
    /// Prepend the `// Generated by wiregen` header to rendered modules.
    pub emit_header: bool,
}

/// Thread-safety contract of generated scoped accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSafety {
    /// `OnceCell` / `ReleasableCell`: no synchronization; the generated struct is `!Sync`.
    #[default]
    SingleThreaded,
    /// `OnceLock` / `SyncReleasableCell`: concurrent first access stores exactly one instance.
    Synchronized,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            release_manager: true,
            strict_validation: false,
            memoization: ThreadSafety::SingleThreaded,
            releasable: ThreadSafety::SingleThreaded,
            add_lint_allows: true,
            emit_header: true,
        }
    }
}

impl EmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release_manager(mut self, enabled: bool) -> Self {
        self.release_manager = enabled;
        self
    }

    pub fn with_strict_validation(mut self, enabled: bool) -> Self {
        self.strict_validation = enabled;
        self
    }

    /// Set the same thread-safety policy for every scope kind.
    pub fn with_thread_safety(mut self, policy: ThreadSafety) -> Self {
        self.memoization = policy;
        self.releasable = policy;
        self
    }

    pub fn with_memoization(mut self, policy: ThreadSafety) -> Self {
        self.memoization = policy;
        self
    }

    pub fn with_releasable(mut self, policy: ThreadSafety) -> Self {
        self.releasable = policy;
        self
    }

    pub fn without_lint_allows(mut self) -> Self {
        self.add_lint_allows = false;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.emit_header = false;
        self
    }
}
