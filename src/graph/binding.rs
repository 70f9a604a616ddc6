//! Bindings: how each key of a resolved graph is produced.

use serde::{Deserialize, Serialize};

use super::key::{Key, TypeRef};

/// Production rule for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub key: Key,
    pub kind: BindingKind,
    #[serde(default)]
    pub scope: Scope,
    /// Keys this binding needs, in argument order.
    #[serde(default)]
    pub dependencies: Vec<Key>,
    #[serde(default)]
    pub owner: BindingOwner,
}

/// Binding kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingKind {
    /// Constructed instance: `<Ty>::constructor(deps..)`.
    Injection {
        #[serde(default = "default_constructor")]
        constructor: String,
    },
    /// Result of a provider method declared on the owning module.
    Provision {
        method: String,
        /// Static methods are called on the module type and need no module instance.
        #[serde(default)]
        is_static: bool,
    },
    /// Instance handed to the builder; the value is the requirement itself.
    BoundInstance,
    /// Result of a method on a component-dependency requirement.
    DependencyMethod { method: String },
    /// Collection of every dependency (the contributions).
    Multibinding { collection: MultibindingCollection },
    /// `Option<underlying>`: present iff a binding for `underlying` is in scope.
    OptionalWrapper { underlying: Key },
    /// Alias of another key; never stores its own instance.
    Delegate { target: Key },
}

fn default_constructor() -> String {
    wiregen_core::lang::conventions::CONSTRUCTOR_METHOD.to_string()
}

/// Collection shape of a multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MultibindingCollection {
    /// Collected into the key's collection type (`Vec<T>`, `HashSet<T>`, ...).
    Set,
    /// Each contribution is paired with the map-key expression at the same index.
    Map { keys: Vec<String> },
}

/// Lifetime/memoization policy of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    /// Recomputed on every access.
    #[default]
    Unscoped,
    /// Computed once per generated instance.
    Memoized,
    /// Computed once per generated instance until explicitly released.
    Releasable { name: String },
}

impl Scope {
    pub fn is_scoped(&self) -> bool {
        !matches!(self, Scope::Unscoped)
    }
}

/// Declaring owner of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingOwner {
    #[default]
    Component,
    Module { ty: TypeRef },
    Dependency { ty: TypeRef },
}

impl Binding {
    pub fn new(key: Key, kind: BindingKind) -> Self {
        Self {
            key,
            kind,
            scope: Scope::Unscoped,
            dependencies: Vec::new(),
            owner: BindingOwner::Component,
        }
    }

    /// Constructed instance via `<Ty>::new(deps..)`.
    pub fn injection(key: Key, dependencies: Vec<Key>) -> Self {
        Self::new(key, BindingKind::Injection {
            constructor: default_constructor(),
        })
        .with_dependencies(dependencies)
    }

    /// Provider method `method` on the module instance of type `module`.
    pub fn provision(key: Key, module: impl Into<TypeRef>, method: impl Into<String>, dependencies: Vec<Key>) -> Self {
        Self::new(key, BindingKind::Provision {
            method: method.into(),
            is_static: false,
        })
        .with_dependencies(dependencies)
        .with_owner(BindingOwner::Module { ty: module.into() })
    }

    /// Static provider method `method` on module type `module`.
    pub fn static_provision(
        key: Key,
        module: impl Into<TypeRef>,
        method: impl Into<String>,
        dependencies: Vec<Key>,
    ) -> Self {
        Self::new(key, BindingKind::Provision {
            method: method.into(),
            is_static: true,
        })
        .with_dependencies(dependencies)
        .with_owner(BindingOwner::Module { ty: module.into() })
    }

    pub fn bound_instance(key: Key) -> Self {
        Self::new(key, BindingKind::BoundInstance)
    }

    pub fn dependency_method(key: Key, dependency: impl Into<TypeRef>, method: impl Into<String>) -> Self {
        Self::new(key, BindingKind::DependencyMethod { method: method.into() })
            .with_owner(BindingOwner::Dependency { ty: dependency.into() })
    }

    pub fn multibound_set(key: Key, contributions: Vec<Key>) -> Self {
        Self::new(key, BindingKind::Multibinding {
            collection: MultibindingCollection::Set,
        })
        .with_dependencies(contributions)
    }

    pub fn multibound_map(key: Key, entries: Vec<(String, Key)>) -> Self {
        let (keys, contributions): (Vec<String>, Vec<Key>) = entries.into_iter().unzip();
        Self::new(key, BindingKind::Multibinding {
            collection: MultibindingCollection::Map { keys },
        })
        .with_dependencies(contributions)
    }

    pub fn optional(key: Key, underlying: Key) -> Self {
        Self::new(key, BindingKind::OptionalWrapper { underlying })
    }

    pub fn delegate(key: Key, target: Key) -> Self {
        Self::new(key, BindingKind::Delegate { target: target.clone() }).with_dependencies(vec![target])
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Key>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_owner(mut self, owner: BindingOwner) -> Self {
        self.owner = owner;
        self
    }

    /// Type of the component requirement this binding reads, if any.
    ///
    /// Instance provider methods read their module, dependency methods read their dependency, bound instances read
    /// the requirement of their own key type.
    pub fn requirement_type(&self) -> Option<&TypeRef> {
        match (&self.kind, &self.owner) {
            (BindingKind::Provision { is_static: false, .. }, BindingOwner::Module { ty }) => Some(ty),
            (BindingKind::DependencyMethod { .. }, BindingOwner::Dependency { ty }) => Some(ty),
            (BindingKind::BoundInstance, _) => Some(&self.key.ty),
            _ => None,
        }
    }

    /// Every key this binding reads, including a delegate's target.
    pub fn dependency_keys(&self) -> impl Iterator<Item = &Key> {
        let target = match &self.kind {
            BindingKind::Delegate { target } if !self.dependencies.contains(target) => Some(target),
            _ => None,
        };
        self.dependencies.iter().chain(target)
    }
}
