//! Component descriptors: the trait to implement, its declared methods, builder API and requirements.

use serde::{Deserialize, Serialize};

use super::key::{Key, TypeRef};

/// The component trait a generated struct implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Path of the user's component trait (`crate::AppComponent`).
    pub component_type: TypeRef,
    /// User-declared builder trait, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_spec: Option<BuilderSpec>,
    /// Methods of the component trait.
    #[serde(default)]
    pub methods: Vec<ComponentMethod>,
}

impl ComponentDescriptor {
    pub fn new(component_type: impl Into<TypeRef>) -> Self {
        Self {
            component_type: component_type.into(),
            builder_spec: None,
            methods: Vec::new(),
        }
    }
}

/// A user-declared builder trait the generated builder must mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSpec {
    /// Path of the builder trait (`crate::AppComponentBuilder`).
    pub builder_type: TypeRef,
    /// Setter methods, in declaration order. Each takes one value and returns `Self`.
    #[serde(default)]
    pub setters: Vec<SetterSpec>,
    pub build_method: BuildMethodSpec,
}

impl BuilderSpec {
    pub fn new(builder_type: impl Into<TypeRef>, build_method: BuildMethodSpec) -> Self {
        Self {
            builder_type: builder_type.into(),
            setters: Vec::new(),
            build_method,
        }
    }

    pub fn with_setter(mut self, name: impl Into<String>, param_type: impl Into<TypeRef>) -> Self {
        self.setters.push(SetterSpec {
            name: name.into(),
            param_type: param_type.into(),
        });
        self
    }
}

/// One setter of a declared builder trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetterSpec {
    pub name: String,
    pub param_type: TypeRef,
}

/// The terminal method of a declared builder trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMethodSpec {
    pub name: String,
    /// Declared return type, copied verbatim (`impl crate::App`, `Box<dyn crate::App>`, `Result<.., E>`).
    pub return_type: TypeRef,
}

impl BuildMethodSpec {
    pub fn new(name: impl Into<String>, return_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
        }
    }
}

/// A method of the component trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMethod {
    pub name: String,
    pub kind: ComponentMethodKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentMethodKind {
    /// `fn name(&self) -> K`
    Provision { key: Key },
    /// `fn name(&self, params..) -> impl ChildTrait + '_`, creating the child graph at index `child`.
    SubcomponentFactory {
        child: usize,
        #[serde(default)]
        params: Vec<FactoryParam>,
    },
    /// `fn name(&self) -> impl ChildBuilderTrait + '_`; the child must declare a builder spec.
    SubcomponentBuilder { child: usize },
}

impl ComponentMethod {
    pub fn provision(name: impl Into<String>, key: Key) -> Self {
        Self {
            name: name.into(),
            kind: ComponentMethodKind::Provision { key },
        }
    }

    pub fn subcomponent_factory(name: impl Into<String>, child: usize, params: Vec<FactoryParam>) -> Self {
        Self {
            name: name.into(),
            kind: ComponentMethodKind::SubcomponentFactory { child, params },
        }
    }

    pub fn subcomponent_builder(name: impl Into<String>, child: usize) -> Self {
        Self {
            name: name.into(),
            kind: ComponentMethodKind::SubcomponentBuilder { child },
        }
    }

    /// Child graph index this method creates, if it is a subcomponent method.
    pub fn child(&self) -> Option<usize> {
        match self.kind {
            ComponentMethodKind::Provision { .. } => None,
            ComponentMethodKind::SubcomponentFactory { child, .. } | ComponentMethodKind::SubcomponentBuilder { child } => {
                Some(child)
            }
        }
    }
}

/// Parameter of a subcomponent factory method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryParam {
    pub name: String,
    pub ty: TypeRef,
}

impl FactoryParam {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// An externally supplied object a component needs. Unique per type within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRequirement {
    pub ty: TypeRef,
    pub kind: RequirementKind,
    /// Whether the caller must supply a module instance (otherwise `Default::default()` is used). Dependencies and
    /// bound instances are always caller-supplied.
    #[serde(default)]
    pub needs_instance: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Module,
    Dependency,
    BoundInstance,
}

impl ComponentRequirement {
    /// A default-constructible module.
    pub fn module(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            kind: RequirementKind::Module,
            needs_instance: false,
        }
    }

    /// A module the caller has to supply.
    pub fn module_instance(ty: impl Into<TypeRef>) -> Self {
        Self {
            needs_instance: true,
            ..Self::module(ty)
        }
    }

    /// A component dependency; always caller-supplied.
    pub fn dependency(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            kind: RequirementKind::Dependency,
            needs_instance: true,
        }
    }

    /// An instance bound through the builder; always caller-supplied.
    pub fn bound_instance(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            kind: RequirementKind::BoundInstance,
            needs_instance: true,
        }
    }
}
