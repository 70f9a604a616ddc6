//! Collision-free identifier allocation.
//!
//! [`UniqueNames`] is the numeric-suffix disambiguation shared by every name the emitter invents (fields, accessors,
//! factories). [`SubcomponentNamer`] applies it to nested struct names across a whole generated module.

use std::collections::{HashMap, HashSet, VecDeque};

use proc_macro2::{TokenStream, TokenTree};
use wiregen_core::lang::conventions;
use wiregen_core::names;

use crate::backend::errors::NamingCollisionError;
use crate::graph::BindingGraph;

/// Highest numeric suffix tried before giving up.
pub const MAX_SUFFIX: usize = 10_000;

/// A set of taken names with `base`, `base2`, `base3`, ... disambiguation.
#[derive(Debug, Clone, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Claim the first free candidate derived from `base`.
    pub fn claim(&mut self, base: &str) -> Result<String, NamingCollisionError> {
        let name = first_free(&names::escape_identifier(base), |candidate| !self.is_taken(candidate))?;
        self.taken.insert(name.clone());
        tracing::trace!(base, name = %name, "claimed name");
        Ok(name)
    }
}

/// First of `base`, `base2`, `base3`, ... accepted by `is_free`.
fn first_free(base: &str, is_free: impl Fn(&str) -> bool) -> Result<String, NamingCollisionError> {
    if is_free(base) {
        return Ok(base.to_string());
    }
    (2..=MAX_SUFFIX)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| is_free(candidate))
        .ok_or_else(|| NamingCollisionError {
            base: base.to_string(),
            attempts: MAX_SUFFIX,
        })
}

/// Struct names for every subcomponent of one generated module.
///
/// All generated structs share one Rust module, so names are unique across the whole tree, not only among siblings.
/// That module glob-imports the user's scope, so a generated struct must not take the name of a type the graph spells
/// without a path either: the struct would shadow it. Each subcomponent also reserves `<Name>Builder` for its builder
/// struct. Names are assigned level by level in child-graph order, which makes them a pure function of the graph.
#[derive(Debug, Clone)]
pub struct SubcomponentNamer {
    names: HashMap<Vec<usize>, String>,
    root_builder: String,
}

impl SubcomponentNamer {
    /// Name every subcomponent below `root`, whose own struct is called `root_name`.
    pub fn for_root(root: &BindingGraph, root_name: &str) -> Result<Self, NamingCollisionError> {
        let mut taken = UniqueNames::new();
        for ty in root.type_refs() {
            for name in bare_type_names(ty.as_str()) {
                taken.reserve(&name);
            }
        }
        taken.reserve(root_name);
        let root_builder = taken.claim(conventions::DEFAULT_BUILDER_TYPE)?;

        let mut names = HashMap::new();
        let mut queue: VecDeque<(Vec<usize>, &BindingGraph)> = VecDeque::from([(Vec::new(), root)]);
        while let Some((path, graph)) = queue.pop_front() {
            for (index, child) in graph.subgraphs().iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(index);

                let base = base_name(child);
                let name = first_free(&base, |candidate| {
                    !taken.is_taken(candidate) && !taken.is_taken(&builder_name(candidate))
                })?;
                taken.reserve(&name);
                taken.reserve(&builder_name(&name));
                tracing::trace!(path = ?child_path, name = %name, "named subcomponent");

                names.insert(child_path.clone(), name);
                queue.push_back((child_path, child));
            }
        }
        Ok(Self { names, root_builder })
    }

    /// Builder struct name of the top-level component (`Builder` unless the graph names a type `Builder`).
    pub fn root_builder(&self) -> &str {
        &self.root_builder
    }

    /// Name of the subcomponent at `path` (child indices from the root).
    pub fn name_for(&self, path: &[usize]) -> Option<&str> {
        self.names.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builder struct name for a generated subcomponent struct.
pub fn builder_name(struct_name: &str) -> String {
    format!("{struct_name}{}", conventions::BUILDER_TYPE_SUFFIX)
}

/// Identifiers that start a relative path in a type spelling (`Rc<crate::Cache>` -> `Rc`).
///
/// Later path segments resolve inside the named module, so a generated struct cannot shadow them.
fn bare_type_names(spelling: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(tokens) = spelling.parse::<TokenStream>() {
        collect_bare(tokens, &mut out);
    }
    out
}

fn collect_bare(tokens: TokenStream, out: &mut Vec<String>) {
    // Set after `:` (path separator) and `'` (lifetime), whose following ident is not a path start.
    let mut continues = false;
    for tree in tokens {
        match tree {
            TokenTree::Ident(ident) => {
                if !continues {
                    out.push(ident.to_string());
                }
                continues = false;
            }
            TokenTree::Punct(punct) => continues = matches!(punct.as_char(), ':' | '\''),
            TokenTree::Group(group) => {
                continues = false;
                collect_bare(group.stream(), out);
            }
            TokenTree::Literal(_) => continues = false,
        }
    }
}

fn base_name(graph: &BindingGraph) -> String {
    let camel = names::to_upper_camel_case(graph.component_type().simple_name());
    if camel.is_empty() {
        return "Subcomponent".to_string();
    }
    names::escape_identifier(&camel)
}
