//! Dependency graph construction.
//!
//! Discovery walks the registration table breadth-first from a root module
//! and materializes exactly one descriptor per distinct name. A dependency
//! that was never registered aborts discovery before the resolver ever sees
//! a partial graph.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::contracts::Module;
use crate::registry::RegistryError;

/// Static metadata plus the instance for one module. Immutable once built;
/// at most one descriptor exists per name in a graph.
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub priority: i32,
    pub module: Arc<dyn Module>,
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("priority", &self.priority)
            .finish()
    }
}

/// What the builder records per registered name.
pub(crate) struct Declaration {
    pub(crate) deps: &'static [&'static str],
    pub(crate) priority: i32,
    pub(crate) module: Arc<dyn Module>,
}

/// Every module reachable from the root, in first-discovery order. Owned by
/// the resolver for the duration of one build and discarded afterwards.
#[derive(Debug)]
pub(crate) struct DependencyGraph {
    pub(crate) nodes: Vec<ModuleDescriptor>,
    pub(crate) index: HashMap<&'static str, usize>,
}

impl DependencyGraph {
    /// Breadth-first discovery from `root` over the registration table.
    pub(crate) fn discover(
        root: &'static str,
        table: &HashMap<&'static str, Declaration>,
    ) -> Result<Self, RegistryError> {
        let root_decl = table
            .get(root)
            .ok_or_else(|| RegistryError::UnknownModule(root.to_string()))?;

        let mut nodes = Vec::new();
        let mut index = HashMap::new();
        let mut queue = VecDeque::new();

        index.insert(root, nodes.len());
        nodes.push(descriptor(root, root_decl));
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            let Some(decl) = table.get(current) else {
                continue;
            };
            for &dep in decl.deps {
                if index.contains_key(dep) {
                    continue;
                }
                let dep_decl =
                    table
                        .get(dep)
                        .ok_or_else(|| RegistryError::MissingDependency {
                            module: current.to_string(),
                            dependency: dep.to_string(),
                        })?;
                index.insert(dep, nodes.len());
                nodes.push(descriptor(dep, dep_decl));
                queue.push_back(dep);
            }
        }

        Ok(Self { nodes, index })
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn descriptor(name: &'static str, decl: &Declaration) -> ModuleDescriptor {
    ModuleDescriptor {
        name,
        deps: decl.deps,
        priority: decl.priority,
        module: decl.module.clone(),
    }
}
