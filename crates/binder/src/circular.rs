//! Module-level import graph and import cycle breaking.

use crate::binder::{Binder, ImportKind};
use crate::graph::{cycles, DependencyMap};
use crate::registry::BinderRegistry;
use crate::ResolveError;
use catalog::ModuleRef;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Import edge between two modules, merged over every binder of the
/// importing module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleEdge {
    kind: ImportKind,
    deferrable: bool,
}

impl ModuleEdge {
    #[must_use]
    #[inline]
    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    #[must_use]
    #[inline]
    pub fn is_deferrable(&self) -> bool {
        self.deferrable
    }
}

/// `importing module → imported module` graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleGraph {
    /// Sorted, so index order is module order.
    modules: Vec<ModuleRef>,
    edges: BTreeMap<(usize, usize), ModuleEdge>,
}

impl ModuleGraph {
    #[must_use]
    pub fn from_binders(binders: &[Binder]) -> Self {
        let modules: Vec<ModuleRef> = binders
            .iter()
            .flat_map(|b| std::iter::once(b.module()).chain(b.imports().keys()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position = |m: &ModuleRef| modules.binary_search(m).ok();

        let mut edges: BTreeMap<(usize, usize), ModuleEdge> = BTreeMap::new();
        for binder in binders {
            let Some(from) = position(binder.module()) else {
                continue;
            };
            for (module, import) in binder.imports() {
                let Some(to) = position(module) else {
                    continue;
                };
                let edge = edges.entry((from, to)).or_insert(ModuleEdge {
                    kind: ImportKind::Deferred,
                    deferrable: true,
                });
                if import.kind() == ImportKind::Direct {
                    edge.kind = ImportKind::Direct;
                }
                edge.deferrable &= import.is_deferrable();
            }
        }
        Self { modules, edges }
    }

    #[must_use]
    #[inline]
    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    /// Edges in `(from, to)` order.
    pub fn edges(&self) -> impl Iterator<Item = (&ModuleRef, &ModuleRef, &ModuleEdge)> {
        self.edges
            .iter()
            .map(|(&(from, to), edge)| (&self.modules[from], &self.modules[to], edge))
    }

    /// Edges turned into forward-declaration-only references.
    #[must_use]
    pub fn deferred(&self) -> Vec<(&ModuleRef, &ModuleRef)> {
        self.edges()
            .filter(|(_, _, edge)| edge.kind == ImportKind::Deferred)
            .map(|(from, to, _)| (from, to))
            .collect()
    }

    /// Cycles among modules over direct edges only.
    #[must_use]
    pub fn direct_cycles(&self) -> Vec<Vec<&ModuleRef>> {
        cycles(self.modules.len(), &self.direct_map())
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| scc.into_iter().map(|i| &self.modules[i]).collect())
            .collect()
    }

    fn direct_map(&self) -> DependencyMap {
        let mut map = DependencyMap::new();
        for (&(from, to), edge) in &self.edges {
            if edge.kind == ImportKind::Direct {
                map.entry(from).or_default().insert(to);
            }
        }
        map
    }

    /// Defer edges until no direct cycle remains. In each cycle the first
    /// deferrable direct edge in `(from, to)` order is deferred.
    fn break_cycles(&mut self) -> Result<usize, ResolveError> {
        let mut deferred = 0usize;
        loop {
            let sccs: Vec<Vec<usize>> = cycles(self.modules.len(), &self.direct_map())
                .into_iter()
                .filter(|scc| scc.len() > 1)
                .collect();
            if sccs.is_empty() {
                return Ok(deferred);
            }
            for scc in sccs {
                let members: BTreeSet<usize> = scc.iter().copied().collect();
                let candidate = self
                    .edges
                    .iter_mut()
                    .filter(|((from, to), edge)| {
                        edge.kind == ImportKind::Direct && members.contains(from) && members.contains(to)
                    })
                    .find(|(_, edge)| edge.deferrable);
                let Some((&(from, to), edge)) = candidate else {
                    return Err(ResolveError::UnresolvableImportCycle {
                        modules: scc.iter().map(|&i| &self.modules[i]).join(", "),
                    });
                };
                edge.kind = ImportKind::Deferred;
                deferred += 1;
                info!("Deferring import {} -> {}", self.modules[from], self.modules[to]);
            }
        }
    }
}

impl BinderRegistry {
    /// Break every import cycle by deferring edges, in the module graph and
    /// in the imports of every affected binder.
    ///
    /// An acyclic import graph is left unchanged. A cycle made only of
    /// by-value or base-class imports is fatal.
    pub fn check_circular(&mut self) -> Result<ModuleGraph, ResolveError> {
        let mut graph = ModuleGraph::from_binders(self.binders());
        let deferred = graph.break_cycles()?;
        if deferred > 0 {
            let pairs: Vec<(ModuleRef, ModuleRef)> = graph
                .deferred()
                .into_iter()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect();
            for binder in self.binders_mut() {
                for (from, to) in &pairs {
                    if binder.module() == from {
                        binder.defer_import(to);
                    }
                }
            }
        }
        info!("Deferred {} module imports", deferred);
        Ok(graph)
    }
}
