//! Dependency ordering of binders.

use crate::graph::{cycles, strongly_connected_components, DependencyMap};
use crate::registry::BinderRegistry;
use common::{case_insensitive_key, DiagnosticKind};
use itertools::Itertools;
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl BinderRegistry {
    /// Order binders so every binder follows the binders it references by
    /// value, by reference or as a base class.
    ///
    /// Kahn's algorithm; ties go to the case-insensitively lowest name. When
    /// nothing is ready, each remaining cycle is reported once and its members
    /// are flagged for review. The lowest-named member of a cycle that waits
    /// on nothing outside itself is then released.
    pub fn sort_binders(&mut self) {
        let count = self.len();
        let dependency_map = self.ordering_edges();
        let keys: Vec<(String, String)> = self
            .binders()
            .iter()
            .map(|b| case_insensitive_key(b.name()))
            .collect();

        let mut dependents = vec![Vec::new(); count];
        let mut pending = vec![0usize; count];
        for (&binder, deps) in &dependency_map {
            pending[binder] = deps.len();
            for &dep in deps {
                dependents[dep].push(binder);
            }
        }

        let mut ready: BTreeSet<(&(String, String), usize)> = (0..count)
            .filter(|&i| pending[i] == 0)
            .map(|i| (&keys[i], i))
            .collect();
        let mut emitted = vec![false; count];
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            let next = match ready.pop_first() {
                Some((_, i)) => i,
                None => {
                    let remaining = remaining_edges(&dependency_map, &emitted);
                    self.report_cycles(&remaining);
                    let Some(released) = releasable(&remaining, count).into_iter().min_by_key(|&i| &keys[i]) else {
                        break;
                    };
                    debug!("Releasing {} to break a type cycle", self.binders()[released]);
                    released
                }
            };
            emitted[next] = true;
            order.push(next);
            for &dependent in &dependents[next] {
                pending[dependent] = pending[dependent].saturating_sub(1);
                if pending[dependent] == 0 && !emitted[dependent] {
                    ready.insert((&keys[dependent], dependent));
                }
            }
        }

        let mut slots: Vec<_> = std::mem::take(self.binders_mut()).into_iter().map(Some).collect();
        *self.binders_mut() = order.into_iter().filter_map(|i| slots[i].take()).collect();
    }

    /// `binder → binders it must follow`, self references dropped.
    fn ordering_edges(&self) -> DependencyMap {
        let index = self.name_index();
        self.binders()
            .iter()
            .enumerate()
            .map(|(i, binder)| {
                let deps = binder
                    .dependencies()
                    .iter()
                    .filter(|dep| dep.usage.orders())
                    .filter_map(|dep| index.get(&dep.name).copied())
                    .filter(|&j| j != i)
                    .collect();
                (i, deps)
            })
            .collect()
    }

    /// Report every not yet reported cycle among the binders still waiting.
    fn report_cycles(&mut self, remaining: &DependencyMap) {
        for cycle in cycles(self.len(), remaining) {
            if cycle.len() < 2 {
                continue;
            }
            let members: Vec<String> = cycle
                .iter()
                .map(|&i| self.binders()[i].name().to_string())
                .sorted_by_cached_key(|name| case_insensitive_key(name))
                .collect();
            let names = members.join(", ");
            if !self.mark_reported(members) {
                continue;
            }
            let binders = self.binders();
            let modules: BTreeSet<String> = cycle.iter().map(|&i| binders[i].module().to_string()).collect();
            let message = if modules.len() == 1 {
                format!("intra-module type cycle in {}", modules.iter().join(", "))
            } else {
                format!("cross-module type cycle across {}", modules.iter().join(", "))
            };
            warn!("{}: {}", message, names);
            self.diagnostics_mut().push(DiagnosticKind::TypeCycle, names, message);
            for &i in &cycle {
                self.binders_mut()[i].flag_for_review();
            }
        }
    }
}

/// Edges among the binders not yet emitted.
fn remaining_edges(dependency_map: &DependencyMap, emitted: &[bool]) -> DependencyMap {
    dependency_map
        .iter()
        .filter(|(&binder, _)| !emitted[binder])
        .map(|(&binder, deps)| (binder, deps.iter().copied().filter(|&d| !emitted[d]).collect()))
        .collect()
}

/// Members of the cycles whose waiting dependencies all lie inside the cycle.
///
/// A stuck graph always has one, since every unemitted binder still waits on
/// another unemitted binder.
fn releasable(remaining: &DependencyMap, node_count: usize) -> Vec<usize> {
    strongly_connected_components(node_count, remaining)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .filter(|scc| {
            scc.iter().all(|member| {
                remaining
                    .get(member)
                    .map_or(true, |deps| deps.iter().all(|dep| scc.binary_search(dep).is_ok()))
            })
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::binder::Binder;
    use crate::registry::BinderRegistry;
    use catalog::{ModuleRef, TypeDependency, Usage};
    use common::DiagnosticKind;

    fn binder(name: &str, module: &str, deps: &[(&str, Usage)]) -> Binder {
        Binder::new(
            name,
            ModuleRef::new("OCCT", module),
            &format!("{name}.hxx"),
            deps.iter()
                .map(|&(n, usage)| TypeDependency {
                    name: n.to_string(),
                    usage,
                })
                .collect(),
        )
    }

    fn sorted(binders: Vec<Binder>) -> (Vec<String>, BinderRegistry) {
        let mut registry = BinderRegistry::from_binders(binders);
        registry.sort_binders();
        let names = registry.binders().iter().map(|b| b.name().to_string()).collect();
        (names, registry)
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn acyclic_order_is_topologically_valid() {
        let binders = vec![
            binder("Geom_Line", "Geom", &[("Geom_Curve", Usage::Base), ("gp_Lin", Usage::Reference)]),
            binder("Geom_Curve", "Geom", &[("Geom_Geometry", Usage::Base)]),
            binder("gp_Lin", "gp", &[("gp_Ax1", Usage::Value)]),
            binder("Geom_Geometry", "Geom", &[]),
            binder("gp_Ax1", "gp", &[("gp_Pnt", Usage::Value)]),
            binder("gp_Pnt", "gp", &[]),
        ];
        let (order, registry) = sorted(binders.clone());
        for b in &binders {
            for dep in b.dependencies() {
                assert!(position(&order, &dep.name) < position(&order, b.name()), "{} before {}", dep.name, b.name());
            }
        }
        assert!(registry.diagnostics().is_empty());

        let (again, _) = sorted(binders.into_iter().rev().collect());
        assert_eq!(order, again);
    }

    #[test]
    fn ties_are_case_insensitive_with_exact_second() {
        let (order, _) = sorted(vec![
            binder("b_Thing", "b", &[]),
            binder("A_Thing", "A", &[]),
            binder("a_Thing", "a", &[]),
            binder("B_Other", "B", &[]),
        ]);
        assert_eq!(order, vec!["A_Thing", "a_Thing", "B_Other", "b_Thing"]);
    }

    #[test]
    fn pointer_usage_does_not_order() {
        let (order, registry) = sorted(vec![
            binder("A_First", "A", &[("B_Second", Usage::Pointer)]),
            binder("B_Second", "B", &[("A_First", Usage::Value)]),
        ]);
        assert_eq!(order, vec!["A_First", "B_Second"]);
        assert!(registry.diagnostics().is_empty());
    }

    #[test]
    fn type_cycle_is_reported_once_and_released_by_name() {
        let (order, registry) = sorted(vec![
            binder("Geom_B", "Geom", &[("Geom_A", Usage::Value)]),
            binder("Geom_A", "Geom", &[("Geom_B", Usage::Reference)]),
            binder("Geom_C", "Geom", &[("Geom_A", Usage::Value)]),
            binder("gp_Pnt", "gp", &[]),
        ]);
        assert_eq!(order, vec!["gp_Pnt", "Geom_A", "Geom_B", "Geom_C"]);
        let diagnostics = registry.diagnostics();
        assert_eq!(diagnostics.count(DiagnosticKind::TypeCycle), 1);
        let cycle = diagnostics.iter().next().unwrap();
        assert_eq!(cycle.subject(), "Geom_A, Geom_B");
        assert!(cycle.message().starts_with("intra-module"));
        assert!(registry.get("Geom_A").unwrap().needs_review());
        assert!(registry.get("Geom_B").unwrap().needs_review());
        assert!(!registry.get("Geom_C").unwrap().needs_review());
    }

    #[test]
    fn binder_waiting_behind_a_cycle_follows_it() {
        let (order, registry) = sorted(vec![
            binder("Geom_A", "Geom", &[("Geom_Z1", Usage::Base)]),
            binder("Geom_Z1", "Geom", &[("Geom_Z2", Usage::Value)]),
            binder("Geom_Z2", "Geom", &[("Geom_Z1", Usage::Value)]),
        ]);
        assert_eq!(order, vec!["Geom_Z1", "Geom_A", "Geom_Z2"]);
        assert!(!registry.get("Geom_A").unwrap().needs_review());
        assert!(registry.get("Geom_Z1").unwrap().needs_review());
        assert_eq!(registry.diagnostics().count(DiagnosticKind::TypeCycle), 1);
    }

    #[test]
    fn only_the_cycle_without_outside_waits_is_released() {
        // Geom_Ca <-> Geom_Cb waits on Geom_Za <-> Geom_Zb.
        let (order, registry) = sorted(vec![
            binder("Geom_Ca", "Geom", &[("Geom_Cb", Usage::Value), ("Geom_Za", Usage::Base)]),
            binder("Geom_Cb", "Geom", &[("Geom_Ca", Usage::Value)]),
            binder("Geom_Za", "Geom", &[("Geom_Zb", Usage::Value)]),
            binder("Geom_Zb", "Geom", &[("Geom_Za", Usage::Value)]),
        ]);
        assert!(position(&order, "Geom_Za") < position(&order, "Geom_Ca"));
        assert!(position(&order, "Geom_Zb") < position(&order, "Geom_Ca"));
        assert_eq!(registry.diagnostics().count(DiagnosticKind::TypeCycle), 2);
    }

    #[test]
    fn cross_module_cycles_are_labelled() {
        let (_, registry) = sorted(vec![
            binder("gp_A", "gp", &[("Geom_B", Usage::Value)]),
            binder("Geom_B", "Geom", &[("gp_A", Usage::Value)]),
        ]);
        let cycle = registry.diagnostics().iter().next().unwrap();
        assert_eq!(cycle.message(), "cross-module type cycle across OCCT.Geom, OCCT.gp");
    }
}
