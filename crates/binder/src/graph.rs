//! Strongly connected components over index graphs.
//!
//! Nodes are `0..n`; `dependency_map[a]` holds the nodes `a` depends on.
//! Ordered maps keep the component order reproducible across runs.

use std::collections::{BTreeMap, BTreeSet};

pub(crate) type DependencyMap = BTreeMap<usize, BTreeSet<usize>>;

/// Kosaraju: components in dependency order (dependencies first).
///
/// Every node in `0..node_count` appears in exactly one component, members
/// sorted ascending.
#[must_use]
pub(crate) fn strongly_connected_components(
    node_count: usize,
    dependency_map: &DependencyMap,
) -> Vec<Vec<usize>> {
    // Pass 1: order by finish time.
    let mut order = Vec::with_capacity(node_count);
    let mut visited = vec![false; node_count];
    for node in 0..node_count {
        dfs_order(dependency_map, &mut visited, &mut order, node);
    }
    order.reverse();

    let transpose = transpose(node_count, dependency_map);

    // Pass 2: collect components on the transposed graph.
    let mut assigned = vec![false; node_count];
    let mut sccs = Vec::new();
    for node in order {
        if !assigned[node] {
            let mut scc = Vec::new();
            dfs_assign(&transpose, &mut assigned, &mut scc, node);
            scc.sort_unstable();
            sccs.push(scc);
        }
    }
    // Kosaraju yields dependents first on a "depends on" graph.
    sccs.reverse();
    sccs
}

/// Components that form a cycle: more than one member, or a self loop.
#[must_use]
pub(crate) fn cycles(node_count: usize, dependency_map: &DependencyMap) -> Vec<Vec<usize>> {
    strongly_connected_components(node_count, dependency_map)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1
                || dependency_map
                    .get(&scc[0])
                    .is_some_and(|deps| deps.contains(&scc[0]))
        })
        .collect()
}

fn transpose(node_count: usize, dependency_map: &DependencyMap) -> DependencyMap {
    let mut out: DependencyMap = (0..node_count).map(|k| (k, BTreeSet::new())).collect();
    for (&src, dests) in dependency_map {
        for &dst in dests {
            out.entry(dst).or_default().insert(src);
        }
    }
    out
}

fn dfs_order(dependency_map: &DependencyMap, visited: &mut [bool], order: &mut Vec<usize>, node: usize) {
    if visited[node] {
        return;
    }
    visited[node] = true;
    if let Some(children) = dependency_map.get(&node) {
        for &c in children {
            dfs_order(dependency_map, visited, order, c);
        }
    }
    order.push(node);
}

fn dfs_assign(transpose: &DependencyMap, assigned: &mut [bool], scc: &mut Vec<usize>, node: usize) {
    if assigned[node] {
        return;
    }
    assigned[node] = true;
    scc.push(node);
    if let Some(parents) = transpose.get(&node) {
        for &p in parents {
            dfs_assign(transpose, assigned, scc, p);
        }
    }
}
