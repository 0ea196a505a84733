//! Cycle detection over declaration dependencies.
//!
//! Alias chains and trait extensions form directed graphs over declaration
//! names. Every strongly connected component with more than one member, or
//! with a self-loop, is a cycle.

use std::collections::HashMap;

use petgraph::{algo::tarjan_scc, graph::DiGraph};

/// Find every cycle among `nodes`.
///
/// `edges` returns the names a node depends on; names that are not nodes
/// are ignored. Each cycle lists its members in the order of `nodes`, and
/// cycles are ordered by their first member.
pub(super) fn find_cycles<'p, I, F>(nodes: I, mut edges: F) -> Vec<Vec<&'p str>>
where
    I: IntoIterator<Item = &'p str>,
    F: FnMut(&'p str) -> Vec<&'p str>,
{
    let mut graph: DiGraph<&'p str, ()> = DiGraph::new();
    let mut indices = HashMap::new();

    for name in nodes {
        indices
            .entry(name)
            .or_insert_with(|| graph.add_node(name));
    }

    let names: Vec<&'p str> = graph.node_weights().copied().collect();
    for name in names {
        let from = indices[name];
        for target in edges(name) {
            if let Some(&to) = indices.get(target) {
                graph.update_edge(from, to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<&'p str>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .map(|mut component| {
            component.sort();
            component.into_iter().map(|index| graph[index]).collect()
        })
        .collect();

    cycles.sort_by_key(|cycle| indices[cycle[0]]);
    cycles
}
