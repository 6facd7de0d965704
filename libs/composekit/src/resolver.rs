//! Cycle detection and deterministic topological linearization.
//!
//! Cycle detection is a classic three-color depth-first traversal; a module
//! entered while still gray is a back edge, reported with the full chain
//! from the re-entered module back to itself. Linearization is Kahn's
//! algorithm with a priority-ordered ready queue: among modules with no
//! path between them, higher declared priority goes first, then earlier
//! discovery. A pair connected by a dependency edge is never reordered.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::DependencyGraph;
use crate::registry::RegistryError;

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White, // unvisited
    Gray,  // on the current DFS stack
    Black, // finished
}

/// Produce the resolved order as indices into the graph's discovery order.
pub(crate) fn resolve(graph: &DependencyGraph) -> Result<Vec<usize>, RegistryError> {
    let n = graph.len();

    // Edge direction: dependency -> dependent.
    let mut adj = vec![Vec::<usize>::new(); n];
    let mut indegree = vec![0usize; n];
    for (dependent, node) in graph.nodes.iter().enumerate() {
        for dep in node.deps {
            let d = graph.index[dep];
            adj[d].push(dependent);
            indegree[dependent] += 1;
        }
    }

    if let Some(chain) = find_cycle(graph, &adj) {
        return Err(RegistryError::CircularDependency { chain });
    }

    // Max-heap keyed by (priority, Reverse(discovery index)): pops the
    // highest-priority ready module, earliest-discovered on ties.
    let mut ready = BinaryHeap::new();
    for (i, &deg) in indegree.iter().enumerate() {
        if deg == 0 {
            ready.push((graph.nodes[i].priority, Reverse(i)));
        }
    }

    let mut order = Vec::with_capacity(n);
    while let Some((_, Reverse(u))) = ready.pop() {
        order.push(u);
        for &w in &adj[u] {
            indegree[w] -= 1;
            if indegree[w] == 0 {
                ready.push((graph.nodes[w].priority, Reverse(w)));
            }
        }
    }

    debug_assert_eq!(order.len(), n);
    Ok(order)
}

fn find_cycle(graph: &DependencyGraph, adj: &[Vec<usize>]) -> Option<Vec<&'static str>> {
    fn dfs(
        node: usize,
        graph: &DependencyGraph,
        adj: &[Vec<usize>],
        colors: &mut [Color],
        path: &mut Vec<usize>,
    ) -> Option<Vec<&'static str>> {
        colors[node] = Color::Gray;
        path.push(node);

        for &next in &adj[node] {
            match colors[next] {
                Color::Gray => {
                    // Back edge: the cycle runs from `next` to the top of the path.
                    if let Some(start) = path.iter().position(|&p| p == next) {
                        let mut chain: Vec<&'static str> =
                            path[start..].iter().map(|&i| graph.nodes[i].name).collect();
                        chain.push(graph.nodes[next].name);
                        return Some(chain);
                    }
                }
                Color::White => {
                    if let Some(chain) = dfs(next, graph, adj, colors, path) {
                        return Some(chain);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node] = Color::Black;
        None
    }

    let mut colors = vec![Color::White; adj.len()];
    let mut path = Vec::new();
    for i in 0..adj.len() {
        if colors[i] == Color::White {
            if let Some(chain) = dfs(i, graph, adj, &mut colors, &mut path) {
                return Some(chain);
            }
        }
    }
    None
}
