//! Oracle traits (§6.1): the graph/distance-data collaborators this engine
//! consumes but does not own. Production callers plug in their own graph and
//! distance-data structures; this crate ships [InMemoryGraphOracle], a small
//! adjacency-list fixture good enough for tests, benches, and the fuzz
//! target, in the same spirit as the teacher crate's own `testing_utils`
//! fixtures rather than a dependency on its CLI/file-format code.

use crate::distances::SpecialDistance;
use crate::primitives::{EdgeId, VertexId};

/// Supplies special distances between leaf pairs, with an equality
/// rule-out variant that can pretend a set of edges is temporarily absent.
pub trait DistanceOracle {
    /// `sd_double(u, v)`: the special distance between `u` and `v`.
    fn sd_double(&self, u: VertexId, v: VertexId) -> SpecialDistance;

    /// `sd_double_forbidden(dist_eq, forbidden_edges, u, v)`: recompute the
    /// special distance between `u` and `v` as if every edge in
    /// `forbidden_edges` did not exist, for the equality rule-out check
    /// (§4.E). `dist_eq` is the bottleneck value the result is being
    /// compared against; implementations may use it to short-circuit once
    /// they can prove no cheaper alternative remains.
    fn sd_double_forbidden(
        &self,
        dist_eq: f64,
        forbidden_edges: &[EdgeId],
        u: VertexId,
        v: VertexId,
    ) -> SpecialDistance;
}

/// Undirected graph with per-edge costs and per-vertex terminal/prize
/// attributes, exposed via head/tail and CSR-style adjacency accessors.
pub trait GraphOracle {
    fn n_vertices(&self) -> usize;
    fn n_edges(&self) -> usize;

    /// The two endpoints of undirected edge `e`.
    fn endpoints(&self, e: EdgeId) -> (VertexId, VertexId);

    /// Cost of undirected edge `e`.
    fn edge_cost(&self, e: EdgeId) -> f64;

    /// Neighbors of `v` as `(edge id, other endpoint)` pairs.
    fn neighbors(&self, v: VertexId) -> Vec<(EdgeId, VertexId)>;

    /// Prize-collecting prize at `v`; `0.0` outside the PC variant.
    fn prize(&self, v: VertexId) -> f64;

    /// Whether `v` is a terminal (always true for every vertex in the
    /// non-PC variant's usual formulation, but kept explicit since the PC
    /// variant distinguishes terminals from Steiner points).
    fn is_term(&self, v: VertexId) -> bool;
}

/// Adjacency-list [GraphOracle] fixture for tests, benches, and fuzzing.
/// Not part of the production surface: real callers bring their own graph
/// representation per the non-goals in §1.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphOracle {
    edges: Vec<(VertexId, VertexId, f64)>,
    adjacency: Vec<Vec<(EdgeId, VertexId)>>,
    prize: Vec<f64>,
    is_term: Vec<bool>,
}

impl InMemoryGraphOracle {
    pub fn new(n_vertices: usize) -> Self {
        InMemoryGraphOracle {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); n_vertices],
            prize: vec![0.0; n_vertices],
            is_term: vec![true; n_vertices],
        }
    }

    pub fn add_edge(&mut self, u: VertexId, v: VertexId, cost: f64) -> EdgeId {
        let id = self.edges.len();
        self.edges.push((u, v, cost));
        self.adjacency[u].push((id, v));
        self.adjacency[v].push((id, u));
        id
    }

    pub fn set_prize(&mut self, v: VertexId, prize: f64) {
        self.prize[v] = prize;
    }

    pub fn set_is_term(&mut self, v: VertexId, is_term: bool) {
        self.is_term[v] = is_term;
    }
}

impl GraphOracle for InMemoryGraphOracle {
    fn n_vertices(&self) -> usize {
        self.adjacency.len()
    }

    fn n_edges(&self) -> usize {
        self.edges.len()
    }

    fn endpoints(&self, e: EdgeId) -> (VertexId, VertexId) {
        let (u, v, _) = self.edges[e];
        (u, v)
    }

    fn edge_cost(&self, e: EdgeId) -> f64 {
        self.edges[e].2
    }

    fn neighbors(&self, v: VertexId) -> Vec<(EdgeId, VertexId)> {
        self.adjacency[v].clone()
    }

    fn prize(&self, v: VertexId) -> f64 {
        self.prize[v]
    }

    fn is_term(&self, v: VertexId) -> bool {
        self.is_term[v]
    }
}

/// [DistanceOracle] built from plain-shortest-path distances over an
/// [InMemoryGraphOracle], via a simple Dijkstra; good enough for tests and
/// the fuzz target, which only need a consistent, queryable oracle, not a
/// production-grade special-distance computation (that machinery is
/// explicitly out of scope per §1).
#[derive(Debug, Clone)]
pub struct InMemoryDistanceOracle<'a> {
    graph: &'a InMemoryGraphOracle,
}

impl<'a> InMemoryDistanceOracle<'a> {
    pub fn new(graph: &'a InMemoryGraphOracle) -> Self {
        InMemoryDistanceOracle { graph }
    }

    fn dijkstra(&self, src: VertexId, forbidden: &[EdgeId]) -> Vec<f64> {
        use std::cmp::Ordering;
        use std::collections::BinaryHeap;

        #[derive(PartialEq)]
        struct HeapItem(f64, VertexId);
        impl Eq for HeapItem {}
        impl PartialOrd for HeapItem {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for HeapItem {
            fn cmp(&self, other: &Self) -> Ordering {
                other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
            }
        }

        let n = self.graph.n_vertices();
        let mut dist = vec![f64::INFINITY; n];
        dist[src] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(HeapItem(0.0, src));

        while let Some(HeapItem(d, u)) = heap.pop() {
            if d > dist[u] {
                continue;
            }
            for (edge_id, v) in self.graph.neighbors(u) {
                if forbidden.contains(&edge_id) {
                    continue;
                }
                let nd = d + self.graph.edge_cost(edge_id);
                if nd < dist[v] {
                    dist[v] = nd;
                    heap.push(HeapItem(nd, v));
                }
            }
        }
        dist
    }
}

impl<'a> DistanceOracle for InMemoryDistanceOracle<'a> {
    fn sd_double(&self, u: VertexId, v: VertexId) -> SpecialDistance {
        if u == v {
            return SpecialDistance::Infeasible;
        }
        let dist = self.dijkstra(u, &[]);
        SpecialDistance::from_raw(dist[v].min(crate::distances::FARAWAY)).unwrap_or(SpecialDistance::Infeasible)
    }

    fn sd_double_forbidden(
        &self,
        _dist_eq: f64,
        forbidden_edges: &[EdgeId],
        u: VertexId,
        v: VertexId,
    ) -> SpecialDistance {
        if u == v {
            return SpecialDistance::Infeasible;
        }
        let dist = self.dijkstra(u, forbidden_edges);
        SpecialDistance::from_raw(dist[v].min(crate::distances::FARAWAY)).unwrap_or(SpecialDistance::Infeasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_shortest_path_matches_direct_edge() {
        let mut g = InMemoryGraphOracle::new(3);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 1.0);
        let e02 = g.add_edge(0, 2, 1.5);
        let oracle = InMemoryDistanceOracle::new(&g);

        assert_eq!(oracle.sd_double(0, 2), SpecialDistance::Known(1.5));
        // Forbid the direct edge: the two-hop path costs 2.0.
        assert_eq!(
            oracle.sd_double_forbidden(1.5, &[e02], 0, 2),
            SpecialDistance::Known(2.0)
        );
    }

    #[test]
    fn unreachable_vertex_is_infeasible() {
        let g = InMemoryGraphOracle::new(2);
        let oracle = InMemoryDistanceOracle::new(&g);
        assert_eq!(oracle.sd_double(0, 1), SpecialDistance::Infeasible);
    }
}
