//! PC mark cache (prize-collecting refinement of component E).
//!
//! While a leaf is being tested for extension (§4.F `leaf_init`/`leaf_exit`),
//! the prize-collecting variant additionally marks non-tree vertices
//! adjacent to the base leaf that are themselves terminals: routing through
//! such a vertex and collecting its prize can make an otherwise-unattractive
//! detour cheap enough to beat a bottleneck that would otherwise look
//! dominant. The cache holds, per marked vertex, the best ("smallest net")
//! such detour cost found so far, checked against candidate SDs during
//! bottleneck testing.

use crate::oracle::GraphOracle;
use crate::primitives::VertexId;

#[derive(Debug, Default)]
pub struct PcMarkCache {
    marks: Vec<Option<f64>>,
    marked_vertices: Vec<VertexId>,
    active: bool,
}

impl PcMarkCache {
    pub fn new(n_vertices: usize) -> Self {
        PcMarkCache {
            marks: vec![None; n_vertices],
            marked_vertices: Vec::new(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `activate`: scan `start`'s graph neighbors for non-tree terminal
    /// vertices and record the net detour cost `edge_cost - prize` for each,
    /// keeping the smallest if a vertex is reachable more than once.
    pub fn activate(&mut self, graph: &dyn GraphOracle, start: VertexId, in_tree: &[bool]) {
        debug_assert!(!self.active, "PC mark cache activated while already active");
        for (edge_id, neighbor) in graph.neighbors(start) {
            if in_tree[neighbor] || !graph.is_term(neighbor) {
                continue;
            }
            let net = graph.edge_cost(edge_id) - graph.prize(neighbor);
            let slot = &mut self.marks[neighbor];
            *slot = Some(slot.map_or(net, |existing| existing.min(net)));
            self.marked_vertices.push(neighbor);
        }
        self.active = true;
    }

    /// `deactivate`: clear every mark set since the matching `activate`.
    pub fn deactivate(&mut self) {
        for v in self.marked_vertices.drain(..) {
            self.marks[v] = None;
        }
        self.active = false;
    }

    /// Whether `candidate_sd` is dominated by the cached detour through
    /// `vertex` (i.e. a cheaper route already exists via its prize), within
    /// `eps`.
    pub fn dominates(&self, vertex: VertexId, candidate_sd: f64, eps: f64) -> bool {
        self.marks
            .get(vertex)
            .copied()
            .flatten()
            .map(|net| net < candidate_sd - eps)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::InMemoryGraphOracle;

    #[test]
    fn activate_marks_adjacent_terminal_with_net_detour_cost() {
        let mut g = InMemoryGraphOracle::new(3);
        g.add_edge(0, 1, 1.0);
        g.set_is_term(1, true);
        g.set_prize(1, 0.6);

        let in_tree = vec![true, false, false];
        let mut cache = PcMarkCache::new(3);
        cache.activate(&g, 0, &in_tree);

        assert!(cache.dominates(1, 1.0, 1e-9));
        assert!(!cache.dominates(1, 0.3, 1e-9));
    }

    #[test]
    fn deactivate_clears_marks() {
        let mut g = InMemoryGraphOracle::new(2);
        g.add_edge(0, 1, 1.0);
        g.set_is_term(1, true);
        g.set_prize(1, 0.5);

        let in_tree = vec![true, false];
        let mut cache = PcMarkCache::new(2);
        cache.activate(&g, 0, &in_tree);
        cache.deactivate();

        assert!(!cache.is_active());
        assert!(!cache.dominates(1, 10.0, 1e-9));
    }

    #[test]
    fn in_tree_and_non_terminal_neighbors_are_skipped() {
        let mut g = InMemoryGraphOracle::new(3);
        g.add_edge(0, 1, 1.0);
        g.add_edge(0, 2, 1.0);
        g.set_is_term(1, false);
        // vertex 2 is in_tree, so even though it's a terminal it's skipped.
        g.set_is_term(2, true);
        g.set_prize(2, 0.5);

        let in_tree = vec![true, false, true];
        let mut cache = PcMarkCache::new(3);
        cache.activate(&g, 0, &in_tree);

        assert!(!cache.dominates(1, 10.0, 1e-9));
        assert!(!cache.dominates(2, 10.0, 1e-9));
    }
}
