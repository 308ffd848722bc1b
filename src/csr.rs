//! CSR depot (component B): a stack of compressed-sparse-row MSTs.
//!
//! Each [Csr] represents an undirected MST over `n_nodes` tree leaves, with
//! leaves identified by their position in the extension tree's `leaves`
//! array rather than by graph vertex id (§4.B). Only the top of the depot
//! may be mutated; everything below it is frozen once sealed.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CsrDepotError {
    #[error("depot is empty")]
    EmptyDepot,
    #[error("top CSR is already marked/sealed and cannot be mutated")]
    TopAlreadyMarked,
}

/// An undirected MST in compressed-sparse-row form: `row_start[i]..row_start[i+1]`
/// indexes into `targets`/`weights` for node `i`'s incident edges. Each
/// undirected edge appears twice (once per direction), so a `k`-node MST has
/// `2(k-1)` entries, matching §4.B's invariant.
#[derive(Debug, Clone, Default)]
pub struct Csr {
    n_nodes: usize,
    row_start: Vec<usize>,
    targets: Vec<usize>,
    weights: Vec<f64>,
    marked: bool,
}

impl Csr {
    /// Build a CSR from an undirected edge list `(u, v, weight)` over `n_nodes`
    /// nodes. `n_nodes == 1` with an empty edge list is a legal zero-edge MST.
    pub fn from_edges(n_nodes: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut degree = vec![0usize; n_nodes];
        for &(u, v, _) in edges {
            degree[u] += 1;
            degree[v] += 1;
        }

        let mut row_start = vec![0usize; n_nodes + 1];
        for i in 0..n_nodes {
            row_start[i + 1] = row_start[i] + degree[i];
        }

        let mut targets = vec![0usize; row_start[n_nodes]];
        let mut weights = vec![0.0f64; row_start[n_nodes]];
        let mut cursor = row_start.clone();
        for &(u, v, w) in edges {
            targets[cursor[u]] = v;
            weights[cursor[u]] = w;
            cursor[u] += 1;

            targets[cursor[v]] = u;
            weights[cursor[v]] = w;
            cursor[v] += 1;
        }

        Csr {
            n_nodes,
            row_start,
            targets,
            weights,
            marked: false,
        }
    }

    /// A one-node MST with no edges.
    pub fn one_node() -> Self {
        Csr::from_edges(1, &[])
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Number of directed edge entries; `2 * (n_nodes - 1)` for a connected MST.
    pub fn n_directed_entries(&self) -> usize {
        self.targets.len()
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Total weight of the undirected edge set (each edge counted once).
    pub fn weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }

    /// Neighbors of node `i` as `(target, weight)` pairs.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.row_start[i];
        let end = self.row_start[i + 1];
        self.targets[start..end]
            .iter()
            .copied()
            .zip(self.weights[start..end].iter().copied())
    }
}

/// A LIFO stack of [Csr]s. Only `get_empty_top`'s result may be mutated, and
/// only until it is marked.
#[derive(Debug, Default)]
pub struct CsrDepot {
    stack: Vec<Csr>,
}

impl CsrDepot {
    pub fn new() -> Self {
        CsrDepot { stack: Vec::new() }
    }

    /// Push a fresh, unmarked, empty-edge CSR with `nnodes` nodes. The
    /// caller fills it in by replacing it via [CsrDepot::get_empty_top] or,
    /// more commonly, by building the finished [Csr] elsewhere and pushing
    /// it directly with [CsrDepot::push_built].
    pub fn add_empty_top_tree(&mut self, nnodes: usize) {
        self.stack.push(Csr {
            n_nodes: nnodes,
            row_start: vec![0; nnodes + 1],
            targets: Vec::new(),
            weights: Vec::new(),
            marked: false,
        });
    }

    /// Push an already-built CSR as the new unmarked top.
    pub fn push_built(&mut self, csr: Csr) {
        self.stack.push(csr);
    }

    pub fn get_empty_top(&mut self) -> Result<&mut Csr, CsrDepotError> {
        let top = self.stack.last_mut().ok_or(CsrDepotError::EmptyDepot)?;
        if top.marked {
            return Err(CsrDepotError::TopAlreadyMarked);
        }
        Ok(top)
    }

    /// Replace the contents of the mutable top with `csr` (used once the
    /// caller has finished building it via the DCMST kernel) and seal it.
    pub fn empty_top_set_marked(&mut self) -> Result<(), CsrDepotError> {
        let top = self.stack.last_mut().ok_or(CsrDepotError::EmptyDepot)?;
        top.marked = true;
        Ok(())
    }

    pub fn remove_top(&mut self) -> Result<Csr, CsrDepotError> {
        self.stack.pop().ok_or(CsrDepotError::EmptyDepot)
    }

    pub fn get_top(&self) -> Result<&Csr, CsrDepotError> {
        self.stack.last().ok_or(CsrDepotError::EmptyDepot)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn n_csrs(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_node_mst_has_no_edges() {
        let csr = Csr::one_node();
        assert_eq!(csr.n_nodes(), 1);
        assert_eq!(csr.n_directed_entries(), 0);
        assert_eq!(csr.weight(), 0.0);
    }

    #[test]
    fn triangle_path_mst_has_expected_directed_entries() {
        let csr = Csr::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(csr.n_directed_entries(), 2 * (3 - 1));
        assert_eq!(csr.weight(), 2.0);
        let neighbors_of_1: Vec<_> = csr.neighbors(1).collect();
        assert_eq!(neighbors_of_1.len(), 2);
    }

    #[test]
    fn depot_push_pop_symmetry() {
        let mut depot = CsrDepot::new();
        depot.push_built(Csr::one_node());
        depot.push_built(Csr::from_edges(2, &[(0, 1, 3.0)]));
        assert_eq!(depot.n_csrs(), 2);
        depot.remove_top().unwrap();
        assert_eq!(depot.n_csrs(), 1);
        depot.remove_top().unwrap();
        assert!(depot.is_empty());
        assert_eq!(depot.remove_top(), Err(CsrDepotError::EmptyDepot));
    }

    #[test]
    fn only_top_is_mutable() {
        let mut depot = CsrDepot::new();
        depot.add_empty_top_tree(1);
        depot.empty_top_set_marked().unwrap();
        assert_eq!(depot.get_empty_top(), Err(CsrDepotError::TopAlreadyMarked));
    }
}
