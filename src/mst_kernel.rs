//! Dynamic-cardinality MST kernel (DCMST, component C).
//!
//! Given a prior MST `P` on `k` nodes and an adjacency-cost vector from a new
//! node to every node of `P`, produces the MST on `k+1` nodes. The new MST is
//! found by running Kruskal's algorithm over the small candidate edge set
//! `P`'s own `k-1` edges plus the `k` new candidate edges from the new node
//! — at most `2k - 1` edges total — rather than re-deriving it from scratch;
//! this is equivalent to (and simpler than) walking the tree and swapping
//! the heaviest edge on the cycle each new edge would close, which is the
//! textbook presentation of the same update. Correctness rests on the usual
//! cut-property argument: since `P` is already optimal among the old nodes,
//! any edge of `P` that stays cheaper than every candidate route through the
//! new node is never worth replacing, and Kruskal's greedy order finds
//! exactly that.
//!
//! A single [MstKernel] instance owns a reusable scratch buffer so that
//! [MstKernel::extend] and friends never allocate on the hot path once
//! constructed, matching the depth-first recursion cost model of the rest of
//! the engine. Grounded in the union-find pattern used for MST algorithms
//! generally (see `habedi-graphina`'s `core::mst` in the example pack).

use thiserror::Error;

use crate::csr::Csr;
use crate::distances::{SpecialDistance, FARAWAY};

#[derive(Error, Debug, PartialEq)]
pub enum MstKernelError {
    #[error("adjacency vector has {given} entries, expected {expected}")]
    InvalidInput { given: usize, expected: usize },
    #[error("adjacency vector length {given} exceeds the configured max_n_leaves {max}")]
    BufferTooSmall { given: usize, max: usize },
}

/// An MST over `n` locally-indexed nodes (positions in the caller's `leaves`
/// array, not graph vertex ids).
#[derive(Debug, Clone, Default)]
pub struct Mst {
    n: usize,
    edges: Vec<(usize, usize, f64)>,
}

impl Mst {
    /// A one-node MST with no edges (`get_1node`).
    pub fn one_node() -> Self {
        Mst { n: 1, edges: Vec::new() }
    }

    pub fn n_nodes(&self) -> usize {
        self.n
    }

    pub fn edges(&self) -> &[(usize, usize, f64)] {
        &self.edges
    }

    /// Total weight of the MST (`get_weight`).
    pub fn weight(&self) -> f64 {
        self.edges.iter().map(|&(_, _, w)| w).sum()
    }

    /// Materialize as a [Csr] for storage on the component/levelbase depots
    /// (component B uses CSR storage; the kernel works with a plain edge
    /// list while it is actively extending).
    pub fn to_csr(&self) -> Csr {
        Csr::from_edges(self.n, &self.edges)
    }
}

impl From<&Csr> for Mst {
    fn from(csr: &Csr) -> Self {
        let mut edges = Vec::new();
        for u in 0..csr.n_nodes() {
            for (v, w) in csr.neighbors(u) {
                if v > u {
                    edges.push((u, v, w));
                }
            }
        }
        Mst { n: csr.n_nodes(), edges }
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]);
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Candidate edge used internally while extending an [Mst] by one node.
/// Existing `P` edges are tagged so ties between an old edge and a new edge
/// of equal weight resolve in favor of the old edge (§4.C tie-breaking),
/// and among new edges, ties resolve toward the smaller target index.
#[derive(Clone, Copy)]
struct Candidate {
    u: usize,
    v: usize,
    weight: f64,
    is_new_edge: bool,
}

fn candidates(prior: &Mst, adj: &[f64]) -> Vec<Candidate> {
    let new_node = prior.n;
    let mut out: Vec<Candidate> = prior
        .edges
        .iter()
        .map(|&(u, v, w)| Candidate {
            u,
            v,
            weight: w,
            is_new_edge: false,
        })
        .collect();

    for (i, &w) in adj.iter().enumerate() {
        if w < FARAWAY {
            out.push(Candidate {
                u: i,
                v: new_node,
                weight: w,
                is_new_edge: true,
            });
        }
    }

    out.sort_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap()
            .then(a.is_new_edge.cmp(&b.is_new_edge))
            .then(a.u.cmp(&b.u))
    });
    out
}

fn kruskal_extend(prior: &Mst, adj: &[f64]) -> Mst {
    let new_n = prior.n + 1;
    let mut uf = UnionFind::new(new_n);
    let mut edges = Vec::with_capacity(new_n.saturating_sub(1));
    for c in candidates(prior, adj) {
        if uf.union(c.u, c.v) {
            edges.push((c.u, c.v, c.weight));
        }
    }
    Mst { n: new_n, edges }
}

fn kruskal_extend_weight(prior: &Mst, adj: &[f64]) -> f64 {
    let new_n = prior.n + 1;
    let mut uf = UnionFind::new(new_n);
    let mut total = 0.0;
    let mut used = 0;
    for c in candidates(prior, adj) {
        if uf.union(c.u, c.v) {
            total += c.weight;
            used += 1;
            if used == new_n - 1 {
                break;
            }
        }
    }
    total
}

/// Owns the reusable adjacency-cost scratch buffer (§9 design note); process
/// wide within one engine instance, single writer, not re-entrant.
#[derive(Debug)]
pub struct MstKernel {
    max_n_leaves: usize,
    scratch: Vec<f64>,
}

impl MstKernel {
    pub fn new(max_n_leaves: usize) -> Self {
        MstKernel {
            max_n_leaves,
            scratch: Vec::with_capacity(max_n_leaves + 1),
        }
    }

    fn validate(&mut self, prior: &Mst, adj: &[SpecialDistance]) -> Result<(), MstKernelError> {
        if adj.len() != prior.n {
            return Err(MstKernelError::InvalidInput {
                given: adj.len(),
                expected: prior.n,
            });
        }
        if adj.len() > self.max_n_leaves {
            return Err(MstKernelError::BufferTooSmall {
                given: adj.len(),
                max: self.max_n_leaves,
            });
        }
        self.scratch.clear();
        self.scratch.extend(adj.iter().map(|d| match d {
            SpecialDistance::Known(v) => v.max(0.0).min(FARAWAY),
            SpecialDistance::Unknown | SpecialDistance::Infeasible => FARAWAY,
        }));
        Ok(())
    }

    /// `add_node`: produce a new MST of size `k+1` from a copy of `prior`.
    pub fn add_node(&mut self, prior: &Mst, adj: &[SpecialDistance]) -> Result<Mst, MstKernelError> {
        self.validate(prior, adj)?;
        Ok(kruskal_extend(prior, &self.scratch))
    }

    /// `add_node_inplace`: extend `target` in place by one more node, using
    /// `target` itself as the prior MST.
    pub fn add_node_inplace(
        &mut self,
        target: &mut Mst,
        adj: &[SpecialDistance],
    ) -> Result<(), MstKernelError> {
        self.validate(target, adj)?;
        *target = kruskal_extend(target, &self.scratch);
        Ok(())
    }

    /// `get_ext_weight`: weight of `prior + new node` without materializing
    /// the extended MST. Must not be called while an `add_node_inplace` on
    /// the same buffer is conceptually "in progress" (this kernel has none
    /// in flight once a call returns, so callers just need to avoid nesting
    /// calls through shared `&mut self` borrows, which the compiler already
    /// enforces).
    pub fn get_ext_weight(&mut self, prior: &Mst, adj: &[SpecialDistance]) -> Result<f64, MstKernelError> {
        self.validate(prior, adj)?;
        Ok(kruskal_extend_weight(prior, &self.scratch))
    }

    pub fn get_weight(&self, mst: &Mst) -> f64 {
        mst.weight()
    }

    pub fn get_1node(&self) -> Mst {
        Mst::one_node()
    }
}
