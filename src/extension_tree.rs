//! Extension tree (§3 data model): the shared, engine-owned state describing
//! the current candidate subtree under evaluation.
//!
//! All per-vertex arrays (`tree_deg`, `parent_node`, `parent_edge_cost`) are
//! indexed by graph vertex id and sized to the whole graph, not just the
//! vertices currently in the tree; `0`/`None` marks "not in tree". Leaf
//! additions are logged so they can be undone in strict LIFO order, matching
//! the level stack's own push/pop discipline (§5).

use thiserror::Error;

use crate::bottleneck::TreeView;
use crate::primitives::{EdgeId, VertexId, NO_VERTEX};

#[derive(Error, Debug, PartialEq)]
pub enum ExtensionTreeError {
    #[error("vertex {0} is already in the tree")]
    AlreadyInTree(VertexId),
    #[error("no leaf additions left to undo")]
    NothingToUndo,
    #[error("parent {0} has no remaining capacity for another child")]
    ParentNotLeaf(VertexId),
}

struct AddedLeaf {
    child: VertexId,
    parent: VertexId,
    parent_was_leaf: bool,
}

/// Record of a path-to-root walk, most distant ancestor last.
pub struct RootPathEdges {
    pub edges: Vec<EdgeId>,
}

/// The rooted candidate subtree. Position `0` of `leaves` is the root of the
/// initial component and never moves.
#[derive(Debug)]
pub struct ExtensionTree {
    leaves: Vec<VertexId>,
    inner_nodes: Vec<VertexId>,
    tree_deg: Vec<usize>,
    parent_node: Vec<Option<VertexId>>,
    parent_edge_cost: Vec<f64>,
    parent_edge_id: Vec<Option<EdgeId>>,
    tree_depth: usize,
    tree_cost: f64,
    depth_of: Vec<usize>,
    additions: Vec<AddedLeaf>,
    max_deg: usize,
}

impl ExtensionTree {
    /// `max_deg` bounds `tree_deg`, counting both the parent edge and every
    /// child edge; a vertex can accept another child only while it has
    /// room left under that cap (§4.F, `config.max_deg`).
    pub fn new(n_vertices: usize, root: VertexId, max_deg: usize) -> Self {
        let mut tree_deg = vec![0usize; n_vertices];
        tree_deg[root] = 0;
        ExtensionTree {
            leaves: vec![root],
            inner_nodes: Vec::new(),
            tree_deg,
            parent_node: vec![None; n_vertices],
            parent_edge_cost: vec![0.0; n_vertices],
            parent_edge_id: vec![None; n_vertices],
            tree_depth: 0,
            tree_cost: 0.0,
            depth_of: vec![0; n_vertices],
            additions: Vec::new(),
            max_deg,
        }
    }

    pub fn root(&self) -> VertexId {
        self.leaves[0]
    }

    pub fn leaves(&self) -> &[VertexId] {
        &self.leaves
    }

    pub fn inner_nodes(&self) -> &[VertexId] {
        &self.inner_nodes
    }

    pub fn tree_depth(&self) -> usize {
        self.tree_depth
    }

    pub fn tree_cost(&self) -> f64 {
        self.tree_cost
    }

    pub fn tree_deg(&self, v: VertexId) -> usize {
        self.tree_deg[v]
    }

    /// Whether `v` still has capacity to accept another child edge, i.e. is
    /// still eligible to be extended from (the tree's "frontier"). A fresh
    /// root starts at `tree_deg == 0`; a fresh non-root leaf starts at
    /// `tree_deg == 1` (its own parent edge).
    pub fn is_leaf(&self, v: VertexId) -> bool {
        self.tree_deg[v] < self.max_deg
    }

    pub fn is_in_tree(&self, v: VertexId) -> bool {
        v == self.root() || self.parent_node[v].is_some()
    }

    pub fn parent_node(&self, v: VertexId) -> Option<VertexId> {
        self.parent_node[v]
    }

    pub fn parent_edge_cost(&self, v: VertexId) -> f64 {
        self.parent_edge_cost[v]
    }

    pub fn parent_edge_id(&self, v: VertexId) -> Option<EdgeId> {
        self.parent_edge_id[v]
    }

    /// Edge ids on the tree path from `from` up to (but not including)
    /// `ancestor`, used to build the forbidden-edge set for equality
    /// rule-out (§4.E). Empty if `ancestor` is not actually an ancestor of
    /// `from`.
    pub fn path_edges_to_ancestor(&self, from: VertexId, ancestor: VertexId) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        let mut cur = from;
        while cur != ancestor {
            match self.parent_node[cur] {
                Some(parent) => {
                    if let Some(e) = self.parent_edge_id[cur] {
                        edges.push(e);
                    }
                    cur = parent;
                }
                None => return Vec::new(),
            }
        }
        edges
    }

    /// `view`: borrow the arrays [crate::bottleneck::BottleneckTracker] needs,
    /// adapted to its `Option`-free sentinel convention.
    pub fn view<'a>(&'a self, prize: &'a [f64], is_terminal: &'a [bool]) -> TreeView<'a> {
        TreeView {
            parent_node: &self.parent_node,
            parent_edge_cost: &self.parent_edge_cost,
            tree_deg: &self.tree_deg,
            prize,
            is_terminal,
        }
    }

    /// Sentinel-encoded parent pointer, per §3 ("root's parent is none",
    /// encoded here as [NO_VERTEX] for callers that want a flat `usize`
    /// array rather than `Option`).
    pub fn parent_or_sentinel(&self, v: VertexId) -> VertexId {
        self.parent_node[v].unwrap_or(NO_VERTEX)
    }

    /// Add `child` as a new leaf under `parent`, which must currently be a
    /// leaf of the tree (extension always grows from the frontier).
    pub fn add_leaf(
        &mut self,
        parent: VertexId,
        child: VertexId,
        edge_cost: f64,
        edge_id: Option<EdgeId>,
    ) -> Result<(), ExtensionTreeError> {
        if self.is_in_tree(child) {
            return Err(ExtensionTreeError::AlreadyInTree(child));
        }
        if !self.is_leaf(parent) {
            return Err(ExtensionTreeError::ParentNotLeaf(parent));
        }

        let parent_was_leaf = self.tree_deg[parent] <= 1;
        if parent_was_leaf && parent != self.root() {
            self.leaves.retain(|&l| l != parent);
            self.inner_nodes.push(parent);
        } else if parent == self.root() && self.tree_deg[parent] == 0 {
            // Root stays in `leaves` at position 0 even once it gains
            // children; only non-root vertices move to `inner_nodes`.
        }

        self.tree_deg[parent] += 1;
        self.tree_deg[child] = 1;
        self.parent_node[child] = Some(parent);
        self.parent_edge_cost[child] = edge_cost;
        self.parent_edge_id[child] = edge_id;
        self.leaves.push(child);
        self.tree_cost += edge_cost;

        let depth = self.depth_of[parent] + 1;
        self.depth_of[child] = depth;
        self.tree_depth = self.tree_depth.max(depth);

        self.additions.push(AddedLeaf {
            child,
            parent,
            parent_was_leaf,
        });
        Ok(())
    }

    /// Undo the most recent [ExtensionTree::add_leaf], restoring every field
    /// it touched.
    pub fn remove_last_leaf(&mut self) -> Result<VertexId, ExtensionTreeError> {
        let added = self.additions.pop().ok_or(ExtensionTreeError::NothingToUndo)?;

        self.leaves.retain(|&l| l != added.child);
        self.tree_cost -= self.parent_edge_cost[added.child];
        self.tree_deg[added.child] = 0;
        self.parent_node[added.child] = None;
        self.parent_edge_cost[added.child] = 0.0;
        self.parent_edge_id[added.child] = None;
        self.depth_of[added.child] = 0;

        self.tree_deg[added.parent] -= 1;
        if added.parent_was_leaf && added.parent != self.root() {
            self.inner_nodes.retain(|&n| n != added.parent);
            self.leaves.push(added.parent);
        }

        self.tree_depth = self.depth_of.iter().copied().max().unwrap_or(0);
        Ok(added.child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_has_only_the_root_as_a_leaf() {
        let tree = ExtensionTree::new(4, 0, 8);
        assert_eq!(tree.leaves(), &[0]);
        assert!(tree.inner_nodes().is_empty());
        assert_eq!(tree.tree_cost(), 0.0);
        assert_eq!(tree.tree_depth(), 0);
    }

    #[test]
    fn adding_a_second_child_promotes_parent_to_inner_node() {
        let mut tree = ExtensionTree::new(4, 0, 8);
        tree.add_leaf(0, 1, 1.0, None).unwrap();
        tree.add_leaf(1, 2, 2.0, None).unwrap();
        tree.add_leaf(1, 3, 3.0, None).unwrap();

        assert!(tree.inner_nodes().contains(&1));
        assert_eq!(tree.tree_deg(1), 3); // parent (root) edge + 2 children
        assert_eq!(tree.tree_cost(), 6.0);
        assert_eq!(tree.tree_depth(), 2);
    }

    #[test]
    fn add_then_remove_restores_original_state() {
        let mut tree = ExtensionTree::new(4, 0, 8);
        tree.add_leaf(0, 1, 1.0, None).unwrap();
        tree.add_leaf(1, 2, 2.0, None).unwrap();

        tree.remove_last_leaf().unwrap();
        tree.remove_last_leaf().unwrap();

        assert_eq!(tree.leaves(), &[0]);
        assert!(tree.inner_nodes().is_empty());
        assert_eq!(tree.tree_cost(), 0.0);
        assert_eq!(tree.tree_depth(), 0);
    }

    #[test]
    fn cannot_add_a_vertex_already_in_the_tree() {
        let mut tree = ExtensionTree::new(4, 0, 8);
        tree.add_leaf(0, 1, 1.0, None).unwrap();
        assert_eq!(tree.add_leaf(0, 1, 5.0, None), Err(ExtensionTreeError::AlreadyInTree(1)));
    }

    #[test]
    fn cannot_extend_from_a_non_leaf() {
        // max_deg 3: vertex 1 already carries its own parent edge (deg 1),
        // so it has room for exactly two children before hitting the cap.
        let mut tree = ExtensionTree::new(5, 0, 3);
        tree.add_leaf(0, 1, 1.0, None).unwrap();
        tree.add_leaf(1, 2, 1.0, None).unwrap();
        tree.add_leaf(1, 3, 1.0, None).unwrap();
        // vertex 1 is now at tree_deg 3 == max_deg: no capacity left.
        assert!(!tree.is_leaf(1));
        assert_eq!(tree.add_leaf(1, 4, 1.0, None), Err(ExtensionTreeError::ParentNotLeaf(1)));
    }

    #[test]
    fn a_parent_can_accept_more_than_one_child_within_its_degree_cap() {
        let mut tree = ExtensionTree::new(5, 0, 8);
        tree.add_leaf(0, 1, 1.0, None).unwrap();
        tree.add_leaf(1, 2, 1.0, None).unwrap();
        tree.add_leaf(1, 3, 1.0, None).unwrap();
        tree.add_leaf(1, 4, 1.0, None).unwrap();
        assert_eq!(tree.tree_deg(1), 4);
        assert!(tree.is_leaf(1));
    }
}
