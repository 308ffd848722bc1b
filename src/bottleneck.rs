//! Bottleneck distance tracker (component D).
//!
//! Tracks, for every vertex on a single currently-marked root path, the
//! bottleneck distance back down to the nearest degree-≥3 branch point (or
//! the start of the path, whichever is closer). Degree-2 "chain" vertices
//! accumulate the running maximum; a degree-≥3 vertex resets it. In the
//! prize-collecting variant, passing through a non-leaf terminal also folds
//! in the alternative of paying for both adjoining edges and recovering the
//! terminal's prize, since that alternative can exceed the plain max (§4.D,
//! §8 scenario 6).

use thiserror::Error;

use crate::primitives::VertexId;

#[derive(Error, Debug, PartialEq)]
pub enum BottleneckError {
    #[error("a root path is already marked; unmark it before marking another")]
    AlreadyMarked,
    #[error("no root path is currently marked")]
    NoMarkedPath,
    #[error("unmark_root_path called with start {given}, but the marked start is {marked}")]
    UnmarkMismatch { given: VertexId, marked: VertexId },
}

/// Read-only view onto the extension tree's per-vertex arrays, borrowed for
/// the duration of a single tracker call. Mirrors the accessor style of the
/// graph oracle (§6): plain index-based lookups, no owned tree structure.
pub struct TreeView<'a> {
    pub parent_node: &'a [Option<VertexId>],
    pub parent_edge_cost: &'a [f64],
    pub tree_deg: &'a [usize],
    pub prize: &'a [f64],
    pub is_terminal: &'a [bool],
}

impl<'a> TreeView<'a> {
    fn is_non_leaf_terminal(&self, v: VertexId) -> bool {
        self.is_terminal[v] && self.tree_deg[v] > 1
    }
}

/// Per-vertex bottleneck distances along the current marked root path; `None`
/// everywhere else.
#[derive(Debug)]
pub struct BottleneckTracker {
    bottleneck: Vec<Option<f64>>,
    marked_start: Option<VertexId>,
    pc_mode: bool,
}

impl BottleneckTracker {
    pub fn new(n_vertices: usize, pc_mode: bool) -> Self {
        BottleneckTracker {
            bottleneck: vec![None; n_vertices],
            marked_start: None,
            pc_mode,
        }
    }

    pub fn is_marked(&self) -> bool {
        self.marked_start.is_some()
    }

    pub fn marked_start(&self) -> Option<VertexId> {
        self.marked_start
    }

    fn grow_to(&mut self, v: VertexId) {
        if v >= self.bottleneck.len() {
            self.bottleneck.resize(v + 1, None);
        }
    }

    /// One accumulation step: fold edge cost `c` leaving vertex `from` into
    /// the running max, including the prize-collecting alternative when
    /// `from` is a non-leaf terminal.
    fn accumulate(&self, view: &TreeView, acc: f64, from: VertexId, c: f64) -> f64 {
        let plain = acc.max(c);
        if self.pc_mode && view.is_non_leaf_terminal(from) {
            plain.max(acc + c - view.prize[from])
        } else {
            plain
        }
    }

    /// `mark_root_path`: walk from `start` to the root, setting `bottleneck`
    /// for every ancestor.
    pub fn mark_root_path(&mut self, start: VertexId, view: &TreeView) -> Result<(), BottleneckError> {
        if self.marked_start.is_some() {
            return Err(BottleneckError::AlreadyMarked);
        }

        self.grow_to(start);
        let mut acc = 0.0;
        let mut cur = start;
        while let Some(parent) = view.parent_node[cur] {
            let c = view.parent_edge_cost[cur];
            acc = self.accumulate(view, acc, cur, c);
            self.grow_to(parent);
            self.bottleneck[parent] = Some(acc);
            if view.tree_deg[parent] >= 3 {
                acc = 0.0;
            }
            cur = parent;
        }

        self.marked_start = Some(start);
        Ok(())
    }

    /// `unmark_root_path`: restore every vertex touched by the matching
    /// `mark_root_path(start)` back to unset.
    pub fn unmark_root_path(&mut self, start: VertexId, view: &TreeView) -> Result<(), BottleneckError> {
        let marked = self
            .marked_start
            .ok_or(BottleneckError::NoMarkedPath)?;
        if marked != start {
            return Err(BottleneckError::UnmarkMismatch { given: start, marked });
        }

        let mut cur = start;
        while let Some(parent) = view.parent_node[cur] {
            self.bottleneck[parent] = None;
            cur = parent;
        }
        self.marked_start = None;
        Ok(())
    }

    /// `get_bottleneck_dist`: walk `v_unmarked` up until a vertex with a set
    /// bottleneck is hit, accumulating along the way, then combine with the
    /// stored value.
    pub fn get_bottleneck_dist(
        &self,
        v_unmarked: VertexId,
        view: &TreeView,
    ) -> Result<f64, BottleneckError> {
        if self.marked_start.is_none() {
            return Err(BottleneckError::NoMarkedPath);
        }

        if v_unmarked == self.marked_start.unwrap() {
            // Walk the root path from scratch to report the root value.
            let mut acc = 0.0;
            let mut cur = v_unmarked;
            let mut last = acc;
            while let Some(parent) = view.parent_node[cur] {
                let c = view.parent_edge_cost[cur];
                acc = self.accumulate(view, acc, cur, c);
                last = self.bottleneck[parent].unwrap_or(acc);
                if view.tree_deg[parent] >= 3 {
                    acc = 0.0;
                }
                cur = parent;
            }
            return Ok(last);
        }

        let mut acc = 0.0;
        let mut cur = v_unmarked;
        loop {
            if let Some(b) = self.bottleneck.get(cur).copied().flatten() {
                return Ok(acc.max(b));
            }
            let parent = view.parent_node[cur].ok_or(BottleneckError::NoMarkedPath)?;
            let c = view.parent_edge_cost[cur];
            acc = self.accumulate(view, acc, cur, c);
            cur = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `0 - t - 2`, t a non-leaf PC terminal with prize 0.4, both edges 1.0.
    fn path_view() -> (Vec<Option<VertexId>>, Vec<f64>, Vec<usize>, Vec<f64>, Vec<bool>) {
        // indices: 0 = root, 1 = t, 2 = leaf
        let parent_node = vec![None, Some(0), Some(1)];
        let parent_edge_cost = vec![0.0, 1.0, 1.0];
        let tree_deg = vec![1, 2, 1];
        let prize = vec![0.0, 0.4, 0.0];
        let is_terminal = vec![false, true, false];
        (parent_node, parent_edge_cost, tree_deg, prize, is_terminal)
    }

    #[test]
    fn pc_prize_subtraction_matches_worked_example() {
        let (parent_node, parent_edge_cost, tree_deg, prize, is_terminal) = path_view();
        let view = TreeView {
            parent_node: &parent_node,
            parent_edge_cost: &parent_edge_cost,
            tree_deg: &tree_deg,
            prize: &prize,
            is_terminal: &is_terminal,
        };

        let mut tracker = BottleneckTracker::new(3, true);
        tracker.mark_root_path(2, &view).unwrap();
        let dist = tracker.get_bottleneck_dist(0, &view).unwrap();
        assert!((dist - 1.6).abs() < 1e-9);
    }

    #[test]
    fn non_pc_chain_uses_plain_max() {
        let (parent_node, parent_edge_cost, tree_deg, prize, is_terminal) = path_view();
        let view = TreeView {
            parent_node: &parent_node,
            parent_edge_cost: &parent_edge_cost,
            tree_deg: &tree_deg,
            prize: &prize,
            is_terminal: &is_terminal,
        };

        let mut tracker = BottleneckTracker::new(3, false);
        tracker.mark_root_path(2, &view).unwrap();
        let dist = tracker.get_bottleneck_dist(0, &view).unwrap();
        assert!((dist - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mark_unmark_round_trip_restores_state() {
        let (parent_node, parent_edge_cost, tree_deg, prize, is_terminal) = path_view();
        let view = TreeView {
            parent_node: &parent_node,
            parent_edge_cost: &parent_edge_cost,
            tree_deg: &tree_deg,
            prize: &prize,
            is_terminal: &is_terminal,
        };

        let mut tracker = BottleneckTracker::new(3, false);
        tracker.mark_root_path(2, &view).unwrap();
        tracker.unmark_root_path(2, &view).unwrap();
        assert!(!tracker.is_marked());
        assert_eq!(tracker.bottleneck, vec![None, None, None]);
    }

    #[test]
    fn double_mark_is_rejected() {
        let (parent_node, parent_edge_cost, tree_deg, prize, is_terminal) = path_view();
        let view = TreeView {
            parent_node: &parent_node,
            parent_edge_cost: &parent_edge_cost,
            tree_deg: &tree_deg,
            prize: &prize,
            is_terminal: &is_terminal,
        };

        let mut tracker = BottleneckTracker::new(3, false);
        tracker.mark_root_path(2, &view).unwrap();
        assert_eq!(tracker.mark_root_path(0, &view), Err(BottleneckError::AlreadyMarked));
    }

    #[test]
    fn unmark_mismatch_is_rejected() {
        let (parent_node, parent_edge_cost, tree_deg, prize, is_terminal) = path_view();
        let view = TreeView {
            parent_node: &parent_node,
            parent_edge_cost: &parent_edge_cost,
            tree_deg: &tree_deg,
            prize: &prize,
            is_terminal: &is_terminal,
        };

        let mut tracker = BottleneckTracker::new(3, false);
        tracker.mark_root_path(2, &view).unwrap();
        assert_eq!(
            tracker.unmark_root_path(0, &view),
            Err(BottleneckError::UnmarkMismatch { given: 0, marked: 2 })
        );
    }
}
