//! Level lifecycle (component F): coordinates the vertical/horizontal
//! distance stacks (component A) and the levelbase/component MST depots
//! (component B) on every extension-tree push and pop.
//!
//! This module owns the four stacks and enforces their relative push/pop
//! ordering (§3, §8); it does not itself talk to the distance/graph oracles
//! or the DCMST kernel — callers (the engine) compute the SD rows and the
//! extended MSTs and hand the finished values in, which keeps this module
//! trivially unit-testable against the stack-count invariants alone.

use thiserror::Error;

use crate::csr::{Csr, CsrDepot, CsrDepotError};
use crate::distances::SpecialDistance;
use crate::mldists::{MlDistsError, MultiLevelDists};
use crate::primitives::VertexId;

#[derive(Error, Debug, PartialEq)]
pub enum LevelError {
    #[error(transparent)]
    Dists(#[from] MlDistsError),
    #[error(transparent)]
    Csr(#[from] CsrDepotError),
    #[error("level_remove called with no levels on the stack")]
    NothingToRemove,
}

/// Owns vertical SDs, horizontal SDs, the levelbase MST depot, and the
/// component MST depot, enforcing the ordering guarantees of §5.
#[derive(Debug, Default)]
pub struct LevelLifecycle {
    vertical: MultiLevelDists,
    horizontal: MultiLevelDists,
    levelbase: CsrDepot,
    component: CsrDepot,
}

impl LevelLifecycle {
    pub fn new() -> Self {
        LevelLifecycle::default()
    }

    /// §3 lifecycle: created exactly once, before any `level_init`.
    pub fn add_root_level(&mut self) {
        self.levelbase.push_built(Csr::one_node());
        self.component.push_built(Csr::one_node());
        self.vertical.level_add_top(1, 1);
        self.horizontal.level_add_top(1, 1);
    }

    pub fn level_init(&mut self, max_slots: usize, ntargets: usize) {
        self.vertical.level_add_top(max_slots, ntargets);
    }

    /// Fill one leaf's vertical slot with its SDs to every current leaf
    /// below this level, in leaf-order.
    pub fn vertical_fill_leaf(
        &mut self,
        base: VertexId,
        targets: &[(VertexId, SpecialDistance)],
    ) -> Result<(), LevelError> {
        self.vertical.empty_slot_set_base(base)?;
        for &(id, d) in targets {
            self.vertical.empty_slot_target_ids()?.push(id);
            self.vertical.empty_slot_target_dists()?.push(d);
        }
        self.vertical.empty_slot_set_filled()?;
        Ok(())
    }

    /// `leaf_exit` discarding a slot whose base turned out to be ruled out
    /// before it was sealed.
    pub fn vertical_discard_leaf(&mut self) -> Result<(), LevelError> {
        self.vertical.empty_slot_reset().map_err(Into::into)
    }

    pub fn vertical_close(&mut self) -> Result<(), LevelError> {
        self.vertical.level_close_top().map_err(Into::into)
    }

    /// Push and immediately fill+seal the horizontal level for this step.
    /// Right-siblings appear as a fresh `(base, targets)` pair; left-sibling
    /// values are expected to already be present in the caller-supplied
    /// `targets` list (the caller is responsible for reading the
    /// already-stored value back via [LevelLifecycle::horizontal_target_dist]
    /// before this call, per §4.F's "right-siblings recompute, left-siblings
    /// read" rule).
    pub fn horizontal_add(
        &mut self,
        max_slots: usize,
        ntargets: usize,
        pairs: &[(VertexId, Vec<(VertexId, SpecialDistance)>)],
    ) -> Result<(), LevelError> {
        self.horizontal.level_add_top(max_slots, ntargets);
        for (base, targets) in pairs {
            self.horizontal.empty_slot_set_base(*base)?;
            for &(id, d) in targets {
                self.horizontal.empty_slot_target_ids()?.push(id);
                self.horizontal.empty_slot_target_dists()?.push(d);
            }
            self.horizontal.empty_slot_set_filled()?;
        }
        self.horizontal.level_close_top()?;
        Ok(())
    }

    pub fn horizontal_target_dist(
        &self,
        base: VertexId,
        target: VertexId,
    ) -> Result<SpecialDistance, LevelError> {
        self.horizontal.top_target_dist(base, target).map_err(Into::into)
    }

    /// Push the finished levelbase MST for this level (built by the caller:
    /// a one-node MST if extending from the root, otherwise the previous
    /// levelbase MST extended by every sibling of `ext_node` in leaf order).
    pub fn level_close(&mut self, new_levelbase: Csr) {
        self.levelbase.push_built(new_levelbase);
    }

    /// Tear down the top of vertical, horizontal, and levelbase, in that
    /// order (§4.F retraction). The component MST must already have been
    /// popped via [LevelLifecycle::component_remove].
    pub fn level_remove(&mut self) -> Result<(), LevelError> {
        self.horizontal.level_remove_top()?;
        self.levelbase.remove_top()?;
        self.vertical.level_remove_top()?;
        Ok(())
    }

    /// Push the finished component MST for this level.
    pub fn component_init(&mut self, new_component: Csr) {
        self.component.push_built(new_component);
    }

    /// Pop the current top component MST. `delete` only affects intent
    /// (Stage 1 rejection discards without the caller ever committing the
    /// level); the stack operation itself is the same either way.
    pub fn component_remove(&mut self, _delete: bool) -> Result<Csr, LevelError> {
        self.component.remove_top().map_err(Into::into)
    }

    pub fn component_top(&self) -> Result<&Csr, LevelError> {
        self.component.get_top().map_err(Into::into)
    }

    pub fn levelbase_top(&self) -> Result<&Csr, LevelError> {
        self.levelbase.get_top().map_err(Into::into)
    }

    pub fn n_component_csrs(&self) -> usize {
        self.component.n_csrs()
    }

    pub fn n_levelbase_csrs(&self) -> usize {
        self.levelbase.n_csrs()
    }

    pub fn n_horizontal_levels(&self) -> usize {
        self.horizontal.n_levels()
    }

    pub fn n_vertical_levels(&self) -> usize {
        self.vertical.n_levels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(vs: &[(VertexId, f64)]) -> Vec<(VertexId, SpecialDistance)> {
        vs.iter().map(|&(id, d)| (id, SpecialDistance::Known(d))).collect()
    }

    #[test]
    fn root_level_seeds_one_csr_on_each_depot() {
        let mut lc = LevelLifecycle::new();
        lc.add_root_level();
        assert_eq!(lc.n_component_csrs(), 1);
        assert_eq!(lc.n_levelbase_csrs(), 1);
        assert_eq!(lc.n_vertical_levels(), 1);
        assert_eq!(lc.n_horizontal_levels(), 1);
    }

    #[test]
    fn stack_counts_track_tree_depth_invariant() {
        let mut lc = LevelLifecycle::new();
        lc.add_root_level();

        for depth in 1..=3 {
            lc.level_init(8, depth);
            lc.vertical_fill_leaf(depth as VertexId, &known(&[(0, 1.0)])).unwrap();
            lc.vertical_close().unwrap();
            lc.horizontal_add(8, depth, &[(depth as VertexId, known(&[(0, 1.0)]))]).unwrap();
            lc.level_close(Csr::from_edges(2, &[(0, 1, 1.0)]));
            lc.component_init(Csr::from_edges(2, &[(0, 1, 1.0)]));

            assert_eq!(lc.n_component_csrs(), depth + 1);
            assert_eq!(lc.n_levelbase_csrs(), lc.n_horizontal_levels());
        }
    }

    #[test]
    fn push_pop_symmetry_restores_all_counts() {
        let mut lc = LevelLifecycle::new();
        lc.add_root_level();

        for _ in 0..3 {
            lc.level_init(8, 1);
            lc.vertical_fill_leaf(1, &known(&[(0, 1.0)])).unwrap();
            lc.vertical_close().unwrap();
            lc.horizontal_add(8, 1, &[(1, known(&[(0, 1.0)]))]).unwrap();
            lc.level_close(Csr::from_edges(2, &[(0, 1, 1.0)]));
            lc.component_init(Csr::from_edges(2, &[(0, 1, 1.0)]));
        }

        let before_component = lc.n_component_csrs();
        let before_levelbase = lc.n_levelbase_csrs();

        for _ in 0..3 {
            lc.component_remove(false).unwrap();
            lc.level_remove().unwrap();
        }

        assert_eq!(lc.n_component_csrs(), before_component - 3);
        assert_eq!(lc.n_levelbase_csrs(), before_levelbase - 3);
        assert_eq!(lc.n_component_csrs(), 1);
        assert_eq!(lc.n_levelbase_csrs(), 1);
    }

    #[test]
    fn discarding_an_unsealed_vertical_slot_keeps_level_open() {
        let mut lc = LevelLifecycle::new();
        lc.add_root_level();
        lc.level_init(8, 1);
        lc.vertical.empty_slot_set_base(1).unwrap();
        lc.vertical_discard_leaf().unwrap();
        assert_eq!(lc.vertical.level_n_slots(lc.vertical.top_level()).unwrap(), 0);
    }
}
