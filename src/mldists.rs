//! Multi-level distance store (MLDISTS, component A).
//!
//! A stack of [DistLevel]s, each holding a set of slots. Every slot is bound
//! to a *base* leaf and stores, as two parallel arrays, the ids and special
//! distances of every *target* leaf the base was compared against. This
//! mirrors the vertical/horizontal split of §3: callers push one level per
//! extension step and fill its slots leaf-by-leaf.

use thiserror::Error;

use crate::distances::SpecialDistance;
use crate::primitives::VertexId;

#[derive(Error, Debug, PartialEq)]
pub enum MlDistsError {
    #[error("level has no open slot; call empty_slot_set_base first")]
    NoOpenSlot,
    #[error("level already has {0} slots, the max for this level")]
    SlotCapacityExceeded(usize),
    #[error("no level on the stack")]
    EmptyStack,
}

/// One base-vertex's row of target distances.
#[derive(Debug, Clone)]
struct Slot {
    base: VertexId,
    ids: Vec<VertexId>,
    dists: Vec<SpecialDistance>,
    filled: bool,
}

impl Slot {
    fn new(base: VertexId) -> Self {
        Slot {
            base,
            ids: Vec::new(),
            dists: Vec::new(),
            filled: false,
        }
    }
}

/// One layer of the distance stack, corresponding to one extension step.
#[derive(Debug, Clone)]
pub struct DistLevel {
    max_slots: usize,
    ntargets: usize,
    slots: Vec<Slot>,
    open: bool,
    sealed: bool,
}

impl DistLevel {
    fn new(max_slots: usize, ntargets: usize) -> Self {
        DistLevel {
            max_slots,
            ntargets,
            slots: Vec::with_capacity(max_slots),
            open: false,
            sealed: false,
        }
    }

    fn slot_for(&self, base: VertexId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.base == base)
    }
}

/// The stack of levels. Strictly LIFO: only the top level can be mutated or
/// removed (§5 ordering guarantees).
#[derive(Debug, Default)]
pub struct MultiLevelDists {
    levels: Vec<DistLevel>,
}

impl MultiLevelDists {
    pub fn new() -> Self {
        MultiLevelDists { levels: Vec::new() }
    }

    /// Push a new empty level with room for at most `max_slots` slots, each
    /// sized for `ntargets` target entries.
    pub fn level_add_top(&mut self, max_slots: usize, ntargets: usize) {
        self.levels.push(DistLevel::new(max_slots, ntargets));
    }

    fn top_mut(&mut self) -> Result<&mut DistLevel, MlDistsError> {
        self.levels.last_mut().ok_or(MlDistsError::EmptyStack)
    }

    fn top(&self) -> Result<&DistLevel, MlDistsError> {
        self.levels.last().ok_or(MlDistsError::EmptyStack)
    }

    /// Bind the next empty slot of the top level to base vertex `v`.
    pub fn empty_slot_set_base(&mut self, v: VertexId) -> Result<(), MlDistsError> {
        let level = self.top_mut()?;
        if level.sealed {
            panic!("bug: empty_slot_set_base called on a sealed level");
        }
        if level.slots.len() >= level.max_slots {
            return Err(MlDistsError::SlotCapacityExceeded(level.max_slots));
        }
        level.slots.push(Slot::new(v));
        level.open = true;
        Ok(())
    }

    fn open_slot_mut(&mut self) -> Result<&mut Slot, MlDistsError> {
        let level = self.top_mut()?;
        if !level.open {
            return Err(MlDistsError::NoOpenSlot);
        }
        Ok(level.slots.last_mut().expect("open flag implies a slot exists"))
    }

    /// Mutable view onto the open slot's target ids, in fill order.
    pub fn empty_slot_target_ids(&mut self) -> Result<&mut Vec<VertexId>, MlDistsError> {
        Ok(&mut self.open_slot_mut()?.ids)
    }

    /// Mutable view onto the open slot's target distances, in fill order.
    pub fn empty_slot_target_dists(&mut self) -> Result<&mut Vec<SpecialDistance>, MlDistsError> {
        Ok(&mut self.open_slot_mut()?.dists)
    }

    /// Seal the open slot so it is addressable by its base vertex.
    pub fn empty_slot_set_filled(&mut self) -> Result<(), MlDistsError> {
        let level = self.top_mut()?;
        if !level.open {
            return Err(MlDistsError::NoOpenSlot);
        }
        let slot = level.slots.last_mut().expect("open flag implies a slot exists");
        if slot.ids.len() != slot.dists.len() {
            panic!("bug: slot ids/dists length mismatch on seal");
        }
        slot.filled = true;
        level.open = false;
        Ok(())
    }

    /// Discard the in-progress (unsealed) slot.
    pub fn empty_slot_reset(&mut self) -> Result<(), MlDistsError> {
        let level = self.top_mut()?;
        if !level.open {
            return Err(MlDistsError::NoOpenSlot);
        }
        level.slots.pop();
        level.open = false;
        Ok(())
    }

    /// Seal the top level so no further slots may be added.
    pub fn level_close_top(&mut self) -> Result<(), MlDistsError> {
        let level = self.top_mut()?;
        if level.open {
            panic!("bug: level_close_top called with an open slot");
        }
        level.sealed = true;
        Ok(())
    }

    /// Discard the top level outright.
    pub fn level_remove_top(&mut self) -> Result<(), MlDistsError> {
        self.levels.pop().ok_or(MlDistsError::EmptyStack)?;
        Ok(())
    }

    /// Look up `top_target_dist(base, target)`; `FARAWAY`-equivalent
    /// [SpecialDistance::Infeasible] for self-pairs and for explicitly
    /// stored unknown pairs.
    pub fn top_target_dist(
        &self,
        base: VertexId,
        target: VertexId,
    ) -> Result<SpecialDistance, MlDistsError> {
        if base == target {
            return Ok(SpecialDistance::Infeasible);
        }
        let level = self.top()?;
        let slot = level
            .slot_for(base)
            .filter(|s| s.filled)
            .ok_or(MlDistsError::NoOpenSlot)?;
        Ok(slot
            .ids
            .iter()
            .position(|&id| id == target)
            .map(|i| slot.dists[i])
            .unwrap_or(SpecialDistance::Unknown))
    }

    /// Read-only view of every `(target, dist)` pair stored for `base` at
    /// the top level.
    pub fn top_target_dists(
        &self,
        base: VertexId,
    ) -> Result<Vec<(VertexId, SpecialDistance)>, MlDistsError> {
        let level = self.top()?;
        let slot = level
            .slot_for(base)
            .filter(|s| s.filled)
            .ok_or(MlDistsError::NoOpenSlot)?;
        Ok(slot.ids.iter().copied().zip(slot.dists.iter().copied()).collect())
    }

    /// Number of filled target entries the top level holds for `base`.
    pub fn level_ntop_targets(&self) -> Result<usize, MlDistsError> {
        Ok(self.top()?.ntargets)
    }

    /// Index of the top level (0-based).
    pub fn top_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Number of levels currently on the stack.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of slots filled so far at level `l`.
    pub fn level_n_slots(&self, l: usize) -> Result<usize, MlDistsError> {
        self.levels
            .get(l)
            .map(|lvl| lvl.slots.len())
            .ok_or(MlDistsError::EmptyStack)
    }
}
