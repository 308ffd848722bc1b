//! Shared identifier types used across the engine.
//!
//! Vertex and edge ids are always ids into the caller's graph, *not* positions
//! in the [crate::extension_tree]'s `leaves` array; the latter are plain
//! `usize` offsets and are kept untyped to avoid a confusing second wrapper.

/// Identifier of a vertex in the underlying graph.
pub type VertexId = usize;

/// Identifier of an undirected edge in the underlying graph.
///
/// Per [crate::oracle], the directed arc id divided by two gives the
/// undirected edge id used to index `edges_is_eq_forbidden`.
pub type EdgeId = usize;

/// Sentinel stored in a parent-pointer slot to mean "no parent" (the root).
pub const NO_VERTEX: VertexId = VertexId::MAX;
