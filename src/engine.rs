//! The top-level engine (§6 external interface): wires the extension tree,
//! level lifecycle, bottleneck tracker, DCMST kernel, and rule-out engine
//! together behind the flat operation set the outer presolver calls.

use logging_timer::stime;

use crate::bottleneck::BottleneckTracker;
use crate::config::EngineConfig;
use crate::distances::SpecialDistance;
use crate::extension_tree::ExtensionTree;
use crate::level::LevelLifecycle;
use crate::mst_kernel::{Mst, MstKernel};
use crate::oracle::{DistanceOracle, GraphOracle};
use crate::primitives::{EdgeId, VertexId};
use crate::rule_out::{CandidateLeaf, RuleOutEngine};

/// An edge from an existing tree leaf to a candidate neighbor, as supplied
/// by the outer driver (§6).
#[derive(Debug, Clone, Copy)]
pub struct EdgeToNeighbor {
    pub parent: VertexId,
    pub child: VertexId,
    pub edge_id: EdgeId,
    pub edge_cost: f64,
}

/// State accumulated for the candidates introduced at the current level,
/// read back by [Engine::horizontal_add] and [Engine::level_close].
#[derive(Debug, Default)]
struct PendingLevel {
    candidates: Vec<EdgeToNeighbor>,
}

/// Per-level bookkeeping needed only at the matching `level_remove`, pushed
/// at `level_init`/`add_root_level` and popped there. Kept as an explicit
/// stack (rather than folded into `pending`, which is scratch for the
/// level currently being built) because a level can stay open on the stack
/// arbitrarily long while the engine recurses into deeper levels before
/// ever backtracking out of it — `pending` itself gets reset by the next
/// `level_init` long before that backtrack happens.
#[derive(Debug, Clone, Copy, Default)]
struct LevelUndo {
    leaves_added: usize,
    eq_depth_before: usize,
}

pub struct Engine<'a> {
    config: EngineConfig,
    tree: ExtensionTree,
    levels: LevelLifecycle,
    bottleneck: BottleneckTracker,
    rule_out: RuleOutEngine,
    mst_kernel: MstKernel,
    graph: &'a dyn GraphOracle,
    distances: &'a dyn DistanceOracle,
    pending: PendingLevel,
    undo_stack: Vec<LevelUndo>,
    in_tree: Vec<bool>,
}

impl<'a> Engine<'a> {
    pub fn new(config: EngineConfig, graph: &'a dyn GraphOracle, distances: &'a dyn DistanceOracle) -> Self {
        let n = graph.n_vertices();
        let rule_out = RuleOutEngine::new(graph.n_edges(), n, config.clone());
        let max_deg = config.max_deg;
        Engine {
            mst_kernel: MstKernel::new(config.max_n_leaves),
            bottleneck: BottleneckTracker::new(n, config.pc_mode),
            rule_out,
            tree: ExtensionTree::new(n, 0, max_deg),
            config,
            levels: LevelLifecycle::new(),
            graph,
            distances,
            pending: PendingLevel::default(),
            undo_stack: Vec::new(),
            in_tree: vec![false; n],
        }
    }

    /// `add_root_level(root_vertex)`.
    #[stime("info", "Engine::{}")]
    pub fn add_root_level(&mut self, root_vertex: VertexId) {
        self.tree = ExtensionTree::new(self.graph.n_vertices(), root_vertex, self.config.max_deg);
        self.in_tree = vec![false; self.graph.n_vertices()];
        self.in_tree[root_vertex] = true;
        self.levels.add_root_level();
        self.undo_stack.clear();
        self.undo_stack.push(LevelUndo {
            leaves_added: 0,
            eq_depth_before: self.rule_out.equality.depth(),
        });
    }

    pub fn level_init(&mut self) {
        let n = self.tree.leaves().len().max(1);
        self.levels.level_init(self.config.max_deg * n, n);
        self.pending = PendingLevel::default();
        self.undo_stack.push(LevelUndo {
            leaves_added: 0,
            eq_depth_before: self.rule_out.equality.depth(),
        });
    }

    fn graph_attrs(&self) -> (Vec<f64>, Vec<bool>) {
        let n = self.graph.n_vertices();
        let mut prize = vec![0.0; n];
        let mut is_term = vec![false; n];
        for v in 0..n {
            prize[v] = self.graph.prize(v);
            is_term[v] = self.graph.is_term(v);
        }
        (prize, is_term)
    }

    /// Shared body of `vertical_add_leaf`/`vertical_add_leaf_initial`.
    fn vertical_add_leaf_impl(&mut self, edge: EdgeToNeighbor, initial: bool) -> bool {
        let (prize, is_term) = self.graph_attrs();

        {
            let view = self.tree.view(&prize, &is_term);
            self.bottleneck
                .mark_root_path(edge.parent, &view)
                .expect("leaf_init: root path already marked, caller violated F's nesting contract");
        }
        if self.config.pc_mode {
            self.rule_out.pc_mark.activate(self.graph, edge.parent, &self.in_tree);
        }

        let mut vertical_targets = Vec::new();
        let mut ancestors = Vec::new();
        for &other in self.tree.leaves() {
            if other == edge.child {
                continue;
            }
            let sigma = self.distances.sd_double(edge.child, other);
            vertical_targets.push((other, sigma));
            if !initial || other != edge.parent {
                let bottleneck_to = {
                    let view = self.tree.view(&prize, &is_term);
                    self.bottleneck
                        .get_bottleneck_dist(other, &view)
                        .unwrap_or(f64::INFINITY)
                };
                let path_edges = self.tree.path_edges_to_ancestor(edge.parent, other);
                ancestors.push((other, bottleneck_to, sigma, path_edges));
            }
        }
        // Inner nodes are tested the same way as leaves, but never stored in
        // the level's vertical SD slots (those hold only leaf-to-leaf SDs).
        for &other in self.tree.inner_nodes() {
            let sigma = self.distances.sd_double(edge.child, other);
            let bottleneck_to = {
                let view = self.tree.view(&prize, &is_term);
                self.bottleneck
                    .get_bottleneck_dist(other, &view)
                    .unwrap_or(f64::INFINITY)
            };
            let path_edges = self.tree.path_edges_to_ancestor(edge.parent, other);
            ancestors.push((other, bottleneck_to, sigma, path_edges));
        }

        let candidate = CandidateLeaf {
            leaf: edge.child,
            extension_edge_cost: edge.edge_cost,
            siblings: Vec::new(),
            ancestors,
        };
        let mut survives = self.rule_out.test_candidate(self.distances, &candidate);

        if survives {
            if let Ok(component) = self.levels.component_top() {
                let trial_mst: Mst = component.into();
                let adj: Vec<SpecialDistance> = (0..trial_mst.n_nodes())
                    .map(|i| {
                        if i == edge.parent {
                            SpecialDistance::Known(edge.edge_cost)
                        } else {
                            self.distances.sd_double(edge.child, i)
                        }
                    })
                    .collect();
                if let Ok(trial_weight) = self.mst_kernel.get_ext_weight(&trial_mst, &adj) {
                    let prospective_tree_cost = self.tree.tree_cost() + edge.edge_cost;
                    if trial_weight < prospective_tree_cost - self.config.eps {
                        survives = false;
                    }
                }
            }
        }

        let fill_result = self.levels.vertical_fill_leaf(edge.child, &vertical_targets);

        {
            let view = self.tree.view(&prize, &is_term);
            self.bottleneck
                .unmark_root_path(edge.parent, &view)
                .expect("leaf_exit: unmark should always succeed after a matching mark");
        }
        if self.config.pc_mode {
            self.rule_out.pc_mark.deactivate();
        }

        if !survives {
            let _ = self.levels.vertical_discard_leaf();
            return true;
        }
        fill_result.expect("vertical slot fill failed after a surviving candidate");
        self.pending.candidates.push(edge);
        false
    }

    /// `vertical_add_leaf(edge_to_neighbor) -> ruled_out?`.
    pub fn vertical_add_leaf(&mut self, edge: EdgeToNeighbor) -> bool {
        self.vertical_add_leaf_impl(edge, false)
    }

    /// `vertical_add_leaf_initial(edge_to_neighbor) -> ruled_out?`, used for
    /// the initial component where the parent itself has no useful ancestor
    /// comparison yet.
    pub fn vertical_add_leaf_initial(&mut self, edge: EdgeToNeighbor) -> bool {
        self.vertical_add_leaf_impl(edge, true)
    }

    pub fn vertical_close(&mut self) {
        self.levels.vertical_close().expect("vertical_close: no open level");
    }

    /// `horizontal_add(ext_edges[])`: pairwise SDs among this level's
    /// surviving candidates; right-siblings recompute fresh, left-siblings
    /// read back the value already stored for the pair.
    pub fn horizontal_add(&mut self) {
        let candidates = self.pending.candidates.clone();
        let max_slots = self.config.max_deg * candidates.len().max(1);
        let mut pairs = Vec::new();
        for (i, left) in candidates.iter().enumerate() {
            let mut targets = Vec::new();
            for (j, right) in candidates.iter().enumerate() {
                if i == j {
                    continue;
                }
                let sigma = if j < i {
                    self.levels
                        .horizontal_target_dist(right.child, left.child)
                        .unwrap_or(SpecialDistance::Unknown)
                } else {
                    self.distances.sd_double(left.child, right.child)
                };
                targets.push((right.child, sigma));
            }
            pairs.push((left.child, targets));
        }
        self.levels
            .horizontal_add(max_slots, candidates.len(), &pairs)
            .expect("horizontal_add: level stack in an unexpected state");
    }

    /// `level_close(ext_node)`: build and push the new levelbase MST.
    pub fn level_close(&mut self, ext_node: VertexId) {
        let prior_csr = self.levels.levelbase_top().expect("level_close: no levelbase to extend").clone();
        let mut mst: Mst = (&prior_csr).into();

        for candidate in self.pending.candidates.clone() {
            if candidate.parent != ext_node {
                continue;
            }
            let adj: Vec<SpecialDistance> = (0..mst.n_nodes())
                .map(|i| {
                    if i == candidate.parent {
                        SpecialDistance::Known(candidate.edge_cost)
                    } else {
                        self.distances.sd_double(candidate.child, i)
                    }
                })
                .collect();
            mst = self
                .mst_kernel
                .add_node(&mst, &adj)
                .expect("level_close: DCMST extension failed");
            self.tree
                .add_leaf(candidate.parent, candidate.child, candidate.edge_cost, Some(candidate.edge_id))
                .expect("level_close: tree topology violated F's contract");
            self.in_tree[candidate.child] = true;
            self.undo_stack
                .last_mut()
                .expect("level_close: called with no open level")
                .leaves_added += 1;
        }

        self.levels.level_close(mst.to_csr());
        self.levels.component_init(mst.to_csr());
    }

    /// Tear down the current (deepest) level: the levelbase/horizontal/
    /// vertical stacks, every tree leaf `level_close` added at this depth,
    /// and any equality-forbidden edges recorded since this level's
    /// `level_init`. `component_remove` must already have been called.
    pub fn level_remove(&mut self) {
        self.levels.level_remove().expect("level_remove: stack already empty");
        let undo = self.undo_stack.pop().expect("level_remove: no open level to remove");
        for _ in 0..undo.leaves_added {
            if let Ok(child) = self.tree.remove_last_leaf() {
                self.in_tree[child] = false;
            }
        }
        self.rule_out.equality.rewind_to_depth(undo.eq_depth_before);
    }

    pub fn component_remove(&mut self) {
        self.levels.component_remove(true).expect("component_remove: stack already empty");
    }

    // -- Introspection (§8 testable properties) --

    pub fn tree_deg(&self, v: VertexId) -> usize {
        self.tree.tree_deg(v)
    }

    pub fn parent_node(&self, v: VertexId) -> Option<VertexId> {
        self.tree.parent_node(v)
    }

    pub fn sdeq_has_forbidden_edges(&self) -> bool {
        self.rule_out.equality.has_forbidden_edges()
    }

    pub fn is_eq_forbidden(&self, edge: EdgeId) -> bool {
        self.rule_out.equality.is_forbidden(edge)
    }

    pub fn n_component_csrs(&self) -> usize {
        self.levels.n_component_csrs()
    }

    pub fn n_levelbase_csrs(&self) -> usize {
        self.levels.n_levelbase_csrs()
    }

    /// `rule_out_peripheral() -> bool`: Stage 2, consuming the finished
    /// component MST.
    #[stime("info", "Engine::{}")]
    pub fn rule_out_peripheral(&self) -> bool {
        let component = match self.levels.component_top() {
            Ok(c) => c,
            Err(_) => return false,
        };
        let n_leaves = self.tree.leaves().len();
        crate::rule_out::stage2_mst_objective_rule_out(
            component.weight(),
            self.tree.tree_cost(),
            component.n_directed_entries() / 2,
            n_leaves,
            false,
            self.config.eps,
        )
    }
}
