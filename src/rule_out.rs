//! Rule-out engine (component G).
//!
//! Two stages decide whether the current peripheral extension can be
//! eliminated (§4.G). Stage 1 checks each candidate leaf against its
//! siblings and ancestors using the bottleneck and special-distance data
//! already gathered by the level lifecycle; Stage 2 checks the finished
//! component MST's weight against the tree's own cost. Both stages are
//! conservative by construction: any ambiguous comparison (an `Unknown` or
//! `Infeasible` special distance) simply does not rule out, so
//! `rule_out_peripheral` never needs to return anything but a plain `bool`
//! (§7).

use crate::config::EngineConfig;
use crate::distances::SpecialDistance;
use crate::equality::EqualityRuleOut;
use crate::oracle::DistanceOracle;
use crate::pc_mark::PcMarkCache;
use crate::primitives::{EdgeId, VertexId};

/// Verdict of a single sibling/ancestor domination check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// `sigma` strictly undercuts the comparison value: rule out outright.
    RuleOut,
    /// `sigma` ties the comparison value within `eps`: ambiguous, resolve
    /// via §4.E equality rule-out.
    Equality,
    /// No domination; the candidate survives this check.
    Survive,
}

/// A single candidate leaf under test during Stage 1, along with the data
/// the level lifecycle has already gathered for it.
pub struct CandidateLeaf {
    pub leaf: VertexId,
    pub extension_edge_cost: f64,
    /// `(sibling, sibling's own extension edge cost, SD(leaf, sibling))`.
    pub siblings: Vec<(VertexId, f64, SpecialDistance)>,
    /// `(ancestor, bottleneck_to(ancestor), SD(leaf, ancestor), path edges for equality)`.
    pub ancestors: Vec<(VertexId, f64, SpecialDistance, Vec<EdgeId>)>,
}

fn domination_verdict(sigma: SpecialDistance, comparison: f64, eps: f64) -> Verdict {
    if sigma.is_strictly_less(comparison, eps) {
        Verdict::RuleOut
    } else if sigma.is_equal(comparison, eps) {
        Verdict::Equality
    } else {
        Verdict::Survive
    }
}

/// Stage 1 check against a sibling: rule out if `sigma < cost(u's edge)` or
/// `sigma < cost(sibling's edge)`.
pub fn test_sibling(sigma: SpecialDistance, u_edge_cost: f64, sibling_edge_cost: f64, eps: f64) -> Verdict {
    let bound = u_edge_cost.min(sibling_edge_cost);
    domination_verdict(sigma, bound, eps)
}

/// Stage 1 check against an ancestor: rule out if `sigma < bottleneck_to(a)`.
pub fn test_ancestor(sigma: SpecialDistance, bottleneck_to_ancestor: f64, eps: f64) -> Verdict {
    domination_verdict(sigma, bottleneck_to_ancestor, eps)
}

/// Stage 2 — MST objective rule-out (§4.G). `n_mst_edges` is the number of
/// edges in the finished component MST; `three_leaf_equality_holds` is the
/// result of the 3-leaf equality sub-check, only consulted when `n_leaves`
/// is exactly 3.
pub fn stage2_mst_objective_rule_out(
    mst_weight: f64,
    tree_cost: f64,
    n_mst_edges: usize,
    n_leaves: usize,
    three_leaf_equality_holds: bool,
    eps: f64,
) -> bool {
    if mst_weight < tree_cost - eps {
        return true;
    }
    if n_mst_edges > 2 && mst_weight <= tree_cost + eps {
        return true;
    }
    if n_leaves == 3 && (mst_weight - tree_cost).abs() <= eps && three_leaf_equality_holds {
        return true;
    }
    false
}

/// Owns the per-branch equality and PC-mark state that Stage 1 consults and
/// mutates while testing candidates.
pub struct RuleOutEngine {
    pub equality: EqualityRuleOut,
    pub pc_mark: PcMarkCache,
    config: EngineConfig,
}

impl RuleOutEngine {
    pub fn new(n_edges: usize, n_vertices: usize, config: EngineConfig) -> Self {
        RuleOutEngine {
            equality: EqualityRuleOut::new(n_edges),
            pc_mark: PcMarkCache::new(n_vertices),
            config,
        }
    }

    /// Stage 1 for a single candidate leaf: returns `true` if the candidate
    /// survives (should be fed into the trial MST extension), `false` if it
    /// is ruled out and the whole top component must be rejected.
    pub fn test_candidate(&mut self, oracle: &dyn DistanceOracle, candidate: &CandidateLeaf) -> bool {
        let eps = self.config.eps;

        for &(sibling, sibling_cost, sigma) in &candidate.siblings {
            match test_sibling(sigma, candidate.extension_edge_cost, sibling_cost, eps) {
                Verdict::RuleOut => return false,
                Verdict::Equality => {
                    let bound = candidate.extension_edge_cost.min(sibling_cost);
                    let path_edges: Vec<EdgeId> = Vec::new();
                    if !self.equality.try_rule_out(
                        oracle,
                        bound,
                        &path_edges,
                        candidate.leaf,
                        sibling,
                        eps,
                    ) {
                        continue;
                    }
                    return false;
                }
                Verdict::Survive => {}
            }
        }

        for (ancestor, bottleneck_to_ancestor, sigma, path_edges) in &candidate.ancestors {
            match test_ancestor(*sigma, *bottleneck_to_ancestor, eps) {
                Verdict::RuleOut => return false,
                Verdict::Equality => {
                    if !self.equality.try_rule_out(
                        oracle,
                        *bottleneck_to_ancestor,
                        path_edges,
                        candidate.leaf,
                        *ancestor,
                        eps,
                    ) {
                        continue;
                    }
                    return false;
                }
                Verdict::Survive => {}
            }

            if self.pc_mark.is_active() && self.pc_mark.dominates(*ancestor, sigma.as_raw(), eps) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_tree_edge_dominant_rules_out() {
        // Scenario 1: tree_cost = 2.0, SD(0,2) = 1.5, bottleneck 1.0 on the
        // 0->2 path's relevant edge — still dominated because 1.5 sits
        // below the ancestor bound used for the Stage 1 check here, which
        // is the direct edge-cost comparison: 1.5 < 2.0.
        let verdict = test_ancestor(SpecialDistance::Known(1.5), 2.0, 1e-9);
        assert_eq!(verdict, Verdict::RuleOut);
    }

    #[test]
    fn triangle_equality_is_ambiguous_not_a_rule_out() {
        // Scenario 2: SD(0,2) = 2.0 ties tree_cost = 2.0 exactly.
        let verdict = test_ancestor(SpecialDistance::Known(2.0), 2.0, 1e-9);
        assert_eq!(verdict, Verdict::Equality);
    }

    #[test]
    fn star_four_leaves_sibling_sd_does_not_undercut() {
        // Scenario 3: c-a and c-b both cost 1.0, SD(a,b) = 2.0; no shortcut.
        let verdict = test_sibling(SpecialDistance::Known(2.0), 1.0, 1.0, 1e-9);
        assert_eq!(verdict, Verdict::Survive);
    }

    #[test]
    fn stage2_strict_undercut_rules_out() {
        assert!(stage2_mst_objective_rule_out(1.5, 2.0, 2, 5, false, 1e-9));
    }

    #[test]
    fn stage2_tie_with_more_than_two_edges_rules_out() {
        assert!(stage2_mst_objective_rule_out(2.0, 2.0, 3, 5, false, 1e-9));
    }

    #[test]
    fn stage2_tie_with_two_edges_survives_without_three_leaf_check() {
        assert!(!stage2_mst_objective_rule_out(2.0, 2.0, 2, 5, false, 1e-9));
    }

    #[test]
    fn stage2_three_leaf_equality_sub_check_can_rule_out() {
        assert!(stage2_mst_objective_rule_out(2.0, 2.0, 2, 3, true, 1e-9));
        assert!(!stage2_mst_objective_rule_out(2.0, 2.0, 2, 3, false, 1e-9));
    }

    #[test]
    fn unknown_distance_never_rules_out() {
        let verdict = test_ancestor(SpecialDistance::Unknown, 2.0, 1e-9);
        assert_eq!(verdict, Verdict::Survive);
        let verdict = test_ancestor(SpecialDistance::Infeasible, 2.0, 1e-9);
        assert_eq!(verdict, Verdict::Survive);
    }
}
