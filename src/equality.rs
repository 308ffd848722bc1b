//! Equality rule-out (§4.E).
//!
//! When a special distance ties the bottleneck it is being compared
//! against, dominance is ambiguous on its face. The tie is resolved by
//! asking the distance oracle what the special distance would be if every
//! edge on the matching bottleneck path were temporarily absent; if the
//! recomputed distance still does not undercut the bottleneck, the rule-out
//! holds with equality. The edges used for that check are recorded on
//! `sdeq_reset_stack` and flagged in `edges_is_eq_forbidden` for the
//! lifetime of the branch, and rewound wholesale on backtrack — "flag plus
//! resettable stack" rather than a scoped/RAII guard, since the branch
//! lifetime is driven by the caller's own level push/pop, not by Rust scope.

use crate::oracle::DistanceOracle;
use crate::primitives::{EdgeId, VertexId};

/// Reversible record of which undirected edges are currently forbidden for
/// equality rule-out purposes.
#[derive(Debug, Default)]
pub struct EqualityRuleOut {
    edges_is_eq_forbidden: Vec<bool>,
    sdeq_reset_stack: Vec<EdgeId>,
}

impl EqualityRuleOut {
    pub fn new(n_edges: usize) -> Self {
        EqualityRuleOut {
            edges_is_eq_forbidden: vec![false; n_edges],
            sdeq_reset_stack: Vec::new(),
        }
    }

    pub fn is_forbidden(&self, edge: EdgeId) -> bool {
        self.edges_is_eq_forbidden.get(edge).copied().unwrap_or(false)
    }

    pub fn has_forbidden_edges(&self) -> bool {
        !self.sdeq_reset_stack.is_empty()
    }

    /// Current depth of the undo stack, for callers that need to rewind back
    /// to a specific branch point rather than wiping the whole set (§5: a
    /// level_remove only owns the edges forbidden since its own level_init).
    pub fn depth(&self) -> usize {
        self.sdeq_reset_stack.len()
    }

    /// Rewind to a previously recorded [EqualityRuleOut::depth], clearing
    /// flags for every edge forbidden since then.
    pub fn rewind_to_depth(&mut self, depth: usize) {
        self.rewind_to(depth);
    }

    fn forbid(&mut self, edges: &[EdgeId]) {
        for &e in edges {
            if e >= self.edges_is_eq_forbidden.len() {
                self.edges_is_eq_forbidden.resize(e + 1, false);
            }
            if !self.edges_is_eq_forbidden[e] {
                self.edges_is_eq_forbidden[e] = true;
                self.sdeq_reset_stack.push(e);
            }
        }
    }

    /// Attempt an equality rule-out between `u` and `v`: forbid
    /// `path_edges` (the bottleneck path's edges), ask the oracle for the
    /// special distance under that restriction, and keep the edges
    /// forbidden (recorded for later rewind) only if the restricted
    /// distance still does not undercut `dist_eq` within `eps` — i.e. the
    /// tie survives even without the direct path.
    pub fn try_rule_out(
        &mut self,
        oracle: &dyn DistanceOracle,
        dist_eq: f64,
        path_edges: &[EdgeId],
        u: VertexId,
        v: VertexId,
        eps: f64,
    ) -> bool {
        let before = self.sdeq_reset_stack.len();
        self.forbid(path_edges);

        let restricted = oracle.sd_double_forbidden(dist_eq, path_edges, u, v);
        let survives = !restricted.is_strictly_less(dist_eq, eps);

        if !survives {
            self.rewind_to(before);
        }
        survives
    }

    /// Rewind the forbidden set back to a prior stack depth, clearing flags
    /// for every edge pushed since then.
    fn rewind_to(&mut self, depth: usize) {
        while self.sdeq_reset_stack.len() > depth {
            let e = self.sdeq_reset_stack.pop().unwrap();
            self.edges_is_eq_forbidden[e] = false;
        }
    }

    /// Rewind the entire forbidden set on branch backtrack (§5 cancellation).
    pub fn reset(&mut self) {
        self.rewind_to(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::SpecialDistance;

    struct FixedOracle {
        direct: f64,
        restricted: f64,
    }

    impl DistanceOracle for FixedOracle {
        fn sd_double(&self, _u: VertexId, _v: VertexId) -> SpecialDistance {
            SpecialDistance::Known(self.direct)
        }

        fn sd_double_forbidden(
            &self,
            _dist_eq: f64,
            _forbidden_edges: &[EdgeId],
            _u: VertexId,
            _v: VertexId,
        ) -> SpecialDistance {
            SpecialDistance::Known(self.restricted)
        }
    }

    #[test]
    fn surviving_tie_keeps_edges_forbidden() {
        let oracle = FixedOracle { direct: 2.0, restricted: 2.0 };
        let mut eq = EqualityRuleOut::new(4);
        let ruled_out = eq.try_rule_out(&oracle, 2.0, &[0, 1], 0, 2, 1e-9);
        assert!(ruled_out);
        assert!(eq.is_forbidden(0));
        assert!(eq.is_forbidden(1));
        assert!(eq.has_forbidden_edges());
    }

    #[test]
    fn cheaper_alternative_clears_the_attempt() {
        let oracle = FixedOracle { direct: 2.0, restricted: 1.0 };
        let mut eq = EqualityRuleOut::new(4);
        let ruled_out = eq.try_rule_out(&oracle, 2.0, &[0, 1], 0, 2, 1e-9);
        assert!(!ruled_out);
        assert!(!eq.is_forbidden(0));
        assert!(!eq.has_forbidden_edges());
    }

    #[test]
    fn backtrack_rewinds_everything() {
        let oracle = FixedOracle { direct: 2.0, restricted: 2.0 };
        let mut eq = EqualityRuleOut::new(4);
        eq.try_rule_out(&oracle, 2.0, &[0], 0, 1, 1e-9);
        eq.try_rule_out(&oracle, 2.0, &[1], 1, 2, 1e-9);
        assert!(eq.has_forbidden_edges());
        eq.reset();
        assert!(!eq.has_forbidden_edges());
        assert!(!eq.is_forbidden(0));
        assert!(!eq.is_forbidden(1));
    }
}
