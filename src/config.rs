//! Tunable parameters for the extended-reduction engine.
//!
//! Mirrors the `derive_builder`-based config pattern used throughout the
//! accumulator configs this crate is descended from: every field has a sane
//! default except `max_n_leaves`, which sizes the [crate::mst_kernel]'s
//! reusable scratch buffer and so must be supplied up front.

use derive_builder::Builder;

/// Default epsilon used for near-equality comparisons on special distances
/// and bottleneck distances (§4.C, §4.G of the design doc).
pub const DEFAULT_EPS: f64 = 1e-9;

/// Default cap on how many children a single extension-tree vertex may gain
/// in one extension step.
pub const DEFAULT_MAX_DEG: usize = 8;

/// Engine-wide configuration, built via [EngineConfigBuilder].
///
/// ```
/// use xreduce::config::EngineConfigBuilder;
///
/// let config = EngineConfigBuilder::default()
///     .max_n_leaves(64usize)
///     .build()
///     .unwrap();
/// assert!(!config.pc_mode);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into))]
pub struct EngineConfig {
    /// Absolute tolerance used when comparing special distances against
    /// bottleneck distances or tree costs.
    #[builder(default = "DEFAULT_EPS")]
    pub eps: f64,

    /// Upper bound on the number of candidate edges considered per
    /// extension step.
    #[builder(default = "DEFAULT_MAX_DEG")]
    pub max_deg: usize,

    /// Whether the prize-collecting variant (§4.D accumulator subtracts
    /// terminal prizes) is active.
    #[builder(default = "false")]
    pub pc_mode: bool,

    /// Upper bound on how many leaves the extension tree can ever hold.
    /// Sizes the [crate::mst_kernel::MstKernel] scratch buffer; exceeding it
    /// is a resource-exhaustion error (§7), not a panic.
    pub max_n_leaves: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = EngineConfigBuilder::default()
            .max_n_leaves(16usize)
            .build()
            .unwrap();
        assert_eq!(config.eps, DEFAULT_EPS);
        assert_eq!(config.max_deg, DEFAULT_MAX_DEG);
        assert!(!config.pc_mode);
        assert_eq!(config.max_n_leaves, 16);
    }

    #[test]
    fn missing_required_field_fails() {
        let result = EngineConfigBuilder::default().build();
        assert!(result.is_err());
    }
}
