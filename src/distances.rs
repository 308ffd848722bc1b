//! Special-distance sentinel encoding (§9 design note).
//!
//! The collaborating distance oracle speaks a single `f64` with two
//! sentinels: `-1.0` for "not computed" and [`FARAWAY`] for "no feasible
//! alternative". Internally the engine immediately lifts that into
//! [`SpecialDistance`], an ordered sum type, so that the rest of the engine
//! never has to special-case the sentinel values.

use thiserror::Error;

/// Sentinel meaning "infeasibly large, treat as absent". Must match the
/// value the distance oracle itself uses (§6).
pub const FARAWAY: f64 = 1e15;

/// Raw oracle encoding of "not yet computed".
const UNKNOWN_RAW: f64 = -1.0;

/// A special distance, lifted out of the oracle's raw `f64` encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecialDistance {
    /// A known, finite, non-negative distance.
    Known(f64),
    /// Not yet computed by the oracle.
    Unknown,
    /// No feasible alternative exists (the oracle returned [`FARAWAY`] or
    /// larger).
    Infeasible,
}

/// An oracle returned a value outside `{-1} ∪ [0, FARAWAY]`; per §7 this is a
/// fatal oracle failure, not a numeric ambiguity.
#[derive(Error, Debug, PartialEq)]
pub enum OracleError {
    #[error("distance oracle returned {0}, which is neither -1, FARAWAY, nor in [0, FARAWAY)")]
    InvalidDistance(f64),
}

impl SpecialDistance {
    /// Lift a raw oracle value into the sum type.
    pub fn from_raw(raw: f64) -> Result<Self, OracleError> {
        if raw == UNKNOWN_RAW {
            Ok(SpecialDistance::Unknown)
        } else if !raw.is_finite() || raw < 0.0 {
            Err(OracleError::InvalidDistance(raw))
        } else if raw >= FARAWAY {
            Ok(SpecialDistance::Infeasible)
        } else {
            Ok(SpecialDistance::Known(raw))
        }
    }

    /// Lower back into the oracle's raw encoding. Used only at test
    /// boundaries and when feeding values into [crate::mst_kernel].
    pub fn as_raw(&self) -> f64 {
        match self {
            SpecialDistance::Known(d) => *d,
            SpecialDistance::Unknown => UNKNOWN_RAW,
            SpecialDistance::Infeasible => FARAWAY,
        }
    }

    /// True for [`SpecialDistance::Known`].
    pub fn is_known(&self) -> bool {
        matches!(self, SpecialDistance::Known(_))
    }

    /// Strictly less than `other`, within `eps`. `Unknown`/`Infeasible`
    /// distances are never strictly less than anything — ambiguous cases
    /// never manufacture a rule-out (§7).
    pub fn is_strictly_less(&self, other: f64, eps: f64) -> bool {
        match self {
            SpecialDistance::Known(d) => *d < other - eps,
            _ => false,
        }
    }

    /// Equal to `other`, within `eps`.
    pub fn is_equal(&self, other: f64, eps: f64) -> bool {
        match self {
            SpecialDistance::Known(d) => (*d - other).abs() <= eps,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_round_trips() {
        assert_eq!(
            SpecialDistance::from_raw(-1.0).unwrap(),
            SpecialDistance::Unknown
        );
        assert_eq!(SpecialDistance::Unknown.as_raw(), -1.0);
    }

    #[test]
    fn faraway_and_beyond_are_infeasible() {
        assert_eq!(
            SpecialDistance::from_raw(FARAWAY).unwrap(),
            SpecialDistance::Infeasible
        );
        assert_eq!(
            SpecialDistance::from_raw(FARAWAY * 2.0).unwrap(),
            SpecialDistance::Infeasible
        );
    }

    #[test]
    fn negative_other_than_sentinel_is_an_oracle_error() {
        assert_eq!(
            SpecialDistance::from_raw(-2.0),
            Err(OracleError::InvalidDistance(-2.0))
        );
    }

    #[test]
    fn known_compares_with_eps() {
        let d = SpecialDistance::Known(1.5);
        assert!(d.is_strictly_less(2.0, 1e-9));
        assert!(!d.is_strictly_less(1.5, 1e-9));
        assert!(d.is_equal(1.5, 1e-9));
        assert!(d.is_equal(1.5 + 1e-12, 1e-9));
    }

    #[test]
    fn unknown_never_dominates() {
        assert!(!SpecialDistance::Unknown.is_strictly_less(f64::MAX, 1e-9));
        assert!(!SpecialDistance::Infeasible.is_strictly_less(f64::MAX, 1e-9));
    }
}
