//! Severity and priority escalation tables.
//!
//! Both tables are exhaustive matches over closed enums, so every input pair
//! has a defined output.

use crate::config::FusionConfig;
use crate::{DetectionPriority as DP, Priority as P, Severity as S};

/// Fuse spatial and temporal severity.
///
/// Symmetric, and monotonic in both arguments.
pub fn fuse_severity(spatial: S, temporal: S) -> S {
    match (spatial, temporal) {
        (S::None, S::None) => S::None,
        (S::None, S::Low) => S::Low,
        (S::None, S::Medium) => S::Low,
        (S::None, S::High) => S::Medium,
        (S::None, S::Critical) => S::High,

        (S::Low, S::None) => S::Low,
        (S::Low, S::Low) => S::Low,
        (S::Low, S::Medium) => S::Medium,
        (S::Low, S::High) => S::High,
        (S::Low, S::Critical) => S::Critical,

        (S::Medium, S::None) => S::Low,
        (S::Medium, S::Low) => S::Medium,
        (S::Medium, S::Medium) => S::Medium,
        (S::Medium, S::High) => S::High,
        (S::Medium, S::Critical) => S::Critical,

        (S::High, S::None) => S::Medium,
        (S::High, S::Low) => S::High,
        (S::High, S::Medium) => S::High,
        (S::High, S::High) => S::High,
        (S::High, S::Critical) => S::Critical,

        (S::Critical, S::None) => S::High,
        (S::Critical, S::Low) => S::Critical,
        (S::Critical, S::Medium) => S::Critical,
        (S::Critical, S::High) => S::Critical,
        (S::Critical, S::Critical) => S::Critical,
    }
}

// TODO: review whether `none` pairs should defer to the temporal priority
// rather than escalating to `medium`.
/// Fuse spatial and temporal priority.
///
/// A spatial priority of `none` has no table entry and falls back to `medium`.
pub fn fuse_priority(spatial: DP, temporal: P) -> P {
    match (spatial, temporal) {
        (DP::Low, P::Low) => P::Low,
        (DP::Low, P::Medium) => P::Medium,
        (DP::Low, P::High) => P::Medium,

        (DP::Medium, P::Low) => P::Medium,
        (DP::Medium, P::Medium) => P::Medium,
        (DP::Medium, P::High) => P::High,

        (DP::High, P::Low) => P::Medium,
        (DP::High, P::Medium) => P::High,
        (DP::High, P::High) => P::High,

        (DP::None, _) => P::Medium,
    }
}

/// Infer a severity for the spatial modality, which reports only objects and priority.
pub fn infer_spatial_severity(cfg: &FusionConfig, object_types: &[String], priority: DP) -> S {
    let has_weapon = object_types.iter().any(|object| cfg.is_weapon(object));
    let has_person = object_types.iter().any(|object| *object == cfg.person_label);

    if has_weapon {
        S::Critical
    } else if has_person && priority == DP::High {
        S::High
    } else if priority == DP::High {
        S::Medium
    } else if priority == DP::Medium {
        S::Low
    } else {
        S::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_diagonal_is_identity() {
        for s in S::ALL {
            assert_eq!(fuse_severity(s, s), s);
        }
    }

    #[test]
    fn severity_table_is_symmetric() {
        for a in S::ALL {
            for b in S::ALL {
                assert_eq!(fuse_severity(a, b), fuse_severity(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn severity_is_monotonic_in_both_inputs() {
        for fixed in S::ALL {
            for pair in S::ALL.windows(2) {
                assert!(fuse_severity(pair[1], fixed) >= fuse_severity(pair[0], fixed));
                assert!(fuse_severity(fixed, pair[1]) >= fuse_severity(fixed, pair[0]));
            }
        }
    }

    #[test]
    fn lone_severity_is_damped() {
        assert_eq!(fuse_severity(S::Critical, S::None), S::High);
        assert_eq!(fuse_severity(S::None, S::Medium), S::Low);
        assert_eq!(fuse_severity(S::High, S::Low), S::High);
    }

    #[test]
    fn priority_table_entries() {
        assert_eq!(fuse_priority(DP::Low, P::Low), P::Low);
        assert_eq!(fuse_priority(DP::Low, P::High), P::Medium);
        assert_eq!(fuse_priority(DP::High, P::Low), P::Medium);
        assert_eq!(fuse_priority(DP::High, P::High), P::High);
        assert_eq!(fuse_priority(DP::Medium, P::High), P::High);
        assert_eq!(fuse_priority(DP::High, P::Medium), P::High);
    }

    #[test]
    fn priority_without_spatial_level_defaults_to_medium() {
        for t in P::ALL {
            assert_eq!(fuse_priority(DP::None, t), P::Medium);
        }
    }

    #[test]
    fn spatial_severity_inference_order() {
        let cfg = FusionConfig::default();
        let objs = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(
            infer_spatial_severity(&cfg, &objs(&["knife"]), DP::Low),
            S::Critical
        );
        assert_eq!(
            infer_spatial_severity(&cfg, &objs(&["person"]), DP::High),
            S::High
        );
        assert_eq!(
            infer_spatial_severity(&cfg, &objs(&["car"]), DP::High),
            S::Medium
        );
        assert_eq!(
            infer_spatial_severity(&cfg, &objs(&["person"]), DP::Medium),
            S::Low
        );
        assert_eq!(infer_spatial_severity(&cfg, &[], DP::Low), S::None);
        assert_eq!(infer_spatial_severity(&cfg, &[], DP::None), S::None);
    }
}
