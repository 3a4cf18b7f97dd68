use crate::config::FusionConfig;

/// Combine two raw confidence scores and their anomaly flags into one calibrated score.
///
/// Rules, first match wins:
/// - neither flags an anomaly: the weaker score, discounted by `quiet_factor`
/// - both flag an anomaly: weighted average times `agreement_bonus`, capped at `agreement_cap`
/// - only spatial: spatial score times `spatial_only_factor`
/// - only temporal: temporal score times `temporal_only_factor`
///
/// The result is always within `[0, 1]`.
pub fn fuse_confidence(
    cfg: &FusionConfig,
    spatial_conf: f64,
    temporal_conf: f64,
    spatial_anomaly: bool,
    temporal_anomaly: bool,
) -> f64 {
    let fused = match (spatial_anomaly, temporal_anomaly) {
        (false, false) => spatial_conf.min(temporal_conf) * cfg.quiet_factor,
        (true, true) => {
            let weighted =
                spatial_conf * cfg.weights.spatial + temporal_conf * cfg.weights.temporal;
            (weighted * cfg.agreement_bonus).min(cfg.agreement_cap)
        }
        (true, false) => spatial_conf * cfg.spatial_only_factor,
        (false, true) => temporal_conf * cfg.temporal_only_factor,
    };
    fused.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quiet_sample_halves_weaker_score() {
        let cfg = FusionConfig::default();
        assert!(close(fuse_confidence(&cfg, 0.1, 0.3, false, false), 0.05));
    }

    #[test]
    fn agreement_applies_weights_and_bonus() {
        let cfg = FusionConfig::default();
        assert!(close(fuse_confidence(&cfg, 0.6, 0.65, true, true), 0.744));
    }

    #[test]
    fn agreement_is_capped() {
        let cfg = FusionConfig::default();
        assert!(close(fuse_confidence(&cfg, 1.0, 1.0, true, true), 0.95));
        assert!(close(fuse_confidence(&cfg, 0.9, 0.8, true, true), 0.95));
    }

    #[test]
    fn lone_signal_is_discounted() {
        let cfg = FusionConfig::default();
        assert!(close(fuse_confidence(&cfg, 0.8, 0.9, true, false), 0.56));
        assert!(close(fuse_confidence(&cfg, 0.8, 0.9, false, true), 0.54));
    }

    #[test]
    fn output_stays_in_unit_interval() {
        let cfg = FusionConfig::default();
        let grid = [0.0, 0.01, 0.25, 0.5, 0.75, 0.99, 1.0];
        for s in grid {
            for t in grid {
                for (sa, ta) in [(false, false), (true, false), (false, true), (true, true)] {
                    let c = fuse_confidence(&cfg, s, t, sa, ta);
                    assert!((0.0..=1.0).contains(&c), "s={s} t={t} sa={sa} ta={ta} -> {c}");
                }
            }
        }
    }
}
