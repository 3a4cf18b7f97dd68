use crate::detect::{SpatialResult, TemporalResult};
use crate::fusion::anomaly_type::NORMAL;
use crate::Severity;

pub const NORMAL_DESCRIPTION: &str =
    "Normal surveillance activity detected across spatial and temporal analysis";

/// Human-readable explanation of a fused verdict.
pub fn describe(
    spatial: &SpatialResult,
    temporal: &TemporalResult,
    anomaly_type: &str,
    severity: Severity,
) -> String {
    if anomaly_type == NORMAL {
        return NORMAL_DESCRIPTION.to_string();
    }

    let spatial_desc = (!spatial.object_types.is_empty()).then(|| {
        format!(
            "Objects detected: {} (conf: {:.2})",
            spatial.object_types.join(", "),
            spatial.max_confidence
        )
    });
    let temporal_desc = temporal.anomaly_type.is_anomalous().then(|| {
        format!(
            "Activity: {} (conf: {:.2})",
            temporal.anomaly_type, temporal.confidence
        )
    });

    let mut description = match (spatial_desc, temporal_desc) {
        (Some(s), Some(t)) => format!("Multi-modal anomaly: {s}; {t}"),
        (Some(s), None) => format!("Spatial anomaly: {s}"),
        (None, Some(t)) => format!("Temporal anomaly: {t}"),
        (None, None) => format!("Anomaly detected: {anomaly_type}"),
    };

    if severity.is_elevated() {
        description.push_str(&format!(
            " [SEVERITY: {}]",
            severity.as_str().to_uppercase()
        ));
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ActivityType;
    use serde_json::Map;

    fn spatial(objects: &[&str], conf: f64) -> SpatialResult {
        SpatialResult {
            anomaly_detected: !objects.is_empty(),
            object_types: objects.iter().map(|s| s.to_string()).collect(),
            max_confidence: conf,
            ..SpatialResult::default()
        }
    }

    #[test]
    fn normal_type_has_fixed_description() {
        let d = describe(
            &spatial(&[], 0.0),
            &TemporalResult::default(),
            "normal",
            Severity::None,
        );
        assert_eq!(d, NORMAL_DESCRIPTION);
    }

    #[test]
    fn multi_modal_description_with_severity_tag() {
        let temporal = TemporalResult::for_activity(ActivityType::Fighting, 0.65, Map::new());
        let d = describe(
            &spatial(&["person", "car"], 0.6),
            &temporal,
            "violent_behavior",
            Severity::High,
        );
        assert_eq!(
            d,
            "Multi-modal anomaly: Objects detected: person, car (conf: 0.60); \
             Activity: fighting (conf: 0.65) [SEVERITY: HIGH]"
        );
    }

    #[test]
    fn single_modality_prefixes() {
        let d = describe(
            &spatial(&["bottle"], 0.456),
            &TemporalResult::default(),
            "suspicious_object_bottle",
            Severity::Low,
        );
        assert_eq!(d, "Spatial anomaly: Objects detected: bottle (conf: 0.46)");

        let temporal = TemporalResult::for_activity(ActivityType::Loitering, 0.45, Map::new());
        let d = describe(
            &spatial(&[], 0.0),
            &temporal,
            "loitering_detected",
            Severity::Medium,
        );
        assert_eq!(d, "Temporal anomaly: Activity: loitering (conf: 0.45)");
    }

    #[test]
    fn no_signal_falls_back_to_type() {
        let d = describe(
            &spatial(&[], 0.0),
            &TemporalResult::default(),
            "weapon_detected",
            Severity::Critical,
        );
        assert_eq!(d, "Anomaly detected: weapon_detected [SEVERITY: CRITICAL]");
    }
}
