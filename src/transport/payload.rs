//! Lenient parsing of collaborator payloads.
//!
//! Collaborators publish loosely-shaped JSON. Missing fields take their
//! defaults; present fields must have the right type and a known enum value.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::detect::{SpatialResult, TemporalResult};
use crate::frame::FrameMetadata;

/// Body of a fusion request: one verdict per modality plus optional frame metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionRequest {
    pub spatial: Value,
    pub temporal: Value,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Parse a spatial detector payload.
///
/// Repeated object labels are collapsed, keeping the first occurrence.
pub fn parse_spatial_payload(payload: &Value) -> Result<SpatialResult> {
    ensure_object("spatial", payload)?;
    let mut result: SpatialResult = serde_json::from_value(payload.clone())
        .map_err(|e| anyhow!("invalid spatial payload: {}", e))?;

    let mut seen: Vec<String> = Vec::with_capacity(result.object_types.len());
    for label in result.object_types.drain(..) {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    result.object_types = seen;
    Ok(result)
}

pub fn parse_temporal_payload(payload: &Value) -> Result<TemporalResult> {
    ensure_object("temporal", payload)?;
    serde_json::from_value(payload.clone()).map_err(|e| anyhow!("invalid temporal payload: {}", e))
}

/// Parse frame metadata. Resolution must be `"WxH"` or `"unknown"`.
pub fn parse_frame_metadata(payload: &Value) -> Result<FrameMetadata> {
    ensure_object("metadata", payload)?;
    let meta: FrameMetadata = serde_json::from_value(payload.clone())
        .map_err(|e| anyhow!("invalid frame metadata: {}", e))?;
    if !is_valid_resolution(&meta.resolution) {
        return Err(anyhow!(
            "conformance: invalid resolution '{}'",
            meta.resolution
        ));
    }
    Ok(meta)
}

pub fn is_valid_resolution(resolution: &str) -> bool {
    static RESOLUTION_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RESOLUTION_RE.get_or_init(|| regex::Regex::new(r"^[1-9]\d*x[1-9]\d*$").unwrap());
    resolution == "unknown" || re.is_match(resolution)
}

fn ensure_object(name: &str, payload: &Value) -> Result<()> {
    if !payload.is_object() {
        return Err(anyhow!("{} payload must be a JSON object", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ActivityType;
    use crate::frame::FileKind;
    use crate::{DetectionPriority, Priority, Severity};
    use serde_json::json;

    #[test]
    fn spatial_payload_defaults_missing_fields() {
        let s = parse_spatial_payload(&json!({"anomaly_detected": true})).unwrap();
        assert!(s.anomaly_detected);
        assert!(s.object_types.is_empty());
        assert_eq!(s.max_confidence, 0.0);
        assert_eq!(s.highest_priority, DetectionPriority::Low);
    }

    #[test]
    fn spatial_payload_collapses_repeated_labels() {
        let s = parse_spatial_payload(&json!({
            "object_types": ["car", "person", "car"],
            "highest_priority": "high",
            "detections": [
                {"class_name": "car", "confidence": 0.7, "bbox": [1, 2, 3, 4]}
            ]
        }))
        .unwrap();
        assert_eq!(s.object_types, vec!["car", "person"]);
        assert_eq!(s.highest_priority, DetectionPriority::High);
        assert_eq!(
            s.detections[0],
            json!({"class_name": "car", "confidence": 0.7, "bbox": [1, 2, 3, 4]})
        );
    }

    #[test]
    fn rejects_unknown_levels_and_non_objects() {
        assert!(parse_spatial_payload(&json!({"highest_priority": "urgent"})).is_err());
        assert!(parse_temporal_payload(&json!({"severity": "extreme"})).is_err());
        assert!(parse_temporal_payload(&json!({"anomaly_type": "dancing"})).is_err());
        assert!(parse_temporal_payload(&json!("fighting")).is_err());
        assert!(parse_spatial_payload(&Value::Null).is_err());
    }

    #[test]
    fn temporal_payload_parses_activity() {
        let t = parse_temporal_payload(&json!({
            "anomaly_detected": true,
            "anomaly_type": "weapon_detection",
            "confidence": 0.8,
            "severity": "critical",
            "priority": "high",
            "temporal_features": {"motion_intensity": 12.5}
        }))
        .unwrap();
        assert_eq!(t.anomaly_type, ActivityType::WeaponDetection);
        assert_eq!(t.severity, Severity::Critical);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.temporal_features["motion_intensity"], json!(12.5));
    }

    #[test]
    fn frame_metadata_validates_resolution() {
        let m = parse_frame_metadata(&json!({
            "frame_count": 16, "resolution": "640x480", "file_type": "video"
        }))
        .unwrap();
        assert_eq!(m.file_type, FileKind::Video);

        assert!(parse_frame_metadata(&json!({
            "frame_count": 0, "resolution": "unknown", "file_type": "image"
        }))
        .is_ok());
        assert!(parse_frame_metadata(&json!({
            "frame_count": 1, "resolution": "640 by 480", "file_type": "image"
        }))
        .is_err());
        assert!(parse_frame_metadata(&json!({"frame_count": 1})).is_err());
    }

    #[test]
    fn request_metadata_is_optional() {
        let req: FusionRequest =
            serde_json::from_value(json!({"spatial": {}, "temporal": {}})).unwrap();
        assert!(req.metadata.is_none());
    }
}
