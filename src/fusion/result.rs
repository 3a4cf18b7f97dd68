use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::FusionWeights;
use crate::detect::ActivityType;
use crate::frame::FrameMetadata;
use crate::{Priority, Severity};

pub const FALLBACK_ANOMALY_TYPE: &str = "processing_error";
pub const FALLBACK_DESCRIPTION: &str = "Fusion engine processing failed";
pub const FALLBACK_MODEL: &str = "Fusion Engine (Error)";
pub const FALLBACK_ERROR: &str = "fusion_processing_failed";
pub const PROCESSING_METHOD: &str = "multi_modal_fusion";

/// Fused surveillance verdict for one sample.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FusionResult {
    /// False when the verdict is a degraded fallback.
    pub success: bool,
    pub anomaly_detected: bool,
    pub anomaly_type: String,
    pub confidence: f64,
    pub severity: Severity,
    pub priority: Priority,
    pub description: String,
    pub processing_time_ms: f64,
    pub model_used: String,
    pub metadata: FusionMetadata,
    /// Spatial detections exactly as the detector reported them, for visualization.
    pub bounding_boxes: Vec<Value>,
}

impl FusionResult {
    /// Fixed result returned when fusion fails internally.
    pub fn fallback() -> Self {
        Self {
            success: false,
            anomaly_detected: false,
            anomaly_type: FALLBACK_ANOMALY_TYPE.to_string(),
            confidence: 0.0,
            severity: Severity::None,
            priority: Priority::Low,
            description: FALLBACK_DESCRIPTION.to_string(),
            processing_time_ms: 0.0,
            model_used: FALLBACK_MODEL.to_string(),
            metadata: FusionMetadata::Failed {
                error: FALLBACK_ERROR.to_string(),
            },
            bounding_boxes: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        !self.success
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FusionMetadata {
    Fused(Box<FusedMetadata>),
    Failed { error: String },
}

impl FusionMetadata {
    pub fn fused(&self) -> Option<&FusedMetadata> {
        match self {
            FusionMetadata::Fused(meta) => Some(meta),
            FusionMetadata::Failed { .. } => None,
        }
    }
}

/// Diagnostics of both inputs plus fusion internals.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FusedMetadata {
    pub spatial_detection: SpatialDiagnostics,
    pub temporal_analysis: TemporalDiagnostics,
    pub fusion_weights: FusionWeights,
    pub critical_combination: bool,
    pub processing_method: String,
    /// Frame metadata, merged at the top level when supplied.
    #[serde(flatten)]
    pub frame: Option<FrameMetadata>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SpatialDiagnostics {
    pub anomaly_detected: bool,
    pub objects: Vec<String>,
    pub confidence: f64,
    pub detections_count: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TemporalDiagnostics {
    pub anomaly_detected: bool,
    pub anomaly_type: ActivityType,
    pub confidence: f64,
    pub temporal_features: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_matches_contract() {
        let r = FusionResult::fallback();
        assert!(r.is_fallback());
        assert!(!r.anomaly_detected);
        assert_eq!(r.anomaly_type, "processing_error");
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.severity, Severity::None);
        assert_eq!(r.priority, Priority::Low);
        assert_eq!(r.description, "Fusion engine processing failed");
        assert!(r.metadata.fused().is_none());
    }

    #[test]
    fn fallback_serializes_error_metadata() {
        let value = serde_json::to_value(FusionResult::fallback()).unwrap();
        assert_eq!(value["metadata"], json!({"error": "fusion_processing_failed"}));
        assert_eq!(value["severity"], json!("none"));
        assert_eq!(value["bounding_boxes"], json!([]));
    }
}
