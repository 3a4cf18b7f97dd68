use anyhow::{anyhow, Result};
use serde_json::Value;
use std::time::Instant;

use crate::config::FusionConfig;
use crate::detect::{SpatialResult, TemporalResult};
use crate::frame::FrameMetadata;
use crate::fusion::anomaly_type::resolve_type;
use crate::fusion::confidence::fuse_confidence;
use crate::fusion::critical::CriticalResolver;
use crate::fusion::describe::describe;
use crate::fusion::escalation::{fuse_priority, fuse_severity, infer_spatial_severity};
use crate::fusion::result::{
    FusedMetadata, FusionMetadata, FusionResult, SpatialDiagnostics, TemporalDiagnostics,
    PROCESSING_METHOD,
};
use crate::transport;

/// Stateless fusion engine.
///
/// Holds only read-only configuration; a single engine may be shared by any
/// number of threads without locking.
#[derive(Clone, Debug)]
pub struct FusionEngine {
    config: FusionConfig,
    critical: CriticalResolver,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        let critical = CriticalResolver::with_extra(&config.extra_critical_combinations);
        Ok(Self { config, critical })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn critical_table(&self) -> &CriticalResolver {
        &self.critical
    }

    /// Fuse two verdicts. Never fails: internal errors yield [`FusionResult::fallback`].
    pub fn fuse(
        &self,
        spatial: &SpatialResult,
        temporal: &TemporalResult,
        frame: Option<&FrameMetadata>,
    ) -> FusionResult {
        match self.try_fuse(spatial, temporal, frame) {
            Ok(result) => result,
            Err(err) => {
                log::error!("fusion engine error: {}", err);
                FusionResult::fallback()
            }
        }
    }

    /// Parse raw collaborator payloads and fuse them.
    ///
    /// Malformed payloads yield the fallback result like any other internal failure.
    pub fn fuse_payloads(
        &self,
        spatial: &Value,
        temporal: &Value,
        frame: Option<&Value>,
    ) -> FusionResult {
        let parsed = transport::parse_spatial_payload(spatial).and_then(|spatial| {
            let temporal = transport::parse_temporal_payload(temporal)?;
            let frame = frame.map(transport::parse_frame_metadata).transpose()?;
            Ok((spatial, temporal, frame))
        });
        match parsed {
            Ok((spatial, temporal, frame)) => self.fuse(&spatial, &temporal, frame.as_ref()),
            Err(err) => {
                log::error!("fusion engine error: {}", err);
                FusionResult::fallback()
            }
        }
    }

    pub fn try_fuse(
        &self,
        spatial: &SpatialResult,
        temporal: &TemporalResult,
        frame: Option<&FrameMetadata>,
    ) -> Result<FusionResult> {
        let start = Instant::now();
        let cfg = &self.config;

        ensure_unit("spatial max_confidence", spatial.max_confidence)?;
        ensure_unit("temporal confidence", temporal.confidence)?;

        let mut confidence = fuse_confidence(
            cfg,
            spatial.max_confidence,
            temporal.confidence,
            spatial.anomaly_detected,
            temporal.anomaly_detected,
        );
        let mut anomaly_detected = spatial.anomaly_detected || temporal.anomaly_detected;

        let critical = self
            .critical
            .resolve(&spatial.object_types, temporal.anomaly_type);
        if let Some(combo) = critical {
            log::debug!(
                "critical combination: {} + {}",
                combo.object,
                combo.activity
            );
            anomaly_detected = true;
            confidence = confidence.max(cfg.critical_confidence_floor);
        }

        let anomaly_type = resolve_type(
            cfg,
            &spatial.object_types,
            temporal.anomaly_type,
            anomaly_detected,
        );

        let spatial_severity =
            infer_spatial_severity(cfg, &spatial.object_types, spatial.highest_priority);
        let (severity, priority) = match critical {
            Some(combo) => (combo.severity, combo.priority),
            None => (
                fuse_severity(spatial_severity, temporal.severity),
                fuse_priority(spatial.highest_priority, temporal.priority),
            ),
        };

        let description = describe(spatial, temporal, &anomaly_type, severity);

        let metadata = FusionMetadata::Fused(Box::new(FusedMetadata {
            spatial_detection: SpatialDiagnostics {
                anomaly_detected: spatial.anomaly_detected,
                objects: spatial.object_types.clone(),
                confidence: spatial.max_confidence,
                detections_count: spatial.anomaly_count,
            },
            temporal_analysis: TemporalDiagnostics {
                anomaly_detected: temporal.anomaly_detected,
                anomaly_type: temporal.anomaly_type,
                confidence: temporal.confidence,
                temporal_features: temporal.temporal_features.clone(),
            },
            fusion_weights: cfg.weights,
            critical_combination: critical.is_some(),
            processing_method: PROCESSING_METHOD.to_string(),
            frame: frame.cloned(),
        }));

        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "fusion completed: {} (confidence: {:.3})",
            anomaly_type,
            confidence
        );

        Ok(FusionResult {
            success: true,
            anomaly_detected,
            anomaly_type,
            confidence: confidence.clamp(0.0, 1.0),
            severity,
            priority,
            description,
            processing_time_ms,
            model_used: cfg.model_label.clone(),
            metadata,
            bounding_boxes: spatial.detections.clone(),
        })
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self {
            config: FusionConfig::default(),
            critical: CriticalResolver::builtin(),
        }
    }
}

fn ensure_unit(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("conformance: {} out of bounds: {}", name, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ActivityType;
    use crate::{DetectionPriority, Priority, Severity};
    use serde_json::{json, Map, Value};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable_across_threads() {
        assert_send_sync::<FusionEngine>();
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = FusionConfig {
            agreement_cap: 2.0,
            ..FusionConfig::default()
        };
        assert!(FusionEngine::new(cfg).is_err());
    }

    #[test]
    fn out_of_range_confidence_falls_back() {
        let engine = FusionEngine::default();
        let spatial = SpatialResult {
            max_confidence: 1.5,
            ..SpatialResult::default()
        };
        let result = engine.fuse(&spatial, &TemporalResult::default(), None);
        assert_eq!(result, FusionResult::fallback());

        let temporal = TemporalResult {
            confidence: f64::NAN,
            ..TemporalResult::default()
        };
        let result = engine.fuse(&SpatialResult::default(), &temporal, None);
        assert!(result.is_fallback());
    }

    #[test]
    fn critical_floor_never_lowers_confidence() {
        let engine = FusionEngine::default();
        let spatial = SpatialResult {
            anomaly_detected: true,
            object_types: vec!["person".to_string()],
            max_confidence: 0.95,
            highest_priority: DetectionPriority::High,
            anomaly_count: 1,
            ..SpatialResult::default()
        };
        let temporal = TemporalResult {
            anomaly_detected: true,
            anomaly_type: ActivityType::Theft,
            confidence: 0.9,
            severity: Severity::High,
            priority: Priority::High,
            temporal_features: Map::new(),
        };
        let result = engine.fuse(&spatial, &temporal, None);
        assert!((result.confidence - 0.95).abs() < 1e-9);
        assert_eq!(result.anomaly_type, "theft_detected");
        assert!(result.metadata.fused().unwrap().critical_combination);
    }

    #[test]
    fn malformed_payload_falls_back() {
        let engine = FusionEngine::default();
        let result = engine.fuse_payloads(
            &json!({"highest_priority": "urgent"}),
            &json!({}),
            None,
        );
        assert!(result.is_fallback());

        let result = engine.fuse_payloads(&json!([1, 2]), &json!({}), None);
        assert!(result.is_fallback());
    }

    fn intrusion_payloads(detections: Value) -> (Value, Value) {
        let spatial = json!({
            "anomaly_detected": true,
            "object_types": ["person"],
            "max_confidence": 0.9,
            "highest_priority": "high",
            "anomaly_count": 1,
            "detections": detections
        });
        let temporal = json!({
            "anomaly_detected": true,
            "anomaly_type": "intrusion",
            "confidence": 0.6,
            "severity": "high",
            "priority": "high"
        });
        (spatial, temporal)
    }

    #[test]
    fn detections_pass_through_verbatim() {
        let engine = FusionEngine::default();
        let detections = json!([
            {
                "class_name": "person",
                "confidence": 0.9,
                "bbox": [10.5, 20.0, 60.0, 120.0],
                "class_id": 0
            },
            {"class_name": "person", "bbox": [1, 2, 3, 4]}
        ]);
        let (spatial, temporal) = intrusion_payloads(detections.clone());
        let result = engine.fuse_payloads(&spatial, &temporal, None);

        assert!(result.success);
        assert_eq!(result.anomaly_type, "unauthorized_access");
        assert!(result.confidence >= engine.config().critical_confidence_floor);
        assert!(result.metadata.fused().unwrap().critical_combination);
        assert_eq!(serde_json::to_value(&result.bounding_boxes).unwrap(), detections);

        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["bounding_boxes"][0]["class_id"], json!(0));
        assert!(out["bounding_boxes"][0].get("is_anomaly").is_none());
    }

    #[test]
    fn odd_detections_do_not_sink_fusion() {
        let engine = FusionEngine::default();
        for detections in [json!("n/a"), json!(null), json!([42, "x", {"bbox": "wide"}])] {
            let (spatial, temporal) = intrusion_payloads(detections);
            let result = engine.fuse_payloads(&spatial, &temporal, None);
            assert!(result.success);
            assert_eq!(result.anomaly_type, "unauthorized_access");
        }
    }

    #[test]
    fn payload_defaults_fuse_to_quiet_verdict() {
        let engine = FusionEngine::default();
        let result = engine.fuse_payloads(&json!({}), &json!({}), None);
        assert!(result.success);
        assert!(!result.anomaly_detected);
        assert_eq!(result.anomaly_type, "normal");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.severity, Severity::None);
        assert_eq!(result.priority, Priority::Low);
    }
}
