use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::detect::classes::ActivityType;
use crate::{DetectionPriority, Priority, Severity};

/// A raw detection as produced by an object detector, before classification.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f64,
    /// Pixel coordinates `[x1, y1, x2, y2]`.
    pub bbox: [i32; 4],
}

/// A classified detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [i32; 4],
    pub is_anomaly: bool,
    pub priority: DetectionPriority,
}

impl Detection {
    /// Wire form carried in `SpatialResult::detections`.
    pub fn to_value(&self) -> Value {
        json!({
            "class_name": self.class_name,
            "confidence": self.confidence,
            "bbox": self.bbox,
            "is_anomaly": self.is_anomaly,
            "priority": self.priority,
        })
    }
}

/// Summarized output of the spatial (object) detector for one sample.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SpatialResult {
    #[serde(default)]
    pub anomaly_detected: bool,
    /// Distinct labels in the order the detector first observed them.
    #[serde(default)]
    pub object_types: Vec<String>,
    #[serde(default)]
    pub max_confidence: f64,
    #[serde(default)]
    pub avg_confidence: f64,
    #[serde(default)]
    pub highest_priority: DetectionPriority,
    #[serde(default)]
    pub anomaly_count: usize,
    /// Anomalous detections in the detector's own wire form. Fusion never
    /// reads them; they reach the fused result untouched.
    #[serde(default, deserialize_with = "lenient_detections")]
    pub detections: Vec<Value>,
}

/// Accept any detections payload: a non-array is dropped, entries are kept verbatim.
fn lenient_detections<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            log::warn!("ignoring non-array detections payload: {}", other);
            Vec::new()
        }
    })
}

impl SpatialResult {
    /// Summarize classified detections, keeping only the anomalous ones.
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        let anomalous: Vec<Detection> = detections.into_iter().filter(|d| d.is_anomaly).collect();

        if anomalous.is_empty() {
            return Self {
                anomaly_detected: false,
                object_types: Vec::new(),
                max_confidence: 0.0,
                avg_confidence: 0.0,
                highest_priority: DetectionPriority::None,
                anomaly_count: 0,
                detections: Vec::new(),
            };
        }

        let mut object_types: Vec<String> = Vec::new();
        for d in &anomalous {
            if !object_types.contains(&d.class_name) {
                object_types.push(d.class_name.clone());
            }
        }

        let highest_priority = if anomalous
            .iter()
            .any(|d| d.priority == DetectionPriority::High)
        {
            DetectionPriority::High
        } else {
            DetectionPriority::Medium
        };

        let max_confidence = anomalous
            .iter()
            .map(|d| d.confidence)
            .fold(0.0_f64, f64::max);
        let avg_confidence =
            anomalous.iter().map(|d| d.confidence).sum::<f64>() / anomalous.len() as f64;

        Self {
            anomaly_detected: true,
            object_types,
            max_confidence,
            avg_confidence,
            highest_priority,
            anomaly_count: anomalous.len(),
            detections: anomalous.iter().map(Detection::to_value).collect(),
        }
    }
}

/// Output of the temporal (activity) detector for one sample.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TemporalResult {
    #[serde(default)]
    pub anomaly_detected: bool,
    #[serde(default)]
    pub anomaly_type: ActivityType,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub priority: Priority,
    /// Diagnostic values, opaque to fusion.
    #[serde(default)]
    pub temporal_features: Map<String, Value>,
}

impl TemporalResult {
    /// Result for a sample with no notable activity.
    pub fn normal(confidence: f64, temporal_features: Map<String, Value>) -> Self {
        Self::for_activity(ActivityType::Normal, confidence, temporal_features)
    }

    /// Result for an activity category, using the category's default severity and priority.
    pub fn for_activity(
        activity: ActivityType,
        confidence: f64,
        temporal_features: Map<String, Value>,
    ) -> Self {
        Self {
            anomaly_detected: activity.is_anomalous(),
            anomaly_type: activity,
            confidence,
            severity: activity.default_severity(),
            priority: activity.default_priority(),
            temporal_features,
        }
    }
}
