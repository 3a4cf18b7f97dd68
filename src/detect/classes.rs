//! Label vocabularies shared by the detectors.

use serde::{Deserialize, Serialize};

use crate::detect::result::{Detection, RawDetection, SpatialResult};
use crate::{DetectionPriority, Priority, Severity};

/// Activity categories reported by the temporal detector.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Normal,
    SuspiciousActivity,
    WeaponDetection,
    Fighting,
    Vandalism,
    Theft,
    Intrusion,
    Loitering,
    Running,
    UnusualBehavior,
}

impl ActivityType {
    pub const ALL: [ActivityType; 10] = [
        ActivityType::Normal,
        ActivityType::SuspiciousActivity,
        ActivityType::WeaponDetection,
        ActivityType::Fighting,
        ActivityType::Vandalism,
        ActivityType::Theft,
        ActivityType::Intrusion,
        ActivityType::Loitering,
        ActivityType::Running,
        ActivityType::UnusualBehavior,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Normal => "normal",
            ActivityType::SuspiciousActivity => "suspicious_activity",
            ActivityType::WeaponDetection => "weapon_detection",
            ActivityType::Fighting => "fighting",
            ActivityType::Vandalism => "vandalism",
            ActivityType::Theft => "theft",
            ActivityType::Intrusion => "intrusion",
            ActivityType::Loitering => "loitering",
            ActivityType::Running => "running",
            ActivityType::UnusualBehavior => "unusual_behavior",
        }
    }

    pub fn is_anomalous(self) -> bool {
        self != ActivityType::Normal
    }

    pub fn default_severity(self) -> Severity {
        match self {
            ActivityType::Normal => Severity::None,
            ActivityType::Loitering => Severity::Low,
            ActivityType::SuspiciousActivity
            | ActivityType::Vandalism
            | ActivityType::Running
            | ActivityType::UnusualBehavior => Severity::Medium,
            ActivityType::Fighting | ActivityType::Theft | ActivityType::Intrusion => {
                Severity::High
            }
            ActivityType::WeaponDetection => Severity::Critical,
        }
    }

    pub fn default_priority(self) -> Priority {
        match self {
            ActivityType::Normal => Priority::Low,
            ActivityType::WeaponDetection
            | ActivityType::Fighting
            | ActivityType::Theft
            | ActivityType::Intrusion => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Object classes relevant to surveillance anomalies (COCO indices).
pub const ANOMALY_CLASSES: &[(u32, &str)] = &[
    (0, "person"),
    (1, "bicycle"),
    (2, "car"),
    (3, "motorcycle"),
    (5, "bus"),
    (7, "truck"),
    (15, "cat"),
    (16, "dog"),
    (24, "handbag"),
    (26, "suitcase"),
    (28, "sports ball"),
    (39, "bottle"),
    (43, "knife"),
    (44, "spoon"),
    (45, "bowl"),
    (73, "laptop"),
    (74, "mouse"),
    (75, "remote"),
    (76, "keyboard"),
    (77, "cell phone"),
];

/// Objects that always raise spatial priority to `high`.
pub const HIGH_PRIORITY_OBJECTS: &[&str] =
    &["knife", "person", "car", "motorcycle", "handbag", "suitcase"];

/// Detections below this confidence are discarded before summarization.
pub const MIN_DETECTION_CONFIDENCE: f64 = 0.3;

pub fn is_anomaly_class(label: &str) -> bool {
    ANOMALY_CLASSES.iter().any(|(_, name)| *name == label)
        || HIGH_PRIORITY_OBJECTS.contains(&label)
}

/// Classify a raw detection into an anomaly flag and priority.
pub fn classify(raw: RawDetection) -> Detection {
    let priority = if HIGH_PRIORITY_OBJECTS.contains(&raw.class_name.as_str()) {
        DetectionPriority::High
    } else {
        DetectionPriority::Medium
    };
    Detection {
        is_anomaly: is_anomaly_class(&raw.class_name),
        priority,
        class_name: raw.class_name,
        confidence: raw.confidence,
        bbox: raw.bbox,
    }
}

/// Drop low-confidence detections, classify the rest and summarize them.
pub fn summarize(raw: Vec<RawDetection>) -> SpatialResult {
    let classified = raw
        .into_iter()
        .filter(|d| d.confidence >= MIN_DETECTION_CONFIDENCE)
        .map(classify)
        .collect();
    SpatialResult::from_detections(classified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_names_match_wire_format() {
        for activity in ActivityType::ALL {
            let wire = serde_json::to_value(activity).unwrap();
            assert_eq!(wire, serde_json::json!(activity.as_str()));
        }
        assert!(serde_json::from_str::<ActivityType>("\"dancing\"").is_err());
    }

    #[test]
    fn weapon_detection_is_critical_and_high() {
        assert_eq!(
            ActivityType::WeaponDetection.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            ActivityType::WeaponDetection.default_priority(),
            Priority::High
        );
    }

    #[test]
    fn knife_is_high_priority_anomaly() {
        let d = classify(RawDetection {
            class_name: "knife".to_string(),
            confidence: 0.8,
            bbox: [1, 2, 3, 4],
        });
        assert!(d.is_anomaly);
        assert_eq!(d.priority, DetectionPriority::High);
    }

    #[test]
    fn summarize_discards_weak_and_benign_detections() {
        let raw = |class: &str, confidence: f64| RawDetection {
            class_name: class.to_string(),
            confidence,
            bbox: [0, 0, 50, 50],
        };
        let s = summarize(vec![
            raw("knife", 0.2),
            raw("giraffe", 0.9),
            raw("bottle", 0.6),
        ]);
        assert!(s.anomaly_detected);
        assert_eq!(s.object_types, vec!["bottle"]);
        assert_eq!(s.highest_priority, DetectionPriority::Medium);
    }

    #[test]
    fn unknown_label_is_not_anomalous() {
        let d = classify(RawDetection {
            class_name: "giraffe".to_string(),
            confidence: 0.8,
            bbox: [1, 2, 3, 4],
        });
        assert!(!d.is_anomaly);
        assert_eq!(d.priority, DetectionPriority::Medium);
    }
}
