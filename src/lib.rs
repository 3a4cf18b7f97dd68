//! Multi-modal surveillance anomaly fusion.
//!
//! This crate reconciles two independent per-sample anomaly verdicts, one from a
//! spatial (object) detector and one from a temporal (activity) detector, into a
//! single surveillance verdict.
//!
//! # Architecture
//!
//! The fusion core is a pure function of its inputs:
//!
//! 1. **Confidence fusion**: two raw scores plus two anomaly flags become one calibrated score.
//! 2. **Critical combinations**: known dangerous (object, activity) pairs force the verdict.
//! 3. **Escalation**: closed lookup tables fuse severity and priority.
//! 4. **Type resolution**: a strict priority order picks one anomaly label.
//! 5. **Description**: a human-readable explanation of the verdict.
//!
//! The engine holds only immutable configuration and never fails outward: any
//! internal error is converted into a fixed fallback result.
//!
//! # Module Structure
//!
//! - `detect`: collaborator contracts (`SpatialResult`, `TemporalResult`) and deterministic stand-ins
//! - `frame`: luma frames, sampling, frame metadata
//! - `fusion`: the reconciliation engine
//! - `pipeline`: runs the collaborators and the engine over a frame sequence
//! - `transport`: lenient JSON parsing of collaborator payloads
//! - `api`: thin HTTP boundary
//! - Core types: `Severity`, `Priority`, `DetectionPriority`

use serde::{Deserialize, Serialize};

pub mod api;
pub mod config;
pub mod detect;
pub mod frame;
pub mod fusion;
pub mod pipeline;
pub mod transport;

pub use config::{FusionConfig, FusionWeights, ServiceConfig};
pub use detect::{
    ActivityType, Detection, MotionTemporalBackend, RawDetection, ScriptedSpatialBackend,
    SpatialBackend, SpatialResult, TemporalBackend, TemporalResult,
};
pub use frame::{sample_indices, FileKind, Frame, FrameMetadata};
pub use fusion::{
    fuse_confidence, fuse_priority, fuse_severity, infer_spatial_severity, CriticalCombination,
    CriticalResolver, FusionEngine, FusionMetadata, FusionResult,
};
pub use pipeline::Pipeline;

// -------------------- Levels --------------------

/// Qualitative impact level of a detected anomaly.
///
/// Variants are declared in escalation order, so `Ord` follows
/// `none < low < medium < high < critical`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::None,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// High and critical verdicts are flagged in descriptions.
    pub fn is_elevated(self) -> bool {
        self >= Severity::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Urgency of operator response.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Priority reported by the spatial detector.
///
/// Unlike [`Priority`], this admits `none` for frames without anomalous objects.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DetectionPriority {
    None,
    #[default]
    Low,
    Medium,
    High,
}

impl DetectionPriority {
    pub const ALL: [DetectionPriority; 4] = [
        DetectionPriority::None,
        DetectionPriority::Low,
        DetectionPriority::Medium,
        DetectionPriority::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetectionPriority::None => "none",
            DetectionPriority::Low => "low",
            DetectionPriority::Medium => "medium",
            DetectionPriority::High => "high",
        }
    }
}

impl std::fmt::Display for DetectionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_escalation() {
        let mut sorted = Severity::ALL;
        sorted.sort();
        assert_eq!(sorted, Severity::ALL);
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::None < Severity::Low);
    }

    #[test]
    fn only_high_and_critical_are_elevated() {
        let elevated: Vec<Severity> = Severity::ALL
            .into_iter()
            .filter(|s| s.is_elevated())
            .collect();
        assert_eq!(elevated, vec![Severity::High, Severity::Critical]);
    }

    #[test]
    fn levels_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
        let p: DetectionPriority = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(p, DetectionPriority::None);
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(serde_json::from_str::<Severity>("\"extreme\"").is_err());
        assert!(serde_json::from_str::<Priority>("\"none\"").is_err());
    }
}
