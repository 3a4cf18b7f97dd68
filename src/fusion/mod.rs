//! Reconciliation of spatial and temporal verdicts.

mod anomaly_type;
mod confidence;
mod critical;
mod describe;
mod engine;
mod escalation;
mod result;

pub use anomaly_type::{resolve_type, NORMAL};
pub use confidence::fuse_confidence;
pub use critical::{CriticalCombination, CriticalResolver};
pub use describe::{describe, NORMAL_DESCRIPTION};
pub use engine::FusionEngine;
pub use escalation::{fuse_priority, fuse_severity, infer_spatial_severity};
pub use result::{
    FusedMetadata, FusionMetadata, FusionResult, SpatialDiagnostics, TemporalDiagnostics,
    FALLBACK_ANOMALY_TYPE, FALLBACK_DESCRIPTION, FALLBACK_ERROR, FALLBACK_MODEL,
    PROCESSING_METHOD,
};
