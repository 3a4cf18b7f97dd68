use anyhow::Result;

use crate::detect::result::{RawDetection, TemporalResult};
use crate::frame::Frame;

/// Spatial detector backend trait.
///
/// # Collaborator Boundary
///
/// Backends stand in for a real object-detection model. The fusion engine
/// consumes only the summarized [`SpatialResult`](crate::SpatialResult), so a
/// backend may be swapped for real inference without touching fusion.
///
/// Implementations must be deterministic for identical input.
pub trait SpatialBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Detect objects in a single frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Temporal detector backend trait.
pub trait TemporalBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Analyze a sequence of frames for activity patterns.
    fn analyze_sequence(&mut self, frames: &[Frame]) -> Result<TemporalResult>;

    /// Analyze a single still image (limited analysis, no motion).
    fn analyze_image(&mut self, frame: &Frame) -> Result<TemporalResult>;

    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
