//! Runs the collaborator backends and the fusion engine over one sample.

use anyhow::Result;
use std::sync::Arc;

use crate::detect::{summarize, SpatialBackend, SpatialResult, TemporalBackend};
use crate::frame::{sample_indices, FileKind, Frame, FrameMetadata, DEFAULT_SAMPLE_FRAMES};
use crate::fusion::{FusionEngine, FusionMetadata, FusionResult, NORMAL};
use crate::{Priority, Severity};

pub const DEGRADED_CONFIDENCE: f64 = 0.2;
pub const DEGRADED_DESCRIPTION: &str = "Fallback detection due to processing error";
pub const DEGRADED_MODEL: &str = "Fallback Detection";

/// Side of the blank frame analyzed when a sample has no frames.
const BLANK_FRAME_SIDE: u32 = 224;

pub struct Pipeline {
    spatial: Box<dyn SpatialBackend>,
    temporal: Box<dyn TemporalBackend>,
    engine: Arc<FusionEngine>,
    max_frames: usize,
}

impl Pipeline {
    pub fn new(
        spatial: Box<dyn SpatialBackend>,
        temporal: Box<dyn TemporalBackend>,
        engine: Arc<FusionEngine>,
    ) -> Self {
        Self {
            spatial,
            temporal,
            engine,
            max_frames: DEFAULT_SAMPLE_FRAMES,
        }
    }

    /// Cap on frames handed to the temporal backend.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.max(1);
        self
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.spatial.warm_up()?;
        self.temporal.warm_up()?;
        log::info!(
            "pipeline ready: spatial={}, temporal={}",
            self.spatial.name(),
            self.temporal.name()
        );
        Ok(())
    }

    /// Analyze one sample. Collaborator failures yield a degraded, non-anomalous verdict.
    pub fn process(&mut self, frames: &[Frame], kind: FileKind) -> FusionResult {
        match self.try_process(frames, kind) {
            Ok(result) => result,
            Err(err) => {
                log::error!("pipeline error: {}", err);
                degraded(&err.to_string())
            }
        }
    }

    fn try_process(&mut self, frames: &[Frame], kind: FileKind) -> Result<FusionResult> {
        let sampled: Vec<Frame> = sample_indices(frames.len(), self.max_frames)
            .into_iter()
            .map(|i| frames[i].clone())
            .collect();

        // An empty sample still gets a verdict: no objects, blank-image activity.
        let (spatial, temporal) = match sampled.first() {
            Some(first) => {
                let spatial = summarize(self.spatial.detect(first)?);
                let temporal = if kind == FileKind::Video && sampled.len() > 1 {
                    self.temporal.analyze_sequence(&sampled)?
                } else {
                    self.temporal.analyze_image(first)?
                };
                (spatial, temporal)
            }
            None => {
                let blank = Frame::solid(BLANK_FRAME_SIDE, BLANK_FRAME_SIDE, 0)?;
                (SpatialResult::default(), self.temporal.analyze_image(&blank)?)
            }
        };

        let meta = FrameMetadata::describe(&sampled, kind);
        Ok(self.engine.fuse(&spatial, &temporal, Some(&meta)))
    }
}

/// Verdict reported when a collaborator fails before fusion runs.
pub fn degraded(error: &str) -> FusionResult {
    FusionResult {
        success: true,
        anomaly_detected: false,
        anomaly_type: NORMAL.to_string(),
        confidence: DEGRADED_CONFIDENCE,
        severity: Severity::None,
        priority: Priority::Low,
        description: DEGRADED_DESCRIPTION.to_string(),
        processing_time_ms: 0.0,
        model_used: DEGRADED_MODEL.to_string(),
        metadata: FusionMetadata::Failed {
            error: error.to_string(),
        },
        bounding_boxes: Vec::new(),
    }
}
