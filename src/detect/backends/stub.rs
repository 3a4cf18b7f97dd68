use anyhow::Result;

use crate::detect::backend::SpatialBackend;
use crate::detect::result::RawDetection;
use crate::frame::Frame;

/// Scripted spatial backend for testing and demos.
///
/// Returns the same detections for every frame, clipped to the frame bounds.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSpatialBackend {
    script: Vec<RawDetection>,
}

impl ScriptedSpatialBackend {
    pub fn new(script: Vec<RawDetection>) -> Self {
        Self { script }
    }

    /// Convenience constructor from `(label, confidence)` pairs laid out left to right.
    pub fn with_labels(labels: &[(&str, f64)]) -> Self {
        let script = labels
            .iter()
            .enumerate()
            .map(|(i, (label, confidence))| {
                let x1 = i as i32 * 60;
                RawDetection {
                    class_name: label.to_string(),
                    confidence: *confidence,
                    bbox: [x1, 10, x1 + 50, 110],
                }
            })
            .collect();
        Self { script }
    }
}

impl SpatialBackend for ScriptedSpatialBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        let max_x = frame.width() as i32;
        let max_y = frame.height() as i32;
        Ok(self
            .script
            .iter()
            .map(|d| {
                let [x1, y1, x2, y2] = d.bbox;
                RawDetection {
                    class_name: d.class_name.clone(),
                    confidence: d.confidence,
                    bbox: [
                        x1.clamp(0, max_x),
                        y1.clamp(0, max_y),
                        x2.clamp(0, max_x),
                        y2.clamp(0, max_y),
                    ],
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_backend_is_repeatable_and_clipped() {
        let mut backend = ScriptedSpatialBackend::with_labels(&[("person", 0.9), ("knife", 0.7)]);
        let frame = Frame::solid(100, 80, 0).unwrap();

        let first = backend.detect(&frame).unwrap();
        let second = backend.detect(&frame).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].bbox, [0, 10, 50, 80]);
        assert_eq!(first[1].bbox, [60, 10, 100, 80]);
    }
}
