use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::detect::backend::TemporalBackend;
use crate::detect::classes::ActivityType;
use crate::detect::result::TemporalResult;
use crate::frame::Frame;

/// Consecutive frame pairs inspected for motion.
const MOTION_PAIRS: usize = 4;

const FIGHTING_MOTION: f64 = 80.0;
const RUNNING_MOTION: f64 = 65.0;
const SUSPICIOUS_MOTION: f64 = 50.0;
const LOITERING_MOTION: f64 = 5.0;

const LOITERING_CONFIDENCE: f64 = 0.45;
const NORMAL_SEQUENCE_CONFIDENCE: f64 = 0.35;
const NORMAL_IMAGE_CONFIDENCE: f64 = 0.3;

const EDGE_THRESHOLD: u16 = 60;
const BUSY_EDGE_DENSITY: f64 = 0.15;

/// Deterministic temporal backend driven by frame differencing.
///
/// Stands in for a learned activity model: motion intensity selects the
/// activity category, still images are judged by edge density.
#[derive(Clone, Debug, Default)]
pub struct MotionTemporalBackend;

impl MotionTemporalBackend {
    pub fn new() -> Self {
        Self
    }

    fn motion_intensity(frames: &[Frame]) -> Result<f64> {
        let diffs = frames
            .windows(2)
            .take(MOTION_PAIRS)
            .map(|pair| pair[0].mean_abs_diff(&pair[1]))
            .collect::<Result<Vec<f64>>>()?;
        if diffs.is_empty() {
            return Ok(0.0);
        }
        Ok(diffs.iter().sum::<f64>() / diffs.len() as f64)
    }
}

fn features(motion: f64, frame_count: usize, level: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("motion_intensity".to_string(), json!(motion));
    map.insert("frame_count".to_string(), json!(frame_count));
    map.insert("activity_level".to_string(), json!(level));
    map
}

impl TemporalBackend for MotionTemporalBackend {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn analyze_sequence(&mut self, frames: &[Frame]) -> Result<TemporalResult> {
        if frames.is_empty() {
            return Ok(TemporalResult::normal(0.0, features(0.0, 0, "normal")));
        }

        let motion = Self::motion_intensity(frames)?;
        let count = frames.len();

        let result = if motion > FIGHTING_MOTION {
            TemporalResult::for_activity(
                ActivityType::Fighting,
                (0.6 + motion / 200.0).min(0.85),
                features(motion, count, "high"),
            )
        } else if motion > RUNNING_MOTION {
            TemporalResult::for_activity(
                ActivityType::Running,
                (0.5 + motion / 250.0).min(0.75),
                features(motion, count, "medium"),
            )
        } else if motion > SUSPICIOUS_MOTION {
            TemporalResult::for_activity(
                ActivityType::SuspiciousActivity,
                (0.4 + motion / 300.0).min(0.65),
                features(motion, count, "medium"),
            )
        } else if motion < LOITERING_MOTION {
            TemporalResult::for_activity(
                ActivityType::Loitering,
                LOITERING_CONFIDENCE,
                features(motion, count, "low"),
            )
        } else {
            TemporalResult::normal(
                NORMAL_SEQUENCE_CONFIDENCE,
                features(motion, count, "normal"),
            )
        };
        Ok(result)
    }

    fn analyze_image(&mut self, frame: &Frame) -> Result<TemporalResult> {
        let edge_density = frame.edge_density(EDGE_THRESHOLD);
        let busy = edge_density > BUSY_EDGE_DENSITY;

        let mut map = Map::new();
        map.insert("edge_density".to_string(), json!(edge_density));
        map.insert("brightness".to_string(), json!(frame.brightness()));
        map.insert("contrast".to_string(), json!(frame.contrast()));
        map.insert("frame_count".to_string(), json!(1));
        map.insert(
            "activity_level".to_string(),
            json!(if busy { "high" } else { "normal" }),
        );

        if busy {
            Ok(TemporalResult::for_activity(
                ActivityType::SuspiciousActivity,
                (0.3 + edge_density).min(0.6),
                map,
            ))
        } else {
            Ok(TemporalResult::normal(NORMAL_IMAGE_CONFIDENCE, map))
        }
    }
}
