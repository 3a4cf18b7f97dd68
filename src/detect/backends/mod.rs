mod motion;
mod stub;

pub use motion::MotionTemporalBackend;
pub use stub::ScriptedSpatialBackend;
