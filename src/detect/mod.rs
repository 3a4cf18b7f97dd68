mod backend;
mod backends;
pub mod classes;
mod result;

pub use backend::{SpatialBackend, TemporalBackend};
pub use backends::{MotionTemporalBackend, ScriptedSpatialBackend};
pub use classes::{classify, summarize, ActivityType};
pub use result::{Detection, RawDetection, SpatialResult, TemporalResult};
