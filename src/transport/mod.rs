//! Wire formats for collaborator verdicts.
//!
//! The spatial and temporal detectors publish JSON; this module turns those
//! payloads into typed results for the fusion engine.

mod payload;

pub use payload::{
    is_valid_resolution, parse_frame_metadata, parse_spatial_payload, parse_temporal_payload,
    FusionRequest,
};
