//! Frame ingestion.
//!
//! Produces `VideoFrame` instances for the processing loop. The synthetic
//! `stub://` backend is always available for tests and demo runs; real
//! capture devices are integrations that slot in as further backends.

mod camera;

pub use camera::{CameraConfig, CameraSource, CameraStats, VideoFrame};
