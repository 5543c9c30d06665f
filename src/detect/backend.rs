use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// The model itself is an external collaborator: the decision core treats it
/// as an opaque function from a frame to a list of detections. Backends must
/// not block the frame loop on network or disk I/O per call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB frame.
    ///
    /// `confidence_floor` is the lowest confidence the caller cares about;
    /// backends may use it to prune candidates early. Detections below the
    /// floor must not be returned.
    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        confidence_floor: f32,
    ) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
