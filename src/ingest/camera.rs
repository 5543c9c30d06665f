use anyhow::{anyhow, Result};

use crate::detect::FrameGeometry;

/// One captured frame: packed RGB, row-major.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height)
    }
}

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Source URL; `stub://<name>` selects the synthetic backend.
    pub url: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "stub://front_camera".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.url.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            })
        } else {
            Err(anyhow!(
                "camera url '{}' not supported in this build (expected stub://)",
                config.url
            ))
        }
    }

    /// Connect to the camera.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<VideoFrame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub url: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demo runs
// ----------------------------------------------------------------------------

/// Frames per scene phase; the scene alternates between a static background
/// and a moving bright block, so a change-sensitive detector fires in bursts.
const SCENE_PHASE_FRAMES: u64 = 60;

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("camera: connected to {} (synthetic)", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<VideoFrame> {
        self.frame_count += 1;
        let width = self.config.width;
        let height = self.config.height;
        let mut pixels = vec![0u8; (width * height * 3) as usize];

        // Static background gradient.
        for y in 0..height {
            for x in 0..width {
                let offset = ((y * width + x) * 3) as usize;
                let shade = ((x + y) % 64) as u8 + 64;
                pixels[offset] = shade;
                pixels[offset + 1] = shade;
                pixels[offset + 2] = shade;
            }
        }

        // During active phases, a bright block sweeps across the frame.
        let phase = self.frame_count / SCENE_PHASE_FRAMES;
        if phase % 2 == 1 {
            let block_w = width / 5;
            let block_h = height / 5;
            let x0 = ((self.frame_count * 7) % (width.saturating_sub(block_w)).max(1) as u64) as u32;
            let y0 = height / 3;
            for y in y0..(y0 + block_h).min(height) {
                for x in x0..(x0 + block_w).min(width) {
                    let offset = ((y * width + x) * 3) as usize;
                    pixels[offset] = 230;
                    pixels[offset + 1] = 230;
                    pixels[offset + 2] = 230;
                }
            }
        }

        Ok(VideoFrame {
            pixels,
            width,
            height,
        })
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}
