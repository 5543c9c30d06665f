//! detect_probe - run the detector against a frame source and print raw
//! detections, without filtering or alerting.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use safesphere::{build_detector, CameraSource, SentinelConfig};

#[derive(Debug, Parser)]
#[command(name = "detect_probe", about = "SafeSphere detector probe")]
struct Args {
    /// Configuration file (JSON). Also read from SENTRY_CONFIG.
    #[arg(long, env = "SENTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Number of frames to probe.
    #[arg(long, default_value_t = 100)]
    frames: u64,

    /// Confidence floor for the probe (intentionally low).
    #[arg(long, default_value_t = 0.1)]
    floor: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let cfg = SentinelConfig::load_from(args.config.as_deref())?;

    let mut detector = build_detector(&cfg.model_path)?;
    detector.warm_up()?;
    println!("detector backend: {}", detector.name());

    let mut source = CameraSource::new(cfg.camera.clone())?;
    source.connect()?;

    let mut total = 0u64;
    for frame_no in 1..=args.frames {
        let frame = source.next_frame()?;
        let detections = detector.detect(&frame.pixels, frame.width, frame.height, args.floor)?;
        for detection in &detections {
            total += 1;
            println!(
                "frame {:>5}: {} conf={:.2} box=({:.0},{:.0})-({:.0},{:.0})",
                frame_no,
                detection.class,
                detection.confidence,
                detection.bbox.x1,
                detection.bbox.y1,
                detection.bbox.x2,
                detection.bbox.y2
            );
        }
    }
    println!("{} detections over {} frames", total, args.frames);
    Ok(())
}
