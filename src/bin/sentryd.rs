//! sentryd - SafeSphere Sentinel daemon
//!
//! This daemon:
//! 1. Loads configuration (file + environment)
//! 2. Verifies the detector resource at startup (fatal when missing)
//! 3. Captures frames from the configured camera
//! 4. Runs the decision core on each frame's detections
//! 5. Publishes annotated JPEG frames to the MJPEG/status HTTP server
//! 6. Dispatches alerts on detached workers, one per cooldown window

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use safesphere::{
    api::{ApiConfig, ApiServer, StatusFeed, VideoSink},
    build_detector, draw_detections, now_s, CameraSource, Sentinel, SentinelConfig,
};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);
const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Parser)]
#[command(name = "sentryd", about = "SafeSphere Sentinel daemon")]
struct Args {
    /// Configuration file (JSON). Also read from SENTRY_CONFIG.
    #[arg(long, env = "SENTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the status/stream listen address.
    #[arg(long)]
    api_addr: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentinelConfig::load_from(args.config.as_deref())?;
    if let Some(addr) = args.api_addr {
        cfg.api_addr = addr;
    }

    // Startup failure is fatal: never serve frames without a working detector.
    let mut detector = build_detector(&cfg.model_path)?;
    detector.warm_up()?;
    log::info!("detector backend: {}", detector.name());

    let mut sentinel = Sentinel::from_config(&cfg);
    let confidence_floor = sentinel.confidence_floor();

    let weapon_detected = Arc::new(AtomicBool::new(false));
    let sink = Arc::new(VideoSink::new());
    let api_handle = ApiServer::new(
        ApiConfig {
            addr: cfg.api_addr.clone(),
        },
        StatusFeed {
            weapon_detected: weapon_detected.clone(),
            gate: sentinel.gate().clone(),
        },
        sink.clone(),
    )
    .spawn()?;
    log::info!("status api listening on {}", api_handle.addr);
    log::info!("video feed at http://{}/video_feed", api_handle.addr);

    let mut source = CameraSource::new(cfg.camera.clone())?;
    source.connect()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })?;

    let frame_interval = Duration::from_millis(1000 / cfg.camera.target_fps.max(1) as u64);
    let mut last_health_log = Instant::now();
    let mut frames_processed = 0u64;
    let mut frames_dropped = 0u64;

    log::info!(
        "sentryd running: cooldown {}s, history {}, quorum {}",
        sentinel.gate().cooldown_secs(),
        cfg.history_length,
        cfg.quorum
    );

    while !shutdown.load(Ordering::SeqCst) {
        let mut frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame capture failed: {}", e);
                frames_dropped += 1;
                std::thread::sleep(frame_interval);
                continue;
            }
        };

        let detections = match detector.detect(
            &frame.pixels,
            frame.width,
            frame.height,
            confidence_floor,
        ) {
            Ok(detections) => detections,
            Err(e) => {
                // Transient detector failure: drop this frame from the
                // decision pipeline and keep the loop alive.
                log::warn!("detector failed, frame dropped: {}", e);
                frames_dropped += 1;
                std::thread::sleep(frame_interval);
                continue;
            }
        };

        let geometry = frame.geometry();
        let verdict = sentinel.process_frame(&detections, geometry, now_s()?);
        weapon_detected.store(verdict.weapon_present, Ordering::SeqCst);

        draw_detections(
            &mut frame.pixels,
            frame.width,
            frame.height,
            &verdict.accepted,
        );
        match encode_jpeg(&frame.pixels, frame.width, frame.height) {
            Ok(jpeg) => sink.publish(jpeg),
            Err(e) => log::warn!("jpeg encode failed: {}", e),
        }

        frames_processed += 1;
        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = source.stats();
            log::info!(
                "camera health={} captured={} processed={} dropped={} url={}",
                source.is_healthy(),
                stats.frames_captured,
                frames_processed,
                frames_dropped,
                stats.url
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(frame_interval);
    }

    log::info!("shutting down");
    api_handle.stop()?;
    Ok(())
}

fn encode_jpeg(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode(pixels, width, height, image::ExtendedColorType::Rgb8)?;
    Ok(jpeg)
}
