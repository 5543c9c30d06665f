//! SafeSphere Sentinel
//!
//! This crate implements the decision core of a weapon-detection alerting
//! system: it turns a noisy per-frame classification stream into a debounced,
//! rate-limited, multi-channel alert signal.
//!
//! # Architecture
//!
//! Per frame: raw detections -> size/class filter -> temporal debouncer ->
//! (on confirmation) alert gate -> notification dispatcher. Independently,
//! filtered detections feed the frame annotator on the cosmetic path.
//!
//! The detector itself and the camera are external collaborators behind the
//! `DetectorBackend` trait and the `ingest` module; alert transports sit
//! behind `NotificationChannel`.
//!
//! # Module Structure
//!
//! - `detect`: detection types and the detector adapter boundary
//! - `filter`: per-class confidence and size-ratio filtering
//! - `debounce`: rolling-window quorum smoothing with high-risk bypass
//! - `alert`: cooldown gate, dispatcher, channels, contacts, messages
//! - `annotate`: bounding-box overlays for the video sink
//! - `ingest`: camera frame sources
//! - `api`: status and MJPEG stream HTTP server
//! - `config`: file + environment configuration

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

pub mod alert;
pub mod annotate;
pub mod api;
pub mod config;
pub mod debounce;
pub mod detect;
pub mod filter;
pub mod ingest;

pub use alert::{
    AlertGate, AlertMessage, AlertService, AlertStatus, AudioSink, DispatchOutcome,
    DispatchReport, Dispatcher, EmergencyContact, GatewayCredentials, MessageTemplate,
    MessengerChannel, NotificationChannel, SirenChannel, SmsChannel, StubSink,
    MIN_ALERT_COOLDOWN_SECS,
};
pub use annotate::draw_detections;
pub use api::{ApiConfig, ApiHandle, ApiServer, StatusFeed, VideoSink};
pub use config::SentinelConfig;
pub use debounce::{DebounceState, Debouncer, HistoryEntry};
pub use detect::{BoundingBox, Detection, DetectorBackend, FrameGeometry, StubBackend, WeaponClass};
pub use filter::{ClassProfile, SizeClassFilter};
pub use ingest::{CameraConfig, CameraSource, VideoFrame};

/// Wall-clock seconds since the epoch, for cooldown arithmetic.
pub fn now_s() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Select a detector backend for the configured model path.
///
/// `stub://` selects the built-in stub. Anything else must at least exist on
/// disk; a missing model is a fatal startup error, not a degraded mode.
pub fn build_detector(model_path: &str) -> Result<Box<dyn DetectorBackend>> {
    if model_path.starts_with("stub://") {
        return Ok(Box::new(StubBackend::new()));
    }
    if !std::path::Path::new(model_path).exists() {
        return Err(anyhow::anyhow!("model file not found at {}", model_path));
    }
    Err(anyhow::anyhow!(
        "no detector backend compiled for {}; available: stub://",
        model_path
    ))
}

/// Build the notification channels a config enables.
pub fn build_channels(cfg: &SentinelConfig) -> Vec<Box<dyn NotificationChannel>> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
    if let Some(messenger) = &cfg.messenger {
        channels.push(Box::new(MessengerChannel::new(
            messenger.gateway_url.clone(),
            messenger.recipient.clone(),
            messenger.credentials.clone(),
        )));
    }
    if let Some(sms) = &cfg.sms {
        channels.push(Box::new(SmsChannel::new(
            sms.gateway_url.clone(),
            sms.credentials.clone(),
            cfg.contacts.clone(),
        )));
    }
    if cfg.siren.enabled {
        if cfg.siren.sound_path.is_none() {
            log::warn!("siren enabled without a sound file; using the stub audio sink");
        }
        let sink = Arc::new(StubSink::new(std::time::Duration::from_secs(
            cfg.siren.duration_secs,
        )));
        channels.push(Box::new(SirenChannel::new(sink)));
    }
    channels
}

/// Outcome of one frame's pass through the decision core.
#[derive(Clone, Debug)]
pub struct FrameVerdict {
    /// Detections that passed the size/class filter (annotation input).
    pub accepted: Vec<Detection>,
    /// True when any class is confirmed on this frame.
    pub weapon_present: bool,
    /// True when this frame won the cooldown window and dispatched an alert.
    pub alert_raised: bool,
}

/// The per-session decision core.
///
/// Owns the filter, the debouncer, and the alerting side. All cross-thread
/// state lives in the shared `AlertGate`; everything else is plain owned
/// state mutated only by the frame loop.
pub struct Sentinel {
    filter: SizeClassFilter,
    debouncer: Debouncer,
    template: MessageTemplate,
    alerts: AlertService,
}

impl Sentinel {
    pub fn from_config(cfg: &SentinelConfig) -> Self {
        let filter = SizeClassFilter::new(cfg.classes.clone());
        let debouncer = Debouncer::new(cfg.history_length, cfg.quorum, cfg.high_risk_classes());
        let template = MessageTemplate::new(cfg.user_name.clone(), cfg.location_hint.clone());
        let gate = Arc::new(AlertGate::new(cfg.alert_cooldown_secs));
        let dispatcher = Arc::new(Dispatcher::new(build_channels(cfg)));
        Self::with_parts(filter, debouncer, template, AlertService::new(gate, dispatcher))
    }

    pub fn with_parts(
        filter: SizeClassFilter,
        debouncer: Debouncer,
        template: MessageTemplate,
        alerts: AlertService,
    ) -> Self {
        Self {
            filter,
            debouncer,
            template,
            alerts,
        }
    }

    pub fn gate(&self) -> &Arc<AlertGate> {
        self.alerts.gate()
    }

    /// The confidence floor to hand the detector.
    pub fn confidence_floor(&self) -> f32 {
        self.filter.confidence_floor()
    }

    /// Run one frame's detections through filter, debouncer, gate, and
    /// (fire-and-forget) dispatch.
    pub fn process_frame(
        &mut self,
        raw: &[Detection],
        geometry: FrameGeometry,
        now: u64,
    ) -> FrameVerdict {
        let mut accepted = Vec::new();
        let mut confirmed = BTreeSet::new();
        let mut trigger: Option<Detection> = None;

        for detection in raw {
            if !self.filter.accept(detection, geometry) {
                continue;
            }
            let size_ratio = geometry.size_ratio(&detection.bbox);
            if self.debouncer.observe(detection, size_ratio) {
                confirmed.insert(detection.class);
                if trigger.is_none() {
                    trigger = Some(detection.clone());
                }
            }
            accepted.push(detection.clone());
        }
        self.debouncer.finish_frame(&confirmed);

        let mut alert_raised = false;
        if let Some(detection) = &trigger {
            let message = self
                .template
                .weapon_alert(detection.class, detection.confidence);
            alert_raised = self.alerts.try_raise(message, now);
        }

        FrameVerdict {
            accepted,
            weapon_present: !confirmed.is_empty(),
            alert_raised,
        }
    }
}
