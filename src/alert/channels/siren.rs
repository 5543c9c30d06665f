//! Local audio-siren channel.
//!
//! Playback goes through the `AudioSink` collaborator so the channel itself
//! stays free of audio-stack details. A `sound_playing` flag suppresses
//! overlapping playback; a timer thread clears it once the sink's reported
//! duration has elapsed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::alert::channel::NotificationChannel;
use crate::alert::message::AlertMessage;

/// Local audio playback primitive. `play` starts playback and returns the
/// sound's duration.
pub trait AudioSink: Send + Sync {
    fn play(&self) -> Result<Duration>;
}

/// Sink that only logs. Stands in when no audio stack is wired up, and keeps
/// drills and tests silent.
pub struct StubSink {
    duration: Duration,
}

impl StubSink {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl AudioSink for StubSink {
    fn play(&self) -> Result<Duration> {
        log::info!("siren: playing alert sound ({:?})", self.duration);
        Ok(self.duration)
    }
}

pub struct SirenChannel {
    sink: Arc<dyn AudioSink>,
    playing: Arc<AtomicBool>,
}

impl SirenChannel {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl NotificationChannel for SirenChannel {
    fn name(&self) -> &'static str {
        "siren"
    }

    fn send(&self, _message: &AlertMessage) -> Result<()> {
        if self.playing.swap(true, Ordering::SeqCst) {
            log::debug!("siren already playing, skipping");
            return Ok(());
        }

        match self.sink.play() {
            Ok(duration) => {
                let playing = self.playing.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(duration);
                    playing.store(false, Ordering::SeqCst);
                });
                Ok(())
            }
            Err(e) => {
                self.playing.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}
