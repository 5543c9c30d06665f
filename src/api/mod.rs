//! Status and video-feed HTTP server.
//!
//! Hand-rolled HTTP/1.1 over `TcpListener`, one thread per connection:
//! - `GET /health` - liveness probe
//! - `GET /status` - weapon flag plus the alert gate snapshot
//! - `GET /video_feed` - MJPEG stream, `multipart/x-mixed-replace` with
//!   boundary `frame`; each part is `--frame\r\nContent-Type:
//!   image/jpeg\r\n\r\n<jpeg>\r\n`. This part framing is an external
//!   contract and must not change.

use anyhow::{anyhow, Result};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::alert::AlertGate;

const MAX_REQUEST_BYTES: usize = 8192;
const STREAM_FRAME_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Shared read-only state for `/status`.
#[derive(Clone)]
pub struct StatusFeed {
    pub weapon_detected: Arc<AtomicBool>,
    pub gate: Arc<AlertGate>,
}

// ----------------------------------------------------------------------------
// VideoSink: latest-frame slot between the capture loop and stream clients
// ----------------------------------------------------------------------------

#[derive(Default)]
struct SinkSlot {
    seq: u64,
    jpeg: Option<Arc<Vec<u8>>>,
}

/// Single-slot frame sink. The capture loop publishes encoded JPEG frames;
/// each stream connection waits for a frame newer than the last one it wrote.
/// Slow clients skip frames instead of buffering them.
pub struct VideoSink {
    slot: Mutex<SinkSlot>,
    cond: Condvar,
}

impl VideoSink {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(SinkSlot::default()),
            cond: Condvar::new(),
        }
    }

    pub fn publish(&self, jpeg: Vec<u8>) {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.seq += 1;
        slot.jpeg = Some(Arc::new(jpeg));
        self.cond.notify_all();
    }

    /// Wait for a frame with a sequence number greater than `after`.
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> Option<(u64, Arc<Vec<u8>>)> {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.seq <= after {
            let (guard, _timeout) = match self.cond.wait_timeout(slot, timeout) {
                Ok(result) => result,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot = guard;
        }
        if slot.seq > after {
            slot.jpeg.clone().map(|jpeg| (slot.seq, jpeg))
        } else {
            None
        }
    }
}

impl Default for VideoSink {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Server
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    status: StatusFeed,
    sink: Arc<VideoSink>,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, status: StatusFeed, sink: Arc<VideoSink>) -> Self {
        Self { cfg, status, sink }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.cfg.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let status = self.status.clone();
        let sink = self.sink.clone();
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, status, sink, shutdown_thread) {
                log::error!("status api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    status: StatusFeed,
    sink: Arc<VideoSink>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                let status = status.clone();
                let sink = sink.clone();
                let shutdown = shutdown.clone();
                std::thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &status, &sink, &shutdown) {
                        log::warn!("status api request rejected: {}", err);
                    }
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(
    mut stream: TcpStream,
    status: &StatusFeed,
    sink: &Arc<VideoSink>,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    let request = read_request(&mut stream)?;
    if request.method != "GET" {
        write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#)?;
        return Ok(());
    }
    match request.path.as_str() {
        "/health" => write_json_response(&mut stream, 200, r#"{"status":"ok"}"#),
        "/status" => {
            let gate_status = status.gate.snapshot();
            let body = serde_json::json!({
                "weapon_detected": status.weapon_detected.load(Ordering::SeqCst),
                "last_alert_time": gate_status.last_alert_time,
                "last_alert_outcome": gate_status.last_alert_outcome,
            });
            write_json_response(&mut stream, 200, &body.to_string())
        }
        "/video_feed" => stream_video(&mut stream, sink, shutdown),
        _ => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
    }
}

fn stream_video(
    stream: &mut TcpStream,
    sink: &Arc<VideoSink>,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    stream.write_all(
        b"HTTP/1.1 200 OK\r\n\
          Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\
          Cache-Control: no-store\r\n\
          Connection: close\r\n\r\n",
    )?;

    let mut last_seq = 0u64;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let Some((seq, jpeg)) = sink.wait_newer(last_seq, STREAM_FRAME_TIMEOUT) else {
            continue;
        };
        last_seq = seq;
        // Part framing is the external contract; do not alter.
        stream.write_all(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n")?;
        stream.write_all(&jpeg)?;
        stream.write_all(b"\r\n")?;
        stream.flush()?;
    }
    Ok(())
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
        if data.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let text = String::from_utf8_lossy(&data);
    let request_line = text
        .split("\r\n")
        .next()
        .ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
    })
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {len}\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
}
