//! Thin HTTP boundary around the fusion engine.
//!
//! Plain HTTP/1.1 on std TCP. Every connection is served on its own thread,
//! up to `max_connections` at once; all threads share one immutable engine.

use crate::fusion::FusionEngine;
use crate::transport::FusionRequest;
use anyhow::{anyhow, Result};
use rand::RngCore;
use serde_json::json;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const MAX_HEADER_BYTES: usize = 8192;
const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: usize = 32;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
    /// Bearer key required on `/fuse`. A random key is generated when absent.
    pub api_key: Option<String>,
    /// Where a generated key is written (mode 0600).
    pub key_path: Option<PathBuf>,
    /// Connections served concurrently; the rest get 503.
    pub max_connections: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8001".to_string(),
            api_key: None,
            key_path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    pub api_key: String,
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
    engine: Arc<FusionEngine>,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, engine: Arc<FusionEngine>) -> Self {
        Self { cfg, engine }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.cfg.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        if configured_addr.ip().is_loopback() && !addr.ip().is_loopback() {
            return Err(anyhow!(
                "api configured for loopback address '{}', but bound to non-loopback address '{}'",
                configured_addr,
                addr
            ));
        }
        listener.set_nonblocking(true)?;

        let api_key = match &self.cfg.api_key {
            Some(key) => key.clone(),
            None => {
                let key = generate_api_key();
                match &self.cfg.key_path {
                    Some(path) => {
                        write_token_file(path, &key)?;
                        log::info!("fusion api key written to {}", path.display());
                    }
                    None => {
                        log::warn!("no api key configured; set FUSION_API_KEY_PATH to persist it");
                        log::warn!("fusion api key (handle securely): {}", key);
                    }
                }
                key
            }
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let state = Arc::new(ServerState {
            engine: self.engine,
            api_key: api_key.clone(),
            started: Instant::now(),
        });
        let limit = ConnectionLimit::new(self.cfg.max_connections);
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, state, limit, shutdown_thread) {
                log::error!("fusion api stopped: {}", err);
            }
        });
        log::info!("fusion api listening on {}", addr);

        Ok(ApiHandle {
            addr,
            api_key,
            shutdown,
            join: Some(join),
        })
    }
}

struct ServerState {
    engine: Arc<FusionEngine>,
    api_key: String,
    started: Instant,
}

/// Random 32-byte key, hex encoded.
pub fn generate_api_key() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    hex::encode(key)
}

/// Counts in-flight connections against a fixed cap.
struct ConnectionLimit {
    active: AtomicUsize,
    max: usize,
}

/// Held by a connection thread; frees its slot on drop.
struct ConnectionSlot {
    limit: Arc<ConnectionLimit>,
}

impl ConnectionLimit {
    fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            max: max.max(1),
        })
    }

    fn try_acquire(self: &Arc<Self>) -> Option<ConnectionSlot> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()
            .map(|_| ConnectionSlot {
                limit: self.clone(),
            })
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.limit.active.fetch_sub(1, Ordering::AcqRel);
    }
}

fn run_api(
    listener: TcpListener,
    state: Arc<ServerState>,
    limit: Arc<ConnectionLimit>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((mut stream, peer)) => {
                let Some(slot) = limit.try_acquire() else {
                    log::warn!(
                        "fusion api busy ({} connections), rejecting {}",
                        limit.active(),
                        peer
                    );
                    if let Err(err) = reject_busy(&mut stream) {
                        log::debug!("busy response to {} failed: {}", peer, err);
                    }
                    continue;
                };
                let state = state.clone();
                std::thread::spawn(move || {
                    let _slot = slot;
                    if let Err(err) = handle_connection(stream, &state) {
                        log::warn!("fusion api request rejected: {}", err);
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

fn reject_busy(stream: &mut TcpStream) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_write_timeout(Some(Duration::from_millis(500)))?;
    write_json_response(stream, 503, r#"{"error":"busy"}"#)
}

fn handle_connection(mut stream: TcpStream, state: &ServerState) -> Result<()> {
    stream.set_nonblocking(false)?;
    let peer = stream.peer_addr()?;
    let local = stream.local_addr()?;
    if local.ip().is_loopback() && !peer.ip().is_loopback() {
        write_json_response(&mut stream, 403, r#"{"error":"forbidden"}"#)?;
        return Ok(());
    }

    let request = read_request(&mut stream)?;
    match (request.path.as_str(), request.method.as_str()) {
        ("/health", "GET") => {
            let body = json!({
                "status": "healthy",
                "model_loaded": true,
                "uptime_seconds": state.started.elapsed().as_secs_f64(),
                "version": env!("CARGO_PKG_VERSION"),
            });
            write_response(&mut stream, 200, "application/json", &serde_json::to_vec(&body)?)
        }
        ("/fuse", "POST") => handle_fuse(&mut stream, &request, state),
        ("/health", _) | ("/fuse", _) => {
            write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#)
        }
        _ => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
    }
}

fn handle_fuse(stream: &mut TcpStream, request: &HttpRequest, state: &ServerState) -> Result<()> {
    match request.bearer_token() {
        Some(token) if token == state.api_key => {}
        Some(_) => {
            write_json_response(stream, 401, r#"{"error":"invalid_api_key"}"#)?;
            return Err(anyhow!("invalid api key"));
        }
        None => {
            write_json_response(stream, 401, r#"{"error":"missing_api_key"}"#)?;
            return Err(anyhow!("missing api key"));
        }
    }

    let body: FusionRequest = match serde_json::from_slice(&request.body) {
        Ok(body) => body,
        Err(err) => {
            write_json_response(stream, 400, r#"{"error":"invalid_json"}"#)?;
            return Err(anyhow!("invalid request body: {}", err));
        }
    };

    let result = state
        .engine
        .fuse_payloads(&body.spatial, &body.temporal, body.metadata.as_ref());
    let payload = serde_json::to_vec(&result)?;
    write_response(stream, 200, "application/json", &payload)
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    let header_end = loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break find_header_end(&data).ok_or_else(|| anyhow!("incomplete request"))?;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(end) = find_header_end(&data) {
            break end;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err(anyhow!("request headers too large"));
        }
    };

    let text = String::from_utf8_lossy(&data[..header_end]);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| anyhow!("invalid content-length"))?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(anyhow!("request body too large"));
    }
    let mut body = data[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("request body truncated"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
        headers,
        body,
    })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    write_response(stream, status, "application/json", body.as_bytes())
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        401 => "HTTP/1.1 401 Unauthorized",
        403 => "HTTP/1.1 403 Forbidden",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        503 => "HTTP/1.1 503 Service Unavailable",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        status_line = status_line,
        content_type = content_type,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    fn bearer_token(&self) -> Option<&str> {
        let value = self.headers.get("authorization")?;
        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
                Some(token)
            }
            _ => None,
        }
    }
}

pub fn write_token_file(path: &Path, token: &str) -> Result<()> {
    std::fs::write(path, format!("{token}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}
