pub mod protocol;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::engine::statistics::TickStatistics;
use crate::session::SessionEvent;
use protocol::{HealthStatus, InputMessage};

/// Shared server state accessible from all connection handlers and the
/// session tick loop.
pub struct ServerState {
    /// Current session snapshot (JSON string, ready to send).
    pub snapshot_json: RwLock<String>,
    /// Broadcast channel for per-tick frames.
    pub frame_sender: broadcast::Sender<String>,
    /// Input events parsed from clients, drained by the tick loop.
    pub input_sender: mpsc::Sender<SessionEvent>,
    /// Health data updated each tick.
    pub health: RwLock<HealthData>,
}

/// Data needed for the health endpoint.
pub struct HealthData {
    pub tick: u64,
    pub game: String,
    pub phase: String,
    pub score: i64,
    pub games_played: u32,
    pub session_id: String,
    pub recent_tick_durations_ms: Vec<f32>,
}

impl HealthData {
    pub fn tick_rate(&self) -> f32 {
        if self.recent_tick_durations_ms.is_empty() {
            return 0.0;
        }
        let avg_ms: f32 = self.recent_tick_durations_ms.iter().sum::<f32>()
            / self.recent_tick_durations_ms.len() as f32;
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }
}

impl ServerState {
    pub fn new(
        initial_snapshot_json: String,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (frame_tx, _) = broadcast::channel(64);
        let (input_tx, input_rx) = mpsc::channel(256);
        let state = ServerState {
            snapshot_json: RwLock::new(initial_snapshot_json),
            frame_sender: frame_tx,
            input_sender: input_tx,
            health: RwLock::new(HealthData {
                tick: 0,
                game: String::new(),
                phase: "Setup".to_string(),
                score: 0,
                games_played: 0,
                session_id: String::new(),
                recent_tick_durations_ms: Vec::new(),
            }),
        };
        (state, input_rx)
    }

    /// Update server state after a tick or an accepted input.
    /// Called by the session loop with the fresh frame and statistics.
    pub async fn on_tick(
        &self,
        snapshot_json: String,
        stats: &TickStatistics,
        game: &str,
        session_id: &str,
        games_played: u32,
        tick_duration_ms: f32,
    ) {
        // Frame for new connections
        *self.snapshot_json.write().await = snapshot_json.clone();

        // Broadcast to connected clients; no receivers is fine
        let _ = self.frame_sender.send(snapshot_json);

        let mut health = self.health.write().await;
        health.tick = stats.tick;
        health.game = game.to_string();
        health.phase = format!("{:?}", stats.phase);
        health.score = stats.score;
        health.games_played = games_played;
        health.session_id = session_id.to_string();
        health.recent_tick_durations_ms.push(tick_duration_ms);
        // Keep only the last 100 tick durations for rate calculation
        if health.recent_tick_durations_ms.len() > 100 {
            health.recent_tick_durations_ms.remove(0);
        }
    }
}

/// Start the WebSocket + HTTP server on the given address.
pub async fn start_server(
    state: Arc<ServerState>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server listening — viewer at http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, state).await {
                error!(%peer, "Connection error: {}", e);
            }
        });
    }
}

/// Handle an incoming TCP connection — route to WebSocket or HTTP.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Peek at the first bytes to determine if this is a WebSocket upgrade or HTTP request
    let mut buf = [0u8; 512];
    let n = stream.peek(&mut buf).await?;
    let request_line = String::from_utf8_lossy(&buf[..n]).to_lowercase();

    if request_line.contains("upgrade: websocket") {
        handle_websocket(stream, peer, state).await
    } else if request_line.contains("get /health") {
        handle_health_request(stream, state).await
    } else {
        // Serve the viewer for any other HTTP request (GET /, GET /index.html, etc.)
        handle_viewer_request(stream).await
    }
}

/// Handle a WebSocket connection: send the current frame, stream frames,
/// and forward parsed input messages to the session loop.
async fn handle_websocket(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!(%peer, "WebSocket connected");

    let (mut write, mut read) = futures_util::StreamExt::split(ws_stream);

    // Send current frame
    let snapshot = state.snapshot_json.read().await.clone();
    futures_util::SinkExt::send(&mut write, Message::Text(snapshot.into())).await?;

    // Subscribe to frames
    let mut rx = state.frame_sender.subscribe();

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Ok(json) => {
                        if futures_util::SinkExt::send(&mut write, Message::Text(json.into())).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%peer, lagged = n, "Client lagged behind on frames");
                        // Continue — the next full frame catches the client up
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break; // Server shutting down
                    }
                }
            }
            msg = futures_util::StreamExt::next(&mut read) => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        forward_input(&state, text.as_str(), &peer).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Ignore pings/binary
                }
            }
        }
    }

    info!(%peer, "WebSocket disconnected");
    Ok(())
}

/// Parse a client text message into a session event and queue it for the
/// tick loop. Malformed messages are logged and dropped.
async fn forward_input(state: &ServerState, text: &str, peer: &SocketAddr) {
    let parsed: Result<InputMessage, _> = serde_json::from_str(text);
    match parsed.map_err(|e| e.to_string()).and_then(|m| m.into_event()) {
        Ok(event) => {
            if state.input_sender.send(event).await.is_err() {
                warn!(%peer, "Session loop gone, dropping input");
            }
        }
        Err(e) => {
            debug!(%peer, error = %e, "Ignoring malformed input message");
        }
    }
}

/// Handle an HTTP request by serving the embedded viewer.
async fn handle_viewer_request(
    mut stream: TcpStream,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;

    // Read and discard the full HTTP request
    let mut buf = vec![0u8; 4096];
    let _ = stream.read(&mut buf).await?;

    const VIEWER_HTML: &str = include_str!("../../viewer/index.html");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nCache-Control: no-cache\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        VIEWER_HTML.len(),
        VIEWER_HTML
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(())
}

/// Handle an HTTP health request.
async fn handle_health_request(
    mut stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;

    // Read and discard the full HTTP request
    let mut buf = vec![0u8; 4096];
    let _ = stream.read(&mut buf).await?;

    let health = state.health.read().await;
    let status = HealthStatus {
        tick: health.tick,
        tick_rate: health.tick_rate(),
        game: health.game.clone(),
        phase: health.phase.clone(),
        score: health.score,
        games_played: health.games_played,
        session_id: health.session_id.clone(),
    };

    let body = serde_json::to_string(&status)?;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(())
}
