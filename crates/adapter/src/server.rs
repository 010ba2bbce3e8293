//! TCP server for the board adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;

use arrayvec::ArrayVec;
use log::{info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::{BoardEngine, CascadeStep};
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::Position;

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest
        .as_bytes()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATCH3_HOST").unwrap_or(defaults.host);
        let port = env::var("MATCH3_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("MATCH3_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let log_path = env::var("MATCH3_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid socket address {}:{}: {}", self.host, self.port, e))
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>, // Client id
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn with_client<R>(&self, client_id: usize, f: impl FnOnce(&mut ClientHandle) -> R) -> Option<R> {
        let mut clients = self.clients.write().await;
        clients.iter_mut().find(|c| c.id == client_id).map(f)
    }

    async fn send_to(&self, client_id: usize, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, obs: ObservationMessage) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.stream_observations) {
            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>, // Channel to send messages to client
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
}

impl ClientOutbound {
    fn encode(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        fn write<T: Serialize>(buf: &mut Vec<u8>, v: &T) -> serde_json::Result<()> {
            serde_json::to_writer(&mut *buf, v)?;
            buf.push(b'\n');
            Ok(())
        }

        buf.clear();
        match self {
            ClientOutbound::Welcome(v) => write(buf, v),
            ClientOutbound::Ack(v) => write(buf, v),
            ClientOutbound::Error(v) => write(buf, v),
            ClientOutbound::Observation(v) => write(buf, v),
        }
    }
}

/// Reject with `HandshakeRequired` before hello, then enforce strictly increasing seq.
async fn check_sequenced(
    state: &ServerState,
    client_id: usize,
    seq: u64,
    require_handshake: Option<&str>,
) -> Result<(), ErrorMessage> {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return Ok(());
    };

    if !client.handshaken {
        return match require_handshake {
            Some(message) => Err(create_error(seq, ErrorCode::HandshakeRequired, message)),
            None => Ok(()),
        };
    }

    match client.last_seq {
        Some(prev) if seq <= prev => Err(create_error(
            seq,
            ErrorCode::InvalidCommand,
            "seq must be strictly increasing",
        )),
        _ => {
            client.last_seq = Some(seq);
            Ok(())
        }
    }
}

/// Spawn the wire log writer; every line sent or received is appended to `path`
fn spawn_wire_log(path: String) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("wire log {} unavailable: {}", path, e);
                return;
            }
        };

        while let Some(line) = rx.recv().await {
            if file.write_all(&line).await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    tx
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up (port 0
/// picks a free port).
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!("adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state.send_to(client_id, ClientOutbound::Observation(obs)).await
                    }
                    OutboundMessage::BroadcastObservation { obs } => state.broadcast(obs).await,
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log_tx = wire_log_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, state, command_tx, wire_log_tx).await {
                warn!("client {} error: {}", client_id, e);
            }
            info!("client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_tx_out = wire_log_tx.clone();

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            if msg.encode(&mut buf).is_err() {
                continue;
            }
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
            if let Some(tx) = wire_log_tx_out.as_ref() {
                let _ = tx.send(buf.clone());
            }
        }
    });

    let reply_error = |err: ErrorMessage| {
        let _ = tx.send(ClientOutbound::Error(err));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            // Client disconnected
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(tx) = wire_log_tx.as_ref() {
            let mut bytes = trimmed.as_bytes().to_vec();
            bytes.push(b'\n');
            let _ = tx.send(bytes);
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if let Err(err) = check_sequenced(&state, client_id, hello.seq, None).await {
                    reply_error(err);
                    continue;
                }

                if !hello.protocol_version.starts_with(PROTOCOL_MAJOR) {
                    reply_error(create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    ));
                    break;
                }

                // First client to hello becomes controller
                let controller_id = {
                    let mut controller = state.controller.write().await;
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!("client {} is now controller", client_id);
                    }
                    *controller
                };
                let is_controller = controller_id == Some(client_id);

                state
                    .with_client(client_id, |c| {
                        c.handshaken = true;
                        c.last_seq = Some(hello.seq);
                        c.stream_observations = hello.requested.stream_observations;
                    })
                    .await;

                let role = if is_controller {
                    AssignedRole::Controller
                } else {
                    AssignedRole::Observer
                };
                let _ = tx.send(ClientOutbound::Welcome(create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id.map(|id| id as u64),
                )));

                // Request an immediate snapshot for this client if desired.
                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if let Err(err) =
                    check_sequenced(&state, client_id, cmd.seq, Some("Send hello before command"))
                        .await
                {
                    reply_error(err);
                    continue;
                }

                let is_controller = *state.controller.read().await == Some(client_id);
                if !is_controller {
                    reply_error(create_error(
                        cmd.seq,
                        ErrorCode::NotController,
                        "Only controller may send commands",
                    ));
                    continue;
                }

                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err(message) => {
                        reply_error(create_error(cmd.seq, ErrorCode::InvalidCommand, &message));
                        continue;
                    }
                };

                // Backpressure: bounded queue. The ack is sent by the driver
                // after the command is applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    reply_error(create_error(
                        cmd.seq,
                        ErrorCode::Backpressure,
                        "Command queue is full",
                    ));
                }
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if let Err(err) =
                    check_sequenced(&state, client_id, ctrl.seq, Some("Send hello before control"))
                        .await
                {
                    reply_error(err);
                    continue;
                }

                let mut controller = state.controller.write().await;
                let result = match ctrl.action {
                    ControlAction::Claim if controller.is_none() => {
                        *controller = Some(client_id);
                        info!("client {} claimed controller", client_id);
                        Ok(())
                    }
                    ControlAction::Claim => Err(create_error(
                        ctrl.seq,
                        ErrorCode::ControllerActive,
                        "Controller already assigned",
                    )),
                    ControlAction::Release if *controller == Some(client_id) => {
                        *controller = None;
                        info!("client {} released controller", client_id);
                        Ok(())
                    }
                    ControlAction::Release => Err(create_error(
                        ctrl.seq,
                        ErrorCode::NotController,
                        "Only controller may release",
                    )),
                };
                drop(controller);

                match result {
                    Ok(()) => {
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq, Vec::new())));
                    }
                    Err(err) => reply_error(err),
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                if let Err(err) = check_sequenced(&state, client_id, unknown.seq, None).await {
                    reply_error(err);
                    continue;
                }
                reply_error(create_error(
                    unknown.seq,
                    ErrorCode::InvalidCommand,
                    "Unknown message type",
                ));
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reply_error(create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                ));
            }
        }
    }

    // Clean up: remove client and promote the next controller if needed.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;

        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            // Promote the lowest-id handshaken client.
            *controller = clients
                .iter()
                .filter(|c| c.handshaken)
                .map(|c| c.id)
                .min();
            match *controller {
                Some(new_id) => info!("controller {} promoted", new_id),
                None => info!("controller {} released", client_id),
            }
        }
    }

    // Cancel write task
    drop(reply_error);
    drop(tx);
    let _ = write_task.await;

    Ok(())
}

/// Map a protocol command into an engine command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, String> {
    match cmd.mode {
        CommandMode::Tap => {
            let Some(ref taps) = cmd.taps else {
                return Err("Missing taps".to_string());
            };
            if taps.0.is_empty() {
                return Err("Empty taps".to_string());
            }
            let positions: ArrayVec<Position, MAX_TAPS> =
                taps.0.iter().map(|&p| Position::from(p)).collect();
            Ok(ClientCommand::Taps(positions))
        }
        CommandMode::Swap => {
            let Some(swap) = cmd.swap else {
                return Err("Missing swap".to_string());
            };
            Ok(ClientCommand::Swap {
                a: swap.a.into(),
                b: swap.b.into(),
            })
        }
        CommandMode::Restart => Ok(ClientCommand::Restart),
    }
}

/// Build observation message from engine state
///
/// `state_hash` covers the full engine snapshot; `last_step` is reported
/// but not hashed.
pub fn build_observation(
    engine: &BoardEngine,
    seq: u64,
    last_step: Option<&CascadeStep>,
) -> ObservationMessage {
    let snapshot = engine.snapshot();

    let mut hasher = Fnv1aHasher::new();
    snapshot.hash(&mut hasher);
    let state_hash = StateHash(hasher.finish());

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        episode_id: snapshot.episode_id,
        seed: snapshot.seed,
        board: WireBoard {
            width: snapshot.board.width,
            height: snapshot.board.height,
            cells: engine.board().rows_u8(),
        },
        score: snapshot.score,
        target_score: snapshot.target_score,
        accepting_moves: snapshot.accepting_moves,
        selected: snapshot.selected.map(WirePosition::from),
        game_won: snapshot.game_won,
        cascade_depth: snapshot.cascade_depth,
        last_step: last_step.map(StepSummary::from),
        state_hash,
    }
}
