//! Adapter runtime integration.
//!
//! Bridges the sync driver loop with the async TCP server.

use arrayvec::ArrayVec;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::protocol::{AckMessage, ErrorMessage, ObservationMessage, MAX_TAPS};
use crate::server::{run_server, ServerConfig};
use crate::types::Position;

/// Command delivered to the driver loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// A streaming client just said hello and wants the current state
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Feed each position to `select_tile` in order
    Taps(ArrayVec<Position, MAX_TAPS>),
    Swap { a: Position, b: Position },
    Restart,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the server on its own tokio runtime.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new()?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None).await {
                log::error!("adapter server stopped: {}", e);
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
        })
    }

    /// Start the adapter from environment variables.
    pub fn start_from_env() -> anyhow::Result<Self> {
        Self::start(ServerConfig::from_env())
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}
