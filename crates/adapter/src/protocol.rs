//! Protocol module - JSON message types for the board adapter
//!
//! Line-delimited JSON. All messages have: type, seq (sequence number),
//! ts (timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::core::{CascadeStep, TapOutcome};
use crate::types::{Position, SwapRejection};

use arrayvec::ArrayVec;

/// Protocol version advertised in `welcome`
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Major version prefix a client hello must carry
pub const PROTOCOL_MAJOR: &str = "1.";

/// Maximum taps accepted in one `tap` command
pub const MAX_TAPS: usize = 8;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[default]
    #[serde(rename = "hello")]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    #[default]
    #[serde(rename = "command")]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[default]
    #[serde(rename = "control")]
    Control,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    pub stream_observations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Board coordinate on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WirePosition {
    pub col: u8,
    pub row: u8,
}

impl From<Position> for WirePosition {
    fn from(p: Position) -> Self {
        Self {
            col: p.col,
            row: p.row,
        }
    }
}

impl From<WirePosition> for Position {
    fn from(p: WirePosition) -> Self {
        Position::new(p.col, p.row)
    }
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub mode: CommandMode,
    #[serde(default)]
    pub taps: Option<TapList>, // For tap mode
    #[serde(default)]
    pub swap: Option<SwapCommand>, // For swap mode
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandMode {
    Tap,
    Swap,
    Restart,
}

impl<'de> Deserialize<'de> for CommandMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("tap") {
            Ok(Self::Tap)
        } else if s.eq_ignore_ascii_case("swap") {
            Ok(Self::Swap)
        } else if s.eq_ignore_ascii_case("restart") {
            Ok(Self::Restart)
        } else {
            Err(serde::de::Error::custom("invalid command mode"))
        }
    }
}

impl Serialize for CommandMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            CommandMode::Tap => serializer.serialize_str("tap"),
            CommandMode::Swap => serializer.serialize_str("swap"),
            CommandMode::Restart => serializer.serialize_str("restart"),
        }
    }
}

/// Bounded list of taps (at most `MAX_TAPS`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapList(pub ArrayVec<WirePosition, MAX_TAPS>);

impl<'de> Deserialize<'de> for TapList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = TapList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of board positions")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<WirePosition, MAX_TAPS>::new();
                while let Some(p) = seq.next_element::<WirePosition>()? {
                    out.try_push(p)
                        .map_err(|_| serde::de::Error::custom("too many taps"))?;
                }
                Ok(TapList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SwapCommand {
    pub a: WirePosition,
    pub b: WirePosition,
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Claim,
    Release,
}

impl<'de> Deserialize<'de> for ControlAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("claim") {
            Ok(Self::Claim)
        } else if s.eq_ignore_ascii_case("release") {
            Ok(Self::Release)
        } else {
            Err(serde::de::Error::custom("invalid control action"))
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "controller_active")]
    ControllerActive,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub command_modes: [CapabilityCommandMode; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityCommandMode {
    #[serde(rename = "tap")]
    Tap,
    #[serde(rename = "swap")]
    Swap,
    #[serde(rename = "restart")]
    Restart,
}

/// Why a swap or tap did nothing, on the wire as `gate-closed`, `not-adjacent`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RejectionCode(pub SwapRejection);

impl From<SwapRejection> for RejectionCode {
    fn from(value: SwapRejection) -> Self {
        Self(value)
    }
}

impl Serialize for RejectionCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for RejectionCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SwapRejection::from_str(&s)
            .map(RejectionCode)
            .ok_or_else(|| serde::de::Error::custom("invalid rejection reason"))
    }
}

/// Result of applying one tap, swap, or restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    Selected { at: WirePosition },
    Deselected,
    Reselected { at: WirePosition },
    Swapped,
    Rejected { reason: RejectionCode },
    Restarted { episode_id: u32 },
}

impl From<TapOutcome> for CommandOutcome {
    fn from(value: TapOutcome) -> Self {
        match value {
            TapOutcome::Selected(p) => Self::Selected { at: p.into() },
            TapOutcome::Deselected => Self::Deselected,
            TapOutcome::Reselected(p) => Self::Reselected { at: p.into() },
            TapOutcome::Swapped => Self::Swapped,
            TapOutcome::Rejected(r) => Self::Rejected { reason: r.into() },
        }
    }
}

/// Acknowledgment sent after a command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<CommandOutcome>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

/// Game state observation (sent to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub episode_id: u32,
    pub seed: u32,
    pub board: WireBoard,
    pub score: u32,
    pub target_score: u32,
    pub accepting_moves: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<WirePosition>,
    pub game_won: bool,
    pub cascade_depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_step: Option<StepSummary>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBoard {
    pub width: u8,
    pub height: u8,
    pub cells: Vec<Vec<u8>>, // 0 = empty, kind + 1 otherwise
}

/// What the most recent cascade step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub runs: u32,
    pub removed: Vec<WirePosition>,
    pub score_delta: u32,
    pub fallen: u32,
    pub spawned: u32,
    pub quiescent: bool,
    pub game_won: bool,
}

impl From<&CascadeStep> for StepSummary {
    fn from(step: &CascadeStep) -> Self {
        Self {
            runs: step.runs.len() as u32,
            removed: step.removed.iter().map(|&p| p.into()).collect(),
            score_delta: step.score_delta,
            fallen: step.fallen.len() as u32,
            spawned: step.spawned.len() as u32,
            quiescent: step.quiescent,
            game_won: step.game_won,
        }
    }
}

/// Deterministic state hash serialized as lowercase hex (16 digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        let s = std::str::from_utf8(&buf).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "control")]
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct Envelope {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            match envelope.msg_type.as_deref() {
                Some("hello" | "command" | "control") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_observations: true,
        },
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "match-three".to_string(),
        command_modes: [
            CapabilityCommandMode::Tap,
            CapabilityCommandMode::Swap,
            CapabilityCommandMode::Restart,
        ],
    }
}

/// Create an acknowledgment carrying the outcome of each applied command
pub fn create_ack(seq: u64, outcomes: Vec<CommandOutcome>) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        outcomes,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
