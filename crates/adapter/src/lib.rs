//! Adapter - drive the board engine over a TCP socket with a JSON protocol
//!
//! A presentation collaborator (a UI, a bot, a test harness) connects over
//! TCP, sends taps or swaps, and receives observations of the board after
//! every change. The engine itself never touches the network; the driver
//! loop owns it and exchanges messages with this crate through
//! [`Adapter`].
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Observation Streaming**: Server sends an observation after every board change
//! 5. **Commanding**: Controller sends taps, swaps, or restarts
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: `tap` (up to 8 positions), `swap` (two positions), or `restart`
//! - **control**: Claim or release controller status
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned role
//! - **observation**: Board cells, score, gate state, selection, last cascade step
//! - **ack**: Sent once a command is applied, with one outcome per tap or swap
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `MATCH3_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_PORT`: Port number (default: 7878)
//! - `MATCH3_MAX_PENDING`: Command queue bound before `backpressure` (default: 10)
//! - `MATCH3_LOG_PATH`: Append every wire line to this file
//! - `MATCH3_SEED`, `MATCH3_WIDTH`, `MATCH3_HEIGHT`, `MATCH3_KINDS`,
//!   `MATCH3_TARGET`, `MATCH3_STEP_MS`: see [`GameConfig`]
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1,"client":{"name":"ui","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":2,"board":{...},"accepting_moves":true,...}
//! Client -> Server: {"type":"command","seq":2,"ts":3,"mode":"tap","taps":[{"col":0,"row":2},{"col":1,"row":2}]}
//! Server -> Client: {"type":"ack","seq":2,"ts":3,"status":"ok","outcomes":[{"result":"selected","at":{"col":0,"row":2}},{"result":"swapped"}]}
//! ```

pub mod config;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use match_three_core as core;
pub use match_three_types as types;

pub use config::GameConfig;
pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{build_observation, run_server, ServerConfig};
