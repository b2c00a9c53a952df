//! Vahana - telemetry and control client for the vehicle simulation server
//!
//! Connects over TCP, authenticates, then streams newline-delimited telemetry
//! to a pluggable [`DisplaySurface`] while the caller issues control commands.
//!
//! ## Threads
//!
//! - **Caller**: `Session::connect`, `send_command`, `disconnect`
//! - **Receive thread**: sole reader of the socket; frames, decodes and
//!   dispatches messages until the stream ends

pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod session;
pub mod shared;
pub mod surface;
pub mod threads;

pub use config::ClientConfig;
pub use dispatch::{DispatchStats, Dispatcher};
pub use error::{Result, VahanaError};
pub use protocol::{
    Direction, FrameBuffer, Message, ProtocolError, Response, ResponseStatus, Role,
    TelemetrySnapshot, User, VehicleCommand,
};
pub use session::{ConnectOptions, Credentials, Session};
pub use shared::SessionStatus;
pub use surface::{ChannelSurface, DisplaySurface, SurfaceEvent};
