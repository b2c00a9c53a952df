//! Vehicle protocol: newline framing and message codec.

pub mod codec;
pub mod frame;
pub mod types;

pub use codec::{Message, ProtocolError};
pub use frame::FrameBuffer;
pub use types::{Direction, Response, ResponseStatus, Role, TelemetrySnapshot, User, VehicleCommand};
