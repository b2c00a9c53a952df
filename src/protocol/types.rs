//! Value types carried by the vehicle protocol.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

use super::ProtocolError;

/// Access level requested during authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// May observe telemetry and issue control commands.
    Admin,
    /// Read-only access to telemetry.
    Observer,
}

impl Role {
    /// Wire spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Observer => "OBSERVER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "OBSERVER" => Ok(Role::Observer),
            other => Err(ProtocolError::UnknownRole(other.to_string())),
        }
    }
}

/// Heading reported by the vehicle.
///
/// Unknown headings are kept verbatim rather than rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
            Direction::Other(s) => s,
        }
    }
}

impl From<&str> for Direction {
    fn from(s: &str) -> Self {
        match s {
            "NORTH" => Direction::North,
            "SOUTH" => Direction::South,
            "EAST" => Direction::East,
            "WEST" => Direction::West,
            other => Direction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry sample. Replaced wholesale on every `TELEM` frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    /// Speed in km/h
    pub speed: f64,
    /// Battery level in percent, stored as received (not clamped)
    pub battery: i32,
    /// Temperature in °C
    pub temperature: f64,
    pub direction: Direction,
}

/// Outcome reported by the server in a `RESP` frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Ok,
    Denied,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Ok => "OK",
            ResponseStatus::Denied => "DENIED",
            ResponseStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(ResponseStatus::Ok),
            "DENIED" => Ok(ResponseStatus::Denied),
            "ERROR" => Ok(ResponseStatus::Error),
            other => Err(ProtocolError::UnknownStatus(other.to_string())),
        }
    }
}

/// Server reply to an authentication attempt or a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: ResponseStatus,
    pub message: String,
}

/// Entry of a `LIST` frame.
///
/// The role is kept as text since the server reports whatever the peer sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub role: String,
    pub address: String,
}

/// Commands understood by the simulation server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VehicleCommand {
    SpeedUp,
    SlowDown,
    TurnLeft,
    TurnRight,
    ListUsers,
    /// Free-form command text, sent verbatim
    Raw(String),
}

impl AsRef<str> for VehicleCommand {
    fn as_ref(&self) -> &str {
        match self {
            VehicleCommand::SpeedUp => "SPEED UP",
            VehicleCommand::SlowDown => "SLOW DOWN",
            VehicleCommand::TurnLeft => "TURN LEFT",
            VehicleCommand::TurnRight => "TURN RIGHT",
            VehicleCommand::ListUsers => "LIST USERS",
            VehicleCommand::Raw(text) => text,
        }
    }
}

impl From<&str> for VehicleCommand {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SPEED UP" => VehicleCommand::SpeedUp,
            "SLOW DOWN" => VehicleCommand::SlowDown,
            "TURN LEFT" => VehicleCommand::TurnLeft,
            "TURN RIGHT" => VehicleCommand::TurnRight,
            "LIST USERS" => VehicleCommand::ListUsers,
            _ => VehicleCommand::Raw(s.to_string()),
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
