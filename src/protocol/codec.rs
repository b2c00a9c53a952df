//! Text codec for the vehicle protocol.
//!
//! # Wire Format
//!
//! ```text
//! <PREFIX>|<payload>\n
//!
//! Client → Server:  AUTH|<role>:<username>:<password>
//!                   CMD|<free-text command>
//! Server → Client:  TELEM|<speed>:<battery>:<temperature>:<direction>
//!                   RESP|<OK|DENIED|ERROR>:<message>
//!                   LIST|<count>:<user-role-address>:...
//! ```
//!
//! There is no escaping. Only `RESP` tolerates `:` inside its last field, and
//! `AUTH` inside the password.

use thiserror::Error;

use super::types::{Direction, Response, Role, TelemetrySnapshot, User};

/// Reasons a frame cannot be decoded or a message cannot be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Missing '|' after message prefix")]
    MissingPrefix,

    #[error("Unknown message prefix: {0}")]
    UnknownPrefix(String),

    #[error("{kind} expects {expected} fields, got {actual}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} out of range: {value:?}")]
    OutOfRange { field: &'static str, value: String },

    #[error("Unknown response status: {0}")]
    UnknownStatus(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("{0} messages are not expected from the server")]
    UnexpectedMessage(&'static str),

    #[error("Payload contains a line break")]
    EmbeddedNewline,
}

/// A decoded protocol message.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Auth {
        role: Role,
        username: String,
        password: String,
    },
    Command(String),
    Telemetry(TelemetrySnapshot),
    Response(Response),
    UserList(Vec<User>),
}

impl Message {
    /// Wire prefix of this message.
    pub fn prefix(&self) -> &'static str {
        match self {
            Message::Auth { .. } => "AUTH",
            Message::Command(_) => "CMD",
            Message::Telemetry(_) => "TELEM",
            Message::Response(_) => "RESP",
            Message::UserList(_) => "LIST",
        }
    }

    /// True for messages the server sends to clients.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Message::Telemetry(_) | Message::Response(_) | Message::UserList(_)
        )
    }

    /// Decode one frame (delimiter already stripped).
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let frame = frame.strip_suffix('\r').unwrap_or(frame);
        let (prefix, payload) = frame.split_once('|').ok_or(ProtocolError::MissingPrefix)?;

        match prefix {
            "TELEM" => decode_telemetry(payload).map(Message::Telemetry),
            "RESP" => decode_response(payload).map(Message::Response),
            "LIST" => decode_user_list(payload).map(Message::UserList),
            "AUTH" => decode_auth(payload),
            "CMD" => Ok(Message::Command(payload.to_string())),
            other => Err(ProtocolError::UnknownPrefix(other.to_string())),
        }
    }

    /// Encode into a complete wire frame, delimiter included.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let body = match self {
            Message::Auth {
                role,
                username,
                password,
            } => format!("AUTH|{}:{}:{}", role, username, password),
            Message::Command(text) => format!("CMD|{}", text),
            Message::Telemetry(t) => format!(
                "TELEM|{}:{}:{}:{}",
                t.speed, t.battery, t.temperature, t.direction
            ),
            Message::Response(r) => format!("RESP|{}:{}", r.status, r.message),
            Message::UserList(users) => {
                let mut body = format!("LIST|{}", users.len());
                for user in users {
                    body.push_str(&format!(
                        ":{}-{}-{}",
                        user.username, user.role, user.address
                    ));
                }
                body
            }
        };

        if body.contains(['\n', '\r']) {
            return Err(ProtocolError::EmbeddedNewline);
        }

        let mut frame = body;
        frame.push('\n');
        Ok(frame)
    }
}

fn decode_telemetry(payload: &str) -> Result<TelemetrySnapshot, ProtocolError> {
    let parts: Vec<&str> = payload.split(':').collect();
    if parts.len() != 4 {
        return Err(ProtocolError::FieldCount {
            kind: "TELEM",
            expected: 4,
            actual: parts.len(),
        });
    }

    Ok(TelemetrySnapshot {
        speed: parse_speed(parts[0])?,
        battery: parse_number(parts[1], "battery")?,
        temperature: parse_real(parts[2], "temperature")?,
        direction: Direction::from(parts[3]),
    })
}

fn decode_response(payload: &str) -> Result<Response, ProtocolError> {
    let (status, message) = payload
        .split_once(':')
        .ok_or(ProtocolError::FieldCount {
            kind: "RESP",
            expected: 2,
            actual: 1,
        })?;

    Ok(Response {
        status: status.parse()?,
        message: message.to_string(),
    })
}

fn decode_user_list(payload: &str) -> Result<Vec<User>, ProtocolError> {
    let mut groups = payload.split(':');
    // Always present: split yields at least one item
    let count = groups.next().unwrap_or_default();
    let declared: usize = parse_number(count, "user count")?;

    let users: Vec<User> = groups
        .filter_map(|group| {
            let fields: Vec<&str> = group.split('-').collect();
            match fields.as_slice() {
                [username, role, address] => Some(User {
                    username: username.to_string(),
                    role: role.to_string(),
                    address: address.to_string(),
                }),
                _ => {
                    tracing::debug!("Skipping malformed user entry {:?}", group);
                    None
                }
            }
        })
        .collect();

    if users.len() != declared {
        tracing::debug!(
            "User list declared {} entries, decoded {}",
            declared,
            users.len()
        );
    }

    Ok(users)
}

fn decode_auth(payload: &str) -> Result<Message, ProtocolError> {
    let parts: Vec<&str> = payload.splitn(3, ':').collect();
    let [role, username, password] = parts.as_slice() else {
        return Err(ProtocolError::FieldCount {
            kind: "AUTH",
            expected: 3,
            actual: parts.len(),
        });
    };

    Ok(Message::Auth {
        role: role.parse()?,
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ProtocolError> {
    value.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Real-valued field. `NaN` and infinities are not measurements.
fn parse_real(value: &str, field: &'static str) -> Result<f64, ProtocolError> {
    let number: f64 = parse_number(value, field)?;
    if !number.is_finite() {
        return Err(ProtocolError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(number)
}

fn parse_speed(value: &str) -> Result<f64, ProtocolError> {
    let speed = parse_real(value, "speed")?;
    if speed < 0.0 {
        return Err(ProtocolError::OutOfRange {
            field: "speed",
            value: value.to_string(),
        });
    }
    Ok(speed)
}
