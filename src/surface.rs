//! Display surface boundary.
//!
//! The session never renders anything. Decoded messages are handed to a
//! [`DisplaySurface`], which may run on any thread; callbacks are invoked from
//! the receive thread and must not block for long.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::protocol::{ResponseStatus, TelemetrySnapshot, User};

/// Consumer of decoded server messages.
pub trait DisplaySurface: Send + Sync {
    /// A new telemetry snapshot replaced the previous one.
    fn on_telemetry_update(&self, snapshot: Arc<TelemetrySnapshot>);

    /// The server answered a command.
    fn on_response(&self, status: ResponseStatus, message: &str);

    /// The server sent the list of connected users.
    fn on_user_list(&self, users: &[User]);

    /// The connection is gone. Fires at most once per session.
    fn on_disconnected(&self);
}

/// Display surface callback as a value.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    Telemetry(Arc<TelemetrySnapshot>),
    Response {
        status: ResponseStatus,
        message: String,
    },
    UserList(Vec<User>),
    Disconnected,
}

/// Forwards every callback over a crossbeam channel.
///
/// Lets a consumer with its own event loop pull updates instead of being
/// called back on the receive thread.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: Sender<SurfaceEvent>,
}

impl ChannelSurface {
    /// Create the surface and the receiving end of its event channel.
    pub fn new() -> (Self, Receiver<SurfaceEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: SurfaceEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Surface event dropped, receiver is gone");
        }
    }
}

impl DisplaySurface for ChannelSurface {
    fn on_telemetry_update(&self, snapshot: Arc<TelemetrySnapshot>) {
        self.send(SurfaceEvent::Telemetry(snapshot));
    }

    fn on_response(&self, status: ResponseStatus, message: &str) {
        self.send(SurfaceEvent::Response {
            status,
            message: message.to_string(),
        });
    }

    fn on_user_list(&self, users: &[User]) {
        self.send(SurfaceEvent::UserList(users.to_vec()));
    }

    fn on_disconnected(&self) {
        self.send(SurfaceEvent::Disconnected);
    }
}
