//! Dispatcher: last telemetry snapshot plus fan-out to the display surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::protocol::{Message, ProtocolError, TelemetrySnapshot};
use crate::surface::DisplaySurface;

/// Frame counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Messages forwarded to the display surface
    pub dispatched: u64,
    /// Frames dropped because they failed to decode or were not server messages
    pub dropped: u64,
}

/// Routes decoded server messages to a display surface.
pub struct Dispatcher {
    surface: Arc<dyn DisplaySurface>,
    /// Swapped as a whole so readers never see a half-updated snapshot
    latest: RwLock<Option<Arc<TelemetrySnapshot>>>,
    dispatched: AtomicU64,
    dropped: AtomicU64,
}

impl Dispatcher {
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            surface,
            latest: RwLock::new(None),
            dispatched: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Forward one decoded message.
    ///
    /// Outbound-only messages (`AUTH`, `CMD`) are refused.
    pub fn dispatch(&self, message: Message) -> Result<(), ProtocolError> {
        match message {
            Message::Telemetry(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.latest.write() = Some(Arc::clone(&snapshot));
                self.surface.on_telemetry_update(snapshot);
            }
            Message::Response(response) => {
                self.surface.on_response(response.status, &response.message);
            }
            Message::UserList(users) => {
                self.surface.on_user_list(&users);
            }
            other => return Err(ProtocolError::UnexpectedMessage(other.prefix())),
        }
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Decode a frame and dispatch it. Bad frames are logged, counted and dropped.
    pub fn handle_frame(&self, frame: &str) {
        tracing::debug!("Frame: {}", frame);
        let result = Message::decode(frame).and_then(|message| self.dispatch(message));
        if let Err(e) = result {
            tracing::warn!("Dropping frame {:?}: {}", frame, e);
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Most recent telemetry snapshot, if any arrived.
    pub fn latest_telemetry(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.latest.read().clone()
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn notify_disconnected(&self) {
        self.surface.on_disconnected();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("latest", &self.latest_telemetry())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
