//! State shared between the caller's threads and the receive thread.
//!
//! - Caller threads write command frames and read the status flag
//! - The receive thread owns every read and may trigger teardown
//! - Either side can tear the connection down; the first one wins

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::dispatch::Dispatcher;

/// Connection lifecycle. Only moves forward; `Disconnected` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionStatus {
    Connecting = 0,
    Authenticated = 1,
    Disconnected = 2,
}

impl SessionStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionStatus::Connecting,
            1 => SessionStatus::Authenticated,
            _ => SessionStatus::Disconnected,
        }
    }
}

/// Shared per-connection state.
#[derive(Debug)]
pub struct SessionShared {
    status: AtomicU8,

    /// Close-once guard for the socket and the disconnect notification
    closed: AtomicBool,

    /// Control handle: handshake reads and shutdown
    stream: TcpStream,

    /// Send-side lock so concurrent commands never interleave on the wire
    writer: Mutex<TcpStream>,

    dispatcher: Dispatcher,
}

impl SessionShared {
    /// Wrap a freshly connected stream. Status starts at `Connecting`.
    pub fn new(stream: TcpStream, dispatcher: Dispatcher) -> io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            status: AtomicU8::new(SessionStatus::Connecting as u8),
            closed: AtomicBool::new(false),
            stream,
            writer: Mutex::new(writer),
            dispatcher,
        })
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Move `Connecting → Authenticated`. Returns false if the session was
    /// already torn down.
    pub fn mark_authenticated(&self) -> bool {
        self.status
            .compare_exchange(
                SessionStatus::Connecting as u8,
                SessionStatus::Authenticated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Write one complete frame under the send lock.
    pub fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(frame)?;
        writer.flush()
    }

    /// Close the socket once without notifying the display surface.
    ///
    /// Returns true for the caller that actually closed it.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.status
            .store(SessionStatus::Disconnected as u8, Ordering::Release);

        // Shutdown unblocks a pending read on the receive thread
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!("Socket shutdown: {}", e);
        }
        true
    }

    /// Shared teardown for explicit disconnects and connection loss.
    ///
    /// The socket is closed and `on_disconnected` fires at most once, no matter
    /// how many threads race here.
    pub fn teardown(&self) {
        if self.close() {
            tracing::info!("Session disconnected");
            self.dispatcher.notify_disconnected();
        }
    }
}
