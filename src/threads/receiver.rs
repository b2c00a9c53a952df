//! Receive thread: turns socket bytes into dispatched messages.
//!
//! This thread owns every read on the connection and:
//! - Blocks on the socket until data, error, or close
//! - Feeds bytes to the frame buffer
//! - Decodes and dispatches each complete frame in order
//! - Runs the shared teardown when the stream ends

use std::io::{ErrorKind, Read};
use std::sync::Arc;

use crate::protocol::FrameBuffer;
use crate::shared::SessionShared;

/// Runs the shared teardown when the receive thread exits, unwinding included.
struct TeardownGuard(Arc<SessionShared>);

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.0.teardown();
    }
}

/// Receive thread state and logic.
pub struct ReceiveThread<R> {
    reader: R,
    shared: Arc<SessionShared>,
    /// Seeded with whatever followed the handshake response
    frames: FrameBuffer,
    buffer: Vec<u8>,
}

impl<R: Read> ReceiveThread<R> {
    pub fn new(
        reader: R,
        shared: Arc<SessionShared>,
        frames: FrameBuffer,
        buffer_size: usize,
    ) -> Self {
        Self {
            reader,
            shared,
            frames,
            buffer: vec![0u8; buffer_size.max(1)],
        }
    }

    /// Run until end-of-stream, a read error, or a disconnect.
    pub fn run(&mut self) {
        tracing::info!("Receive thread started");
        let _teardown = TeardownGuard(Arc::clone(&self.shared));

        // Frames that arrived together with the handshake response
        self.drain_frames();

        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    if !self.shared.is_closed() {
                        tracing::info!("Server closed the connection");
                    }
                    break;
                }
                Ok(len) => {
                    self.frames.feed(&self.buffer[..len]);
                    self.drain_frames();
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    if self.shared.is_closed() {
                        tracing::debug!("Read ended by disconnect: {}", e);
                    } else {
                        tracing::error!("Receive error: {}", e);
                    }
                    break;
                }
            }
        }

        if !self.frames.pending().is_empty() {
            tracing::debug!(
                "Discarding {} bytes of unterminated frame",
                self.frames.pending().len()
            );
        }

        tracing::info!("Receive thread stopped");
    }

    fn drain_frames(&mut self) {
        let dispatcher = self.shared.dispatcher();
        while let Some(frame) = self.frames.next_frame() {
            dispatcher.handle_frame(&frame);
        }
    }
}
