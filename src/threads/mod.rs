//! Background threads owned by a session.
//!
//! - Receive thread: the only reader of the socket

mod receiver;

pub use receiver::ReceiveThread;

use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::protocol::FrameBuffer;
use crate::shared::SessionShared;

/// Spawn the receive thread for an authenticated session.
pub fn spawn_receiver(
    shared: Arc<SessionShared>,
    reader: TcpStream,
    frames: FrameBuffer,
    buffer_size: usize,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("receiver".into())
        .spawn(move || {
            let mut receive_thread = ReceiveThread::new(reader, shared, frames, buffer_size);
            receive_thread.run();
        })
}
