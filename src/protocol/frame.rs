//! Newline framing over a byte stream.
//!
//! A read may end in the middle of a frame or carry several frames at once,
//! so bytes are accumulated until a `\n` delimiter is seen. Text decoding
//! happens per frame, after the delimiter is found, so a multi-byte character
//! split across two reads is reassembled before it is decoded.

/// Frame delimiter on the wire
pub const FRAME_DELIMITER: u8 = b'\n';

/// Accumulates raw bytes and yields complete frames in arrival order.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    /// Start of the unconsumed region of `buffer`
    head: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        // Compact consumed frames before growing
        if self.head > 0 {
            self.buffer.drain(..self.head);
            self.head = 0;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, without its delimiter.
    ///
    /// Empty frames are skipped. Invalid UTF-8 is replaced with U+FFFD so a
    /// garbled frame still reaches the decoder and is rejected there.
    pub fn next_frame(&mut self) -> Option<String> {
        loop {
            let line = self.next_line()?;
            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Pop the next complete line as-is, empty or not.
    pub fn next_line(&mut self) -> Option<String> {
        let pending = &self.buffer[self.head..];
        let pos = pending.iter().position(|&b| b == FRAME_DELIMITER)?;
        let line = String::from_utf8_lossy(&pending[..pos]).into_owned();
        self.head += pos + 1;
        Some(line)
    }

    /// Pop every frame currently complete.
    pub fn extract_frames(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Bytes of the trailing partial frame.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.head..]
    }
}
