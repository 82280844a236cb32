//! Accumulating byte buffer for the duplex child-process transport.
//!
//! Grounded on the companion protocol's `FrameCodec`: push bytes as they
//! arrive, then repeatedly try to decode; `try_decode` returns `None` on a
//! partial buffer rather than erroring, and the caller retries once more
//! bytes arrive (SPEC_FULL §4.1).

use bytes::{Buf, BytesMut};

/// Accumulates raw bytes read off a node's transport and hands off
/// complete wire frames to [`crate::wire::WireCodec`].
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer { buf: BytesMut::with_capacity(4096) }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns a view of the unconsumed bytes without copying.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Drops the first `n` consumed bytes from the buffer.
    pub fn advance(&mut self, n: usize) {
        self.buf.advance(n.min(self.buf.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_pushes() {
        let mut fb = FrameBuffer::new();
        fb.push(&[1, 2, 3]);
        fb.push(&[4, 5]);
        assert_eq!(fb.as_slice(), &[1, 2, 3, 4, 5]);
        fb.advance(2);
        assert_eq!(fb.as_slice(), &[3, 4, 5]);
    }
}
