//! Append-only chained byte buffer.
//!
//! Built on `bytes::{Bytes, BytesMut}` for zero-copy slicing, without
//! allocator-pool machinery: this buffer exists per-connection and is reset
//! wholesale on reconnect, so pooling would add complexity with no payoff
//! here.

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;

/// Ordered sequence of byte slices plus a running total length.
#[derive(Debug, Default)]
pub struct ChainedBuffer {
    chunks: VecDeque<Bytes>,
    len: usize,
}

impl ChainedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a slice, taking ownership without copying.
    pub fn fill(&mut self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return;
        }
        self.len += bytes.len();
        self.chunks.push_back(bytes);
    }

    /// Coalesces all chunks into one and returns a clone of it without
    /// draining the buffer. Cheap when there is already a single chunk.
    pub fn peek(&mut self) -> Bytes {
        self.pack();
        self.chunks.front().cloned().unwrap_or_default()
    }

    /// Removes and returns up to `n` bytes (all of them if `n` is `None`
    /// or exceeds the current length). A chunk straddling the boundary is
    /// split; the tail is pushed back as the new head.
    pub fn drain(&mut self, n: Option<usize>) -> Bytes {
        let n = n.unwrap_or(self.len).min(self.len);
        if n == 0 {
            return Bytes::new();
        }
        if n == self.len && self.chunks.len() == 1 {
            self.len = 0;
            return self.chunks.pop_front().unwrap_or_default();
        }

        let mut out = BytesMut::with_capacity(n);
        let mut remaining = n;
        while remaining > 0 {
            let mut front = match self.chunks.pop_front() {
                Some(c) => c,
                None => break,
            };
            if front.len() <= remaining {
                remaining -= front.len();
                out.extend_from_slice(&front);
            } else {
                let tail = front.split_off(remaining);
                out.extend_from_slice(&front);
                self.chunks.push_front(tail);
                remaining = 0;
            }
        }
        self.len -= n;
        out.freeze()
    }

    /// Atomically yields every chunk and empties the buffer.
    pub fn reset(&mut self) -> Vec<Bytes> {
        self.len = 0;
        self.chunks.drain(..).collect()
    }

    fn pack(&mut self) {
        if self.chunks.len() <= 1 {
            return;
        }
        let mut combined = BytesMut::with_capacity(self.len);
        for chunk in self.chunks.drain(..) {
            combined.extend_from_slice(&chunk);
        }
        self.chunks.push_back(combined.freeze());
    }

    /// Scans the coalesced head for the first occurrence of `needle`,
    /// returning the byte offset if found. Used by the control-line
    /// scanner to locate `\r\n` without copying the whole buffer.
    pub fn find(&mut self, needle: &[u8]) -> Option<usize> {
        self.pack();
        let head = self.chunks.front()?;
        head.windows(needle.len()).position(|w| w == needle)
    }

    /// Advances past `n` bytes without returning them (used once a control
    /// line has already been inspected via `find`/`peek`).
    pub fn advance(&mut self, n: usize) {
        let _ = self.drain(Some(n));
    }
}
