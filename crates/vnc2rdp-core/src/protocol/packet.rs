//! Framed packet buffer for RFB message assembly and parsing.
//!
//! One [`Packet`] is owned by each connection and reused for every message
//! in both directions. The buffer is a fixed allocated region with a read
//! cursor and an end-of-valid-data marker:
//!
//! ```text
//! [ data .................................... ]
//!   ^cursor          ^end                     ^capacity
//! ```
//!
//! Reads consume bytes between `cursor` and `end` and fail with
//! [`VncError::Truncated`] rather than running past the valid region.
//! Writes append at `end`. All multi-byte fields are big-endian, as the RFB
//! wire format requires.
//!
//! Growth is explicit and grow-only: [`Packet::grow_to`] reallocates to an
//! exact size when an incoming payload is known to exceed the current
//! capacity, and the larger region is kept for the rest of the session so
//! a stream of similarly sized rectangles reallocates once.

use crate::error::VncError;

/// Reusable byte buffer with sequential big-endian field access.
#[derive(Debug)]
pub struct Packet {
    buf: Vec<u8>,
    cursor: usize,
    end: usize,
}

impl Packet {
    /// Initial capacity used for a fresh connection, large enough for every
    /// handshake message and typical small updates.
    pub const DEFAULT_CAPACITY: usize = 65535;

    /// Allocates a packet buffer of exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, VncError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| VncError::Allocation(capacity))?;
        buf.resize(capacity, 0);
        Ok(Self {
            buf,
            cursor: 0,
            end: 0,
        })
    }

    /// Rewinds the cursor and the end marker without touching capacity.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.end = 0;
    }

    /// Allocated size of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of valid bytes (write position / send length).
    pub fn len(&self) -> usize {
        self.end
    }

    /// `true` when no valid bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Unread bytes remaining between the cursor and the end marker.
    pub fn remaining(&self) -> usize {
        self.end - self.cursor
    }

    /// Reallocates to exactly `size` bytes if the current capacity is
    /// smaller. The buffer is never shrunk back; any buffered content is
    /// discarded.
    pub fn grow_to(&mut self, size: usize) -> Result<(), VncError> {
        if size <= self.buf.len() {
            return Ok(());
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| VncError::Allocation(size))?;
        buf.resize(size, 0);
        self.buf = buf;
        self.cursor = 0;
        self.end = 0;
        Ok(())
    }

    // ── Receive integration ───────────────────────────────────────────────

    /// Writable view of the first `len` bytes, used as the target of a
    /// socket receive. `len` must not exceed the capacity; grow first.
    pub(crate) fn recv_space(&mut self, len: usize) -> &mut [u8] {
        debug_assert!(len <= self.buf.len());
        &mut self.buf[..len]
    }

    /// Marks `len` received bytes as valid and rewinds the cursor.
    pub(crate) fn mark_received(&mut self, len: usize) {
        self.cursor = 0;
        self.end = len;
    }

    // ── Sequential reads ──────────────────────────────────────────────────

    fn take(&mut self, n: usize) -> Result<&[u8], VncError> {
        if self.remaining() < n {
            return Err(VncError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.buf[start..start + n])
    }

    pub fn read_u8(&mut self) -> Result<u8, VncError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, VncError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, VncError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32_be(&mut self) -> Result<i32, VncError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Copies the next `out.len()` bytes into `out`.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), VncError> {
        let b = self.take(out.len())?;
        out.copy_from_slice(b);
        Ok(())
    }

    /// Skips `n` bytes without interpreting them (padding/reserved fields).
    pub fn skip(&mut self, n: usize) -> Result<(), VncError> {
        self.take(n).map(|_| ())
    }

    /// Skips a single padding byte.
    pub fn skip_u8(&mut self) -> Result<(), VncError> {
        self.skip(1)
    }

    // ── Sequential writes ─────────────────────────────────────────────────
    //
    // Outbound RFB client messages are at most 20 bytes, far below even the
    // smallest capacity this buffer is ever given, so writes assert rather
    // than grow.

    fn put(&mut self, bytes: &[u8]) {
        let end = self.end;
        assert!(
            end + bytes.len() <= self.buf.len(),
            "packet write past capacity; grow_to before writing large payloads"
        );
        self.buf[end..end + bytes.len()].copy_from_slice(bytes);
        self.end += bytes.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub fn write_u16_be(&mut self, value: u16) {
        self.put(&value.to_be_bytes());
    }

    pub fn write_u32_be(&mut self, value: u32) {
        self.put(&value.to_be_bytes());
    }

    pub fn write_i32_be(&mut self, value: i32) {
        self.put(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }

    // ── Whole-buffer access ───────────────────────────────────────────────

    /// The valid region, start through end marker. This is what gets sent.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.end]
    }

    /// Mutable view of the valid region, used for in-place scanline
    /// reordering of received pixel payloads.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.end]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
