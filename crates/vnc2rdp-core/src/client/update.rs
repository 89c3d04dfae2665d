//! Server message decoding: framebuffer updates and clipboard traffic.
//!
//! [`VncConnection::process_next_message`] is called once per inbound
//! server message by the session's read-dispatch loop. Decoded rectangles
//! are pushed into the RDP-side [`UpdateSink`] immediately; nothing is
//! retained between calls except the reusable buffers.
//!
//! Raw rectangles arrive as `width * height * 4` bytes of top-down
//! scanlines in the fixed pixel format forced during the handshake. The
//! RDP bitmap layout is bottom-up, so the payload's row order is reversed
//! in place before emission, and the rectangle is split into row groups so
//! no single bitmap update exceeds [`MAX_UPDATE_BYTES`].

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::error::VncError;
use crate::protocol::rfb::{server_msg, Encoding, Rectangle, BYTES_PER_PIXEL};
use crate::sink::{UpdateSink, MAX_UPDATE_BYTES};

use super::connection::VncConnection;

impl<S: AsyncRead + AsyncWrite + Unpin> VncConnection<S> {
    /// Receives and decodes exactly one server message, forwarding decoded
    /// content to `sink`.
    ///
    /// # Errors
    ///
    /// Every error is fatal to the connection: message lengths are
    /// type-dependent, so once a message cannot be decoded there is no way
    /// to find the start of the next one.
    pub async fn process_next_message<K: UpdateSink>(
        &mut self,
        sink: &mut K,
    ) -> Result<(), VncError> {
        self.recv_exact(1).await?;
        let msg_type = self.packet.read_u8()?;

        match msg_type {
            server_msg::FRAMEBUFFER_UPDATE => self.process_framebuffer_update(sink).await,
            server_msg::SERVER_CUT_TEXT => self.process_server_cut_text().await,
            other => Err(VncError::UnknownMessageType(other)),
        }
    }

    async fn process_framebuffer_update<K: UpdateSink>(
        &mut self,
        sink: &mut K,
    ) -> Result<(), VncError> {
        self.recv_exact(3).await?;
        self.packet.skip_u8()?; // padding
        let nrects = self.packet.read_u16_be()?;
        trace!("framebuffer update with {nrects} rectangle(s)");

        for _ in 0..nrects {
            self.recv_exact(12).await?;
            let rect = Rectangle {
                x: self.packet.read_u16_be()?,
                y: self.packet.read_u16_be()?,
                width: self.packet.read_u16_be()?,
                height: self.packet.read_u16_be()?,
                encoding: Encoding::from(self.packet.read_i32_be()?),
            };

            match rect.encoding {
                Encoding::Raw => self.process_raw_rect(sink, rect).await?,
                Encoding::CopyRect => self.process_copy_rect(sink, rect).await?,
                Encoding::Unknown(tag) => {
                    // The payload length is encoding-defined, so an
                    // unadvertised encoding cannot be skipped over.
                    warn!("server sent unadvertised encoding {tag}");
                    return Err(VncError::UnknownEncoding(tag));
                }
            }
        }

        // Keep the update stream flowing, unless the RDP client asked for
        // display updates to be withheld.
        if !sink.updates_suppressed() {
            let (width, height) = (self.width(), self.height());
            self.send_update_request(true, 0, 0, width, height).await?;
        }
        Ok(())
    }

    async fn process_raw_rect<K: UpdateSink>(
        &mut self,
        sink: &mut K,
        rect: Rectangle,
    ) -> Result<(), VncError> {
        let Rectangle {
            x, y, width: w, height: h, ..
        } = rect;
        let line_size = w as usize * BYTES_PER_PIXEL;
        let data_size = line_size * h as usize;
        if data_size == 0 {
            // Degenerate rectangle; no payload follows.
            return Ok(());
        }

        // recv_exact grows the packet buffer (grow-only) when the payload
        // exceeds the current capacity.
        self.recv_exact(data_size).await?;

        reverse_rows(self.packet.as_bytes_mut(), &mut self.swap, line_size)?;

        // One scanline wider than the ceiling still goes through as a
        // single-row group rather than stalling the rectangle loop.
        let max_lines = (MAX_UPDATE_BYTES / line_size).max(1);
        let height = h as usize;
        let mut row = 0usize;
        while row < height {
            let lines = max_lines.min(height - row);
            // Group 0 sits at payload offset 0, which after the reversal is
            // the bottom band of the rectangle in destination coordinates.
            let left = x;
            let top = (y as u32 + h as u32 - row as u32 - lines as u32) as u16;
            let right = (x as u32 + w as u32 - 1) as u16;
            let bottom = (y as u32 + h as u32 - row as u32 - 1) as u16;
            let data = &self.packet.as_bytes()[row * line_size..(row + lines) * line_size];
            sink.send_bitmap_update(left, top, right, bottom, w, lines as u16, 32, data)?;
            row += lines;
        }
        Ok(())
    }

    async fn process_copy_rect<K: UpdateSink>(
        &mut self,
        sink: &mut K,
        rect: Rectangle,
    ) -> Result<(), VncError> {
        self.recv_exact(4).await?;
        let src_x = self.packet.read_u16_be()?;
        let src_y = self.packet.read_u16_be()?;
        debug!(
            "copy rect from {src_x},{src_y} to {},{} size {}x{}",
            rect.x, rect.y, rect.width, rect.height
        );
        sink.send_screen_copy(rect.x, rect.y, rect.width, rect.height, src_x, src_y)?;
        Ok(())
    }

    async fn process_server_cut_text(&mut self) -> Result<(), VncError> {
        self.recv_exact(7).await?;
        self.packet.skip(3)?; // padding
        let length = self.packet.read_u32_be()? as usize;
        debug!("discarding {length} byte(s) of server clipboard text");

        // Clipboard forwarding is out of scope; the payload is consumed for
        // protocol compliance in buffer-sized chunks so a hostile length
        // cannot force a matching allocation.
        let mut remaining = length;
        while remaining > 0 {
            let chunk = remaining.min(self.packet.capacity());
            self.recv_exact(chunk).await?;
            remaining -= chunk;
        }
        Ok(())
    }
}

/// Reverses the scanline order of `data` in place through the scratch
/// buffer: row `i` swaps with row `rows - 1 - i`. Applying it twice is the
/// identity.
fn reverse_rows(
    data: &mut [u8],
    swap: &mut Vec<u8>,
    line_size: usize,
) -> Result<(), VncError> {
    if line_size == 0 {
        return Ok(());
    }
    if swap.len() < line_size {
        swap.try_reserve(line_size - swap.len())
            .map_err(|_| VncError::Allocation(line_size))?;
        swap.resize(line_size, 0);
    }

    let rows = data.len() / line_size;
    for i in 0..rows / 2 {
        let upper = i * line_size;
        let lower = (rows - 1 - i) * line_size;
        swap[..line_size].copy_from_slice(&data[upper..upper + line_size]);
        data.copy_within(lower..lower + line_size, upper);
        data[lower..lower + line_size].copy_from_slice(&swap[..line_size]);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────
