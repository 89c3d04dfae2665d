//! Client-to-server input event encoders.
//!
//! Three stateless, fire-and-forget serializers. Success means the bytes
//! were handed to the transport; no acknowledgment exists in the protocol.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::VncError;
use crate::protocol::rfb::client_msg;

use super::connection::VncConnection;

impl<S: AsyncRead + AsyncWrite + Unpin> VncConnection<S> {
    /// Sends a KeyEvent for the X11 keysym `keysym`.
    pub async fn send_key_event(&mut self, down: bool, keysym: u32) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(client_msg::KEY_EVENT);
        self.packet.write_u8(u8::from(down)); // down-flag
        self.packet.write_u16_be(0); // padding
        self.packet.write_u32_be(keysym);
        self.send_packet().await
    }

    /// Sends a PointerEvent with the current button state and position.
    ///
    /// `button_mask` carries one bit per button, bit 0 = left, following
    /// the RFB convention.
    pub async fn send_pointer_event(
        &mut self,
        button_mask: u8,
        x: u16,
        y: u16,
    ) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(client_msg::POINTER_EVENT);
        self.packet.write_u8(button_mask);
        self.packet.write_u16_be(x);
        self.packet.write_u16_be(y);
        self.send_packet().await
    }

    /// Sends a FramebufferUpdateRequest for the given region.
    ///
    /// Incremental requests ask only for what changed since the last
    /// update; the handshake issues the one non-incremental request that
    /// seeds the full frame.
    pub async fn send_update_request(
        &mut self,
        incremental: bool,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(client_msg::FRAMEBUFFER_UPDATE_REQUEST);
        self.packet.write_u8(u8::from(incremental));
        self.packet.write_u16_be(x);
        self.packet.write_u16_be(y);
        self.packet.write_u16_be(width);
        self.packet.write_u16_be(height);
        self.send_packet().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
