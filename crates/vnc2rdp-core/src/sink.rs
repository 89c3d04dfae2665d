//! The RDP-side update sink.
//!
//! The decoder never talks to the RDP client directly; it hands decoded
//! framebuffer content to an [`UpdateSink`] implemented by the paired RDP
//! session. The sink is synchronous by design: implementations are expected
//! to queue outbound PDUs, and flow control happens through
//! [`UpdateSink::updates_suppressed`] rather than backpressure on these
//! calls.

use thiserror::Error;

/// Largest pixel payload the RDP side accepts in a single bitmap update.
///
/// Raw rectangles wider than this are split into row groups before emission
/// (see the framebuffer update decoder).
pub const MAX_UPDATE_BYTES: usize = 8192;

/// Error returned by a sink implementation when it cannot accept an update.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The RDP-side transport failed; the proxied session is over.
    #[error("rdp transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// The update was rejected for a protocol-level reason.
    #[error("{0}")]
    Rejected(String),
}

/// Consumer of decoded VNC updates, implemented by the paired RDP session.
#[cfg_attr(test, mockall::automock)]
pub trait UpdateSink {
    /// Delivers one bottom-up bitmap band.
    ///
    /// `left`/`top`/`right`/`bottom` are inclusive destination coordinates;
    /// `width`/`height` describe the band and `data` holds
    /// `width * height * (bits_per_pixel / 8)` bytes in bottom-up scanline
    /// order. `data.len()` never exceeds [`MAX_UPDATE_BYTES`] unless a
    /// single scanline is already larger than that.
    #[allow(clippy::too_many_arguments)]
    fn send_bitmap_update(
        &mut self,
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
        width: u16,
        height: u16,
        bits_per_pixel: u8,
        data: &[u8],
    ) -> Result<(), SinkError>;

    /// Delivers a screen-to-screen copy order (no pixel data).
    fn send_screen_copy(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        src_x: u16,
        src_y: u16,
    ) -> Result<(), SinkError>;

    /// Whether the RDP client asked for display updates to be withheld.
    ///
    /// Checked before requesting the next framebuffer update from the VNC
    /// server; while this returns `true` the update stream goes quiet.
    fn updates_suppressed(&self) -> bool {
        false
    }
}
