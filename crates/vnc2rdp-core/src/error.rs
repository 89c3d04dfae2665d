//! Connection-level error taxonomy.
//!
//! Every error in this crate is fatal to the connection that produced it:
//! once the byte stream is desynchronized there is no safe resume point, so
//! the caller must drop the [`VncConnection`](crate::VncConnection) and
//! decide at the session layer whether to reconnect.

use std::time::Duration;

use thiserror::Error;

use crate::sink::SinkError;

/// Errors raised by the VNC protocol engine.
#[derive(Debug, Error)]
pub enum VncError {
    /// A field or payload required more bytes than the packet buffer holds.
    ///
    /// Stream framing is desynchronized at this point; the connection cannot
    /// be resumed.
    #[error("packet truncated: needed {needed} byte(s), {available} available")]
    Truncated { needed: usize, available: usize },

    /// The server closed the connection (EOF on receive).
    #[error("connection closed by VNC server")]
    ConnectionClosed,

    /// A socket-level send or receive failure other than EOF.
    #[error("socket I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// No data arrived within the configured receive timeout.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered the authentication response with a nonzero
    /// security result. Credentials are not re-prompted at this layer.
    #[error("VNC authentication rejected by server (security result {0})")]
    AuthFailed(u32),

    /// The server selected a security type this client does not implement.
    #[error("unsupported security type {0}")]
    UnsupportedSecurity(u32),

    /// Unrecognized top-level server message. Message lengths are
    /// type-dependent, so skipping past an unknown one is impossible.
    #[error("unknown server message type 0x{0:02x}")]
    UnknownMessageType(u8),

    /// A rectangle inside a FramebufferUpdate carried an encoding that was
    /// never advertised. The payload length is encoding-defined, so the
    /// stream position after it is unknowable.
    #[error("unknown rectangle encoding {0}")]
    UnknownEncoding(i32),

    /// Growing the packet or scanline buffer failed.
    #[error("failed to allocate {0} bytes for receive buffer")]
    Allocation(usize),

    /// The RDP-side sink refused a decoded update.
    #[error("update sink failure")]
    Sink(#[from] SinkError),
}

impl VncError {
    /// Maps a receive/send I/O error onto the taxonomy: an unexpected EOF
    /// means the peer went away mid-message.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            VncError::ConnectionClosed
        } else {
            VncError::Io(err)
        }
    }
}
