//! RFB protocol constants and value types (RFC 6143 subset).
//!
//! This engine speaks the client side of the protocol: it consumes
//! `FramebufferUpdate` and `ServerCutText` and produces `SetPixelFormat`,
//! `SetEncodings`, `FramebufferUpdateRequest`, `KeyEvent` and
//! `PointerEvent`. Only the `Raw` and `CopyRect` encodings are advertised.

use serde::{Deserialize, Serialize};

/// Protocol version string sent to every server, regardless of what the
/// server advertised. Fixed 12 ASCII bytes.
pub const PROTOCOL_VERSION: &[u8; 12] = b"RFB 003.008\n";

/// Length of the DES authentication challenge.
pub const CHALLENGE_SIZE: usize = 16;

/// Security result code meaning the handshake may proceed.
pub const SECURITY_RESULT_OK: u32 = 0;

/// Bytes per pixel under the fixed 32-bit format this client requests.
pub const BYTES_PER_PIXEL: usize = 4;

// ── Message type codes ────────────────────────────────────────────────────

/// Server-to-client message types this client consumes.
pub mod server_msg {
    pub const FRAMEBUFFER_UPDATE: u8 = 0;
    pub const SERVER_CUT_TEXT: u8 = 3;
}

/// Client-to-server message types this client produces.
pub mod client_msg {
    pub const SET_PIXEL_FORMAT: u8 = 0;
    pub const SET_ENCODINGS: u8 = 2;
    pub const FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;
    pub const KEY_EVENT: u8 = 4;
    pub const POINTER_EVENT: u8 = 5;
}

// ── Security types ────────────────────────────────────────────────────────

/// Security types recognized during the handshake.
///
/// The server announces its choice as a 4-byte big-endian code; anything
/// outside this set aborts the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum SecurityType {
    None = 1,
    VncAuth = 2,
}

impl TryFrom<u32> for SecurityType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        match value {
            1 => Ok(SecurityType::None),
            2 => Ok(SecurityType::VncAuth),
            other => Err(other),
        }
    }
}

// ── Encodings ─────────────────────────────────────────────────────────────

/// Rectangle encodings, as the signed 4-byte tag carried on the wire.
///
/// The set is closed: anything the server sends beyond the two advertised
/// encodings is preserved in `Unknown` for the error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Raw,
    CopyRect,
    Unknown(i32),
}

impl Encoding {
    pub const RAW_TAG: i32 = 0;
    pub const COPY_RECT_TAG: i32 = 1;

    /// The wire tag for this encoding.
    pub fn tag(self) -> i32 {
        match self {
            Encoding::Raw => Self::RAW_TAG,
            Encoding::CopyRect => Self::COPY_RECT_TAG,
            Encoding::Unknown(tag) => tag,
        }
    }
}

impl From<i32> for Encoding {
    fn from(tag: i32) -> Self {
        match tag {
            Self::RAW_TAG => Encoding::Raw,
            Self::COPY_RECT_TAG => Encoding::CopyRect,
            other => Encoding::Unknown(other),
        }
    }
}

// ── Value types ───────────────────────────────────────────────────────────

/// Pixel format reported by the server in ServerInit, stored verbatim and
/// immutable for the life of the session.
///
/// Note this is what the server *has*, not what it will send: immediately
/// after ServerInit the client forces the fixed 32-bit format with
/// SetPixelFormat, which is what makes the raw-rectangle byte math valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub true_colour: bool,
}

/// One rectangle header inside a FramebufferUpdate. Transient: consumed
/// into an outbound update immediately after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: Encoding,
}

// ── Tests ─────────────────────────────────────────────────────────────────
