//! # vnc2rdp-core
//!
//! The VNC client protocol engine of the vnc2rdp gateway, which presents a
//! VNC desktop to RDP clients. This crate owns the hard half of that
//! translation: establishing an RFB session with the VNC server and turning
//! its framebuffer update stream into RDP-shaped bitmap and screen-copy
//! updates, plus encoding keyboard and pointer input headed the other way.
//!
//! The RDP-side protocol implementation, session lifecycle, and listener
//! are deliberately not here; they consume this crate through two narrow
//! seams:
//!
//! - **`client`** – [`VncConnection`]: the handshake (version exchange,
//!   security negotiation with DES authentication, pixel format and
//!   encoding setup), the per-message update decoder, and the input event
//!   encoders. Generic over the byte stream, so the whole protocol is
//!   testable against scripted exchanges.
//!
//! - **`sink`** – [`UpdateSink`]: the interface the decoder pushes decoded
//!   rectangles into, implemented by the paired RDP session. Raw
//!   rectangles are row-reversed (RFB is top-down, the RDP bitmap layout
//!   bottom-up) and split into bands no larger than
//!   [`sink::MAX_UPDATE_BYTES`].
//!
//! Supporting modules: **`protocol`** (framed packet buffer, RFB constants
//! and the DES challenge-response primitive), **`config`** (TOML
//! configuration for the VNC target), and **`error`** (the fatal-only
//! error taxonomy; a failed connection is dropped, never resumed).

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod sink;

pub use client::{VncConnection, VncOptions};
pub use config::{load_config, save_config, ProxyConfig};
pub use error::VncError;
pub use protocol::{Encoding, PixelFormat, Rectangle, SecurityType};
pub use sink::{SinkError, UpdateSink};
