//! The VNC client engine: connection handshake, server message decoding,
//! and input event encoding, all operating on one [`VncConnection`].

mod connection;
mod input;
mod update;

pub use connection::{VncConnection, VncOptions};
