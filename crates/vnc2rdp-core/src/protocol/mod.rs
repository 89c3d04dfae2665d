//! Wire-level building blocks: the framed packet buffer, RFB constants and
//! value types, and the DES authentication primitive.

pub mod auth;
pub mod packet;
pub mod rfb;

pub use packet::Packet;
pub use rfb::{Encoding, PixelFormat, Rectangle, SecurityType};
