//! VNC connection establishment and transport plumbing.
//!
//! [`VncConnection::handshake`] runs the strictly sequential connection
//! sequence: version exchange, security negotiation (with optional DES
//! authentication), ClientInit/ServerInit, then the fixed pixel format and
//! encoding set, finishing with a full non-incremental framebuffer update
//! request. Each step either completes or fails the whole handshake; a
//! half-connected session is never returned.
//!
//! The connection is generic over the byte stream so tests can script
//! server exchanges; production callers use [`VncConnection::connect`] on a
//! plain `TcpStream`.

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::info;

use crate::error::VncError;
use crate::protocol::auth;
use crate::protocol::packet::Packet;
use crate::protocol::rfb::{self, client_msg, Encoding, PixelFormat, SecurityType};

/// Connection parameters supplied by the session layer.
#[derive(Clone)]
pub struct VncOptions {
    /// Password for VNC authentication. Only the first 8 bytes participate
    /// in the DES key; `None` behaves like an empty password if the server
    /// demands authentication anyway.
    pub password: Option<String>,
    /// Shared-session flag sent in ClientInit. `true` (the default) asks
    /// the server to leave other clients connected.
    pub shared: bool,
    /// Optional ceiling on every receive. `None` (the default) blocks
    /// indefinitely, which means a hung server stalls the session until the
    /// socket is closed from outside.
    pub recv_timeout: Option<Duration>,
}

impl Default for VncOptions {
    fn default() -> Self {
        Self {
            password: None,
            shared: true,
            recv_timeout: None,
        }
    }
}

impl fmt::Debug for VncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VncOptions")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("shared", &self.shared)
            .field("recv_timeout", &self.recv_timeout)
            .finish()
    }
}

/// A live, handshake-complete connection to a VNC server.
///
/// Owns its socket, packet buffer and scanline scratch buffer exclusively;
/// all message processing goes through `&mut self`, so calls for one
/// connection are serialized by construction. Dropping the value closes the
/// socket and frees the buffers.
pub struct VncConnection<S> {
    pub(crate) stream: S,
    pub(crate) packet: Packet,
    /// Scratch buffer sized to one scanline, used to reverse row order of
    /// raw pixel payloads. Grows on demand, never shrinks.
    pub(crate) swap: Vec<u8>,
    pub(crate) recv_timeout: Option<Duration>,
    security_type: SecurityType,
    width: u16,
    height: u16,
    format: PixelFormat,
}

impl<S> fmt::Debug for VncConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VncConnection")
            .field("security_type", &self.security_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl VncConnection<TcpStream> {
    /// Connects to a VNC server over TCP and performs the full handshake.
    ///
    /// # Errors
    ///
    /// Any connect or handshake failure aborts the attempt; no connection
    /// value exists afterwards.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        options: &VncOptions,
    ) -> Result<Self, VncError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream, options).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> VncConnection<S> {
    /// Performs the VNC handshake over an established byte stream.
    ///
    /// # Errors
    ///
    /// Fails on socket errors, truncated exchanges, an unsupported security
    /// type, or a rejected authentication. The stream is dropped with the
    /// partially built connection in every failure case.
    pub async fn handshake(stream: S, options: &VncOptions) -> Result<Self, VncError> {
        let mut conn = Self {
            stream,
            packet: Packet::with_capacity(Packet::DEFAULT_CAPACITY)?,
            swap: Vec::new(),
            recv_timeout: options.recv_timeout,
            security_type: SecurityType::None,
            width: 0,
            height: 0,
            format: PixelFormat {
                bits_per_pixel: 0,
                depth: 0,
                big_endian: false,
                true_colour: false,
            },
        };

        conn.exchange_version().await?;
        conn.negotiate_security(options.password.as_deref()).await?;
        conn.send_client_init(options.shared).await?;
        conn.read_server_init().await?;
        conn.send_pixel_format().await?;
        conn.send_encodings().await?;

        // Prime the update stream with one full, non-incremental refresh.
        let (width, height) = (conn.width, conn.height);
        conn.send_update_request(false, 0, 0, width, height).await?;

        Ok(conn)
    }

    /// Framebuffer width negotiated in ServerInit.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Framebuffer height negotiated in ServerInit.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixel format the server reported in ServerInit (before the client
    /// forced the fixed 32-bit format).
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Security type the server selected during the handshake.
    pub fn security_type(&self) -> SecurityType {
        self.security_type
    }

    // ── Handshake steps ───────────────────────────────────────────────────

    async fn exchange_version(&mut self) -> Result<(), VncError> {
        self.recv_some().await?;
        let advertised = String::from_utf8_lossy(self.packet.as_bytes())
            .trim_end()
            .to_string();
        info!("server protocol version: {advertised}");

        // Always answer with the fixed version string; there is no
        // negotiation beyond this echo.
        self.packet.reset();
        self.packet.write_bytes(rfb::PROTOCOL_VERSION);
        self.send_packet().await
    }

    async fn negotiate_security(&mut self, password: Option<&str>) -> Result<(), VncError> {
        self.recv_exact(4).await?;
        let code = self.packet.read_u32_be()?;
        let security = SecurityType::try_from(code).map_err(VncError::UnsupportedSecurity)?;
        self.security_type = security;

        match security {
            SecurityType::None => Ok(()),
            SecurityType::VncAuth => self.authenticate(password.unwrap_or("")).await,
        }
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), VncError> {
        self.recv_exact(rfb::CHALLENGE_SIZE).await?;
        let mut challenge = [0u8; rfb::CHALLENGE_SIZE];
        self.packet.read_bytes(&mut challenge)?;

        let response = auth::challenge_response(&challenge, password);
        self.packet.reset();
        self.packet.write_bytes(&response);
        self.send_packet().await?;

        self.recv_exact(4).await?;
        let result = self.packet.read_u32_be()?;
        if result == rfb::SECURITY_RESULT_OK {
            info!("VNC authentication succeeded");
            Ok(())
        } else {
            Err(VncError::AuthFailed(result))
        }
    }

    async fn send_client_init(&mut self, shared: bool) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(u8::from(shared));
        self.send_packet().await
    }

    async fn read_server_init(&mut self) -> Result<(), VncError> {
        self.recv_some().await?;
        self.width = self.packet.read_u16_be()?;
        self.height = self.packet.read_u16_be()?;
        self.format = PixelFormat {
            bits_per_pixel: self.packet.read_u8()?,
            depth: self.packet.read_u8()?,
            big_endian: self.packet.read_u8()? != 0,
            true_colour: self.packet.read_u8()? != 0,
        };
        // The rest of ServerInit (channel maxima, shifts, desktop name) is
        // irrelevant once SetPixelFormat overrides it.

        info!(
            "server framebuffer size: {}x{}",
            self.width, self.height
        );
        info!(
            "server bits_per_pixel: {}, depth: {}, big_endian: {}, true_colour: {}",
            self.format.bits_per_pixel,
            self.format.depth,
            self.format.big_endian,
            self.format.true_colour
        );
        Ok(())
    }

    /// Forces the one pixel format the raw-rectangle decoder understands:
    /// 32 bits per pixel, depth 24, little-endian, true colour, 8 bits per
    /// channel with red/green/blue shifts 16/8/0 (0x00BBGGRR in memory).
    async fn send_pixel_format(&mut self) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(client_msg::SET_PIXEL_FORMAT);
        self.packet.write_bytes(&[0, 0, 0]); // padding
        self.packet.write_u8(32); // bits-per-pixel
        self.packet.write_u8(24); // depth
        self.packet.write_u8(0); // big-endian-flag
        self.packet.write_u8(1); // true-colour-flag
        self.packet.write_u16_be(255); // red-max
        self.packet.write_u16_be(255); // green-max
        self.packet.write_u16_be(255); // blue-max
        self.packet.write_u8(16); // red-shift
        self.packet.write_u8(8); // green-shift
        self.packet.write_u8(0); // blue-shift
        self.packet.write_bytes(&[0, 0, 0]); // padding
        self.send_packet().await
    }

    /// Advertises the two supported encodings, preferred order first.
    async fn send_encodings(&mut self) -> Result<(), VncError> {
        self.packet.reset();
        self.packet.write_u8(client_msg::SET_ENCODINGS);
        self.packet.write_u8(0); // padding
        self.packet.write_u16_be(2); // number-of-encodings
        self.packet.write_i32_be(Encoding::RAW_TAG);
        self.packet.write_i32_be(Encoding::COPY_RECT_TAG);
        self.send_packet().await
    }

    // ── Transport helpers ─────────────────────────────────────────────────

    /// Receives whatever the server has ready, at least one byte, into the
    /// rewound packet buffer. Used where the protocol delivers a whole
    /// message in one burst (version string, ServerInit).
    pub(crate) async fn recv_some(&mut self) -> Result<(), VncError> {
        let Self {
            stream,
            packet,
            recv_timeout,
            ..
        } = self;
        let capacity = packet.capacity();
        let buf = packet.recv_space(capacity);

        let n = match recv_timeout {
            Some(limit) => tokio::time::timeout(*limit, stream.read(buf))
                .await
                .map_err(|_| VncError::Timeout(*limit))?
                .map_err(VncError::from_io)?,
            None => stream.read(buf).await.map_err(VncError::from_io)?,
        };
        if n == 0 {
            return Err(VncError::ConnectionClosed);
        }
        packet.mark_received(n);
        Ok(())
    }

    /// Receives exactly `len` bytes into the rewound packet buffer, growing
    /// it first when the payload exceeds the current capacity.
    pub(crate) async fn recv_exact(&mut self, len: usize) -> Result<(), VncError> {
        self.packet.grow_to(len)?;
        let Self {
            stream,
            packet,
            recv_timeout,
            ..
        } = self;
        let buf = packet.recv_space(len);

        let read = stream.read_exact(buf);
        match recv_timeout {
            Some(limit) => {
                tokio::time::timeout(*limit, read)
                    .await
                    .map_err(|_| VncError::Timeout(*limit))?
                    .map_err(VncError::from_io)?;
            }
            None => {
                read.await.map_err(VncError::from_io)?;
            }
        }
        packet.mark_received(len);
        Ok(())
    }

    /// Transmits the packet buffer's valid region. All-or-nothing: a short
    /// or failed write is fatal to the connection.
    pub(crate) async fn send_packet(&mut self) -> Result<(), VncError> {
        let Self { stream, packet, .. } = self;
        stream
            .write_all(packet.as_bytes())
            .await
            .map_err(VncError::from_io)?;
        stream.flush().await.map_err(VncError::from_io)
    }

    /// Test-only constructor that skips the handshake and fixes the
    /// negotiated geometry.
    #[cfg(test)]
    pub(crate) fn with_negotiated(stream: S, width: u16, height: u16) -> Self {
        Self {
            stream,
            packet: Packet::with_capacity(Packet::DEFAULT_CAPACITY)
                .expect("test buffer allocation"),
            swap: Vec::new(),
            recv_timeout: None,
            security_type: SecurityType::None,
            width,
            height,
            format: PixelFormat {
                bits_per_pixel: 32,
                depth: 24,
                big_endian: false,
                true_colour: true,
            },
        }
    }
}
