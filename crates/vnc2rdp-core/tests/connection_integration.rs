//! Integration tests for the VNC connection handshake, driven by scripted
//! server exchanges over a mock byte stream.

use std::time::Duration;

use tokio_test::io::Builder;
use tracing_subscriber::EnvFilter;

use vnc2rdp_core::error::VncError;
use vnc2rdp_core::protocol::auth;
use vnc2rdp_core::protocol::rfb::SecurityType;
use vnc2rdp_core::{VncConnection, VncOptions};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

// ── Scripted server bytes ─────────────────────────────────────────────────

const VERSION: &[u8; 12] = b"RFB 003.008\n";

/// ServerInit for a 1024x768 framebuffer, 32bpp depth 24, little-endian,
/// true colour, empty desktop name.
const SERVER_INIT: [u8; 24] = [
    0x04, 0x00, // width 1024
    0x03, 0x00, // height 768
    32, 24, 0, 1, // bits-per-pixel, depth, big-endian, true-colour
    0, 255, 0, 255, 0, 255, // channel maxima
    16, 8, 0, // channel shifts
    0, 0, 0, // padding
    0, 0, 0, 0, // name length 0
];

/// The fixed pixel format the client always requests.
const SET_PIXEL_FORMAT: [u8; 20] = [
    0, 0, 0, 0, // message type + padding
    32, 24, 0, 1, // bits-per-pixel, depth, big-endian, true-colour
    0, 255, 0, 255, 0, 255, // channel maxima
    16, 8, 0, // channel shifts
    0, 0, 0, // padding
];

/// Raw then CopyRect, in preference order.
const SET_ENCODINGS: [u8; 12] = [2, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 1];

/// Non-incremental full-frame request issued at the end of the handshake.
const INITIAL_UPDATE_REQUEST: [u8; 10] = [3, 0, 0, 0, 0, 0, 0x04, 0x00, 0x03, 0x00];

// ── Handshake success paths ───────────────────────────────────────────────

#[tokio::test]
async fn test_handshake_with_security_none_reports_geometry() {
    init_tracing();

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 1]) // security type: None
        .write(&[1]) // ClientInit, shared
        .read(&SERVER_INIT)
        .write(&SET_PIXEL_FORMAT)
        .write(&SET_ENCODINGS)
        .write(&INITIAL_UPDATE_REQUEST)
        .build();

    let conn = VncConnection::handshake(stream, &VncOptions::default())
        .await
        .expect("handshake must succeed");

    assert_eq!(conn.width(), 1024);
    assert_eq!(conn.height(), 768);
    assert_eq!(conn.security_type(), SecurityType::None);

    let format = conn.pixel_format();
    assert_eq!(format.bits_per_pixel, 32);
    assert_eq!(format.depth, 24);
    assert!(!format.big_endian);
    assert!(format.true_colour);
}

#[tokio::test]
async fn test_handshake_with_vnc_auth_succeeds() {
    init_tracing();

    let challenge: [u8; 16] = *b"0123456789abcdef";
    let response = auth::challenge_response(&challenge, "secret");

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 2]) // security type: VNC authentication
        .read(&challenge)
        .write(&response)
        .read(&[0, 0, 0, 0]) // security result: ok
        .write(&[1])
        .read(&SERVER_INIT)
        .write(&SET_PIXEL_FORMAT)
        .write(&SET_ENCODINGS)
        .write(&INITIAL_UPDATE_REQUEST)
        .build();

    let options = VncOptions {
        password: Some("secret".to_string()),
        ..Default::default()
    };
    let conn = VncConnection::handshake(stream, &options)
        .await
        .expect("authenticated handshake must succeed");

    assert_eq!(conn.security_type(), SecurityType::VncAuth);
    assert_eq!(conn.width(), 1024);
}

#[tokio::test]
async fn test_handshake_unshared_client_init() {
    init_tracing();

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 1])
        .write(&[0]) // shared = false
        .read(&SERVER_INIT)
        .write(&SET_PIXEL_FORMAT)
        .write(&SET_ENCODINGS)
        .write(&INITIAL_UPDATE_REQUEST)
        .build();

    let options = VncOptions {
        shared: false,
        ..Default::default()
    };
    VncConnection::handshake(stream, &options)
        .await
        .expect("handshake must succeed");
}

// ── Handshake failure paths ───────────────────────────────────────────────

#[tokio::test]
async fn test_nonzero_security_result_surfaces_auth_failed() {
    init_tracing();

    let challenge = [0xA5u8; 16];
    let response = auth::challenge_response(&challenge, "wrong");

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 2])
        .read(&challenge)
        .write(&response)
        .read(&[0, 0, 0, 1]) // security result: failed
        .build();

    let options = VncOptions {
        password: Some("wrong".to_string()),
        ..Default::default()
    };
    let err = VncConnection::handshake(stream, &options).await.unwrap_err();

    assert!(matches!(err, VncError::AuthFailed(1)));
}

#[tokio::test]
async fn test_unrecognized_security_type_is_fatal() {
    init_tracing();

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 16]) // Tight security, not implemented
        .build();

    let err = VncConnection::handshake(stream, &VncOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, VncError::UnsupportedSecurity(16)));
}

#[tokio::test]
async fn test_truncated_server_init_surfaces_truncated() {
    init_tracing();

    let stream = Builder::new()
        .read(VERSION)
        .write(VERSION)
        .read(&[0, 0, 0, 1])
        .write(&[1])
        .read(&SERVER_INIT[..2]) // only the width arrives
        .build();

    let err = VncConnection::handshake(stream, &VncOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VncError::Truncated {
            needed: 2,
            available: 0
        }
    ));
}

#[tokio::test]
async fn test_slow_server_trips_receive_timeout() {
    init_tracing();

    // Nothing but a delay is scripted: the version bytes never arrive.
    let stream = Builder::new().wait(Duration::from_millis(200)).build();

    let options = VncOptions {
        recv_timeout: Some(Duration::from_millis(20)),
        ..Default::default()
    };
    let err = VncConnection::handshake(stream, &options).await.unwrap_err();

    assert!(matches!(err, VncError::Timeout(_)));
}
