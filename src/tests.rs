use crate::close_code::CloseCode;
use crate::codec;
use crate::error::Error;
use crate::frame::{Frame, OpCode, MAX_CONTROL_PAYLOAD};
use crate::handler::{ConnectionHandler, NoopHandler};
use crate::handshake::accept_key;
use std::io::Cursor;

#[test]
fn opcode_round_trips_through_the_wire_byte() {
    assert_eq!(OpCode::from_byte(0x0).unwrap(), OpCode::Continuation);
    assert_eq!(OpCode::from_byte(0x1).unwrap(), OpCode::Text);
    assert_eq!(OpCode::from_byte(0x2).unwrap(), OpCode::Binary);
    assert_eq!(OpCode::from_byte(0x8).unwrap(), OpCode::Close);
    assert_eq!(OpCode::from_byte(0x9).unwrap(), OpCode::Ping);
    assert_eq!(OpCode::from_byte(0xA).unwrap(), OpCode::Pong);

    assert_eq!(OpCode::Text.as_u8(), 0x1);
    assert_eq!(OpCode::Close.as_u8(), 0x8);
}

#[test]
fn opcode_from_byte_rejects_unknown_values() {
    let err = OpCode::from_byte(0x3).unwrap_err();
    assert!(matches!(err, Error::InvalidOpcode(0x3)));
}

#[test]
fn control_opcodes_are_flagged() {
    assert!(OpCode::Close.is_control());
    assert!(OpCode::Ping.is_control());
    assert!(OpCode::Pong.is_control());
    assert!(!OpCode::Text.is_control());
    assert!(!OpCode::Binary.is_control());
    assert!(!OpCode::Continuation.is_control());
}

#[test]
fn frame_constructor_stores_its_fields() {
    let frame = Frame::new(false, OpCode::Text, b"hi".to_vec());
    assert!(!frame.final_fragment);
    assert_eq!(frame.opcode, OpCode::Text);
    assert_eq!(frame.payload, b"hi");
}

#[test]
fn close_code_round_trips_through_u16() {
    for (code, value) in [
        (CloseCode::Normal, 1000u16),
        (CloseCode::GoingAway, 1001),
        (CloseCode::ProtocolError, 1002),
        (CloseCode::UnacceptableData, 1003),
        (CloseCode::NoCode, 1005),
        (CloseCode::ClosedAbnormally, 1006),
        (CloseCode::InconsistentData, 1007),
        (CloseCode::PolicyViolation, 1008),
        (CloseCode::MessageTooBig, 1009),
        (CloseCode::ExtensionNegotiationFailure, 1010),
        (CloseCode::UnexpectedCondition, 1011),
        (CloseCode::TlsHandshakeFailure, 1015),
    ] {
        assert_eq!(u16::from(code), value);
        assert_eq!(CloseCode::from(value), code);
    }

    assert_eq!(CloseCode::from(4000), CloseCode::Other(4000));
}

#[test]
fn close_code_flags_the_locally_reserved_codes() {
    assert!(CloseCode::NoCode.is_reserved_local());
    assert!(CloseCode::ClosedAbnormally.is_reserved_local());
    assert!(CloseCode::TlsHandshakeFailure.is_reserved_local());
    assert!(!CloseCode::Normal.is_reserved_local());
    assert!(!CloseCode::Other(4000).is_reserved_local());
}

#[test]
fn accept_key_matches_the_rfc_6455_worked_example() {
    assert_eq!(
        accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
        "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
}

async fn read_back(bytes: Vec<u8>) -> Frame {
    let mut cursor = Cursor::new(bytes);
    codec::read_frame(&mut cursor, 1 << 20).await.unwrap()
}

#[tokio::test]
async fn reads_a_single_frame_masked_text_message() {
    // "Hello" masked with key 0x37fa213d, per RFC 6455 §5.7.
    let bytes = vec![
        0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
    ];
    let frame = read_back(bytes).await;
    assert!(frame.final_fragment);
    assert_eq!(frame.opcode, OpCode::Text);
    assert_eq!(frame.payload, b"Hello");
}

#[tokio::test]
async fn reads_a_single_frame_unmasked_text_message() {
    // Unmasked frames are tolerated even though a compliant client always masks.
    let mut bytes = vec![0x81, 0x05];
    bytes.extend_from_slice(b"Hello");
    let frame = read_back(bytes).await;
    assert!(frame.final_fragment);
    assert_eq!(frame.opcode, OpCode::Text);
    assert_eq!(frame.payload, b"Hello");
}

#[tokio::test]
async fn reads_a_fragmented_text_message_across_two_frames() {
    let first = vec![0x01, 0x03, b'H', b'e', b'l'];
    let second = vec![0x80, 0x02, b'l', b'o'];

    let mut cursor = Cursor::new(first);
    let frame = codec::read_frame(&mut cursor, 1 << 20).await.unwrap();
    assert!(!frame.final_fragment);
    assert_eq!(frame.opcode, OpCode::Text);
    assert_eq!(frame.payload, b"Hel");

    let mut cursor = Cursor::new(second);
    let frame = codec::read_frame(&mut cursor, 1 << 20).await.unwrap();
    assert!(frame.final_fragment);
    assert_eq!(frame.opcode, OpCode::Continuation);
    assert_eq!(frame.payload, b"lo");
}

#[tokio::test]
async fn reads_an_unmasked_ping_with_a_binary_payload() {
    let mut bytes = vec![0x89, 0x05];
    bytes.extend_from_slice(b"Hello");
    let frame = read_back(bytes).await;
    assert_eq!(frame.opcode, OpCode::Ping);
    assert_eq!(frame.payload, b"Hello");
}

#[tokio::test]
async fn reads_a_256_byte_binary_frame_with_the_16_bit_length_form() {
    let payload = vec![0xAB; 256];
    let mut bytes = vec![0x82, 126, 0x01, 0x00];
    bytes.extend_from_slice(&payload);
    let frame = read_back(bytes).await;
    assert_eq!(frame.opcode, OpCode::Binary);
    assert_eq!(frame.payload, payload);
}

#[tokio::test]
async fn reads_a_65536_byte_binary_frame_with_the_64_bit_length_form() {
    let payload = vec![0xCD; 65536];
    let mut bytes = vec![0x82u8, 127];
    bytes.extend_from_slice(&(65536u64).to_be_bytes());
    bytes.extend_from_slice(&payload);
    let frame = read_back(bytes).await;
    assert_eq!(frame.opcode, OpCode::Binary);
    assert_eq!(frame.payload.len(), 65536);
    assert_eq!(frame.payload, payload);
}

#[tokio::test]
async fn rejects_frames_with_a_reserved_bit_set() {
    let bytes = vec![0b1111_0001, 0x00];
    let mut cursor = Cursor::new(bytes);
    let err = codec::read_frame(&mut cursor, 1 << 20).await.unwrap_err();
    assert!(matches!(err, Error::RsvNotZero));
}

#[tokio::test]
async fn rejects_fragmented_control_frames() {
    // FIN=0, opcode=Ping: control frames must never be fragmented.
    let bytes = vec![0x09, 0x00];
    let mut cursor = Cursor::new(bytes);
    let err = codec::read_frame(&mut cursor, 1 << 20).await.unwrap_err();
    assert!(matches!(err, Error::ControlFrameFragmented));
}

#[tokio::test]
async fn rejects_control_frames_over_125_bytes() {
    let bytes = vec![0x89, 126, 0x00, 0x80];
    let mut cursor = Cursor::new(bytes);
    let err = codec::read_frame(&mut cursor, 1 << 20).await.unwrap_err();
    assert!(matches!(err, Error::ControlFramePayloadTooLarge));
}

#[tokio::test]
async fn rejects_frames_over_the_configured_max_frame_size() {
    let mut bytes = vec![0x82, 126, 0x01, 0x00];
    bytes.extend_from_slice(&[0u8; 256]);
    let mut cursor = Cursor::new(bytes);
    let err = codec::read_frame(&mut cursor, 100).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MaxFrameSizeExceeded {
            actual: 256,
            limit: 100
        }
    ));
}

#[tokio::test]
async fn write_text_produces_an_unmasked_final_text_frame() {
    let mut out = Vec::new();
    codec::write_text(&mut out, "Hello").await.unwrap();
    assert_eq!(out, vec![0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);
}

#[tokio::test]
async fn write_binary_uses_the_16_bit_length_form_above_125_bytes() {
    let payload = vec![0x42; 200];
    let mut out = Vec::new();
    codec::write_binary(&mut out, &payload).await.unwrap();
    assert_eq!(&out[0..2], &[0x82, 126]);
    assert_eq!(&out[2..4], &(200u16).to_be_bytes());
    assert_eq!(&out[4..], payload.as_slice());
}

#[tokio::test]
async fn write_close_rejects_the_locally_reserved_codes() {
    let mut out = Vec::new();
    let err = codec::write_close(&mut out, CloseCode::ClosedAbnormally, "")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ReservedCloseCode(_)));
}

#[tokio::test]
async fn write_close_rejects_an_overlong_reason() {
    let mut out = Vec::new();
    let reason = "x".repeat(MAX_CONTROL_PAYLOAD);
    let err = codec::write_close(&mut out, CloseCode::Normal, &reason)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CloseReasonTooLong { .. }));
}

#[tokio::test]
async fn write_close_encodes_the_status_code_big_endian_followed_by_the_reason() {
    let mut out = Vec::new();
    codec::write_close(&mut out, CloseCode::Normal, "bye")
        .await
        .unwrap();
    // header(2) + len(1) + code(2) + "bye"(3)
    assert_eq!(out.len(), 8);
    assert_eq!(&out[2..4], &[0x03, 0xE8]); // 1000 big-endian
    assert_eq!(&out[4..], b"bye");
}

#[tokio::test]
async fn a_ping_written_and_read_back_round_trips_its_payload() {
    let mut buf = Vec::new();
    codec::write_ping(&mut buf, b"keepalive").await.unwrap();
    let mut cursor = Cursor::new(buf);
    let frame = codec::read_frame(&mut cursor, 1 << 20).await.unwrap();
    assert_eq!(frame.opcode, OpCode::Ping);
    assert_eq!(frame.payload, b"keepalive");
}

mod manager_tests {
    use super::*;
    use crate::config::WebSocketConfig;
    use crate::manager::Manager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[derive(Default)]
    struct CountingHandler {
        established: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ConnectionHandler for CountingHandler {
        async fn on_connection_established(
            &self,
            _connection: Arc<crate::connection::Connection>,
            _request: &crate::request::ParsedRequest,
        ) {
            self.established.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn upgrade_request(key: &str) -> Vec<u8> {
        format!(
            "GET /chat HTTP/1.1\r\n\
             Host: example.test\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Sec-WebSocket-Version: 13\r\n\
             \r\n"
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn manager_registers_a_connection_and_fires_established() {
        let (client, server) = tokio::io::duplex(4096);
        let handler = Arc::new(CountingHandler::default());

        let mut client = client;
        client
            .write_all(&upgrade_request("dGhlIHNhbXBsZSBub25jZQ==").await)
            .await
            .unwrap();

        let (pending, request) = crate::handshake::accept_async(server, handler.clone())
            .await
            .unwrap();

        let manager = Manager::shared();
        manager
            .add(pending, request, WebSocketConfig::default())
            .await;

        // Give the spawned receive loop and the established hook a chance to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(manager.len().await, 1);
        assert_eq!(handler.established.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn broadcast_text_reaches_every_registered_connection() {
        let manager = Manager::shared();
        let mut clients = Vec::new();

        for i in 0..3 {
            let (mut client, server) = tokio::io::duplex(4096);
            client
                .write_all(&upgrade_request(&format!("key-{i}===============")).await)
                .await
                .unwrap();

            let handler: Arc<dyn ConnectionHandler> = Arc::new(NoopHandler);
            let (pending, request) = crate::handshake::accept_async(server, handler)
                .await
                .unwrap();
            manager
                .add(pending, request, WebSocketConfig::default())
                .await;
            clients.push(client);
        }

        assert_eq!(manager.len().await, 3);

        manager.broadcast_text("hello everyone").await;

        for client in &mut clients {
            // Discard the 101 response already buffered before the broadcast frame.
            let mut response = [0u8; 4096];
            let n = client.read(&mut response).await.unwrap();
            let text = String::from_utf8_lossy(&response[..n]);
            assert!(text.contains("101 Switching Protocols"));

            let frame = codec::read_frame(client, 1 << 20).await.unwrap();
            assert_eq!(frame.opcode, OpCode::Text);
            assert_eq!(frame.payload, b"hello everyone");
        }
    }

    #[tokio::test]
    async fn remove_closes_and_deregisters_the_connection() {
        let (mut client, server) = tokio::io::duplex(4096);
        client
            .write_all(&upgrade_request("dGhlIHNhbXBsZSBub25jZQ==").await)
            .await
            .unwrap();

        let handler: Arc<dyn ConnectionHandler> = Arc::new(NoopHandler);
        let (pending, request) = crate::handshake::accept_async(server, handler)
            .await
            .unwrap();

        let manager = Manager::shared();
        let id = pending.connection.id();
        manager
            .add(pending, request, WebSocketConfig::default())
            .await;

        assert_eq!(manager.len().await, 1);
        manager.remove(id).await;
        assert_eq!(manager.len().await, 0);
    }
}
