//! Integration tests for the SIO codecs over Tokio streams.
//!
//! A host-side `Framed` and a device-side `Framed` are joined by an in-memory
//! duplex pipe, with the translator applied on the device side the way the
//! bus bridge does.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use fujinet_core::{ErrorCode, TransactionFlag, UnitNumber};
use fujinet_protocol::{
    CommandFrame, HostCodec, HostCommand, HostTranslator, ResponseMarker, SioCodec,
    SioHostTranslator, TranslatorError,
};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::codec::Framed;

fn create_framed_duplex(
    buffer_size: usize,
) -> (Framed<DuplexStream, HostCodec>, Framed<DuplexStream, SioCodec>) {
    let (host, device) = tokio::io::duplex(buffer_size);
    (
        Framed::new(host, HostCodec::new()),
        Framed::new(device, SioCodec::new()),
    )
}

fn unit(n: u8) -> UnitNumber {
    UnitNumber::new(n).unwrap()
}

#[tokio::test]
async fn test_command_reaches_device_intact() {
    let (mut host, mut device) = create_framed_duplex(1024);

    let command = HostCommand::Open {
        specifier: "N1:http://example.com/".into(),
        mode: 4,
        flag: TransactionFlag::NONE,
    };
    host.send(command.to_frame(unit(1))).await.unwrap();

    let frame = device.next().await.unwrap().unwrap();
    let request = SioHostTranslator::new().translate_command(&frame).unwrap();
    assert_eq!(request.unit, unit(1));
    assert_eq!(request.command, command);
}

#[tokio::test]
async fn test_request_response_exchange() {
    let (mut host, mut device) = create_framed_duplex(1024);
    let translator = SioHostTranslator::new();

    let command = HostCommand::Get {
        specifier: "N3:https://example.com/data".into(),
        capacity: 512,
    };
    host.send(command.to_frame(unit(3))).await.unwrap();

    let frame = device.next().await.unwrap().unwrap();
    let request = translator.translate_command(&frame).unwrap();
    assert!(matches!(request.command, HostCommand::Get { capacity: 512, .. }));

    let response = translator.translate_response(ErrorCode::Ok, Bytes::from_static(b"hello"));
    device.send(response).await.unwrap();

    let reply = host.next().await.unwrap().unwrap();
    assert_eq!(reply.marker, ResponseMarker::Complete);
    assert_eq!(reply.status, ErrorCode::Ok);
    assert_eq!(reply.payload.as_ref(), b"hello");
}

#[tokio::test]
async fn test_multiple_frames_in_one_write() {
    let (host_io, device_io) = tokio::io::duplex(4096);
    let mut device = Framed::new(device_io, SioCodec::new());
    let mut host_io = host_io;

    let mut bytes = Vec::new();
    for n in 1..=8 {
        let frame = HostCommand::Status {
            specifier: format!("N{n}:http://x/"),
        }
        .to_frame(unit(n));
        bytes.extend_from_slice(&frame.to_bytes());
    }
    host_io.write_all(&bytes).await.unwrap();

    for n in 1..=8u8 {
        let frame = device.next().await.unwrap().unwrap();
        assert_eq!(frame.unit(), Some(unit(n)));
    }
}

#[tokio::test]
async fn test_frame_split_across_writes() {
    let (mut host_io, device_io) = tokio::io::duplex(1024);
    let mut device = Framed::new(device_io, SioCodec::new());

    let frame = HostCommand::PostBin {
        specifier: "N2:http://x/upload".into(),
        data: Bytes::from(vec![0xAA; 100]),
    }
    .to_frame(unit(2));
    let bytes = frame.to_bytes();

    let writer = tokio::spawn(async move {
        for chunk in bytes.chunks(7) {
            host_io.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
        host_io
    });

    let received = device.next().await.unwrap().unwrap();
    assert_eq!(received, frame);
    drop(writer.await.unwrap());
}

#[tokio::test]
async fn test_corrupted_frame_rejected_by_translator() {
    let (mut host, mut device) = create_framed_duplex(1024);

    let mut frame = HostCommand::Close {
        specifier: "N1:http://x/".into(),
    }
    .to_frame(unit(1));
    frame.checksum ^= 0x5A;
    host.send(frame).await.unwrap();

    // The codec still frames it; the translator refuses it
    let received: CommandFrame = device.next().await.unwrap().unwrap();
    let err = SioHostTranslator::new()
        .translate_command(&received)
        .unwrap_err();
    assert!(matches!(err, TranslatorError::InvalidParameter(_)));
}

#[tokio::test]
async fn test_nak_reaches_host() {
    let (mut host, mut device) = create_framed_duplex(64);

    device
        .send(fujinet_protocol::ResponseFrame::nak())
        .await
        .unwrap();

    let reply = host.next().await.unwrap().unwrap();
    assert!(reply.is_nak());
}
