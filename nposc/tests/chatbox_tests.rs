//! Chatbox transport against a loopback UDP peer

use nposc::{ChatboxOptions, NotificationSound, OscArg, OscChatboxTransport, OscMessage};
use nppipeline::{ReadinessCoordinator, Signal, TransportGate};
use std::time::Duration;
use tokio::net::UdpSocket;

async fn peer() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

fn options_for(peer: &UdpSocket) -> ChatboxOptions {
    ChatboxOptions {
        local: "127.0.0.1:0".parse().unwrap(),
        remote: peer.local_addr().unwrap(),
        ..Default::default()
    }
}

async fn receive(peer: &UdpSocket) -> OscMessage {
    let mut buf = [0u8; 1024];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), peer.recv_from(&mut buf))
        .await
        .expect("no datagram received")
        .unwrap();
    OscMessage::decode(&buf[..len]).unwrap()
}

#[tokio::test]
async fn test_open_sends_typing_indicator_then_messages() {
    let peer = peer().await;
    let readiness = ReadinessCoordinator::new();
    let mut gate = TransportGate::new(
        OscChatboxTransport::new(options_for(&peer)),
        readiness.clone(),
    );

    gate.open().await.unwrap();
    assert!(readiness.is_raised(Signal::TRANSPORT));
    assert_eq!(gate.max_message_len(), Some(144));

    let typing = receive(&peer).await;
    assert_eq!(typing.address, "/chatbox/typing");
    assert_eq!(typing.args, vec![OscArg::Int(1)]);

    gate.send("[>]Listening to: Song by Artist [======O===================]")
        .await
        .unwrap();
    let input = receive(&peer).await;
    assert_eq!(input.address, "/chatbox/input");
    assert_eq!(
        input.args,
        vec![
            OscArg::Str("[>]Listening to: Song by Artist [======O===================]".into()),
            OscArg::Int(1),
        ]
    );
}

#[tokio::test]
async fn test_disabled_typing_indicator_and_notification_flag() {
    let peer = peer().await;
    let options = ChatboxOptions {
        send_typing_indicator: false,
        notification_sound: NotificationSound::On,
        ..options_for(&peer)
    };
    let mut gate = TransportGate::new(OscChatboxTransport::new(options), ReadinessCoordinator::new());
    gate.open().await.unwrap();

    gate.send("hello").await.unwrap();
    let first = receive(&peer).await;
    assert_eq!(first.address, "/chatbox/input");
    assert_eq!(
        first.args,
        vec![OscArg::Str("hello".into()), OscArg::Int(1), OscArg::Bool(true)]
    );
}

#[tokio::test]
async fn test_port_in_use_fails_open() {
    let taken = peer().await;
    let options = ChatboxOptions {
        local: taken.local_addr().unwrap(),
        remote: taken.local_addr().unwrap(),
        ..Default::default()
    };
    let readiness = ReadinessCoordinator::new();
    let mut gate = TransportGate::new(OscChatboxTransport::new(options), readiness.clone());

    assert!(gate.open().await.is_err());
    assert!(!gate.is_open());
    assert!(!readiness.is_raised(Signal::TRANSPORT));
}
