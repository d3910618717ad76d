//! Integration tests for data channel establishment and dispatch.
//!
//! These tests drive real `DataChannelManager` dispatch loops over mock
//! endpoints, either wired back to back or fed with hand-built messages.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;

use datachan_core::constants::{PPID_CONTROL, PPID_STRING};
use datachan_core::error::{Error, Result};
use datachan_core::protocol::encode_open;
use datachan_core::transport::Inbound;
use datachan_core::{DataChannelManager, ManagerConfig, Role};
use datachan_test_utils::{MessageLog, MockEndpoint, RecordingListener, mock_endpoint_pair};

const WAIT: Duration = Duration::from_secs(1);

type Manager = Arc<DataChannelManager<MockEndpoint>>;

// =============================================================================
// Helpers
// =============================================================================

fn spawn_manager(
    endpoint: Arc<MockEndpoint>,
) -> (Manager, RecordingListener, JoinHandle<Result<()>>) {
    let listener = RecordingListener::new();
    let manager = Arc::new(DataChannelManager::new(endpoint, listener.clone()));
    let runner = manager.clone();
    let task = tokio::spawn(async move { runner.run().await });
    (manager, listener, task)
}

fn open_msg(stream_id: u16, label: &str, protocol: &str) -> Inbound {
    Inbound::new(stream_id, PPID_CONTROL, encode_open(label, protocol).unwrap())
}

fn text_msg(stream_id: u16, text: &str) -> Inbound {
    Inbound::new(stream_id, PPID_STRING, text.as_bytes().to_vec())
}

// =============================================================================
// Peer To Peer
// =============================================================================

#[tokio::test]
async fn test_open_and_exchange_between_peers() {
    let (server_ep, client_ep) = mock_endpoint_pair();
    let (server, _server_events, _server_task) = spawn_manager(server_ep);
    let (_client, client_events, _client_task) = spawn_manager(client_ep);

    let local = server.open_channel("chat", "json").unwrap();
    let local_log = MessageLog::attach(&local);
    assert_eq!(local.id(), 0);

    let remote = timeout(WAIT, client_events.wait_for(1))
        .await
        .expect("client never saw the channel")
        .remove(0);
    assert_eq!(remote.id(), 0);
    assert_eq!(remote.label(), "chat");
    assert_eq!(remote.protocol(), "json");
    let remote_log = MessageLog::attach(&remote);

    local.send("hello").await.unwrap();
    let received = timeout(WAIT, remote_log.wait_for(1)).await.unwrap();
    assert_eq!(received, vec!["hello".to_string()]);

    remote.send("hi back").await.unwrap();
    let received = timeout(WAIT, local_log.wait_for(1)).await.unwrap();
    assert_eq!(received, vec!["hi back".to_string()]);
}

#[tokio::test]
async fn test_simultaneous_opens_never_collide() {
    let (server_ep, client_ep) = mock_endpoint_pair();
    let (server, server_events, _server_task) = spawn_manager(server_ep);
    let (client, client_events, _client_task) = spawn_manager(client_ep);

    let server_ids: Vec<u16> = (0..3)
        .map(|i| server.open_channel(&format!("s{}", i), "").unwrap().id())
        .collect();
    let client_ids: Vec<u16> = (0..3)
        .map(|i| client.open_channel(&format!("c{}", i), "").unwrap().id())
        .collect();

    assert_eq!(server_ids, vec![0, 2, 4]);
    assert_eq!(client_ids, vec![1, 3, 5]);

    timeout(WAIT, server_events.wait_for(3)).await.unwrap();
    timeout(WAIT, client_events.wait_for(3)).await.unwrap();

    let ids = |m: &Manager| m.channels().iter().map(|c| c.id()).collect::<Vec<_>>();
    assert_eq!(ids(&server), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(ids(&client), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(server.channel(3).unwrap().label(), "c1");
    assert_eq!(client.channel(4).unwrap().label(), "s2");
}

#[tokio::test]
async fn test_labels_need_not_be_unique() {
    let (server_ep, client_ep) = mock_endpoint_pair();
    let (server, _server_events, _server_task) = spawn_manager(server_ep);
    let (_client, client_events, _client_task) = spawn_manager(client_ep);

    let a = server.open_channel("same", "").unwrap();
    let b = server.open_channel("same", "").unwrap();
    assert_ne!(a.id(), b.id());

    let remote = timeout(WAIT, client_events.wait_for(2)).await.unwrap();
    assert!(remote.iter().all(|c| c.label() == "same"));
}

// =============================================================================
// Dispatch Loop
// =============================================================================

#[tokio::test]
async fn test_remote_open_then_data_delivered() {
    let endpoint = MockEndpoint::new(true);
    let (manager, events, _task) = spawn_manager(endpoint.clone());

    endpoint.inject(open_msg(1, "chat", ""));
    let channel = timeout(WAIT, events.wait_for(1)).await.unwrap().remove(0);
    assert_eq!(channel.id(), 1);
    assert_eq!(channel.label(), "chat");
    assert_eq!(channel.protocol(), "");
    assert!(manager.channel(1).is_some());

    let log = MessageLog::attach(&channel);
    endpoint.inject(text_msg(1, "first"));
    endpoint.inject(text_msg(1, "second"));
    let received = timeout(WAIT, log.wait_for(2)).await.unwrap();
    assert_eq!(received, vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test]
async fn test_loop_survives_bad_messages() {
    let endpoint = MockEndpoint::new(true);
    let (manager, events, task) = spawn_manager(endpoint.clone());

    endpoint.inject(open_msg(1, "good", ""));
    let channel = timeout(WAIT, events.wait_for(1)).await.unwrap().remove(0);
    let log = MessageLog::attach(&channel);

    // Short control message
    endpoint.inject(Inbound::new(3, PPID_CONTROL, vec![3u8, 0, 0, 0]));
    // Declared lengths exceed the payload
    endpoint.inject(Inbound::new(
        3,
        PPID_CONTROL,
        vec![3u8, 0, 0, 0, 0, 0, 0, 0, 0, 9, 0, 0, b'x'],
    ));
    // Wrong parity for a peer-opened stream
    endpoint.inject(open_msg(2, "evil", ""));
    // Duplicate of an existing stream
    endpoint.inject(open_msg(1, "again", ""));
    // Not UTF-8
    endpoint.inject(Inbound::new(1, PPID_STRING, vec![0xc3u8, 0x28]));
    // Unknown payload tag and unknown stream
    endpoint.inject(Inbound::new(1, 53, b"binary".to_vec()));
    endpoint.inject(text_msg(99, "nobody home"));
    // Still routing afterwards
    endpoint.inject(text_msg(1, "still alive"));

    let received = timeout(WAIT, log.wait_for(1)).await.unwrap();
    assert_eq!(received, vec!["still alive".to_string()]);
    assert_eq!(events.len(), 1);
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.channel(1).unwrap().label(), "good");
    assert!(!task.is_finished());
}

#[tokio::test]
async fn test_loop_exits_on_transport_failure() {
    let endpoint = MockEndpoint::new(false);
    let (_manager, _events, task) = spawn_manager(endpoint.clone());

    endpoint.close();
    let result = timeout(WAIT, task).await.unwrap().unwrap();
    assert!(matches!(result, Err(Error::ConnectionClosed)));
}

// =============================================================================
// Send Path
// =============================================================================

#[tokio::test]
async fn test_send_produces_one_tagged_transmission() {
    let endpoint = MockEndpoint::new(false);
    let manager = DataChannelManager::new(endpoint.clone(), RecordingListener::new());

    let channel = manager.open_channel("c", "").unwrap();
    manager.send(&channel, "hello").await.unwrap();

    let sent = endpoint.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].ppid, PPID_CONTROL);
    assert_eq!(sent[0].data, encode_open("c", "").unwrap());

    let data: Vec<_> = sent.iter().filter(|m| m.ppid == PPID_STRING).collect();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].stream_id, 1);
    assert_eq!(&data[0].data[..], "hello".as_bytes());
}

#[tokio::test]
async fn test_fire_and_forget_send_still_transmits() {
    let endpoint = MockEndpoint::new(true);
    let manager = DataChannelManager::new(endpoint.clone(), RecordingListener::new());

    let channel = manager.open_channel("c", "").unwrap();
    drop(channel.send("one"));
    drop(channel.send("two"));

    let sent = timeout(WAIT, endpoint.wait_for_sent(3)).await.unwrap();
    let texts: Vec<_> = sent[1..].iter().filter_map(|m| m.text()).collect();
    assert_eq!(texts, vec!["one", "two"]);
}

#[tokio::test]
async fn test_send_after_transport_closed_reports_error() {
    let endpoint = MockEndpoint::new(true);
    let manager = DataChannelManager::with_config(
        endpoint.clone(),
        RecordingListener::new(),
        ManagerConfig::new().with_outbound_capacity(16),
    );
    assert_eq!(manager.role(), Role::Server);

    let channel = manager.open_channel("c", "").unwrap();
    endpoint.close();

    let err = channel.send("late").await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    // The channel itself stays registered
    assert!(manager.channel(channel.id()).is_some());
}
