// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! End-to-end tests for the chat relay.
//!
//! Clients are plain `tokio-tungstenite` sockets speaking the JSON event
//! protocol. Covers a full chat session across three participants and
//! history surviving a relay restart through the JSON-lines file.

use std::sync::Arc;
use std::time::Duration;

use agora_proto::events::{self, ClientEvent, ServerEvent};
use agora_relay::relay::{self, RelayState};
use agora_relay::store::MessageStore;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

type Client =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn join(addr: std::net::SocketAddr) -> (Client, String, Vec<String>) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("connect failed");
    let ServerEvent::Start {
        nickname,
        message_history,
    } = recv(&mut ws).await
    else {
        panic!("expected start event");
    };
    assert!(matches!(recv(&mut ws).await, ServerEvent::OnlineUsers(_)));
    (ws, nickname, message_history)
}

async fn send(ws: &mut Client, event: &ClientEvent) {
    let text = events::encode_client(event).unwrap();
    ws.send(tungstenite::Message::Text(text.into())).await.unwrap();
}

async fn say(ws: &mut Client, nickname: &str, body: &str) {
    send(
        ws,
        &ClientEvent::Message {
            nickname: nickname.into(),
            chat_message: body.into(),
        },
    )
    .await;
}

async fn recv(ws: &mut Client) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = ws.next().await.unwrap().unwrap();
            if let tungstenite::Message::Text(text) = msg {
                return events::decode_server(text.as_str()).unwrap();
            }
        }
    })
    .await
    .expect("recv timed out")
}

/// Skips events until a chat line arrives.
async fn next_line(ws: &mut Client) -> String {
    loop {
        if let ServerEvent::Message(line) = recv(ws).await {
            return line;
        }
    }
}

/// Skips events until a participant list arrives.
async fn next_listing(ws: &mut Client) -> Vec<String> {
    loop {
        if let ServerEvent::OnlineUsers(users) = recv(ws).await {
            return users;
        }
    }
}

#[tokio::test]
async fn three_participants_chat() {
    let state = Arc::new(RelayState::new());
    let (addr, _handle) = relay::start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .unwrap();

    let (mut alice, nick_a, _) = join(addr).await;
    let (mut bob, nick_b, _) = join(addr).await;
    let (mut carol, nick_c, _) = join(addr).await;

    assert_eq!(
        next_listing(&mut alice).await,
        vec![nick_a.clone(), nick_b.clone()]
    );
    assert_eq!(
        next_listing(&mut alice).await,
        vec![nick_a.clone(), nick_b.clone(), nick_c.clone()]
    );
    assert_eq!(next_listing(&mut bob).await.len(), 3);

    send(&mut alice, &ClientEvent::SetNickname("Alice".into())).await;
    for ws in [&mut alice, &mut bob, &mut carol] {
        assert_eq!(
            next_line(ws).await,
            format!("{nick_a} changed their nickname to Alice")
        );
        assert_eq!(
            next_listing(ws).await,
            vec!["Alice".to_string(), nick_b.clone(), nick_c.clone()]
        );
    }

    say(&mut alice, "Alice", "hello all").await;
    for ws in [&mut alice, &mut bob, &mut carol] {
        assert!(next_line(ws).await.ends_with(" - Alice: hello all"));
    }
    say(&mut bob, &nick_b, "hi Alice").await;
    for ws in [&mut alice, &mut bob, &mut carol] {
        assert!(next_line(ws).await.ends_with(&format!(" - {nick_b}: hi Alice")));
    }

    send(&mut carol, &ClientEvent::Disconnect).await;
    for ws in [&mut alice, &mut bob] {
        assert_eq!(next_line(ws).await, format!("{nick_c} left the room"));
        assert_eq!(
            next_listing(ws).await,
            vec!["Alice".to_string(), nick_b.clone()]
        );
    }

    assert_eq!(state.registry.list(), vec!["Alice".to_string(), nick_b]);
    assert_eq!(state.store.len().await, 2);
}

#[tokio::test]
async fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("chat.jsonl");

    {
        let store = MessageStore::open(&history).await.unwrap();
        let state = Arc::new(RelayState::with_config(16 * 1024, store));
        let (addr, handle) = relay::start_server_with_state("127.0.0.1:0", state)
            .await
            .unwrap();

        let (mut ws, nickname, past) = join(addr).await;
        assert!(past.is_empty());
        say(&mut ws, &nickname, "first").await;
        say(&mut ws, &nickname, "second").await;
        next_line(&mut ws).await;
        next_line(&mut ws).await;
        handle.abort();
    }

    let store = MessageStore::open(&history).await.unwrap();
    let state = Arc::new(RelayState::with_config(16 * 1024, store));
    let (addr, _handle) = relay::start_server_with_state("127.0.0.1:0", state)
        .await
        .unwrap();

    let (_ws, _, past) = join(addr).await;
    assert_eq!(past.len(), 2);
    assert!(past[0].ends_with(": first"));
    assert!(past[1].ends_with(": second"));
}
