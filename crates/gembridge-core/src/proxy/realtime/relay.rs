//! Duplex websocket relay between a client and the upstream live API.
//!
//! Frames are forwarded as-is. Pings and pongs are answered by each socket
//! library locally and never cross the relay.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{
    CloseFrame as UpstreamCloseFrame, Message as UpstreamMessage,
};

use super::session::{RelaySession, RelayState};

/// Close code sent to the client when upstream fails.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

enum RelayEvent {
    Client(Message),
    ClientClosed(Option<CloseFrame<'static>>),
    Upstream(UpstreamMessage),
    UpstreamClosed(Option<UpstreamCloseFrame<'static>>),
}

/// Drive one realtime session until both sides are closed.
pub async fn run_relay(socket: WebSocket, upstream_url: String) {
    let (mut client_tx, mut client_rx) = socket.split();
    let mut session = RelaySession::new();
    tracing::info!("[Relay] Session opened, connecting upstream");

    let connect = connect_async(upstream_url.as_str());
    tokio::pin!(connect);
    let upstream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _)) => break stream,
                Err(e) => {
                    tracing::warn!("[Relay] Upstream connect failed: {}", e);
                    session.begin_close();
                    let frame = internal_close("upstream unavailable");
                    let _ = client_tx.send(Message::Close(Some(frame))).await;
                    session.closed();
                    return;
                },
            },
            incoming = client_rx.next() => match client_event(incoming) {
                RelayEvent::Client(message) => {
                    session.client_message(message);
                },
                _ => {
                    tracing::debug!("[Relay] Client left before upstream opened");
                    session.closed();
                    return;
                },
            },
        }
    };

    let (mut upstream_tx, mut upstream_rx) = upstream.split();
    let queued = session.upstream_opened();
    tracing::info!("[Relay] Upstream open, flushing {} queued message(s)", queued.len());
    for message in queued.into_iter().filter_map(to_upstream) {
        if let Err(e) = upstream_tx.send(message).await {
            tracing::warn!("[Relay] Upstream send failed: {}", e);
            session.begin_close();
            let _ = client_tx.send(Message::Close(Some(internal_close("upstream send failed")))).await;
            break;
        }
    }

    while session.state() == RelayState::Relaying {
        let event = tokio::select! {
            incoming = client_rx.next() => client_event(incoming),
            incoming = upstream_rx.next() => upstream_event(incoming),
        };
        match event {
            RelayEvent::Client(message) => {
                let Some(message) = session.client_message(message).and_then(to_upstream) else {
                    continue;
                };
                if let Err(e) = upstream_tx.send(message).await {
                    tracing::warn!("[Relay] Upstream send failed: {}", e);
                    session.begin_close();
                    let frame = internal_close("upstream send failed");
                    let _ = client_tx.send(Message::Close(Some(frame))).await;
                }
            },
            RelayEvent::Upstream(message) => {
                let Some(message) = session.upstream_message(message).and_then(to_client) else {
                    continue;
                };
                if client_tx.send(message).await.is_err() {
                    tracing::debug!("[Relay] Client gone, dropping upstream traffic");
                    session.client_gone();
                    let _ = upstream_tx.send(UpstreamMessage::Close(None)).await;
                }
            },
            RelayEvent::ClientClosed(frame) => {
                tracing::debug!("[Relay] Client closed: {:?}", frame);
                session.client_gone();
                let _ = upstream_tx.send(UpstreamMessage::Close(frame.map(close_to_upstream))).await;
            },
            RelayEvent::UpstreamClosed(frame) => {
                tracing::debug!("[Relay] Upstream closed: {:?}", frame);
                session.begin_close();
                let _ = client_tx.send(Message::Close(frame.map(close_to_client))).await;
            },
        }
    }

    let _ = upstream_tx.close().await;
    let _ = client_tx.close().await;
    session.closed();
    tracing::info!("[Relay] Session closed");
}

fn client_event(incoming: Option<Result<Message, axum::Error>>) -> RelayEvent {
    match incoming {
        Some(Ok(Message::Close(frame))) => RelayEvent::ClientClosed(frame),
        Some(Ok(message)) => RelayEvent::Client(message),
        Some(Err(e)) => {
            tracing::debug!("[Relay] Client socket error: {}", e);
            RelayEvent::ClientClosed(None)
        },
        None => RelayEvent::ClientClosed(None),
    }
}

fn upstream_event(
    incoming: Option<Result<UpstreamMessage, tokio_tungstenite::tungstenite::Error>>,
) -> RelayEvent {
    match incoming {
        Some(Ok(UpstreamMessage::Close(frame))) => RelayEvent::UpstreamClosed(frame),
        Some(Ok(message)) => RelayEvent::Upstream(message),
        Some(Err(e)) => {
            tracing::warn!("[Relay] Upstream socket error: {}", e);
            RelayEvent::UpstreamClosed(Some(UpstreamCloseFrame {
                code: CloseCode::from(CLOSE_INTERNAL_ERROR),
                reason: Cow::Borrowed("upstream error"),
            }))
        },
        None => RelayEvent::UpstreamClosed(None),
    }
}

fn internal_close(reason: &'static str) -> CloseFrame<'static> {
    CloseFrame { code: CLOSE_INTERNAL_ERROR, reason: Cow::Borrowed(reason) }
}

fn to_upstream(message: Message) -> Option<UpstreamMessage> {
    match message {
        Message::Text(text) => Some(UpstreamMessage::Text(text)),
        Message::Binary(data) => Some(UpstreamMessage::Binary(data)),
        _ => None,
    }
}

fn to_client(message: UpstreamMessage) -> Option<Message> {
    match message {
        UpstreamMessage::Text(text) => Some(Message::Text(text)),
        UpstreamMessage::Binary(data) => Some(Message::Binary(data)),
        _ => None,
    }
}

fn close_to_upstream(frame: CloseFrame<'static>) -> UpstreamCloseFrame<'static> {
    UpstreamCloseFrame { code: CloseCode::from(frame.code), reason: frame.reason }
}

fn close_to_client(frame: UpstreamCloseFrame<'static>) -> CloseFrame<'static> {
    CloseFrame { code: u16::from(frame.code), reason: frame.reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frames_cross_unchanged() {
        assert_eq!(
            to_upstream(Message::Text("{\"setup\":{}}".into())),
            Some(UpstreamMessage::Text("{\"setup\":{}}".into()))
        );
        assert_eq!(
            to_client(UpstreamMessage::Binary(vec![1, 2, 3])),
            Some(Message::Binary(vec![1, 2, 3]))
        );
        assert_eq!(to_upstream(Message::Ping(vec![])), None);
        assert_eq!(to_client(UpstreamMessage::Pong(vec![])), None);
    }

    #[test]
    fn test_close_frames_keep_code_and_reason() {
        let up = close_to_upstream(CloseFrame { code: 4000, reason: Cow::Borrowed("bye") });
        assert_eq!(u16::from(up.code), 4000);
        assert_eq!(up.reason, "bye");

        let down = close_to_client(UpstreamCloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed("done"),
        });
        assert_eq!(down.code, 1000);
        assert_eq!(down.reason, "done");
    }

    #[test]
    fn test_upstream_error_maps_to_internal_close() {
        let event = upstream_event(Some(Err(
            tokio_tungstenite::tungstenite::Error::ConnectionClosed,
        )));
        match event {
            RelayEvent::UpstreamClosed(Some(frame)) => {
                assert_eq!(u16::from(frame.code), CLOSE_INTERNAL_ERROR);
            },
            _ => panic!("expected upstream close"),
        }
    }
}
