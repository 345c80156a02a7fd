use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::config::CLIENT_CHANNEL_SIZE;
use crate::market::cache::fetch_quote;
use crate::market::provider::QuoteSource;
use crate::websocket::broadcaster::LiveBroadcaster;
use crate::websocket::messages::{ControlMessage, StreamMessage};

/// Shared state handed to every streaming connection.
pub struct StreamState {
    pub broadcaster: Arc<LiveBroadcaster>,
    pub source: Arc<dyn QuoteSource>,
}

/// One accepted TCP connection: handshake, register with the broadcaster,
/// run the per-connection receive loop, unregister on the way out.
///
/// Streaming clients are not authenticated; the dashboard session layer
/// covers the HTTP surface only.
pub async fn handle_connection(state: Arc<StreamState>, stream: TcpStream, peer_addr: String) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {:?}", peer_addr, e);
            return;
        }
    };

    let (write, read) = ws_stream.split();
    let (tx, rx) = mpsc::channel::<String>(CLIENT_CHANNEL_SIZE);
    let client_id = state.broadcaster.register(tx.clone());
    info!("Stream client {} connected from {}", client_id, peer_addr);

    let write_task = spawn_write_task(write, rx);
    run_read_loop(&state, client_id, read, tx).await;

    // Protocol errors never force a disconnect; reaching this point means
    // the client closed or the transport died.
    state.broadcaster.unregister(client_id);
    write_task.abort();
    info!("Stream client {} disconnected from {}", client_id, peer_addr);
}

fn spawn_write_task(
    mut write: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut rx: mpsc::Receiver<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = write.send(Message::Text(message)).await {
                error!("Error sending message: {:?}", e);
                break;
            }
        }
    })
}

async fn run_read_loop(
    state: &StreamState,
    client_id: Uuid,
    mut read: SplitStream<WebSocketStream<TcpStream>>,
    tx: mpsc::Sender<String>,
) {
    'connection: while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                for reply in handle_control(state, client_id, &text).await {
                    match reply.to_json() {
                        Ok(json) => {
                            if tx.send(json).await.is_err() {
                                break 'connection;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize reply for {}: {}", client_id, e);
                        }
                    }
                }
            }
            Ok(Message::Close(frame)) => {
                info!("Client {} sent close frame: {:?}", client_id, frame);
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(_) => {}
            Err(e) => {
                error!("WebSocket error for client {}: {:?}", client_id, e);
                break;
            }
        }
    }
}

/// Dispatch one inbound control message; replies go to this client only.
/// A malformed message earns an error reply and the connection stays open.
pub async fn handle_control(
    state: &StreamState,
    client_id: Uuid,
    text: &str,
) -> Vec<StreamMessage> {
    let control: ControlMessage = match serde_json::from_str(text) {
        Ok(control) => control,
        Err(e) => {
            warn!("Malformed control message from {}: {}", client_id, e);
            return vec![StreamMessage::error("رسالة غير صالحة")];
        }
    };

    match control {
        ControlMessage::Subscribe { symbol } => {
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() {
                return vec![StreamMessage::error("Symbol must not be empty")];
            }

            if let Err(e) = state.broadcaster.subscribe(client_id, &symbol) {
                return vec![StreamMessage::error(e)];
            }
            info!("Client {} subscribed to {}", client_id, symbol);

            // One immediate update for the requesting client only; the poll
            // loop takes over from here.
            match fetch_quote(state.source.as_ref(), &symbol).await {
                Some(quote) => vec![StreamMessage::stock_update(&quote)],
                None => vec![StreamMessage::error(format!(
                    "No data available for {}",
                    symbol
                ))],
            }
        }
        ControlMessage::Unsubscribe { symbol } => {
            match state.broadcaster.unsubscribe(client_id, &symbol) {
                Ok(()) => {
                    info!("Client {} unsubscribed from {}", client_id, symbol);
                    Vec::new()
                }
                Err(e) => vec![StreamMessage::error(e)],
            }
        }
        ControlMessage::Ping => vec![StreamMessage::pong()],
        ControlMessage::GetHistory { symbol, period } => {
            match state.source.daily_sessions(&symbol, &period).await {
                Ok(sessions) if !sessions.is_empty() => {
                    vec![StreamMessage::HistoryData {
                        symbol,
                        data: sessions,
                    }]
                }
                Ok(_) => vec![StreamMessage::error(format!("No history for {}", symbol))],
                Err(e) => {
                    warn!("History fetch failed for {}: {}", symbol, e);
                    vec![StreamMessage::error(e)]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::market::quote::Session;

    struct FixedSource(Vec<Session>);

    #[async_trait]
    impl QuoteSource for FixedSource {
        async fn daily_sessions(&self, _symbol: &str, _range: &str) -> Result<Vec<Session>, String> {
            Ok(self.0.clone())
        }
    }

    fn stream_state() -> Arc<StreamState> {
        let source: Arc<dyn QuoteSource> = Arc::new(FixedSource(vec![
            Session::new("2025-11-02", 80.0, 100),
            Session::new("2025-11-03", 84.0, 200),
        ]));
        Arc::new(StreamState {
            broadcaster: Arc::new(LiveBroadcaster::new(
                source.clone(),
                Duration::from_secs(2),
                Duration::from_secs(5),
            )),
            source,
        })
    }

    fn connect(state: &StreamState) -> Uuid {
        let (tx, _rx) = mpsc::channel(8);
        state.broadcaster.register(tx)
    }

    #[tokio::test]
    async fn test_subscribe_returns_one_immediate_update() {
        let state = stream_state();
        let client = connect(&state);

        let replies =
            handle_control(&state, client, r#"{"type": "subscribe", "symbol": "1120"}"#).await;

        assert_eq!(replies.len(), 1);
        assert!(matches!(
            &replies[0],
            StreamMessage::StockUpdate { symbol, .. } if symbol == "1120"
        ));
        assert_eq!(state.broadcaster.subscribed_symbols(), vec!["1120"]);
    }

    #[tokio::test]
    async fn test_malformed_message_gets_error_reply() {
        let state = stream_state();
        let client = connect(&state);

        for raw in ["not json", r#"{"type": "shout"}"#, r#"{"type": "subscribe"}"#] {
            let replies = handle_control(&state, client, raw).await;
            assert_eq!(replies.len(), 1);
            assert!(matches!(&replies[0], StreamMessage::Error { .. }));
        }

        // The connection is still registered.
        assert_eq!(state.broadcaster.client_count(), 1);
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let state = stream_state();
        let client = connect(&state);

        let replies = handle_control(&state, client, r#"{"type": "ping"}"#).await;
        assert!(matches!(&replies[0], StreamMessage::Pong { .. }));
    }

    #[tokio::test]
    async fn test_get_history_returns_sessions() {
        let state = stream_state();
        let client = connect(&state);

        let replies = handle_control(
            &state,
            client,
            r#"{"type": "get_history", "symbol": "2222", "period": "5d"}"#,
        )
        .await;

        match &replies[0] {
            StreamMessage::HistoryData { symbol, data } => {
                assert_eq!(symbol, "2222");
                assert_eq!(data.len(), 2);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_is_silent_on_success() {
        let state = stream_state();
        let client = connect(&state);

        handle_control(&state, client, r#"{"type": "subscribe", "symbol": "1120"}"#).await;
        let replies =
            handle_control(&state, client, r#"{"type": "unsubscribe", "symbol": "1120"}"#).await;

        assert!(replies.is_empty());
        assert!(state.broadcaster.subscribed_symbols().is_empty());
    }

    #[tokio::test]
    async fn test_blank_symbol_is_rejected() {
        let state = stream_state();
        let client = connect(&state);

        let replies =
            handle_control(&state, client, r#"{"type": "subscribe", "symbol": "  "}"#).await;
        assert!(matches!(&replies[0], StreamMessage::Error { .. }));
        assert!(state.broadcaster.subscribed_symbols().is_empty());
    }
}
