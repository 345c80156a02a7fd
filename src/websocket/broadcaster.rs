use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout};
use uuid::Uuid;

use crate::config::STREAM_SHUTDOWN_TIMEOUT_SECS;
use crate::market::provider::{QuoteSource, SNAPSHOT_RANGE};
use crate::market::quote::Quote;
use crate::websocket::messages::StreamMessage;

struct ClientHandle {
    sender: mpsc::Sender<String>,
    subscriptions: HashSet<String>,
}

/// Live update broadcaster.
///
/// Subscriptions are tracked per client; the polled symbol set is the union
/// of every client's set, so one client unsubscribing cannot strip a symbol
/// another client still watches. A background loop re-fetches each symbol
/// in the union on a fixed interval and pushes updates to its subscribers.
pub struct LiveBroadcaster {
    source: Arc<dyn QuoteSource>,
    clients: Mutex<HashMap<Uuid, ClientHandle>>,
    poll_interval: Duration,
    backoff: Duration,
}

impl LiveBroadcaster {
    pub fn new(source: Arc<dyn QuoteSource>, poll_interval: Duration, backoff: Duration) -> Self {
        Self {
            source,
            clients: Mutex::new(HashMap::new()),
            poll_interval,
            backoff,
        }
    }

    pub fn register(&self, sender: mpsc::Sender<String>) -> Uuid {
        let client_id = Uuid::new_v4();
        let mut clients = self.clients.lock().unwrap();
        clients.insert(
            client_id,
            ClientHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );
        info!("Stream client {} registered ({} connected)", client_id, clients.len());
        client_id
    }

    pub fn unregister(&self, client_id: Uuid) {
        let mut clients = self.clients.lock().unwrap();
        if clients.remove(&client_id).is_some() {
            info!("Stream client {} removed ({} remaining)", client_id, clients.len());
        }
    }

    pub fn subscribe(&self, client_id: Uuid, symbol: &str) -> Result<(), String> {
        let mut clients = self.clients.lock().map_err(|_| "Lock poisoned".to_string())?;
        let client = clients
            .get_mut(&client_id)
            .ok_or_else(|| format!("Unknown client {}", client_id))?;
        client.subscriptions.insert(symbol.to_string());
        Ok(())
    }

    pub fn unsubscribe(&self, client_id: Uuid, symbol: &str) -> Result<(), String> {
        let mut clients = self.clients.lock().map_err(|_| "Lock poisoned".to_string())?;
        let client = clients
            .get_mut(&client_id)
            .ok_or_else(|| format!("Unknown client {}", client_id))?;
        if client.subscriptions.remove(symbol) {
            Ok(())
        } else {
            Err(format!("Not subscribed to {}", symbol))
        }
    }

    /// Union of every client's subscriptions: the symbols the poll loop
    /// fetches. Sorted for deterministic polling order.
    pub fn subscribed_symbols(&self) -> Vec<String> {
        let clients = self.clients.lock().unwrap();
        let mut symbols: Vec<String> = clients
            .values()
            .flat_map(|c| c.subscriptions.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// Push a symbol's update to every client subscribed to it.
    ///
    /// A full channel drops the push rather than blocking the loop on a
    /// slow consumer; a closed channel means the client is mid-disconnect
    /// and is skipped.
    fn push_update(&self, symbol: &str, json: &str) -> usize {
        let clients = self.clients.lock().unwrap();
        let mut delivered = 0;
        for (client_id, client) in clients.iter() {
            if !client.subscriptions.contains(symbol) {
                continue;
            }
            match client.sender.try_send(json.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Client {} is lagging, dropping {} update", client_id, symbol);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Fetch and push one round of updates for the subscribed union.
    /// A provider failure aborts the round so the caller can back off.
    async fn poll_once(&self) -> Result<(), String> {
        for symbol in self.subscribed_symbols() {
            let sessions = self.source.daily_sessions(&symbol, SNAPSHOT_RANGE).await?;

            let quote = match Quote::from_sessions(&symbol, &sessions) {
                Some(quote) => quote,
                None => continue,
            };

            match StreamMessage::stock_update(&quote).to_json() {
                Ok(json) => {
                    let delivered = self.push_update(&symbol, &json);
                    if delivered > 0 {
                        info!("Pushed {} update to {} subscribers", symbol, delivered);
                    }
                }
                Err(e) => error!("Failed to serialize update for {}: {}", symbol, e),
            }
        }
        Ok(())
    }

    /// Start the background poll-and-push loop. The loop never exits on a
    /// fetch error; it logs, backs off, and resumes.
    pub fn spawn(self: Arc<Self>) -> BroadcasterHandle {
        let broadcaster = self;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(broadcaster.poll_interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = broadcaster.poll_once().await {
                            error!(
                                "Live poll failed: {}; backing off for {:?}",
                                e, broadcaster.backoff
                            );
                            tokio::select! {
                                _ = sleep(broadcaster.backoff) => {}
                                _ = shutdown_rx.changed() => break,
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Broadcast loop stopped");
        });

        BroadcasterHandle { shutdown_tx, task }
    }
}

/// Handle for stopping the poll loop; joins within a bounded timeout.
pub struct BroadcasterHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl BroadcasterHandle {
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);

        let mut task = self.task;
        let limit = Duration::from_secs(STREAM_SHUTDOWN_TIMEOUT_SECS);
        if timeout(limit, &mut task).await.is_err() {
            warn!("Broadcast loop did not stop within {:?}, aborting", limit);
            task.abort();
        }
    }
}
