use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{info, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::directory;
use crate::market::provider::{QuoteSource, SNAPSHOT_RANGE};
use crate::market::quote::Quote;

struct CacheState {
    quotes: Vec<Quote>,
    last_update: Option<Instant>,
}

/// TTL-guarded snapshot of every tradable symbol.
///
/// The mutex is held across the whole check-then-refresh sequence, so
/// overlapping callers trigger exactly one fan-out; callers arriving during
/// a refresh wait and read the entry it installs.
pub struct MarketCache {
    source: Arc<dyn QuoteSource>,
    state: Mutex<CacheState>,
    ttl: Duration,
    concurrency: usize,
}

impl MarketCache {
    pub fn new(source: Arc<dyn QuoteSource>, ttl: Duration, concurrency: usize) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState {
                quotes: Vec::new(),
                last_update: None,
            }),
            ttl,
            concurrency,
        }
    }

    /// The current market snapshot, served from cache while fresh.
    ///
    /// Output order is fan-out completion order; callers sort when order
    /// matters.
    pub async fn market_snapshot(&self) -> Vec<Quote> {
        let mut state = self.state.lock().await;

        if let Some(at) = state.last_update {
            if at.elapsed() < self.ttl {
                return state.quotes.clone();
            }
        }

        let quotes = self.refresh().await;
        info!(
            "Snapshot refreshed: {}/{} symbols reporting",
            quotes.len(),
            directory::company_count()
        );

        state.quotes = quotes.clone();
        state.last_update = Some(Instant::now());
        quotes
    }

    /// Fan out one fetch per directory symbol through a bounded pool and
    /// keep whatever came back. Partial failure shrinks the snapshot, never
    /// fails it.
    async fn refresh(&self) -> Vec<Quote> {
        let source = self.source.clone();
        let tasks: Vec<_> = directory::tradable_symbols()
            .map(move |symbol| fetch_one(source.clone(), symbol))
            .collect();
        stream::iter(tasks)
            .buffer_unordered(self.concurrency)
            .filter_map(|quote| async move { quote })
            .collect()
            .await
    }
}

// Owned-Arc wrapper so the fan-out's per-symbol future carries no borrow of
// `self`, keeping it `Send` for the request handler's future.
async fn fetch_one(source: Arc<dyn QuoteSource>, symbol: &'static str) -> Option<Quote> {
    fetch_quote(source.as_ref(), symbol).await
}

/// One symbol, one upstream call. Provider absence and provider failure
/// both collapse to None so the caller can simply drop the symbol.
pub fn fetch_quote<'a>(
    source: &'a dyn QuoteSource,
    symbol: &'a str,
) -> impl std::future::Future<Output = Option<Quote>> + Send + 'a {
    async move {
        match source.daily_sessions(symbol, SNAPSHOT_RANGE).await {
            Ok(sessions) => Quote::from_sessions(symbol, &sessions),
            Err(e) => {
                warn!("Fetch failed for {}: {}", symbol, e);
                None
            }
        }
    }
}
