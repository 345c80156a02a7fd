use log::warn;
use serde::{Deserialize, Serialize};

use crate::directory::INDEX_SYMBOL;
use crate::market::provider::{QuoteSource, SNAPSHOT_RANGE};
use crate::market::quote::round2;

/// Aggregate index reading for the dashboard header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    pub current: f64,
    pub change: f64,
    pub change_percent: f64,
    pub status: String,
    pub volume: u64,
}

impl Overview {
    /// Literal fallback served when the index cannot be fetched; the
    /// dashboard must always render something.
    pub fn fallback() -> Self {
        Self {
            current: 12000.00,
            change: 150.50,
            change_percent: 1.27,
            status: "up".to_string(),
            volume: 150_000_000,
        }
    }
}

/// Fetch the last two index sessions; any failure (including fewer than two
/// sessions) degrades to the fallback record, never an error.
pub fn get_overview<'a>(
    source: &'a dyn QuoteSource,
) -> impl std::future::Future<Output = Overview> + Send + 'a {
    async move {
        match fetch_index(source).await {
            Ok(Some(overview)) => overview,
            Ok(None) => {
                warn!("Index {} returned too few sessions, serving fallback", INDEX_SYMBOL);
                Overview::fallback()
            }
            Err(e) => {
                warn!("Index fetch failed ({}), serving fallback", e);
                Overview::fallback()
            }
        }
    }
}

async fn fetch_index(source: &dyn QuoteSource) -> Result<Option<Overview>, String> {
    let sessions = source.daily_sessions(INDEX_SYMBOL, SNAPSHOT_RANGE).await?;

    let (previous, current) = match sessions.as_slice() {
        [.., previous, current] => (previous, current),
        _ => return Ok(None),
    };

    let change = round2(current.close - previous.close);
    let change_percent = if previous.close != 0.0 {
        round2((current.close - previous.close) / previous.close * 100.0)
    } else {
        0.0
    };

    Ok(Some(Overview {
        current: round2(current.close),
        change,
        change_percent,
        status: if change > 0.0 { "up" } else { "down" }.to_string(),
        volume: current.volume,
    }))
}
