use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::market::quote::Session;

/// Range used for snapshot and overview fetches: the last two sessions.
pub const SNAPSHOT_RANGE: &str = "2d";

/// Upstream market-data port. Implementations return daily sessions oldest
/// first; an empty vec means the provider has no rows for the symbol, which
/// is not an error.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn daily_sessions(&self, symbol: &str, range: &str) -> Result<Vec<Session>, String>;
}

/// Yahoo Finance v8 chart client. Tadawul equities trade under `<code>.SR`
/// tickers; the index symbol already carries its full form.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_symbol(symbol: &str) -> String {
        if symbol.starts_with('^') || symbol.ends_with(".SR") {
            symbol.to_string()
        } else {
            format!("{}.SR", symbol)
        }
    }
}

#[async_trait]
impl QuoteSource for YahooProvider {
    async fn daily_sessions(&self, symbol: &str, range: &str) -> Result<Vec<Session>, String> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            Self::chart_symbol(symbol),
            range
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Request failed for {}: {}", symbol, e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Provider returned {} for {}",
                response.status(),
                symbol
            ));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| format!("Bad chart payload for {}: {}", symbol, e))?;

        Ok(body.into_sessions())
    }
}

// Chart endpoint payload, reduced to the fields we read.

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl ChartResponse {
    /// Rows with a null close (holidays, suspended sessions) are skipped.
    fn into_sessions(self) -> Vec<Session> {
        let result = match self.chart.result.and_then(|mut r| r.pop()) {
            Some(result) => result,
            None => return Vec::new(),
        };

        let quote = match result.indicators.quote.into_iter().next() {
            Some(quote) => quote,
            None => return Vec::new(),
        };

        result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let close = quote.close.get(i).copied().flatten()?;
                let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);
                Some(Session {
                    date: format_date(*ts),
                    close,
                    volume,
                })
            })
            .collect()
    }
}

fn format_date(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "1120.SR"},
                "timestamp": [1730505600, 1730592000, 1730678400],
                "indicators": {
                    "quote": [{
                        "close": [80.0, null, 84.0],
                        "volume": [1000000, null, 1200000]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_payload() {
        let response: ChartResponse = serde_json::from_str(CHART_FIXTURE).expect("parse");
        let sessions = response.into_sessions();

        // Null close row is dropped.
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].close, 80.0);
        assert_eq!(sessions[0].volume, 1_000_000);
        assert_eq!(sessions[0].date, "2024-11-02");
        assert_eq!(sessions[1].close, 84.0);
    }

    #[test]
    fn test_empty_result_means_no_sessions() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).expect("parse");
        assert!(response.into_sessions().is_empty());
    }

    #[test]
    fn test_missing_volume_defaults_to_zero() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1730505600],
                    "indicators": {"quote": [{"close": [12.5], "volume": [null]}]}
                }]
            }
        }"#;
        let response: ChartResponse = serde_json::from_str(body).expect("parse");
        let sessions = response.into_sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].volume, 0);
    }

    #[test]
    fn test_chart_symbol_suffixing() {
        assert_eq!(YahooProvider::chart_symbol("1120"), "1120.SR");
        assert_eq!(YahooProvider::chart_symbol("^TASI.SR"), "^TASI.SR");
        assert_eq!(YahooProvider::chart_symbol("2222.SR"), "2222.SR");
    }
}
