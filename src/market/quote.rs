use serde::{Deserialize, Serialize};

use crate::directory;

/// One trading session of a symbol as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub date: String,
    pub close: f64,
    pub volume: u64,
}

impl Session {
    pub fn new(date: &str, close: f64, volume: u64) -> Self {
        Self {
            date: date.to_string(),
            close,
            volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Zero change is flat: an unchanged symbol is neither a gainer nor a
    /// loser.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// A symbol's latest observation. Immutable once built; the next refresh
/// replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub last: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub trend: Trend,
}

impl Quote {
    /// Normalize a session history (oldest first) into a quote.
    ///
    /// With a single session the previous close defaults to the current one
    /// (change 0). An empty history yields None and the symbol is simply
    /// excluded from the snapshot.
    pub fn from_sessions(symbol: &str, sessions: &[Session]) -> Option<Quote> {
        let current = sessions.last()?;
        let previous = if sessions.len() > 1 {
            &sessions[sessions.len() - 2]
        } else {
            current
        };

        let change = round2(current.close - previous.close);
        let change_percent = if previous.close != 0.0 {
            round2((current.close - previous.close) / previous.close * 100.0)
        } else {
            0.0
        };

        let (name, sector) = directory::name_and_sector(symbol);

        Some(Quote {
            symbol: symbol.to_string(),
            name,
            sector,
            last: round2(current.close),
            change,
            change_percent,
            volume: current.volume,
            trend: Trend::from_change(change),
        })
    }

    pub fn previous_close(&self) -> f64 {
        round2(self.last - self.change)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_from_two_sessions() {
        let sessions = vec![
            Session::new("2025-11-02", 80.0, 1_000_000),
            Session::new("2025-11-03", 84.0, 1_200_000),
        ];

        let quote = Quote::from_sessions("1120", &sessions).expect("quote");
        assert_eq!(quote.last, 84.0);
        assert_eq!(quote.change, 4.0);
        assert_eq!(quote.change_percent, 5.0);
        assert_eq!(quote.volume, 1_200_000);
        assert_eq!(quote.trend, Trend::Up);
        assert_eq!(quote.name, "مصرف الراجحي");
        assert_eq!(quote.previous_close(), 80.0);
    }

    #[test]
    fn test_single_session_is_flat() {
        let sessions = vec![Session::new("2025-11-03", 31.5, 50_000)];

        let quote = Quote::from_sessions("2222", &sessions).expect("quote");
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);
        assert_eq!(quote.trend, Trend::Flat);
    }

    #[test]
    fn test_zero_previous_close_gives_zero_percent() {
        let sessions = vec![
            Session::new("2025-11-02", 0.0, 0),
            Session::new("2025-11-03", 12.0, 100),
        ];

        let quote = Quote::from_sessions("2010", &sessions).expect("quote");
        assert_eq!(quote.change, 12.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn test_empty_history_is_absent() {
        assert!(Quote::from_sessions("1010", &[]).is_none());
    }

    #[test]
    fn test_falling_quote_trends_down() {
        let sessions = vec![
            Session::new("2025-11-02", 50.0, 1_000),
            Session::new("2025-11-03", 48.5, 2_000),
        ];

        let quote = Quote::from_sessions("1010", &sessions).expect("quote");
        assert_eq!(quote.change, -1.5);
        assert_eq!(quote.change_percent, -3.0);
        assert_eq!(quote.trend, Trend::Down);
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let sessions = vec![
            Session::new("2025-11-02", 3.0, 100),
            Session::new("2025-11-03", 3.333_333, 100),
        ];

        let quote = Quote::from_sessions("4001", &sessions).expect("quote");
        assert_eq!(quote.last, 3.33);
        assert_eq!(quote.change, 0.33);
        assert_eq!(quote.change_percent, 11.11);
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        let json = serde_json::to_string(&Trend::Up).expect("serialize");
        assert_eq!(json, "\"up\"");
    }
}
