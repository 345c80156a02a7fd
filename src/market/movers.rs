use std::cmp::Ordering;

use crate::market::quote::Quote;

/// Top gainers and losers by percent change.
///
/// Gainers require change > 0 and sort descending; losers require
/// change < 0 and sort ascending (most negative first). Unchanged quotes
/// rank in neither list. Sorting is stable, so ties keep input order.
pub fn rank_movers(quotes: &[Quote], top_n: usize) -> (Vec<Quote>, Vec<Quote>) {
    let mut gainers: Vec<Quote> = quotes.iter().filter(|q| q.change > 0.0).cloned().collect();
    let mut losers: Vec<Quote> = quotes.iter().filter(|q| q.change < 0.0).cloned().collect();

    gainers.sort_by(|a, b| compare_percent(b, a));
    losers.sort_by(compare_percent);

    gainers.truncate(top_n);
    losers.truncate(top_n);

    (gainers, losers)
}

fn compare_percent(a: &Quote, b: &Quote) -> Ordering {
    a.change_percent
        .partial_cmp(&b.change_percent)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::market::quote::Session;

    fn quote(symbol: &str, change_percent: f64) -> Quote {
        // Build from sessions so change and change_percent stay consistent.
        let sessions = vec![
            Session::new("2025-11-02", 100.0, 1_000),
            Session::new("2025-11-03", 100.0 + change_percent, 1_000),
        ];
        Quote::from_sessions(symbol, &sessions).expect("quote")
    }

    #[test]
    fn test_rank_movers_mixed_changes() {
        let quotes = vec![
            quote("1010", 5.0),
            quote("1020", -3.0),
            quote("1030", 10.0),
            quote("1050", -8.0),
            quote("1060", 0.0),
        ];

        let (gainers, losers) = rank_movers(&quotes, 2);

        let gainer_pcts: Vec<f64> = gainers.iter().map(|q| q.change_percent).collect();
        let loser_pcts: Vec<f64> = losers.iter().map(|q| q.change_percent).collect();
        assert_eq!(gainer_pcts, vec![10.0, 5.0]);
        assert_eq!(loser_pcts, vec![-8.0, -3.0]);

        // The unchanged quote appears in neither list.
        assert!(gainers.iter().all(|q| q.symbol != "1060"));
        assert!(losers.iter().all(|q| q.symbol != "1060"));
    }

    #[test]
    fn test_truncation_to_top_n() {
        let quotes = vec![
            quote("1010", 1.0),
            quote("1020", 2.0),
            quote("1030", 3.0),
            quote("1050", 4.0),
        ];

        let (gainers, losers) = rank_movers(&quotes, 2);
        assert_eq!(gainers.len(), 2);
        assert_eq!(gainers[0].change_percent, 4.0);
        assert!(losers.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let quotes = vec![
            quote("1010", 2.0),
            quote("1020", 2.0),
            quote("1030", 2.0),
        ];

        let (gainers, _) = rank_movers(&quotes, 3);
        let symbols: Vec<&str> = gainers.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["1010", "1020", "1030"]);
    }

    #[test]
    fn test_empty_input() {
        let (gainers, losers) = rank_movers(&[], 10);
        assert!(gainers.is_empty());
        assert!(losers.is_empty());
    }
}
