pub mod cache;
pub mod movers;
pub mod overview;
pub mod provider;
pub mod quote;

pub use cache::{fetch_quote, MarketCache};
pub use movers::rank_movers;
pub use overview::{get_overview, Overview};
pub use provider::{QuoteSource, YahooProvider, SNAPSHOT_RANGE};
pub use quote::{Quote, Session, Trend};
