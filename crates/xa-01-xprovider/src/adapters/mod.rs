//! Adapters for XProvider ports

pub mod mock_fetcher;

pub use mock_fetcher::MockBlockFetcher;
