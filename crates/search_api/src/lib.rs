//! Web search transport: one POST per query against a Tavily-compatible
//! `/search` endpoint, returning the synthesized answer and ranked sources.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;

pub use client::SearchApiClient;
pub use config::SearchApiConfig;
pub use error::SearchApiError;
pub use payload::{SearchRequest, SearchResponse, SearchResult};
