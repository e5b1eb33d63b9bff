//! Transport-only client primitives for the remote reasoning backend.
//!
//! This crate owns request building, header construction, endpoint
//! normalization and error-body parsing for the Messages endpoint only. It
//! performs exactly one HTTP attempt per call: retry scheduling lives with the
//! caller, which classifies failures by the status carried in
//! [`MessagesApiError::status`].

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::MessagesApiClient;
pub use config::MessagesApiConfig;
pub use error::MessagesApiError;
pub use payload::{ContentBlock, MessagesRequest, MessagesResponse, RequestMessage, Usage};
pub use reqwest::StatusCode;
pub use url::normalize_messages_url;
