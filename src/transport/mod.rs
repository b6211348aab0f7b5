//! Transports carrying one chat completion request per call

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::request::ChatRequest;

pub use http::HttpTransport;

/// One attempt at `POST url` with bearer auth and a JSON body.
///
/// Implementations return the raw body of a 2xx response and
/// map failures onto `Error::Timeout`, `Error::HttpError` or
/// `Error::ApiError`, the kinds the client retries. They never
/// retry on their own.
#[async_trait]
pub trait Transport: Send + Sync
{   async fn post_chat(
      &self
    , url: &str
    , api_key: &str
    , request: &ChatRequest
    ) -> Result<String>;
}
