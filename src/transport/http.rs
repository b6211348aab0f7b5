use std::time::Duration;
use async_trait::async_trait;
use log::{error, trace};

use crate::error::{Error, Result};
use crate::request::ChatRequest;
use super::Transport;

/// Per-attempt network timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed transport. Holds one pooled `reqwest::Client`
/// for its whole lifetime; dropping it releases the pool.
#[derive(Debug, Clone)]
pub struct HttpTransport
{   http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new() -> Result<Self>
    {   HttpTransport::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self>
    {   let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::HttpError(e.to_string())
          })?;
        Ok(HttpTransport { http_client })
    }
}

fn classify(e: reqwest::Error) -> Error
{   if e.is_timeout()
    {   Error::Timeout
    } else
    {   Error::HttpError(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn post_chat(
      &self
    , url: &str
    , api_key: &str
    , request: &ChatRequest
    ) -> Result<String>
    {   trace!("POST {} with {:?}", url, request);

        let response = self.http_client
          .post(url)
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(request)
          .send()
          .await
          .map_err(classify)?;

        let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success()
        {   let body = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            return Err(Error::ApiError
            {   status: status.as_u16()
              , body
            });
        }

        response.text().await.map_err(classify)
    }
}
