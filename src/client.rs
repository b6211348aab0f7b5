//! Chat completions client with retry and exponential backoff

use log::{debug, error, trace, warn};

use crate::config::{self, ClientConfig};
use crate::error::{Error, Result};
use crate::files::truncate;
use crate::request::{ChatMessage, ChatRequest, ChatResponse};
use crate::retry::{RetryPolicy, RetryState, Sleeper, TokioSleeper};
use crate::transport::{HttpTransport, Transport};

/// Client for an OpenAI-compatible `/chat/completions` API.
///
/// Owns its transport (and so its connection pool) for its
/// whole lifetime. Not meant for overlapping requests from
/// several tasks; give each concurrent caller its own client.
pub struct ApiClient<T = HttpTransport, S = TokioSleeper>
{   config: ClientConfig
  , policy: RetryPolicy
  , transport: T
  , sleeper: S
}

impl ApiClient
{   /// Client over HTTP with a 30s per-attempt timeout and the
    /// default retry policy
    pub fn new(config: ClientConfig) -> Result<Self>
    {   debug!("Creating ApiClient for model {}", config.model());
        let transport = HttpTransport::new()?;
        Ok(ApiClient::with_transport_and_sleeper(
          config, transport, TokioSleeper
        ))
    }
}

impl<T, S> ApiClient<T, S>
where
  T: Transport
, S: Sleeper
{   pub fn with_transport_and_sleeper(
      config: ClientConfig
    , transport: T
    , sleeper: S
    ) -> Self
    {   ApiClient
        {   config
          , policy: RetryPolicy::default()
          , transport
          , sleeper
        }
    }

    /// Set the attempt budget; at least one attempt is required
    pub fn with_max_retries(self, max_retries: usize)
      -> Result<Self>
    {   let policy = RetryPolicy
        {   max_retries
          , ..self.policy.clone()
        };
        self.with_retry_policy(policy)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy)
      -> Result<Self>
    {   if policy.max_retries < 1
        {   return Err(Error::InvalidConfiguration(
              "max_retries must be at least 1".to_string()
            ));
        }
        self.policy = policy;
        Ok(self)
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy
    {   &self.policy
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    pub fn sleeper(&self) -> &S
    {   &self.sleeper
    }

    /// Wire payload for `prompt`; absent overrides fall back to
    /// the config defaults
    pub fn build_payload(
      &self
    , prompt: &str
    , max_tokens: Option<u32>
    , temperature: Option<f32>
    ) -> Result<ChatRequest>
    {   let max_tokens
          = max_tokens.unwrap_or(self.config.max_tokens());
        let temperature
          = temperature.unwrap_or(self.config.temperature());
        config::validate_max_tokens(max_tokens)?;
        config::validate_temperature(temperature)?;

        Ok(ChatRequest
        {   model: self.config.model().to_string()
          , messages: vec![ChatMessage::user(prompt)]
          , max_tokens
          , temperature
          , top_p: self.config.top_p()
        })
    }

    /// Send `prompt` and return the first choice's content.
    ///
    /// Transient faults are retried up to the policy's budget;
    /// the last one is returned once the budget is spent.
    /// A malformed 2xx body fails at once.
    pub async fn generate_text(
      &self
    , prompt: &str
    , max_tokens: Option<u32>
    , temperature: Option<f32>
    ) -> Result<String>
    {   let payload
          = self.build_payload(prompt, max_tokens, temperature)?;
        self.make_request(&payload).await
    }

    async fn make_request(&self, payload: &ChatRequest)
      -> Result<String>
    {   let url = self.config.completions_url();
        let max = self.policy.max_retries;

        let mut state = RetryState::start();
        let mut body = None;
        let mut last_error = None;

        while let RetryState::Attempting(attempt) = state
        {   debug!("API request attempt {}/{}", attempt + 1, max);

            match self.transport
              .post_chat(&url, self.config.api_key(), payload)
              .await
            {   Ok(text) => {
                  trace!(
                    "Raw response: {}",
                    truncate(&text, 200, "...")
                  );
                  body = Some(text);
                  state = state.succeed();
                }
              , Err(e) if e.is_transient() => {
                  if e == Error::Timeout
                  {   warn!("Request timeout on attempt {}", attempt + 1);
                  } else
                  {   error!("API request failed: {}", e);
                  }
                  let (next, delay) = state.fail(&self.policy);
                  if let Some(delay) = delay
                  {   debug!("Retrying in {:?}", delay);
                      self.sleeper.sleep(delay).await;
                  }
                  last_error = Some(e);
                  state = next;
                }
              , Err(e) => {
                  error!("API request failed permanently: {}", e);
                  return Err(e);
                }
            }
        }

        match (state, body)
        {   (RetryState::Succeeded, Some(text)) => {
              ChatResponse::first_content(&text).map_err(|e| {
                error!("{}", e);
                e
              })
            }
          , _ => Err(last_error
              .unwrap_or(Error::RetriesExhausted(max)))
        }
    }

    /// Release the transport and its connection pool
    pub fn close(self)
    {   debug!("Closing ApiClient");
        drop(self);
    }
}
