//! Retry policy, retry state machine and the sleep seam used
//! between attempts

use std::time::Duration;
use async_trait::async_trait;
use log::debug;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

/// Retry policy for transient request failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub backoff_multiplier: f64
  , pub initial_backoff: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_retries: usize
    , backoff_multiplier: f64
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_retries
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
        }
    }

    /// Default doubling policy with a custom attempt budget
    pub fn with_max_retries(max_retries: usize) -> Self
    {   RetryPolicy
        {   max_retries
          , ..RetryPolicy::default()
        }
    }

    /// Delay after the failed 0-indexed `attempt`:
    /// `initial * multiplier^attempt`, uncapped, no jitter
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   let multiplier
          = self.backoff_multiplier.powi(attempt as i32);
        let millis
          = self.initial_backoff.as_millis() as f64 * multiplier;
        debug!(
          "Backoff for attempt {} is {:.0}ms", attempt, millis
        );
        // float-to-int casts saturate
        Duration::from_millis(millis as u64)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(
          DEFAULT_MAX_RETRIES
        , DEFAULT_BACKOFF_MULTIPLIER
        , DEFAULT_INITIAL_BACKOFF_MS
        )
    }
}

/// Where a retry loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState
{   /// About to run the 0-indexed attempt
    Attempting(usize)
  , Succeeded
  , ExhaustedFailed
}

impl RetryState
{   pub fn start() -> Self
    {   RetryState::Attempting(0)
    }

    pub fn is_terminal(&self) -> bool
    {   !matches!(self, RetryState::Attempting(_))
    }

    pub fn succeed(self) -> Self
    {   RetryState::Succeeded
    }

    /// Transition after a transient failure. Returns the next
    /// state and, when another attempt follows, how long to
    /// wait before it.
    pub fn fail(self, policy: &RetryPolicy)
      -> (RetryState, Option<Duration>)
    {   match self
        {   RetryState::Attempting(attempt)
              if attempt + 1 < policy.max_retries => {
              ( RetryState::Attempting(attempt + 1)
              , Some(policy.backoff_for_attempt(attempt))
              )
            }
          , RetryState::Attempting(_) => {
              (RetryState::ExhaustedFailed, None)
            }
          , terminal => (terminal, None)
        }
    }
}

/// Blocks the current task between attempts
#[async_trait]
pub trait Sleeper: Send + Sync
{   async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper
{   async fn sleep(&self, duration: Duration)
    {   tokio::time::sleep(duration).await
    }
}
