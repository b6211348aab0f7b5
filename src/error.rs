use std::fmt;
use std::path::PathBuf;

/// Error type for every testgen operation
/// Implements Clone so a recorded attempt failure can be
/// handed back unchanged after retries run out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Missing credential or out-of-range setting
    InvalidConfiguration(String)
  , /// Request did not complete within the per-attempt timeout
    Timeout
  , /// Connection-level failure (DNS, refused, reset, ...)
    HttpError(String)
  , /// API answered with a non-2xx status
    ApiError
    {   status: u16
      , body: String
    }
  , /// A 2xx body that does not match the chat completion schema
    MalformedResponse(String)
  , /// Retry loop ended without a recorded failure
    RetriesExhausted(usize)
  , /// Input file does not exist
    FileNotFound(PathBuf)
  , /// Output file exists and overwrite was not requested
    FileExists(PathBuf)
  , /// Any other filesystem failure
    Io(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Faults worth another attempt: timeouts, dropped
    /// connections and non-2xx answers
    pub fn is_transient(&self) -> bool
    {   matches!(
          self,
          Error::Timeout
            | Error::HttpError(_)
            | Error::ApiError { .. }
        )
    }

    pub fn is_config(&self) -> bool
    {   matches!(self, Error::InvalidConfiguration(_))
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, body } => {
              write!(f, "API error ({}): {}", status, body)
            }
          , Error::MalformedResponse(msg) => {
              write!(f, "Unexpected API response format: {}", msg)
            }
          , Error::RetriesExhausted(attempts) => {
              write!(f,
                "Failed to get response after all retries ({} attempts)",
                attempts
              )
            }
          , Error::FileNotFound(path) => {
              write!(f, "File not found: {}", path.display())
            }
          , Error::FileExists(path) => {
              write!(f, "File already exists: {}", path.display())
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
