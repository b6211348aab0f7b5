//! Client configuration and its validation gate

use std::fmt;
use std::path::Path;
use serde::Serialize;
use log::debug;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str
  = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-coder";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.95;

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_API_URL: &str = "DEEPSEEK_API_URL";
pub const ENV_MODEL: &str = "DEEPSEEK_MODEL";
pub const ENV_MAX_TOKENS: &str = "MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "TEMPERATURE";
pub const ENV_TOP_P: &str = "TOP_P";

/// Credential, endpoint and generation defaults shared by
/// every request a client issues. Only constructible through
/// `ClientConfig::new`, so a value in hand is always valid.
#[derive(Clone, PartialEq)]
pub struct ClientConfig
{   api_key: String
  , base_url: String
  , model: String
  , max_tokens: u32
  , temperature: f32
  , top_p: f32
}

/// Redacted view of a config, safe to log
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary
{   pub base_url: String
  , pub model: String
  , pub max_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
}

impl ClientConfig
{   pub fn new(
      api_key: impl Into<String>
    , base_url: impl Into<String>
    , model: impl Into<String>
    , max_tokens: u32
    , temperature: f32
    , top_p: f32
    ) -> Result<Self>
    {   let api_key = api_key.into();
        if api_key.trim().is_empty()
        {   return Err(Error::InvalidConfiguration(format!(
              "{} is required. Please set it in your .env file.",
              ENV_API_KEY
            )));
        }

        let base_url = base_url.into()
          .trim()
          .trim_end_matches('/')
          .to_string();
        if base_url.is_empty()
        {   return Err(Error::InvalidConfiguration(
              format!("{} is required", ENV_API_URL)
            ));
        }

        let model = model.into();
        if model.trim().is_empty()
        {   return Err(Error::InvalidConfiguration(
              format!("{} must not be empty", ENV_MODEL)
            ));
        }

        validate_max_tokens(max_tokens)?;
        validate_temperature(temperature)?;
        validate_top_p(top_p)?;

        Ok(ClientConfig
        {   api_key
          , base_url
          , model
          , max_tokens
          , temperature
          , top_p
        })
    }

    /// Config with the default endpoint, model and sampling
    pub fn with_api_key(api_key: impl Into<String>)
      -> Result<Self>
    {   ClientConfig::new(
          api_key
        , DEFAULT_API_BASE
        , DEFAULT_MODEL
        , DEFAULT_MAX_TOKENS
        , DEFAULT_TEMPERATURE
        , DEFAULT_TOP_P
        )
    }

    /// Load a `.env` file into the process environment.
    /// A missing file is not an error.
    pub fn load_dotenv(path: impl AsRef<Path>)
    {   let path = path.as_ref();
        match dotenvy::from_path(path)
        {   Ok(()) => debug!("Loaded env file {}", path.display())
          , Err(e) => debug!(
              "Env file {} not loaded: {}",
              path.display(),
              e
            )
        }
    }

    /// Build from process environment variables
    pub fn from_env() -> Result<Self>
    {   ClientConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back
    /// to defaults, except the API key which is required
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
      F: Fn(&str) -> Option<String>
    {   let api_key = lookup(ENV_API_KEY).unwrap_or_default();
        let base_url = lookup(ENV_API_URL)
          .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = lookup(ENV_MODEL)
          .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_tokens = parse_var(
          &lookup, ENV_MAX_TOKENS, DEFAULT_MAX_TOKENS
        )?;
        let temperature = parse_var(
          &lookup, ENV_TEMPERATURE, DEFAULT_TEMPERATURE
        )?;
        let top_p = parse_var(&lookup, ENV_TOP_P, DEFAULT_TOP_P)?;

        ClientConfig::new(
          api_key, base_url, model, max_tokens, temperature, top_p
        )
    }

    pub fn api_key(&self) -> &str
    {   &self.api_key
    }

    pub fn base_url(&self) -> &str
    {   &self.base_url
    }

    pub fn model(&self) -> &str
    {   &self.model
    }

    pub fn max_tokens(&self) -> u32
    {   self.max_tokens
    }

    pub fn temperature(&self) -> f32
    {   self.temperature
    }

    pub fn top_p(&self) -> f32
    {   self.top_p
    }

    pub fn completions_url(&self) -> String
    {   format!("{}/chat/completions", self.base_url)
    }

    pub fn summary(&self) -> ConfigSummary
    {   ConfigSummary
        {   base_url: self.base_url.clone()
          , model: self.model.clone()
          , max_tokens: self.max_tokens
          , temperature: self.temperature
          , top_p: self.top_p
        }
    }
}

impl fmt::Debug for ClientConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ClientConfig")
          .field("api_key", &"***")
          .field("base_url", &self.base_url)
          .field("model", &self.model)
          .field("max_tokens", &self.max_tokens)
          .field("temperature", &self.temperature)
          .field("top_p", &self.top_p)
          .finish()
    }
}

pub(crate) fn validate_max_tokens(max_tokens: u32) -> Result<()>
{   if max_tokens < 1
    {   return Err(Error::InvalidConfiguration(
          format!("{} must be greater than 0", ENV_MAX_TOKENS)
        ));
    }
    Ok(())
}

// NaN fails both range checks
pub(crate) fn validate_temperature(temperature: f32) -> Result<()>
{   if !(0.0..=2.0).contains(&temperature)
    {   return Err(Error::InvalidConfiguration(format!(
          "{} must be between 0 and 2, got {}",
          ENV_TEMPERATURE,
          temperature
        )));
    }
    Ok(())
}

pub(crate) fn validate_top_p(top_p: f32) -> Result<()>
{   if !(0.0..=1.0).contains(&top_p)
    {   return Err(Error::InvalidConfiguration(format!(
          "{} must be between 0 and 1, got {}",
          ENV_TOP_P,
          top_p
        )));
    }
    Ok(())
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
  F: Fn(&str) -> Option<String>
, T: std::str::FromStr
{   match lookup(key)
    {   None => Ok(default)
      , Some(raw) => raw.trim().parse::<T>().map_err(|_| {
          Error::InvalidConfiguration(
            format!("{} is not a valid number: {:?}", key, raw)
          )
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)])
      -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = pairs
          .iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn build(temperature: f32) -> Result<ClientConfig>
    {   ClientConfig::new(
          "test-key", DEFAULT_API_BASE, DEFAULT_MODEL,
          DEFAULT_MAX_TOKENS, temperature, DEFAULT_TOP_P
        )
    }

    #[test]
    fn test_empty_key_rejected()
    {   let err = ClientConfig::with_api_key("").unwrap_err();
        assert!(err.is_config());
        assert!(ClientConfig::with_api_key("   ").is_err());
    }

    #[test]
    fn test_temperature_range()
    {   assert!(build(1.0).is_ok());
        assert!(build(0.0).is_ok());
        assert!(build(2.0).is_ok());
        assert!(build(2.5).is_err());
        assert!(build(-0.1).is_err());
        assert!(build(f32::NAN).is_err());
    }

    #[test]
    fn test_top_p_and_max_tokens_range()
    {   assert!(ClientConfig::new(
          "k", DEFAULT_API_BASE, DEFAULT_MODEL, 0, 0.7, 0.9
        ).is_err());
        assert!(ClientConfig::new(
          "k", DEFAULT_API_BASE, DEFAULT_MODEL, 1, 0.7, 1.5
        ).is_err());
        assert!(ClientConfig::new(
          "k", DEFAULT_API_BASE, DEFAULT_MODEL, 1, 0.7, 1.0
        ).is_ok());
    }

    #[test]
    fn test_trailing_slash_stripped()
    {   let cfg = ClientConfig::new(
          "k", "http://localhost:8080/v1/", "m", 16, 0.5, 0.5
        ).unwrap();
        assert_eq!(
          cfg.completions_url(),
          "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_lookup_defaults()
    {   let cfg = ClientConfig::from_lookup(
          lookup_from(&[(ENV_API_KEY, "abc")])
        ).unwrap();
        assert_eq!(cfg.api_key(), "abc");
        assert_eq!(cfg.base_url(), DEFAULT_API_BASE);
        assert_eq!(cfg.model(), DEFAULT_MODEL);
        assert_eq!(cfg.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(cfg.top_p(), DEFAULT_TOP_P);
    }

    #[test]
    fn test_from_lookup_requires_key()
    {   let err = ClientConfig::from_lookup(lookup_from(&[]))
          .unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn test_from_lookup_bad_number()
    {   let err = ClientConfig::from_lookup(lookup_from(&[
          (ENV_API_KEY, "abc")
        , (ENV_TEMPERATURE, "warm")
        ])).unwrap_err();
        assert!(err.is_config());

        let err = ClientConfig::from_lookup(lookup_from(&[
          (ENV_API_KEY, "abc")
        , (ENV_TEMPERATURE, "2.5")
        ])).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_debug_hides_key()
    {   let cfg = ClientConfig::with_api_key("sk-secret").unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("***"));
    }
}
