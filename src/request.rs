//! Request and response types for test generation and the
//! chat completions wire format

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Test framework the generated module should target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework
{   #[default]
    Pytest
  , Unittest
}

impl Framework
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Framework::Pytest => "pytest"
          , Framework::Unittest => "unittest"
        }
    }
}

impl fmt::Display for Framework
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl FromStr for Framework
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "pytest" => Ok(Framework::Pytest)
          , "unittest" => Ok(Framework::Unittest)
          , other => Err(Error::InvalidConfiguration(
              format!("Unsupported test framework: {}", other)
            ))
        }
    }
}

/// One test generation job. Built per invocation and
/// consumed by prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest
{   pub source_code: String
  , pub specs: Option<String>
  , pub framework: String
}

impl GenerationRequest
{   pub fn new(
      source_code: impl Into<String>
    , specs: Option<String>
    , framework: impl Into<String>
    ) -> Self
    {   GenerationRequest
        {   source_code: source_code.into()
          , specs
          , framework: framework.into()
        }
    }
}

// ===== Wire Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.into()
        }
    }
}

/// Body of `POST {base}/chat/completions`. The same value is
/// resent verbatim on every retry attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

impl ChatResponse
{   /// Validate a raw 2xx body against the expected schema
    /// and return `choices[0].message.content`
    pub fn first_content(body: &str) -> Result<String>
    {   let parsed: ChatResponse = serde_json::from_str(body)
          .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let choice = parsed.choices.into_iter().next()
          .ok_or_else(|| Error::MalformedResponse(
            "response contained no choices".to_string()
          ))?;

        choice.message.content.ok_or_else(|| {
          Error::MalformedResponse(
            "first choice has no message content".to_string()
          )
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_framework_parse()
    {   assert_eq!(
          "pytest".parse::<Framework>().unwrap(),
          Framework::Pytest
        );
        assert_eq!(
          "UnitTest".parse::<Framework>().unwrap(),
          Framework::Unittest
        );
        assert!("nose".parse::<Framework>().is_err());
        assert_eq!(Framework::default().to_string(), "pytest");
    }

    #[test]
    fn test_request_serializes_wire_names()
    {   let req = ChatRequest
        {   model: "deepseek-coder".to_string()
          , messages: vec![ChatMessage::user("hi")]
          , max_tokens: 64
          , temperature: 0.5
          , top_p: 1.0
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["model"], "deepseek-coder");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["max_tokens"], 64);
        assert_eq!(value["top_p"], 1.0);
    }

    #[test]
    fn test_first_content()
    {   let body = r#"{"id":"x","choices":[
          {"index":0,"message":{"role":"assistant","content":"ok"},
           "finish_reason":"stop"}
        ]}"#;
        assert_eq!(ChatResponse::first_content(body).unwrap(), "ok");
    }

    #[test]
    fn test_malformed_shapes()
    {   for body in [
          r#"{"choices":[]}"#
        , r#"{"result":"ok"}"#
        , r#"{"choices":[{"message":{"role":"assistant"}}]}"#
        , r#"{"choices":[{"text":"ok"}]}"#
        , "not json"
        ]
        {   match ChatResponse::first_content(body)
            {   Err(Error::MalformedResponse(_)) => {}
              , other => panic!("{} gave {:?}", body, other)
            }
        }
    }
}
