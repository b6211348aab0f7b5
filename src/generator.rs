//! Test generation: prompt, API call, block extraction,
//! syntax check and fallback

use std::path::{Path, PathBuf};
use log::{debug, info, warn};

use crate::analyzer::summarize_source;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::extract::extract_code_blocks;
use crate::files::write_file;
use crate::prompt::build_prompt_with_summary;
use crate::request::{Framework, GenerationRequest};
use crate::retry::{Sleeper, TokioSleeper};
use crate::syntax::is_valid_source;
use crate::transport::{HttpTransport, Transport};

/// First line of a module that did not pass the syntax check
pub const FALLBACK_MARKER: &str = "# Generated tests (raw)";

/// Fence tag of the blocks taken from a response
pub const TARGET_LANGUAGE: &str = "python";

/// A finished test module and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTestModule
{   pub path: PathBuf
  , pub content: String
}

impl GeneratedTestModule
{   pub fn save(&self, overwrite: bool) -> Result<()>
    {   write_file(&self.path, &self.content, overwrite)
    }
}

/// Turn a raw model response into a test module: first python
/// block if any, else the whole response; marked with
/// `FALLBACK_MARKER` when it does not parse.
pub fn finalize_response(raw: &str) -> String
{   let blocks = extract_code_blocks(raw, TARGET_LANGUAGE);
    debug!("Extracted {} code blocks", blocks.len());

    let candidate = match blocks.into_iter().next()
    {   Some(block) => block
      , None => {
          debug!("No {} block found, using raw response", TARGET_LANGUAGE);
          raw.to_string()
        }
    };

    if is_valid_source(&candidate)
    {   candidate
    } else
    {   warn!("Generated code failed syntax check, keeping raw output");
        format!("{}\n{}", FALLBACK_MARKER, candidate)
    }
}

pub struct TestGenerator<T = HttpTransport, S = TokioSleeper>
{   client: ApiClient<T, S>
  , summarize: bool
}

impl TestGenerator
{   /// Generator over a fresh HTTP client
    pub fn from_config(config: ClientConfig) -> Result<Self>
    {   Ok(TestGenerator::new(ApiClient::new(config)?))
    }
}

impl<T, S> TestGenerator<T, S>
where
  T: Transport
, S: Sleeper
{   pub fn new(client: ApiClient<T, S>) -> Self
    {   TestGenerator
        {   client
          , summarize: false
        }
    }

    /// Add a function/class overview of the source to prompts
    pub fn with_source_summary(mut self, summarize: bool) -> Self
    {   self.summarize = summarize;
        self
    }

    pub fn client(&self) -> &ApiClient<T, S>
    {   &self.client
    }

    pub fn prompt_for(&self, request: &GenerationRequest) -> String
    {   let summary = self.summarize
          .then(|| summarize_source(&request.source_code));
        build_prompt_with_summary(
          &request.source_code
        , request.specs.as_deref()
        , &request.framework
        , summary.as_deref()
        )
    }

    /// Generate a test module. API failures propagate unchanged;
    /// invalid generated syntax does not fail the call.
    pub async fn generate(&self, request: &GenerationRequest)
      -> Result<String>
    {   info!("Generating {} tests", request.framework);
        let prompt = self.prompt_for(request);
        let raw = self.client.generate_text(&prompt, None, None).await?;
        Ok(finalize_response(&raw))
    }

    pub async fn generate_tests(
      &self
    , code: &str
    , specs: Option<&str>
    , framework: &str
    ) -> Result<String>
    {   let request = GenerationRequest::new(
          code, specs.map(str::to_string), framework
        );
        self.generate(&request).await
    }

    /// Generate and write to `output_path`. `framework` defaults
    /// to pytest.
    pub async fn generate_and_save(
      &self
    , code: &str
    , output_path: impl AsRef<Path>
    , specs: Option<&str>
    , framework: Option<&str>
    , overwrite: bool
    ) -> Result<PathBuf>
    {   let framework = framework
          .unwrap_or(Framework::default().as_str());
        let content = self.generate_tests(code, specs, framework).await?;

        let module = GeneratedTestModule
        {   path: output_path.as_ref().to_path_buf()
          , content
        };
        module.save(overwrite)?;
        info!("Generated tests written to {}", module.path.display());
        Ok(module.path)
    }

    pub fn close(self)
    {   self.client.close()
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_single_block_taken_verbatim()
    {   let raw = "Sure!\n```python\ndef test_a():\n    assert 1 == 1\n```\nDone.";
        assert_eq!(
          finalize_response(raw),
          "def test_a():\n    assert 1 == 1"
        );
    }

    #[test]
    fn test_first_of_several_blocks()
    {   let raw = "```python\nx = 1\n```\n```python\ny = 2\n```";
        assert_eq!(finalize_response(raw), "x = 1");
    }

    #[test]
    fn test_raw_response_used_without_blocks()
    {   let raw = "import unittest\n\nclass T(unittest.TestCase):\n    pass\n";
        assert_eq!(finalize_response(raw), raw);
    }

    #[test]
    fn test_invalid_candidate_wrapped()
    {   let out = finalize_response("```python\ndef f(:\n```");
        assert_eq!(out, format!("{}\ndef f(:", FALLBACK_MARKER));

        let prose = "I cannot write tests for this (sorry";
        let out = finalize_response(prose);
        assert!(out.starts_with(FALLBACK_MARKER));
        assert!(out.ends_with(prose));
    }

    #[test]
    fn test_indentation_error_wrapped()
    {   let out = finalize_response(
          "```python\ndef test_a():\nassert True\n```"
        );
        assert_eq!(
          out,
          format!("{}\ndef test_a():\nassert True", FALLBACK_MARKER)
        );

        let out = finalize_response("```python\nx = 1\n  y = 2\n```");
        assert!(out.starts_with(FALLBACK_MARKER));
    }
}
