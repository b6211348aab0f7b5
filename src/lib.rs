pub mod error;
pub mod config;
pub mod request;
pub mod retry;
pub mod transport;
pub mod client;
pub mod prompt;
pub mod extract;
pub mod syntax;
pub mod analyzer;
pub mod files;
pub mod generator;

/*

testgen: write a Python unit test module for a source file by
asking a chat-completions LLM API, then cleaning up the answer.

  source + specs + framework
        │
        ▼
  prompt.rs      build_prompt (pure, deterministic)
        │
        ▼
  client.rs      generate_text: POST {base}/chat/completions,
        │        retry transient faults with 1s, 2s, 4s, ... backoff
        ▼
  extract.rs     extract_code_blocks (```python fences)
        │
        ▼
  syntax.rs      is_valid_source (rustpython parser)
        │
        ▼
  generator.rs   first block or raw text, fallback marker when
                 invalid, optional write to disk

*/

pub use error::{Error, Result};
pub use config::ClientConfig;
pub use request::{
  ChatMessage, ChatRequest, ChatResponse, Framework, GenerationRequest
};
pub use retry::{RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, Transport};
pub use client::ApiClient;
pub use prompt::{build_prompt, build_prompt_with_summary};
pub use extract::extract_code_blocks;
pub use syntax::is_valid_source;
pub use analyzer::summarize_source;
pub use files::{read_file, write_file};
pub use generator::{
  finalize_response, GeneratedTestModule, TestGenerator, FALLBACK_MARKER
};
