//! Prompt assembly for test generation

pub const SYSTEM_INSTRUCTIONS: &str
  = "You are an expert software engineer and test writer. \
     Generate high-quality, minimal, and maintainable unit tests. \
     Cover normal cases, edge cases, and error handling.";

pub const OUTPUT_DIRECTIVE: &str
  = "Output ONLY a Python test module. Do not include explanations. \
     If you include Markdown, wrap all code in a single ```python block.";

/// Build the generation prompt. Sections, in order: system
/// instructions, framework directive, specs (only when `specs`
/// has non-blank text), the code under test in a fenced block,
/// then the output directive. Same inputs, same bytes.
pub fn build_prompt(
  code: &str
, specs: Option<&str>
, framework: &str
) -> String
{   build_prompt_with_summary(code, specs, framework, None)
}

/// `build_prompt` plus an optional source overview section
/// between the specs and the code block
pub fn build_prompt_with_summary(
  code: &str
, specs: Option<&str>
, framework: &str
, summary: Option<&str>
) -> String
{   let mut prompt = String::with_capacity(
      code.len() + specs.map_or(0, str::len) + 512
    );

    prompt.push_str("System: ");
    prompt.push_str(SYSTEM_INSTRUCTIONS);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
      "Please write tests using {}. \
       If fixtures are helpful, add small inline fixtures.\n",
      framework
    ));

    if let Some(specs) = specs.filter(|s| !s.trim().is_empty())
    {   prompt.push_str("Specifications:\n");
        prompt.push_str(specs);
        prompt.push_str("\n\n");
    }

    if let Some(summary) = summary.filter(|s| !s.trim().is_empty())
    {   prompt.push_str("Source overview:\n");
        prompt.push_str(summary);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Code under test:\n```python\n");
    prompt.push_str(code);
    prompt.push_str("\n```\n\n");

    prompt.push_str(OUTPUT_DIRECTIVE);
    prompt.push('\n');
    prompt
}
