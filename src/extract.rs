//! Fenced code block extraction from model responses

pub const FENCE: &str = "```";

/// Collect the bodies of fenced blocks tagged `language`, in
/// document order.
///
/// A block opens on a line starting with the fence immediately
/// followed by `language` and closes on a line holding only the
/// fence. A block left open at the end of `text` is dropped, as
/// is a block with no lines. An opening line seen inside an open
/// block restarts it.
pub fn extract_code_blocks(text: &str, language: &str) -> Vec<String>
{   let opener = format!("{}{}", FENCE, language);
    let mut blocks = vec![];
    let mut current: Option<Vec<&str>> = None;

    for line in text.split('\n')
    {   let is_open = line.starts_with(&opener);
        let is_close
          = line.trim_end_matches(['\r', ' ', '\t']) == FENCE;

        current = match current.take()
        {   None if is_open => Some(vec![])
          , None => None
          , Some(lines) if is_close => {
              if !lines.is_empty()
              {   blocks.push(lines.join("\n"));
              }
              None
            }
          , Some(_) if is_open => Some(vec![])
          , Some(mut lines) => {
              lines.push(line);
              Some(lines)
            }
        };
    }

    blocks
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_two_blocks_in_order()
    {   let text = "```python\nprint(1)\n```\nmore\n```python\nx=1\n```";
        assert_eq!(
          extract_code_blocks(text, "python"),
          vec!["print(1)".to_string(), "x=1".to_string()]
        );
    }

    #[test]
    fn test_surrounding_prose_and_multiline_body()
    {   let text = "Here is code:\n```python\nimport os\n\ndef test_a():\n    assert True\n```\nAnd more.\n";
        assert_eq!(
          extract_code_blocks(text, "python"),
          vec!["import os\n\ndef test_a():\n    assert True".to_string()]
        );
    }

    #[test]
    fn test_other_language_ignored()
    {   let text = "```rust\nfn main() {}\n```\n```\nplain\n```";
        assert!(extract_code_blocks(text, "python").is_empty());
        assert!(extract_code_blocks("no fences at all", "python").is_empty());
    }

    #[test]
    fn test_unclosed_block_dropped()
    {   let text = "```python\nx = 1\n```\n```python\ny = 2\n";
        assert_eq!(extract_code_blocks(text, "python"), vec!["x = 1".to_string()]);
    }

    #[test]
    fn test_crlf_closing_fence()
    {   let text = "```python\r\nx = 1\r\n```\r\n";
        assert_eq!(
          extract_code_blocks(text, "python"),
          vec!["x = 1\r".to_string()]
        );
    }

    #[test]
    fn test_empty_block_dropped()
    {   assert!(extract_code_blocks("```python\n```", "python").is_empty());
    }

    #[test]
    fn test_untagged_fences_with_empty_language()
    {   let text = "```\na\n```\n```\nb\n```";
        assert_eq!(
          extract_code_blocks(text, ""),
          vec!["a".to_string(), "b".to_string()]
        );
    }
}
