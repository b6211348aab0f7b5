//! Top-level symbol discovery used to enrich prompts

use std::fmt;
use log::{debug, error};
use tree_sitter::{Language, Node, Parser, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo
{   pub name: String
  , /// Positional parameter names, in order
    pub args: Vec<String>
  , pub docstring: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo
{   pub name: String
  , pub methods: Vec<FunctionInfo>
  , pub docstring: Option<String>
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary
{   pub functions: Vec<FunctionInfo>
  , pub classes: Vec<ClassInfo>
}

impl SourceSummary
{   pub fn is_empty(&self) -> bool
    {   self.functions.is_empty() && self.classes.is_empty()
    }
}

impl fmt::Display for SourceSummary
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   if self.is_empty()
        {   return f.write_str("No public symbols detected.");
        }

        let mut lines = vec![];
        if !self.functions.is_empty()
        {   lines.push("Functions:".to_string());
            for func in &self.functions
            {   lines.push(format!(
                  "- {}({})", func.name, func.args.join(", ")
                ));
            }
        }
        if !self.classes.is_empty()
        {   lines.push("Classes:".to_string());
            for class in &self.classes
            {   let methods: Vec<&str> = class.methods
                  .iter()
                  .map(|m| m.name.as_str())
                  .collect();
                lines.push(format!(
                  "- {} (methods: {})", class.name, methods.join(", ")
                ));
            }
        }
        f.write_str(&lines.join("\n"))
    }
}

fn python_language() -> Language
{   tree_sitter_python::LANGUAGE.into()
}

/// Parse `source` as Python with error recovery. `None` only
/// when the parser itself could not be set up.
fn parse_python(source: &str) -> Option<Tree>
{   let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&python_language())
    {   error!("Failed to load Python grammar: {}", e);
        return None;
    }
    parser.parse(source, None)
}

/// Top-level plain `def` functions and classes of a Python
/// module. On a syntax error, whatever tree-sitter recovered
/// is returned.
pub fn analyze(source: &str) -> SourceSummary
{   let Some(tree) = parse_python(source)
    else
    {   return SourceSummary::default();
    };

    let src = source.as_bytes();
    let root = tree.root_node();
    let mut summary = SourceSummary::default();
    let mut cursor = root.walk();

    for node in root.named_children(&mut cursor)
    {   let node = unwrap_decorated(node);
        match node.kind()
        {   "function_definition" if !is_async(node) => {
              if let Some(func) = function_info(node, src)
              {   summary.functions.push(func);
              }
            }
          , "class_definition" => {
              if let Some(class) = class_info(node, src)
              {   summary.classes.push(class);
              }
            }
          , _ => {}
        }
    }

    debug!(
      "Analyzed source: {} functions, {} classes",
      summary.functions.len(),
      summary.classes.len()
    );
    summary
}

pub fn parse_functions(source: &str) -> Vec<FunctionInfo>
{   analyze(source).functions
}

pub fn parse_classes(source: &str) -> Vec<ClassInfo>
{   analyze(source).classes
}

/// Prompt-ready overview of a module's public surface
pub fn summarize_source(source: &str) -> String
{   analyze(source).to_string()
}

fn unwrap_decorated(node: Node<'_>) -> Node<'_>
{   if node.kind() == "decorated_definition"
    {   node.child_by_field_name("definition").unwrap_or(node)
    } else
    {   node
    }
}

fn is_async(node: Node<'_>) -> bool
{   node.child(0).is_some_and(|first| first.kind() == "async")
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> Option<&'a str>
{   node.utf8_text(src).ok()
}

fn function_info(node: Node<'_>, src: &[u8]) -> Option<FunctionInfo>
{   let name = text(node.child_by_field_name("name")?, src)?;
    let args = node.child_by_field_name("parameters")
      .map(|params| positional_args(params, src))
      .unwrap_or_default();
    let docstring = node.child_by_field_name("body")
      .and_then(|body| docstring(body, src));

    Some(FunctionInfo
    {   name: name.to_string()
      , args
      , docstring
    })
}

fn class_info(node: Node<'_>, src: &[u8]) -> Option<ClassInfo>
{   let name = text(node.child_by_field_name("name")?, src)?;
    let body = node.child_by_field_name("body");

    let mut methods = vec![];
    if let Some(body) = body
    {   let mut cursor = body.walk();
        for item in body.named_children(&mut cursor)
        {   let item = unwrap_decorated(item);
            if item.kind() == "function_definition" && !is_async(item)
            {   methods.extend(function_info(item, src));
            }
        }
    }

    Some(ClassInfo
    {   name: name.to_string()
      , methods
      , docstring: body.and_then(|b| docstring(b, src))
    })
}

// Names before `/` are positional-only and names after `*`,
// `*args` or `**kwargs` keyword-only; neither is listed.
fn positional_args(params: Node<'_>, src: &[u8]) -> Vec<String>
{   let mut args = vec![];
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor)
    {   let name_node = match param.kind()
        {   "identifier" => Some(param)
          , "default_parameter" | "typed_default_parameter" => {
              param.child_by_field_name("name")
            }
          , "typed_parameter" => match param.named_child(0)
            {   Some(inner) if is_splat(inner) => break
              , inner => inner.filter(|n| n.kind() == "identifier")
            }
          , "positional_separator" => {
              args.clear();
              None
            }
          , _ if is_splat(param) => break
          , _ => None
        };
        if let Some(name) = name_node.and_then(|n| text(n, src))
        {   args.push(name.to_string());
        }
    }
    args
}

fn is_splat(node: Node<'_>) -> bool
{   matches!(
      node.kind(),
      "list_splat_pattern"
        | "dictionary_splat_pattern"
        | "keyword_separator"
    )
}

/// Leading string literal of a body, decoded and cleaned the
/// way `inspect.cleandoc` does. Byte and f-strings do not count.
fn docstring(body: Node<'_>, src: &[u8]) -> Option<String>
{   let mut cursor = body.walk();
    let first = body.named_children(&mut cursor)
      .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement"
    {   return None;
    }
    let string = first.named_child(0)
      .filter(|n| n.kind() == "string")?;

    let start = string.named_child(0)
      .filter(|n| n.kind() == "string_start")?;
    let end = string.named_child(string.named_child_count() - 1)
      .filter(|n| n.kind() == "string_end")?;

    let prefix = text(start, src)?.to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f')
    {   return None;
    }

    let raw = std::str::from_utf8(
      src.get(start.end_byte()..end.start_byte())?
    ).ok()?;
    let decoded = if prefix.contains('r')
    {   raw.to_string()
    } else
    {   decode_escapes(raw)
    };
    Some(clean_doc(&decoded))
}

fn decode_escapes(raw: &str) -> String
{   let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next()
    {   if c != '\\'
        {   out.push(c);
            continue;
        }
        match chars.next()
        {   None => out.push('\\')
          , Some('\n') => {}
          , Some('\\') => out.push('\\')
          , Some('\'') => out.push('\'')
          , Some('"') => out.push('"')
          , Some('n') => out.push('\n')
          , Some('t') => out.push('\t')
          , Some('r') => out.push('\r')
          , Some('a') => out.push('\x07')
          , Some('b') => out.push('\x08')
          , Some('f') => out.push('\x0c')
          , Some('v') => out.push('\x0b')
          , Some(o @ '0'..='7') => {
              let mut value = o.to_digit(8).unwrap_or(0);
              for _ in 0..2
              {   match chars.peek().and_then(|d| d.to_digit(8))
                  {   Some(d) => {
                        value = value * 8 + d;
                        chars.next();
                      }
                    , None => break
                  }
              }
              out.extend(char::from_u32(value));
            }
          , Some(kind @ ('x' | 'u' | 'U')) => {
              let width = match kind
              {   'x' => 2
                , 'u' => 4
                , _ => 8
              };
              let digits: String = chars.clone().take(width).collect();
              match u32::from_str_radix(&digits, 16).ok()
                .filter(|_| digits.len() == width)
                .and_then(char::from_u32)
              {   Some(decoded) => {
                    out.push(decoded);
                    for _ in 0..width
                    {   chars.next();
                    }
                  }
                , None => {
                    out.push('\\');
                    out.push(kind);
                  }
              }
            }
          , Some(other) => {
              out.push('\\');
              out.push(other);
            }
        }
    }
    out
}

fn expand_tabs(line: &str) -> String
{   let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars()
    {   match c
        {   '\t' => {
              let pad = 8 - column % 8;
              out.extend(std::iter::repeat(' ').take(pad));
              column += pad;
            }
          , '\n' | '\r' => {
              out.push(c);
              column = 0;
            }
          , _ => {
              out.push(c);
              column += 1;
            }
        }
    }
    out
}

/// First line stripped, common indentation of the rest removed,
/// leading and trailing blank lines dropped
fn clean_doc(doc: &str) -> String
{   let expanded = expand_tabs(doc);
    let lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines.iter()
      .skip(1)
      .filter(|l| !l.trim_start().is_empty())
      .map(|l| l.len() - l.trim_start().len())
      .min()
      .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first()
    {   cleaned.push(first.trim_start());
    }
    for line in lines.iter().skip(1)
    {   cleaned.push(line.get(margin..).unwrap_or(""));
    }

    while cleaned.last().is_some_and(|l| l.is_empty())
    {   cleaned.pop();
    }
    let leading = cleaned.iter()
      .take_while(|l| l.is_empty())
      .count();
    cleaned[leading..].join("\n")
}

#[cfg(test)]
mod tests
{   use super::*;

    const SOURCE: &str = r#"
import math

def area(radius, scale=1.0):
    """Area of a circle."""
    return math.pi * radius ** 2 * scale

@functools.cache
def total(*items, strict=False):
    return sum(items)

class Shape:
    """Base shape."""

    def __init__(self, name: str):
        self.name = name

    @property
    def label(self):
        return self.name

def _helper(a, b: int = 2, *, flag):
    pass
"#;

    #[test]
    fn test_functions()
    {   let funcs = parse_functions(SOURCE);
        let names: Vec<&str>
          = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["area", "total", "_helper"]);
        assert_eq!(funcs[0].args, vec!["radius", "scale"]);
        assert_eq!(funcs[0].docstring.as_deref(), Some("Area of a circle."));
        assert!(funcs[1].args.is_empty());
        assert_eq!(funcs[2].args, vec!["a", "b"]);
    }

    #[test]
    fn test_classes()
    {   let classes = parse_classes(SOURCE);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Shape");
        assert_eq!(classes[0].docstring.as_deref(), Some("Base shape."));
        let methods: Vec<&str> = classes[0].methods
          .iter()
          .map(|m| m.name.as_str())
          .collect();
        assert_eq!(methods, vec!["__init__", "label"]);
        assert_eq!(classes[0].methods[0].args, vec!["self", "name"]);
    }

    #[test]
    fn test_async_functions_skipped()
    {   let source = "async def fetch(url):\n    pass\n\nclass Api:\n    async def get(self):\n        pass\n\n    def put(self, body):\n        pass\n";
        assert!(parse_functions(source).is_empty());
        let methods: Vec<String> = parse_classes(source)[0].methods
          .iter()
          .map(|m| m.name.clone())
          .collect();
        assert_eq!(methods, vec!["put"]);
    }

    #[test]
    fn test_positional_only_params_excluded()
    {   let funcs = parse_functions(
          "def h(a, /, b):\n    pass\n\ndef k(a, b=1, /, c=2, *args: int, d):\n    pass\n"
        );
        assert_eq!(funcs[0].args, vec!["b"]);
        assert_eq!(funcs[1].args, vec!["c"]);
    }

    #[test]
    fn test_docstring_escapes()
    {   let funcs = parse_functions(
          "def f():\n    \"One\\nTwo \\\"quoted\\\"\"\n\ndef g():\n    r\"\"\"Raw \\n kept\"\"\"\n\ndef h():\n    b\"bytes\"\n"
        );
        assert_eq!(
          funcs[0].docstring.as_deref(),
          Some("One\nTwo \"quoted\"")
        );
        assert_eq!(funcs[1].docstring.as_deref(), Some("Raw \\n kept"));
        assert_eq!(funcs[2].docstring, None);
    }

    #[test]
    fn test_docstring_indentation_cleaned()
    {   let source = "def f():\n    \"\"\"\n    Summary line.\n\n        Indented detail.\n    \"\"\"\n";
        assert_eq!(
          parse_functions(source)[0].docstring.as_deref(),
          Some("Summary line.\n\n    Indented detail.")
        );
        assert_eq!(clean_doc("  One.\n    Two.\n    Three.\n"), "One.\nTwo.\nThree.");
    }

    #[test]
    fn test_summary_text()
    {   let summary = summarize_source(
          "def f(x):\n    pass\n\nclass C:\n    def m(self):\n        pass\n"
        );
        assert_eq!(
          summary,
          "Functions:\n- f(x)\nClasses:\n- C (methods: m)"
        );
    }

    #[test]
    fn test_nothing_found()
    {   assert_eq!(
          summarize_source("x = 1\n"),
          "No public symbols detected."
        );
    }
}
