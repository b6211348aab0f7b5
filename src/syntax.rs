//! Python syntax checks backed by the rustpython parser

use log::debug;
use rustpython_parser::{ast, Parse};

/// True iff `text` is a Python module `compile` would accept:
/// it parses, and no `break`/`continue` sits outside a loop and
/// no `return` outside a function. Never panics on malformed
/// input.
pub fn is_valid_source(text: &str) -> bool
{   let suite = match ast::Suite::parse(text, "<string>")
    {   Ok(suite) => suite
      , Err(e) => {
          debug!("Syntax check failed: {}", e);
          return false;
        }
    };

    match misplaced_statement(&suite, Scope::default())
    {   Some(reason) => {
          debug!("Syntax check failed: {}", reason);
          false
        }
      , None => true
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope
{   in_loop: bool
  , in_function: bool
}

fn misplaced_statement(body: &[ast::Stmt], scope: Scope)
  -> Option<&'static str>
{   body.iter().find_map(|stmt| misplaced_in(stmt, scope))
}

fn misplaced_in(stmt: &ast::Stmt, scope: Scope)
  -> Option<&'static str>
{   use ast::Stmt;

    let looping = Scope { in_loop: true, ..scope };
    let function = Scope { in_loop: false, in_function: true };

    match stmt
    {   Stmt::Break(_) if !scope.in_loop => {
          Some("'break' outside loop")
        }
      , Stmt::Continue(_) if !scope.in_loop => {
          Some("'continue' not properly in loop")
        }
      , Stmt::Return(_) if !scope.in_function => {
          Some("'return' outside function")
        }
      , Stmt::FunctionDef(def) => {
          misplaced_statement(&def.body, function)
        }
      , Stmt::AsyncFunctionDef(def) => {
          misplaced_statement(&def.body, function)
        }
      , Stmt::ClassDef(def) => {
          misplaced_statement(&def.body, Scope::default())
        }
      // `else` of a loop runs outside it
      , Stmt::For(s) => misplaced_statement(&s.body, looping)
          .or_else(|| misplaced_statement(&s.orelse, scope))
      , Stmt::AsyncFor(s) => misplaced_statement(&s.body, looping)
          .or_else(|| misplaced_statement(&s.orelse, scope))
      , Stmt::While(s) => misplaced_statement(&s.body, looping)
          .or_else(|| misplaced_statement(&s.orelse, scope))
      , Stmt::If(s) => misplaced_statement(&s.body, scope)
          .or_else(|| misplaced_statement(&s.orelse, scope))
      , Stmt::With(s) => misplaced_statement(&s.body, scope)
      , Stmt::AsyncWith(s) => misplaced_statement(&s.body, scope)
      , Stmt::Match(s) => s.cases
          .iter()
          .find_map(|case| misplaced_statement(&case.body, scope))
      , Stmt::Try(s) => misplaced_in_try(
          &s.body, &s.handlers, &s.orelse, &s.finalbody, scope
        )
      , Stmt::TryStar(s) => misplaced_in_try(
          &s.body, &s.handlers, &s.orelse, &s.finalbody, scope
        )
      , _ => None
    }
}

fn misplaced_in_try(
  body: &[ast::Stmt]
, handlers: &[ast::ExceptHandler]
, orelse: &[ast::Stmt]
, finalbody: &[ast::Stmt]
, scope: Scope
) -> Option<&'static str>
{   misplaced_statement(body, scope)
      .or_else(|| handlers.iter().find_map(|handler| match handler
      {   ast::ExceptHandler::ExceptHandler(h) => {
            misplaced_statement(&h.body, scope)
          }
      }))
      .or_else(|| misplaced_statement(orelse, scope))
      .or_else(|| misplaced_statement(finalbody, scope))
}
