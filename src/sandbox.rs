//! Script-mode parameter execution.
//!
//! A definition whose parameters hold a single `code` entry carries a script
//! instead of ordered expressions. Running arbitrary scripts is the host's
//! business: it plugs a [`ScriptSandbox`] into the [`Context`]. The crate
//! ships [`AssignmentSandbox`] for the common case of a block of plain
//! assignments.

use crate::api::Context;
use crate::engine::try_evaluate;
use crate::error::SandboxError;
use crate::value::ValueEnvironment;

/// Executes a script body and returns the bindings it produced.
///
/// The context's externals are in scope while the script runs.
pub trait ScriptSandbox: Send + Sync {
    fn execute(&self, source: &str, context: &Context) -> Result<ValueEnvironment, SandboxError>;
}

/// Runs `name = expression` statements in order, one per line or separated
/// by `;`.
///
/// `$` sigils and a leading `my ` are ignored, so legacy blocks such as
/// `$a = randnum(1, 9); $b = $a * 2;` run unchanged. There is no control flow.
/// Each right-hand side is an ordinary parameter expression and sees the
/// bindings made before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentSandbox;

impl AssignmentSandbox {
    pub fn new() -> Self {
        AssignmentSandbox
    }
}

impl ScriptSandbox for AssignmentSandbox {
    fn execute(&self, source: &str, context: &Context) -> Result<ValueEnvironment, SandboxError> {
        let mut env = ValueEnvironment::new();
        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            for statement in statements(line) {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                let (name, expr) = assignment(statement).ok_or_else(|| SandboxError::Statement {
                    line: line_no,
                    message: format!("expected `name = expression`, found `{}`", statement),
                })?;
                let expr = strip_sigils(expr);
                let value = try_evaluate(&expr, &env, context).map_err(|source| SandboxError::Eval { line: line_no, source })?;
                env.define(name, value);
            }
        }
        tracing::debug!(bindings = env.len(), "assignment script executed");
        Ok(env)
    }
}

/// Split a line on `;` outside string literals.
fn statements(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = line.char_indices();
    while let Some((idx, c)) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ';') => {
                parts.push(&line[start..idx]);
                start = idx + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(&line[start..]);
    parts
}

/// Drop `$` in front of names; string literals keep theirs.
fn strip_sigils(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut quote: Option<char> = None;
    let mut chars = expr.chars().peekable();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
                continue;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '$') if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => continue,
            (None, _) => {}
        }
        out.push(c);
    }
    out
}

fn assignment(statement: &str) -> Option<(&str, &str)> {
    let caps = regex!(r"^(?:my\s+)?\$?([A-Za-z_][A-Za-z0-9_]*)\s*=([^=].*)$").captures(statement)?;
    let name = caps.get(1)?.as_str();
    let expr = caps.get(2)?.as_str();
    Some((name, expr))
}
