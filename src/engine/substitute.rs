//! Placeholder substitution.
//!
//! A template is split once into literal pieces and positional slots. Slots
//! are evaluated independently and the output is assembled in a single pass,
//! so a substituted value is never rescanned and authored text can never be
//! mistaken for a slot.

use super::eval::Namespace;
use super::expr::{Expr, parse_expression};
use crate::api::Context;
use crate::value::{Value, ValueEnvironment};
use crate::EvalError;

const OPEN: &str = "@{";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Literal(String),
    Slot(Slot),
}

/// One `@{expr}` occurrence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    /// Text between the braces, as authored.
    source: String,
    expr: Result<Expr, EvalError>,
}

impl Slot {
    fn new(source: &str) -> Self {
        Slot { source: source.to_string(), expr: parse_expression(source) }
    }

    fn literal(&self) -> String {
        format!("@{{{}}}", self.source)
    }
}

/// Result of rendering a template once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub text: String,
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub(crate) fn compile(text: &str) -> Self {
        let mut pieces = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find(OPEN) {
            let body = &rest[start + OPEN.len()..];
            let Some(len) = balanced_len(body) else {
                break;
            };
            if start > 0 {
                pieces.push(Piece::Literal(rest[..start].to_string()));
            }
            pieces.push(Piece::Slot(Slot::new(&body[..len])));
            rest = &body[len + 1..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Literal(rest.to_string()));
        }
        Template { pieces }
    }

    #[cfg(test)]
    pub(crate) fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.pieces.iter().filter(|p| matches!(p, Piece::Slot(_))).count()
    }

    pub(crate) fn render(&self, ns: Namespace<'_>) -> Rendered {
        let rendered: Vec<Option<String>> = self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(_) => None,
                Piece::Slot(slot) => resolve(slot, ns),
            })
            .collect();

        let mut text = String::new();
        let mut unresolved = 0;
        for (piece, value) in self.pieces.iter().zip(rendered) {
            match (piece, value) {
                (Piece::Literal(s), _) => text.push_str(s),
                (Piece::Slot(_), Some(value)) => text.push_str(&value),
                (Piece::Slot(slot), None) => {
                    unresolved += 1;
                    text.push_str(&slot.literal());
                }
            }
        }
        Rendered { text, unresolved }
    }
}

/// Length of the body of a brace-balanced span whose opening brace has
/// already been consumed, or `None` when it never closes.
fn balanced_len(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn resolve(slot: &Slot, ns: Namespace<'_>) -> Option<String> {
    let value = slot.expr.as_ref().map_err(Clone::clone).and_then(|expr| ns.eval(expr));
    match value {
        Ok(Value::Str(s)) => Some(s),
        Ok(value) => Some(ns.context().algebra().to_latex(&value)),
        Err(err) => {
            tracing::warn!(placeholder = %slot.source, error = %err, "placeholder left unresolved");
            None
        }
    }
}

/// Resolve every `@{expr}` in `text` against `env` and the context.
///
/// Text without placeholders comes back unchanged. A placeholder that cannot
/// be evaluated is left in place as written.
///
/// ```
/// use quizgen::{Context, Value, ValueEnvironment, substitute};
///
/// let mut env = ValueEnvironment::new();
/// env.define("a", Value::int(4));
/// let ctx = Context::default();
/// assert_eq!(substitute("Compute @{a} + @{a/8}.", &env, &ctx), "Compute 4 + \\frac{1}{2}.");
/// assert_eq!(substitute("Keep @{missing}", &env, &ctx), "Keep @{missing}");
/// ```
pub fn substitute(text: &str, env: &ValueEnvironment, context: &Context) -> String {
    Template::compile(text).render(Namespace::new(env, context)).text
}
