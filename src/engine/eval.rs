//! Expression evaluation against a bounded namespace.
//!
//! Identifiers resolve, in order, to already-resolved parameters, caller
//! externals and the algebra capability's free symbols. Callees resolve to
//! caller functions first and library functions second. Nothing else is
//! reachable from an expression.

use super::expr::{Expr, parse_expression};
use super::library::{self, CallArgs};
use super::ops;
use crate::api::Context;
use crate::value::{Value, ValueEnvironment};
use crate::EvalError;

/// The names visible to one evaluation.
#[derive(Clone, Copy)]
pub(crate) struct Namespace<'a> {
    locals: &'a ValueEnvironment,
    context: &'a Context,
}

impl<'a> Namespace<'a> {
    pub(crate) fn new(locals: &'a ValueEnvironment, context: &'a Context) -> Self {
        Namespace { locals, context }
    }

    pub(crate) fn context(&self) -> &'a Context {
        self.context
    }

    fn variable(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.context.externals().get(name))
            .cloned()
            .or_else(|| self.context.algebra().symbol(name))
    }

    fn call(&self, callee: &str, args: CallArgs) -> Result<Value, EvalError> {
        if let Some(function) = self.context.function(callee) {
            if let Some((name, _)) = args.keywords.first() {
                return Err(EvalError::Other(format!("{}() does not accept keyword argument '{}'", callee, name)));
            }
            return function(&args.positional);
        }
        if let Some(builtin) = library::lookup(callee) {
            return builtin(args);
        }
        if self.variable(callee).is_some() {
            return Err(EvalError::NotCallable(callee.to_string()));
        }
        Err(EvalError::Undefined(callee.to_string()))
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        let algebra = self.context.algebra();
        match expr {
            Expr::Number(r) => Ok(Value::Number(*r)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => self.variable(name).ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::List(items) => Ok(Value::List(items.iter().map(|e| self.eval(e)).collect::<Result<_, _>>()?)),
            Expr::Set(items) => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.eval(item)?;
                    if !unique.iter().any(|seen| seen.loosely_equals(&value)) {
                        unique.push(value);
                    }
                }
                Ok(Value::List(unique))
            }
            Expr::Unary(op, inner) => ops::unary(*op, self.eval(inner)?, algebra),
            Expr::Binary(op, lhs, rhs) => ops::binary(*op, self.eval(lhs)?, self.eval(rhs)?, algebra),
            Expr::Call { callee, args, kwargs } => {
                let positional = args.iter().map(|e| self.eval(e)).collect::<Result<_, _>>()?;
                let keywords = kwargs
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), self.eval(e)?)))
                    .collect::<Result<_, EvalError>>()?;
                self.call(callee, CallArgs { positional, keywords })
            }
            Expr::Index(target, index) => index_value(self.eval(target)?, self.eval(index)?),
        }
    }
}

fn index_value(target: Value, index: Value) -> Result<Value, EvalError> {
    let idx = index.as_integer()?;
    let resolve = |len: usize| {
        let pos = if idx < 0 { idx + len as i64 } else { idx };
        usize::try_from(pos).ok().filter(|&p| p < len).ok_or(EvalError::IndexOutOfBounds { index: idx, len })
    };
    match target {
        Value::List(mut items) => {
            let pos = resolve(items.len())?;
            Ok(items.swap_remove(pos))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let pos = resolve(chars.len())?;
            Ok(Value::Str(chars[pos].to_string()))
        }
        other => Err(EvalError::type_mismatch("list or string", other.type_name())),
    }
}

/// Parse and evaluate `source`, propagating the failure.
pub fn try_evaluate(source: &str, env: &ValueEnvironment, context: &Context) -> Result<Value, EvalError> {
    let expr = parse_expression(source)?;
    Namespace::new(env, context).eval(&expr)
}

/// Parse and evaluate `source`; failures are logged and yield `None`.
///
/// ```
/// use quizgen::{Context, Value, ValueEnvironment, evaluate};
///
/// let mut env = ValueEnvironment::new();
/// env.define("a", Value::int(3));
/// assert_eq!(evaluate("a * 2 + 1", &env, &Context::default()), Some(Value::int(7)));
/// assert_eq!(evaluate("b + 1", &env, &Context::default()), None);
/// ```
pub fn evaluate(source: &str, env: &ValueEnvironment, context: &Context) -> Option<Value> {
    match try_evaluate(source, env, context) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(expression = source, error = %err, "cannot evaluate expression");
            None
        }
    }
}
