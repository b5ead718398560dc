//! The algebra capability.
//!
//! Simplification and math-markup rendering are delegated through the
//! [`Algebra`] trait so a host can plug in a real computer-algebra system.
//! [`ExactAlgebra`] is the built-in implementation: exact rational numbers,
//! LaTeX rendering, and a declared set of free symbols combined textually with
//! only trivial simplifications (`0·x`, `1·x`, `x + 0`).

use crate::engine::BinaryOp;
use crate::value::{Precedence, Rational, Symbolic, Value, format_float};
use crate::EvalError;

/// Black-box symbolic capability consumed by the evaluator and the template
/// engine.
pub trait Algebra: Send + Sync {
    /// Value for an identifier that nothing else in the namespace defines.
    fn symbol(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Binary arithmetic where at least one operand is symbolic.
    fn combine(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError>;

    /// Negation of a symbolic operand.
    fn negate(&self, value: &Value) -> Result<Value, EvalError>;

    /// Math-markup rendering of a non-string value.
    fn to_latex(&self, value: &Value) -> String;
}

/// Exact arithmetic plus LaTeX rendering.
#[derive(Debug, Clone, Default)]
pub struct ExactAlgebra {
    symbols: Vec<String>,
}

impl ExactAlgebra {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare free symbols (e.g. `x`) that may appear unbound in expressions.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    fn as_symbolic(&self, value: &Value) -> Result<Symbolic, EvalError> {
        match value {
            Value::Symbolic(sym) => Ok(sym.clone()),
            Value::Number(r) if r.is_negative() => {
                Ok(Symbolic { markup: self.to_latex(value), precedence: Precedence::Sum })
            }
            Value::Number(_) | Value::Float(_) => Ok(Symbolic::atom(self.to_latex(value))),
            other => Err(EvalError::type_mismatch("number or symbol", other.type_name())),
        }
    }
}

fn wrap(sym: &Symbolic, min: Precedence) -> String {
    if sym.precedence < min { format!("\\left({}\\right)", sym.markup) } else { sym.markup.clone() }
}

fn is_zero(value: &Value) -> bool {
    matches!(value, Value::Number(r) if *r == Rational::ZERO)
}

fn is_one(value: &Value) -> bool {
    matches!(value, Value::Number(r) if *r == Rational::ONE)
}

impl Algebra for ExactAlgebra {
    fn symbol(&self, name: &str) -> Option<Value> {
        self.symbols.iter().any(|s| s == name).then(|| Value::Symbolic(Symbolic::atom(name)))
    }

    fn combine(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Add if is_zero(lhs) => return Ok(rhs.clone()),
            BinaryOp::Add | BinaryOp::Sub if is_zero(rhs) => return Ok(lhs.clone()),
            BinaryOp::Mul if is_zero(lhs) || is_zero(rhs) => return Ok(Value::int(0)),
            BinaryOp::Mul if is_one(lhs) => return Ok(rhs.clone()),
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow if is_one(rhs) => return Ok(lhs.clone()),
            _ => {}
        }

        let l = self.as_symbolic(lhs)?;
        let r = self.as_symbolic(rhs)?;
        let sym = match op {
            BinaryOp::Add => {
                let markup = match r.markup.strip_prefix('-') {
                    Some(rest) => format!("{} - {}", l.markup, rest.trim_start()),
                    None => format!("{} + {}", l.markup, r.markup),
                };
                Symbolic { markup, precedence: Precedence::Sum }
            }
            BinaryOp::Sub => Symbolic {
                markup: format!("{} - {}", l.markup, wrap(&r, Precedence::Product)),
                precedence: Precedence::Sum,
            },
            BinaryOp::Mul => {
                let markup = if matches!(lhs, Value::Number(n) if *n == Rational::integer(-1)) {
                    format!("- {}", wrap(&r, Precedence::Product))
                } else {
                    format!("{} {}", wrap(&l, Precedence::Product), wrap(&r, Precedence::Product))
                };
                Symbolic { markup, precedence: Precedence::Product }
            }
            BinaryOp::Div => {
                Symbolic { markup: format!("\\frac{{{}}}{{{}}}", l.markup, r.markup), precedence: Precedence::Atom }
            }
            BinaryOp::Pow => Symbolic {
                markup: format!("{}^{{{}}}", wrap(&l, Precedence::Atom), r.markup),
                precedence: Precedence::Power,
            },
            other => {
                return Err(EvalError::Other(format!("operator '{}' is not defined for symbolic operands", other)));
            }
        };
        Ok(Value::Symbolic(sym))
    }

    fn negate(&self, value: &Value) -> Result<Value, EvalError> {
        let sym = self.as_symbolic(value)?;
        Ok(Value::Symbolic(Symbolic {
            markup: format!("- {}", wrap(&sym, Precedence::Product)),
            precedence: Precedence::Sum,
        }))
    }

    fn to_latex(&self, value: &Value) -> String {
        match value {
            Value::Number(r) if r.is_integer() => r.numer().to_string(),
            Value::Number(r) if r.is_negative() => format!("- \\frac{{{}}}{{{}}}", -(r.numer() as i128), r.denom()),
            Value::Number(r) => format!("\\frac{{{}}}{{{}}}", r.numer(), r.denom()),
            Value::Float(v) => float_latex(*v),
            Value::Bool(b) => format!("\\text{{{}}}", if *b { "True" } else { "False" }),
            Value::Str(s) => s.clone(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(|item| self.to_latex(item)).collect();
                format!("\\left[ {}\\right]", inner.join(", \\  "))
            }
            Value::Symbolic(sym) => sym.markup.clone(),
        }
    }
}

fn float_latex(value: f64) -> String {
    let abs = value.abs();
    if value.is_finite() && abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        // `{:e}` keeps subnormals exact where dividing by 10^exp would not
        let sci = format!("{:e}", value);
        if let Some((mantissa, exp)) = sci.split_once('e') {
            if let (Ok(mantissa), Ok(exp)) = (mantissa.parse::<f64>(), exp.parse::<i32>()) {
                return format!("{} \\cdot 10^{{{}}}", format_float(mantissa), exp);
            }
        }
    }
    format_float(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Value {
        Value::Number(Rational::new(n, d).unwrap())
    }

    #[test]
    fn renders_numbers_like_a_cas() {
        let alg = ExactAlgebra::new();
        assert_eq!(alg.to_latex(&Value::int(-7)), "-7");
        assert_eq!(alg.to_latex(&frac(1, 2)), "\\frac{1}{2}");
        assert_eq!(alg.to_latex(&frac(-3, 4)), "- \\frac{3}{4}");
        assert_eq!(alg.to_latex(&Value::Float(0.25)), "0.25");
        assert_eq!(alg.to_latex(&Value::Float(1e20)), "1.0 \\cdot 10^{20}");
        assert_eq!(alg.to_latex(&Value::Float(-2.5e-7)), "-2.5 \\cdot 10^{-7}");
        assert_eq!(alg.to_latex(&Value::Float(5e-324)), "5.0 \\cdot 10^{-324}");
        assert_eq!(alg.to_latex(&Value::Float(f64::MIN_POSITIVE / 4.0)), "5.562684646268003 \\cdot 10^{-309}");
        assert_eq!(alg.to_latex(&Value::List(vec![Value::int(1), Value::int(2)])), "\\left[ 1, \\  2\\right]");
    }

    #[test]
    fn symbols_must_be_declared() {
        let alg = ExactAlgebra::new().with_symbols(["x"]);
        assert!(alg.symbol("x").is_some());
        assert!(alg.symbol("y").is_none());
    }

    #[test]
    fn symbolic_combination_is_textual_with_trivial_simplification() {
        let alg = ExactAlgebra::new().with_symbols(["x"]);
        let x = alg.symbol("x").unwrap();
        let three_x = alg.combine(BinaryOp::Mul, &Value::int(3), &x).unwrap();
        let poly = alg.combine(BinaryOp::Add, &three_x, &Value::int(-2)).unwrap();
        assert_eq!(alg.to_latex(&poly), "3 x - 2");

        assert_eq!(alg.combine(BinaryOp::Mul, &Value::int(0), &x).unwrap(), Value::int(0));
        assert_eq!(alg.combine(BinaryOp::Mul, &Value::int(1), &x).unwrap(), x);

        let squared = alg.combine(BinaryOp::Pow, &poly, &Value::int(2)).unwrap();
        assert_eq!(alg.to_latex(&squared), "\\left(3 x - 2\\right)^{2}");
    }
}
