//! Operations on values.
//!
//! Arithmetic stays exact while both operands are exact; any float operand
//! turns the result into a float. Symbolic operands are handed to the algebra
//! capability untouched.

use super::expr::{BinaryOp, UnaryOp};
use crate::algebra::Algebra;
use crate::value::{Rational, Value};
use crate::EvalError;
use std::cmp::Ordering;

pub(crate) fn unary(op: UnaryOp, value: Value, algebra: &dyn Algebra) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Pos, v @ (Value::Number(_) | Value::Float(_) | Value::Symbolic(_))) => Ok(v),
        (UnaryOp::Neg, Value::Number(r)) => Ok(Value::Number(r.checked_neg()?)),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Neg, v @ Value::Symbolic(_)) => algebra.negate(&v),
        (_, v) => Err(EvalError::type_mismatch("number", v.type_name())),
    }
}

pub(crate) fn binary(op: BinaryOp, lhs: Value, rhs: Value, algebra: &dyn Algebra) -> Result<Value, EvalError> {
    use BinaryOp::*;

    match op {
        Eq => return Ok(Value::Bool(lhs.loosely_equals(&rhs))),
        Ne => return Ok(Value::Bool(!lhs.loosely_equals(&rhs))),
        Lt | Le | Gt | Ge => return compare(op, &lhs, &rhs),
        _ => {}
    }

    if matches!(lhs, Value::Symbolic(_)) || matches!(rhs, Value::Symbolic(_)) {
        return algebra.combine(op, &lhs, &rhs);
    }

    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => exact(op, a, b),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            // is_numeric guarantees both views exist
            let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            float(op, x, y)
        }
        (Value::Str(a), Value::Str(b)) if op == Add => Ok(Value::Str(a + &b)),
        (Value::List(mut a), Value::List(b)) if op == Add => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (a, b) => Err(EvalError::Other(format!(
            "unsupported operand types for {}: {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn exact(op: BinaryOp, a: Rational, b: Rational) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b)?,
        BinaryOp::Sub => a.checked_sub(b)?,
        BinaryOp::Mul => a.checked_mul(b)?,
        BinaryOp::Div => a.checked_div(b)?,
        BinaryOp::Rem => {
            if b == Rational::ZERO {
                return Err(EvalError::DivisionByZero);
            }
            // Python semantics: the result takes the sign of the divisor.
            let quotient = Rational::integer(a.checked_div(b)?.floor());
            a.checked_sub(b.checked_mul(quotient)?)?
        }
        BinaryOp::Pow if b.is_integer() => a.checked_pow(b.numer())?,
        BinaryOp::Pow => return float(op, a.to_f64(), b.to_f64()),
        _ => unreachable!("comparisons are handled before arithmetic"),
    };
    Ok(Value::Number(result))
}

fn float(op: BinaryOp, x: f64, y: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div if y == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => x / y,
        BinaryOp::Rem if y == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Rem => x - (x / y).floor() * y,
        BinaryOp::Pow => x.powf(y),
        _ => unreachable!("comparisons are handled before arithmetic"),
    };
    if result.is_nan() {
        return Err(EvalError::Other(format!("{} {} {} has no real result", x, op, y)));
    }
    Ok(Value::Float(result))
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (a, b) => {
            return Err(EvalError::Other(format!("cannot order {} and {}", a.type_name(), b.type_name())));
        }
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let holds = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => unreachable!("only ordering operators reach compare"),
    };
    Ok(Value::Bool(holds))
}
