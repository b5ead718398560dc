//! Runtime values produced by the expression evaluator.
//!
//! Numbers are exact rationals whenever the inputs allow it, so `3/6` stays
//! `1/2` instead of collapsing to `0.5`. Floats appear only when an author
//! writes one or an operation has no exact result (`sqrt(2)`).

use crate::EvalError;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::fmt;

// --- Rational ----------------------------------------------------------------

/// An exact fraction over `i64`, always normalized: `den > 0` and
/// `gcd(num, den) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

pub(crate) fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    pub fn new(num: i64, den: i64) -> Result<Self, EvalError> {
        Self::from_i128(num as i128, den as i128)
    }

    pub fn integer(value: i64) -> Self {
        Rational { num: value, den: 1 }
    }

    fn from_i128(num: i128, den: i128) -> Result<Self, EvalError> {
        if den == 0 {
            return Err(EvalError::DivisionByZero);
        }
        let g = gcd(num, den).max(1);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = -num;
            den = -den;
        }
        let num = i64::try_from(num).map_err(|_| EvalError::Overflow)?;
        let den = i64::try_from(den).map_err(|_| EvalError::Overflow)?;
        Ok(Rational { num, den })
    }

    pub fn numer(&self) -> i64 {
        self.num
    }

    pub fn denom(&self) -> i64 {
        self.den
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn checked_add(self, other: Rational) -> Result<Rational, EvalError> {
        let num = self.num as i128 * other.den as i128 + other.num as i128 * self.den as i128;
        Self::from_i128(num, self.den as i128 * other.den as i128)
    }

    pub fn checked_sub(self, other: Rational) -> Result<Rational, EvalError> {
        self.checked_add(other.checked_neg()?)
    }

    pub fn checked_mul(self, other: Rational) -> Result<Rational, EvalError> {
        Self::from_i128(self.num as i128 * other.num as i128, self.den as i128 * other.den as i128)
    }

    pub fn checked_div(self, other: Rational) -> Result<Rational, EvalError> {
        Self::from_i128(self.num as i128 * other.den as i128, self.den as i128 * other.num as i128)
    }

    pub fn checked_neg(self) -> Result<Rational, EvalError> {
        Ok(Rational { num: self.num.checked_neg().ok_or(EvalError::Overflow)?, den: self.den })
    }

    /// Integer power; negative exponents invert.
    pub fn checked_pow(self, exp: i64) -> Result<Rational, EvalError> {
        let base = if exp < 0 { Rational::ONE.checked_div(self)? } else { self };
        let exp = u32::try_from(exp.unsigned_abs()).map_err(|_| EvalError::Overflow)?;
        let num = base.num.checked_pow(exp).ok_or(EvalError::Overflow)?;
        let den = base.den.checked_pow(exp).ok_or(EvalError::Overflow)?;
        Rational::new(num, den)
    }

    pub fn abs(self) -> Result<Rational, EvalError> {
        if self.num < 0 { self.checked_neg() } else { Ok(self) }
    }

    pub fn floor(self) -> i64 {
        self.num.div_euclid(self.den)
    }

    pub fn ceil(self) -> i64 {
        let floor = self.floor();
        if self.is_integer() { floor } else { floor + 1 }
    }

    /// Round half to even, like Python's `round`.
    pub fn round(self) -> i64 {
        let floor = self.floor();
        let twice_rem = 2 * (self.num as i128 - floor as i128 * self.den as i128);
        match twice_rem.cmp(&(self.den as i128)) {
            Ordering::Less => floor,
            Ordering::Greater => floor + 1,
            Ordering::Equal => {
                if floor % 2 == 0 {
                    floor
                } else {
                    floor + 1
                }
            }
        }
    }

    /// Exact square root when both parts are perfect squares.
    pub fn exact_sqrt(self) -> Option<Rational> {
        if self.num < 0 {
            return None;
        }
        // the float estimate can be off by one above 2^53
        let root = |n: i64| {
            let guess = (n as f64).sqrt().round() as i128;
            (guess - 1..=guess + 1).find(|r| *r >= 0 && r * r == n as i128).and_then(|r| i64::try_from(r).ok())
        };
        Some(Rational { num: root(self.num)?, den: root(self.den)? })
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num as i128 * other.den as i128).cmp(&(other.num as i128 * self.den as i128))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 { write!(f, "{}", self.num) } else { write!(f, "{}/{}", self.num, self.den) }
    }
}

// --- Symbolic ----------------------------------------------------------------

/// Binding strength of a symbolic expression, used to decide parentheses
/// when it is combined further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Sum,
    Product,
    Power,
    Atom,
}

/// An opaque symbolic result owned by the algebra capability, carried as its
/// rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbolic {
    pub markup: String,
    pub precedence: Precedence,
}

impl Symbolic {
    pub fn atom(markup: impl Into<String>) -> Self {
        Symbolic { markup: markup.into(), precedence: Precedence::Atom }
    }
}

// --- Value -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Exact number (integers have denominator 1).
    Number(Rational),
    Float(f64),
    Bool(bool),
    /// A ready-made string; templates insert it verbatim.
    Str(String),
    List(Vec<Value>),
    Symbolic(Symbolic),
}

impl Value {
    pub fn int(value: i64) -> Self {
        Value::Number(Rational::integer(value))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(r) if r.is_integer() => "integer",
            Value::Number(_) => "rational",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Symbolic(_) => "symbolic",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(r) => Some(r.to_f64()),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; integral floats are accepted.
    pub fn as_integer(&self) -> Result<i64, EvalError> {
        match self {
            Value::Number(r) if r.is_integer() => Ok(r.numer()),
            Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(*v as i64),
            other => Err(EvalError::type_mismatch("integer", other.type_name())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric equality across the exact/float boundary, structural otherwise.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64() == b.as_f64(),
            (a, b) => a == b,
        }
    }
}

pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Plain-text form, as `str()` would print it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(r) => write!(f, "{}", r),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Symbolic(sym) => f.write_str(&sym.markup),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(r) if r.is_integer() => serializer.serialize_i64(r.numer()),
            Value::Number(r) => serializer.serialize_str(&r.to_string()),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Symbolic(sym) => serializer.serialize_str(&sym.markup),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Rational> for Value {
    fn from(value: Rational) -> Self {
        Value::Number(value)
    }
}

// --- ValueEnvironment --------------------------------------------------------

/// Name → value bindings in insertion (declaration) order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ValueEnvironment {
    bindings: IndexMap<String, Value>,
}

impl ValueEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for ValueEnvironment {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        ValueEnvironment { bindings: iter.into_iter().collect() }
    }
}
