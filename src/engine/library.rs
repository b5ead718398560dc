//! Built-in functions available to every parameter expression.
//!
//! A caller function registered under the same name as a built-in replaces it.

use crate::value::{Rational, Value};
use crate::EvalError;
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// Candidate sets up to this size are materialized and sampled directly.
const MATERIALIZE_LIMIT: u64 = 4096;

/// Draw budget for rejection sampling over larger ranges.
const MAX_DRAWS: usize = 1000;

/// Arguments of a single call, already evaluated.
#[derive(Debug, Default)]
pub(crate) struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl CallArgs {
    fn keyword(&mut self, name: &str) -> Option<Value> {
        let idx = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(idx).1)
    }

    fn reject_keywords(&self, function: &'static str) -> Result<(), EvalError> {
        match self.keywords.first() {
            Some((name, _)) => arg_error!(function, "unexpected keyword argument '{}'", name),
            None => Ok(()),
        }
    }

    fn arity(&self, function: &'static str, min: usize, max: usize) -> Result<(), EvalError> {
        let got = self.positional.len();
        if got < min || got > max {
            let expected = match (min, max) {
                (1, 1) => "1",
                (2, 2) => "2",
                (5, 5) => "5",
                (1, 2) => "1 or 2",
                (2, 4) => "2 to 4",
                _ => "a different number of",
            };
            return Err(EvalError::Arity { function, expected, got });
        }
        Ok(())
    }

    /// A single list argument is spread, so `max([1, 2])` works like `max(1, 2)`.
    fn spread(self) -> Vec<Value> {
        match <[Value; 1]>::try_from(self.positional) {
            Ok([Value::List(items)]) => items,
            Ok([single]) => vec![single],
            Err(all) => all,
        }
    }
}

type Builtin = fn(CallArgs) -> Result<Value, EvalError>;

const LIBRARY: &[(&str, Builtin)] = &[
    ("randnum", randnum),
    ("pickone", pickone),
    ("pick", pick),
    ("abs", abs),
    ("ceil", ceil),
    ("floor", floor),
    ("round", round),
    ("max", max),
    ("min", min),
    ("fraction", fraction),
    ("sqrt", sqrt),
    ("commas", commas),
    ("dfraction", dfraction),
    ("line_fraction", line_fraction),
    ("ifelse", ifelse),
    ("signsymbol", signsymbol),
    ("signsymbol_neg", signsymbol_neg),
];

pub(crate) fn lookup(name: &str) -> Option<Builtin> {
    LIBRARY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

fn number(function: &'static str, value: &Value) -> Result<(), EvalError> {
    if value.is_numeric() {
        Ok(())
    } else {
        arg_error!(function, "expected a number, got {}", value.type_name())
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.cmp(y)),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            x.as_f64().partial_cmp(&y.as_f64()).ok_or_else(|| EvalError::Other("cannot order nan".to_string()))
        }
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (x, y) => Err(EvalError::Other(format!("cannot order {} and {}", x.type_name(), y.type_name()))),
    }
}

fn excluded_by(exception: &Option<Value>, candidate: &Value) -> bool {
    match exception {
        None => false,
        Some(Value::List(items)) => items.iter().any(|item| item.loosely_equals(candidate)),
        Some(single) => single.loosely_equals(candidate),
    }
}

// --- randomness ----------------------------------------------------------------

/// `randnum(a, b[, step][, exclude])`: uniform over `a, a + step, ..` up to `b`.
fn randnum(mut args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "randnum";
    let kw_step = args.keyword("step");
    let kw_exclude = args.keyword("exclude");
    args.reject_keywords(F)?;
    args.arity(F, 2, 4)?;

    let mut positional = args.positional.into_iter();
    let (Some(low), Some(high)) = (positional.next(), positional.next()) else {
        return Err(EvalError::Arity { function: F, expected: "2 to 4", got: 0 });
    };
    let (mut step, mut exclude) = match (positional.next(), positional.next()) {
        (Some(list @ Value::List(_)), None) => (None, Some(list)),
        (third, fourth) => (third, fourth),
    };
    step = step.or(kw_step);
    exclude = exclude.or(kw_exclude);

    let step = step.unwrap_or(Value::int(1));
    for v in [&low, &high, &step] {
        number(F, v)?;
    }
    let exclude = exclude.map(|e| match e {
        Value::List(items) => items,
        single => vec![single],
    });
    let exclude = exclude.unwrap_or_default();

    let range = Progression::new(&low, &high, &step)?;
    let admissible = |v: &Value| !exclude.iter().any(|e| e.loosely_equals(v));
    let mut rng = rand::thread_rng();

    if range.len <= MATERIALIZE_LIMIT {
        let candidates: Vec<Value> = (0..range.len).map(|k| range.nth(k)).collect::<Result<_, _>>()?;
        let candidates: Vec<Value> = candidates.into_iter().filter(|v| admissible(v)).collect();
        return match candidates.choose(&mut rng) {
            Some(v) => Ok(v.clone()),
            None => arg_error!(F, "every value between {} and {} is excluded", low, high),
        };
    }

    for _ in 0..MAX_DRAWS {
        let candidate = range.nth(rng.gen_range(0..range.len))?;
        if admissible(&candidate) {
            return Ok(candidate);
        }
    }
    Err(EvalError::ExhaustedSampling { function: F, draws: MAX_DRAWS })
}

/// The arithmetic progression `start + k * step` for `k < len`.
struct Progression {
    start: Value,
    step: Value,
    len: u64,
}

impl Progression {
    fn new(low: &Value, high: &Value, step: &Value) -> Result<Self, EvalError> {
        const F: &str = "randnum";
        let len = match (low, high, step) {
            (Value::Number(a), Value::Number(b), Value::Number(s)) => {
                if *s <= Rational::ZERO {
                    arg_error!(F, "step must be positive");
                }
                if b < a {
                    arg_error!(F, "empty range {}..={}", a, b);
                }
                let span = b.checked_sub(*a)?.checked_div(*s)?.floor();
                u64::try_from(span).map_err(|_| EvalError::Overflow)?
            }
            _ => {
                let (a, b, s) = (low.as_f64().unwrap_or(0.0), high.as_f64().unwrap_or(0.0), step.as_f64().unwrap_or(0.0));
                if s.is_nan() || s <= 0.0 {
                    arg_error!(F, "step must be positive");
                }
                if b.is_nan() || a.is_nan() || b < a {
                    arg_error!(F, "empty range {}..={}", a, b);
                }
                let span = ((b - a) / s).floor();
                // positions must stay addressable as i64
                if !span.is_finite() || span >= i64::MAX as f64 {
                    return Err(EvalError::Overflow);
                }
                span as u64
            }
        };
        let len = len.checked_add(1).ok_or(EvalError::Overflow)?;
        Ok(Progression { start: low.clone(), step: step.clone(), len })
    }

    fn nth(&self, k: u64) -> Result<Value, EvalError> {
        let k = i64::try_from(k).map_err(|_| EvalError::Overflow)?;
        match (&self.start, &self.step) {
            (Value::Number(a), Value::Number(s)) => Ok(Value::Number(a.checked_add(s.checked_mul(Rational::integer(k))?)?)),
            (a, s) => Ok(Value::Float(a.as_f64().unwrap_or(0.0) + k as f64 * s.as_f64().unwrap_or(0.0))),
        }
    }
}

/// `pickone(*xs, exception=v)`
fn pickone(mut args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "pickone";
    let exception = args.keyword("exception");
    args.reject_keywords(F)?;
    let candidates: Vec<Value> = args.spread().into_iter().filter(|v| !excluded_by(&exception, v)).collect();
    match candidates.choose(&mut rand::thread_rng()) {
        Some(v) => Ok(v.clone()),
        None => arg_error!(F, "nothing to pick from"),
    }
}

/// `pick(k, *xs, exception=v)`: `k` values from distinct positions.
fn pick(mut args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "pick";
    let exception = args.keyword("exception");
    args.reject_keywords(F)?;
    if args.positional.is_empty() {
        return Err(EvalError::Arity { function: F, expected: "at least 1", got: 0 });
    }
    let count = args.positional.remove(0).as_integer()?;
    let Ok(count) = usize::try_from(count) else {
        arg_error!(F, "cannot pick {} values", count);
    };

    let candidates: Vec<Value> = args.spread().into_iter().filter(|v| !excluded_by(&exception, v)).collect();
    if candidates.len() < count {
        arg_error!(F, "cannot pick {} values from {} candidates", count, candidates.len());
    }
    Ok(Value::List(candidates.choose_multiple(&mut rand::thread_rng(), count).cloned().collect()))
}

// --- numeric -------------------------------------------------------------------

fn single(mut args: CallArgs, function: &'static str) -> Result<Value, EvalError> {
    args.reject_keywords(function)?;
    args.arity(function, 1, 1)?;
    Ok(args.positional.remove(0))
}

fn abs(args: CallArgs) -> Result<Value, EvalError> {
    match single(args, "abs")? {
        Value::Number(r) => Ok(Value::Number(r.abs()?)),
        Value::Float(v) => Ok(Value::Float(v.abs())),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

fn to_int(value: f64) -> Result<Value, EvalError> {
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Ok(Value::int(value as i64))
    } else {
        Err(EvalError::Overflow)
    }
}

fn ceil(args: CallArgs) -> Result<Value, EvalError> {
    match single(args, "ceil")? {
        Value::Number(r) => Ok(Value::int(r.ceil())),
        Value::Float(v) => to_int(v.ceil()),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

fn floor(args: CallArgs) -> Result<Value, EvalError> {
    match single(args, "floor")? {
        Value::Number(r) => Ok(Value::int(r.floor())),
        Value::Float(v) => to_int(v.floor()),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

/// `round(x)` rounds half to even; `round(x, n)` keeps `n` decimals.
fn round(mut args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "round";
    args.reject_keywords(F)?;
    args.arity(F, 1, 2)?;
    let digits = match args.positional.get(1) {
        Some(d) => Some(d.as_integer()?),
        None => None,
    };
    let value = args.positional.swap_remove(0);

    match (value, digits) {
        (Value::Number(r), None) => Ok(Value::int(r.round())),
        (Value::Float(v), None) => to_int(v.round_ties_even()),
        (Value::Number(r), Some(n)) => {
            let scale = Rational::integer(10).checked_pow(n)?;
            let rounded = Rational::integer(r.checked_mul(scale)?.round());
            Ok(Value::Number(rounded.checked_div(scale)?))
        }
        (Value::Float(v), Some(n)) => {
            let scale = 10f64.powi(i32::try_from(n).map_err(|_| EvalError::Overflow)?);
            Ok(Value::Float((v * scale).round_ties_even() / scale))
        }
        (other, _) => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

fn extremum(args: CallArgs, function: &'static str, wanted: Ordering) -> Result<Value, EvalError> {
    args.reject_keywords(function)?;
    let mut values = args.spread().into_iter();
    let Some(mut best) = values.next() else {
        arg_error!(function, "expected at least one value");
    };
    for value in values {
        if compare(&value, &best)? == wanted {
            best = value;
        }
    }
    Ok(best)
}

fn max(args: CallArgs) -> Result<Value, EvalError> {
    extremum(args, "max", Ordering::Greater)
}

fn min(args: CallArgs) -> Result<Value, EvalError> {
    extremum(args, "min", Ordering::Less)
}

/// `fraction(n[, d])`: an exact rational.
fn fraction(args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "fraction";
    args.reject_keywords(F)?;
    args.arity(F, 1, 2)?;
    let exact = |v: &Value| match v {
        Value::Number(r) => Ok(*r),
        other => Err(EvalError::type_mismatch("exact number", other.type_name())),
    };
    let num = exact(&args.positional[0])?;
    let den = match args.positional.get(1) {
        Some(d) => exact(d)?,
        None => Rational::ONE,
    };
    Ok(Value::Number(num.checked_div(den)?))
}

/// Exact for perfect squares, a float otherwise.
fn sqrt(args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "sqrt";
    match single(args, F)? {
        Value::Number(r) if r.is_negative() => arg_error!(F, "square root of negative number {}", r),
        Value::Number(r) => Ok(r.exact_sqrt().map(Value::Number).unwrap_or_else(|| Value::Float(r.to_f64().sqrt()))),
        Value::Float(v) if v < 0.0 => arg_error!(F, "square root of negative number {}", v),
        Value::Float(v) => Ok(Value::Float(v.sqrt())),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

// --- formatting ----------------------------------------------------------------

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn with_commas(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let sign = if value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, group_thousands(int_part), f),
        None => format!("{}{}", sign, group_thousands(int_part)),
    }
}

/// Thousands separators; non-integers get two decimals; strings pass through.
fn commas(args: CallArgs) -> Result<Value, EvalError> {
    let text = match single(args, "commas")? {
        Value::Number(r) if r.is_integer() => {
            let digits = group_thousands(&r.numer().unsigned_abs().to_string());
            if r.is_negative() { format!("-{}", digits) } else { digits }
        }
        Value::Number(r) => with_commas(r.to_f64(), 2),
        Value::Float(v) => with_commas(v, 2),
        other => return Ok(other),
    };
    Ok(Value::Str(text))
}

/// Reduced `(sign, |n|, |d|)` for a two-argument fraction call.
fn reduce(args: &[Value]) -> Result<(bool, Rational), EvalError> {
    let (n, d) = (args[0].as_integer()?, args[1].as_integer()?);
    let r = Rational::new(n, d)?;
    Ok((r.is_negative(), r.abs()?))
}

fn render_fraction(mut args: CallArgs, function: &'static str, render: fn(&Rational) -> String) -> Result<Value, EvalError> {
    args.reject_keywords(function)?;
    args.arity(function, 1, 2)?;
    if args.positional.len() == 2 {
        let (negative, r) = reduce(&args.positional)?;
        if r.is_integer() {
            let n = if negative { -r.numer() } else { r.numer() };
            return Ok(Value::Str(n.to_string()));
        }
        let sign = if negative { "-" } else { "" };
        return Ok(Value::Str(format!("{}{}", sign, render(&r))));
    }

    match args.positional.remove(0) {
        Value::Number(r) if !r.is_integer() => {
            let sign = if r.is_negative() { "-" } else { "" };
            Ok(Value::Str(format!("{}{}", sign, render(&r.abs()?))))
        }
        other => {
            number(function, &other)?;
            Ok(other)
        }
    }
}

/// `dfraction(x)` / `dfraction(n, d)`: display-style `\dfrac{n}{d}`.
fn dfraction(args: CallArgs) -> Result<Value, EvalError> {
    render_fraction(args, "dfraction", |r| format!("\\dfrac{{{}}}{{{}}}", r.numer(), r.denom()))
}

/// `line_fraction(x)` / `line_fraction(n, d)`: inline `n/d`.
fn line_fraction(args: CallArgs) -> Result<Value, EvalError> {
    render_fraction(args, "line_fraction", |r| format!("{}/{}", r.numer(), r.denom()))
}

// --- control -------------------------------------------------------------------

/// `ifelse(test, compared, op, t, f)`
fn ifelse(args: CallArgs) -> Result<Value, EvalError> {
    const F: &str = "ifelse";
    args.reject_keywords(F)?;
    args.arity(F, 5, 5)?;
    let mut it = args.positional.into_iter();
    let (Some(test), Some(compared), Some(op), Some(when_true), Some(when_false)) =
        (it.next(), it.next(), it.next(), it.next(), it.next())
    else {
        return Err(EvalError::Arity { function: F, expected: "5", got: 0 });
    };

    let holds = match op.as_str() {
        Some("=") => test.loosely_equals(&compared),
        Some(">") => compare(&test, &compared)? == Ordering::Greater,
        Some(">=") => compare(&test, &compared)? != Ordering::Less,
        Some("<") => compare(&test, &compared)? == Ordering::Less,
        Some("<=") => compare(&test, &compared)? != Ordering::Greater,
        _ => true,
    };
    Ok(if holds { when_true } else { when_false })
}

fn is_negative(function: &'static str, value: &Value) -> Result<bool, EvalError> {
    number(function, value)?;
    Ok(compare(value, &Value::int(0))? == Ordering::Less)
}

fn signsymbol(args: CallArgs) -> Result<Value, EvalError> {
    let value = single(args, "signsymbol")?;
    Ok(Value::str(if is_negative("signsymbol", &value)? { "-" } else { "+" }))
}

fn signsymbol_neg(args: CallArgs) -> Result<Value, EvalError> {
    let value = single(args, "signsymbol_neg")?;
    Ok(Value::str(if is_negative("signsymbol_neg", &value)? { "-" } else { "" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, positional: Vec<Value>) -> Result<Value, EvalError> {
        lookup(name).unwrap()(CallArgs { positional, keywords: Vec::new() })
    }

    fn call_kw(name: &str, positional: Vec<Value>, keywords: Vec<(&str, Value)>) -> Result<Value, EvalError> {
        let keywords = keywords.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        lookup(name).unwrap()(CallArgs { positional, keywords })
    }

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().map(|&x| Value::int(x)).collect()
    }

    #[test]
    fn randnum_stays_in_range_and_honors_step() {
        for _ in 0..200 {
            let v = call("randnum", ints(&[2, 20, 3])).unwrap().as_integer().unwrap();
            assert!((2..=20).contains(&v));
            assert_eq!((v - 2) % 3, 0);
        }
    }

    #[test]
    fn randnum_exclusions() {
        for _ in 0..100 {
            let v = call("randnum", vec![Value::int(1), Value::int(3), Value::List(ints(&[1, 2]))]).unwrap();
            assert_eq!(v, Value::int(3));
            let v = call("randnum", ints(&[1, 3, 1, 2])).unwrap().as_integer().unwrap();
            assert_ne!(v, 2);
        }
        let err = call("randnum", vec![Value::int(1), Value::int(2), Value::List(ints(&[1, 2]))]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidArgument { function: "randnum", .. }));
    }

    #[test]
    fn randnum_over_a_huge_range_uses_rejection_sampling() {
        let v = call("randnum", ints(&[-1_000_000_000, 1_000_000_000])).unwrap().as_integer().unwrap();
        assert!((-1_000_000_000..=1_000_000_000).contains(&v));
    }

    #[test]
    fn randnum_rejects_bad_ranges() {
        assert!(call("randnum", ints(&[5, 1])).is_err());
        assert!(call("randnum", ints(&[1, 5, 0])).is_err());
        assert!(call("randnum", vec![Value::int(1), Value::str("x")]).is_err());
    }

    #[test]
    fn randnum_with_too_many_float_steps_is_an_error() {
        assert_eq!(call("randnum", vec![Value::int(0), Value::Float(1e300)]), Err(EvalError::Overflow));
        assert_eq!(call("randnum", vec![Value::Float(0.0), Value::Float(f64::INFINITY)]), Err(EvalError::Overflow));

        let v = call("randnum", vec![Value::int(0), Value::Float(1e300), Value::Float(1e299)]).unwrap();
        assert!((0.0..=1.01e300).contains(&v.as_f64().unwrap()));
    }

    #[test]
    fn rounding_the_smallest_integer() {
        assert_eq!(call("ceil", ints(&[i64::MIN])), Ok(Value::int(i64::MIN)));
        assert_eq!(call("floor", ints(&[i64::MIN])), Ok(Value::int(i64::MIN)));
    }

    #[test]
    fn pick_and_pickone_respect_exception() {
        for _ in 0..50 {
            let v = call_kw("pickone", ints(&[1, 2]), vec![("exception", Value::int(1))]).unwrap();
            assert_eq!(v, Value::int(2));

            let Value::List(picked) = call_kw("pick", ints(&[2, 1, 2, 3]), vec![("exception", Value::int(3))]).unwrap()
            else {
                panic!("pick returns a list")
            };
            assert_eq!(picked.len(), 2);
            assert!(!picked.contains(&Value::int(3)));
            assert_ne!(picked[0], picked[1]);
        }
        assert!(call("pick", ints(&[3, 1, 2])).is_err());
    }

    #[test]
    fn rounding_family() {
        let half = Value::Number(Rational::new(5, 2).unwrap());
        assert_eq!(call("round", vec![half.clone()]).unwrap(), Value::int(2));
        assert_eq!(call("ceil", vec![half.clone()]).unwrap(), Value::int(3));
        assert_eq!(call("floor", vec![half]).unwrap(), Value::int(2));
        assert_eq!(call("round", vec![Value::Float(3.14159), Value::int(2)]).unwrap(), Value::Float(3.14));
        assert_eq!(call("abs", ints(&[-4])).unwrap(), Value::int(4));
    }

    #[test]
    fn max_min_accept_lists_and_varargs() {
        assert_eq!(call("max", ints(&[3, 9, 2])).unwrap(), Value::int(9));
        assert_eq!(call("min", vec![Value::List(ints(&[3, 9, 2]))]).unwrap(), Value::int(2));
        assert!(call("max", vec![]).is_err());
    }

    #[test]
    fn sqrt_is_exact_when_possible() {
        assert_eq!(call("sqrt", ints(&[16])).unwrap(), Value::int(4));
        assert!(matches!(call("sqrt", ints(&[2])).unwrap(), Value::Float(_)));
        assert!(call("sqrt", ints(&[-1])).is_err());
    }

    #[test]
    fn commas_groups_thousands() {
        assert_eq!(call("commas", ints(&[1234567])).unwrap(), Value::str("1,234,567"));
        assert_eq!(call("commas", ints(&[-1000])).unwrap(), Value::str("-1,000"));
        assert_eq!(call("commas", ints(&[999])).unwrap(), Value::str("999"));
        assert_eq!(call("commas", vec![Value::Float(12345.678)]).unwrap(), Value::str("12,345.68"));
        assert_eq!(call("commas", vec![Value::str("n/a")]).unwrap(), Value::str("n/a"));
    }

    #[test]
    fn fractions_reduce_and_carry_the_sign() {
        assert_eq!(call("dfraction", ints(&[3, 6])).unwrap(), Value::str("\\dfrac{1}{2}"));
        assert_eq!(call("dfraction", ints(&[3, -6])).unwrap(), Value::str("-\\dfrac{1}{2}"));
        assert_eq!(call("dfraction", ints(&[8, 4])).unwrap(), Value::str("2"));
        assert_eq!(call("dfraction", ints(&[5])).unwrap(), Value::int(5));
        let third = Value::Number(Rational::new(-1, 3).unwrap());
        assert_eq!(call("dfraction", vec![third.clone()]).unwrap(), Value::str("-\\dfrac{1}{3}"));
        assert_eq!(call("line_fraction", vec![third]).unwrap(), Value::str("-1/3"));
        assert_eq!(call("line_fraction", ints(&[4, 6])).unwrap(), Value::str("2/3"));
        assert_eq!(call("dfraction", ints(&[1, 0])), Err(EvalError::DivisionByZero));
        assert_eq!(call("fraction", ints(&[2, 4])).unwrap(), Value::Number(Rational::new(1, 2).unwrap()));
    }

    #[test]
    fn ifelse_operators() {
        let run = |a: i64, b: i64, op: &str| {
            call("ifelse", vec![Value::int(a), Value::int(b), Value::str(op), Value::str("t"), Value::str("f")]).unwrap()
        };
        assert_eq!(run(1, 1, "="), Value::str("t"));
        assert_eq!(run(1, 2, "="), Value::str("f"));
        assert_eq!(run(3, 2, ">"), Value::str("t"));
        assert_eq!(run(2, 2, ">="), Value::str("t"));
        assert_eq!(run(3, 2, "<"), Value::str("f"));
        assert_eq!(run(2, 2, "<="), Value::str("t"));
        assert_eq!(run(1, 2, "!"), Value::str("t"));
    }

    #[test]
    fn sign_symbols() {
        assert_eq!(call("signsymbol", ints(&[-3])).unwrap(), Value::str("-"));
        assert_eq!(call("signsymbol", ints(&[0])).unwrap(), Value::str("+"));
        assert_eq!(call("signsymbol_neg", ints(&[4])).unwrap(), Value::str(""));
        assert_eq!(call("signsymbol_neg", vec![Value::Float(-0.5)]).unwrap(), Value::str("-"));
    }

    #[test]
    fn unknown_keywords_are_rejected() {
        assert!(call_kw("abs", ints(&[1]), vec![("foo", Value::int(1))]).is_err());
    }
}
