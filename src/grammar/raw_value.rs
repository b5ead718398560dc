//! Literal scalars and one-level lists found in section bodies.
//!
//! Decoding never fails: a span that is not a recognizable literal is kept as
//! [`RawValue::Text`], which is also how unquoted parameter expressions such
//! as `randnum(1, 5)` arrive.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// The `nan` / `NaN` keyword.
    NaN,
    /// A quoted string, unescaped.
    Str(String),
    List(Vec<RawValue>),
    /// Anything else, verbatim.
    Text(String),
}

impl RawValue {
    /// Decode a span; surrounding whitespace is ignored.
    ///
    /// ```
    /// use quizgen::RawValue;
    ///
    /// assert_eq!(RawValue::decode("-12"), RawValue::Int(-12));
    /// assert_eq!(RawValue::decode("2.5e3"), RawValue::Float(2500.0));
    /// assert_eq!(RawValue::decode("'it''s'"), RawValue::Text("'it''s'".to_string()));
    /// assert_eq!(RawValue::decode("[1, \"a,b\"]"), RawValue::List(vec![RawValue::Int(1), RawValue::Str("a,b".into())]));
    /// assert_eq!(RawValue::decode("randnum(1, 5)"), RawValue::Text("randnum(1, 5)".to_string()));
    /// ```
    pub fn decode(span: &str) -> RawValue {
        let span = span.trim();
        scalar(span).or_else(|| list(span)).unwrap_or_else(|| RawValue::Text(span.to_string()))
    }

    /// Literal form that [`RawValue::decode`] maps back to `self`.
    pub fn to_literal(&self) -> String {
        match self {
            RawValue::Int(n) => n.to_string(),
            RawValue::Float(v) => format!("{:?}", v),
            RawValue::Bool(true) => "True".to_string(),
            RawValue::Bool(false) => "False".to_string(),
            RawValue::NaN => "nan".to_string(),
            RawValue::Str(s) => quote(s),
            RawValue::List(items) => {
                let inner: Vec<String> = items.iter().map(RawValue::to_literal).collect();
                format!("[{}]", inner.join(", "))
            }
            RawValue::Text(s) => s.clone(),
        }
    }

    /// Source text to evaluate when the value is used as a parameter.
    pub fn expression_source(&self) -> String {
        match self {
            RawValue::Str(s) | RawValue::Text(s) => s.clone(),
            other => other.to_literal(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) | RawValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Strings print their content, everything else its literal.
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => f.write_str(&self.to_literal()),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Int(n) => serializer.serialize_i64(*n),
            RawValue::Float(v) => serializer.serialize_f64(*v),
            RawValue::Bool(b) => serializer.serialize_bool(*b),
            RawValue::NaN => serializer.serialize_f64(f64::NAN),
            RawValue::Str(s) | RawValue::Text(s) => serializer.serialize_str(s),
            RawValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn scalar(span: &str) -> Option<RawValue> {
    number(span).or_else(|| keyword(span)).or_else(|| string(span))
}

fn number(span: &str) -> Option<RawValue> {
    if regex!(r"^[+-]?\d+$").is_match(span) {
        return Some(match span.parse::<i64>() {
            Ok(n) => RawValue::Int(n),
            Err(_) => RawValue::Float(span.parse::<f64>().ok()?),
        });
    }
    if regex!(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").is_match(span) {
        let v = span.parse::<f64>().ok()?;
        return v.is_finite().then_some(RawValue::Float(v));
    }
    None
}

fn keyword(span: &str) -> Option<RawValue> {
    match span {
        "True" | "true" => Some(RawValue::Bool(true)),
        "False" | "false" => Some(RawValue::Bool(false)),
        "nan" | "NaN" => Some(RawValue::NaN),
        _ => None,
    }
}

fn string(span: &str) -> Option<RawValue> {
    for triple in ["\"\"\"", "'''"] {
        if span.len() >= 6 && span.starts_with(triple) && span.ends_with(triple) {
            let inner = &span[3..span.len() - 3];
            return (!inner.contains(triple)).then(|| RawValue::Str(inner.to_string()));
        }
    }

    let quote = span.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let (content, rest) = unescape(&span[1..], quote)?;
    rest.is_empty().then_some(RawValue::Str(content))
}

/// Read a single-quoted body up to its closing `quote`; returns the content
/// and whatever follows the closing quote.
pub(crate) fn unescape(body: &str, quote: char) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, e @ ('\\' | '"' | '\''))) => out.push(e),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            c if c == quote => return Some((out, &body[idx + 1..])),
            '\n' => return None,
            c => out.push(c),
        }
    }
    None
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn list(span: &str) -> Option<RawValue> {
    let inner = span.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let parts = split_top_level(inner)?;
    let last = parts.len().saturating_sub(1);
    for (idx, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part.is_empty() {
            // `[]` and a single trailing comma are fine; `[1,,2]` is not a list
            if idx == last {
                continue;
            }
            return None;
        }
        items.push(scalar(part).unwrap_or_else(|| RawValue::Text(part.to_string())));
    }
    Some(RawValue::List(items))
}

/// Split on commas outside quotes and brackets.
pub(crate) fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() || depth != 0 {
        return None;
    }
    parts.push(&text[start..]);
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn scalars_in_priority_order() {
        assert_eq!(RawValue::decode(" 42 "), RawValue::Int(42));
        assert_eq!(RawValue::decode("+7"), RawValue::Int(7));
        assert_eq!(RawValue::decode("-.5"), RawValue::Float(-0.5));
        assert_eq!(RawValue::decode("1E-2"), RawValue::Float(0.01));
        assert_eq!(RawValue::decode("99999999999999999999"), RawValue::Float(1e20));
        assert_eq!(RawValue::decode("true"), RawValue::Bool(true));
        assert_eq!(RawValue::decode("False"), RawValue::Bool(false));
        assert_eq!(RawValue::decode("NaN"), RawValue::NaN);
        assert_eq!(RawValue::decode("\"jane\""), RawValue::Str("jane".to_string()));
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(RawValue::decode(r#"'a\'b\n'"#), RawValue::Str("a'b\n".to_string()));
        assert_eq!(RawValue::decode(r#""\dfrac{1}{2}""#), RawValue::Str("\\dfrac{1}{2}".to_string()));
        assert_eq!(RawValue::decode("\"\"\"two\nlines \\n\"\"\""), RawValue::Str("two\nlines \\n".to_string()));
        // closing quote before the end means it is not one string
        assert_eq!(RawValue::decode("'a' + 'b'"), RawValue::Text("'a' + 'b'".to_string()));
    }

    #[test]
    fn lists_are_one_level() {
        assert_eq!(RawValue::decode("[]"), RawValue::List(vec![]));
        assert_eq!(
            RawValue::decode("[1, 2.5, True, 'x',]"),
            RawValue::List(vec![RawValue::Int(1), RawValue::Float(2.5), RawValue::Bool(true), RawValue::Str("x".into())])
        );
        assert_eq!(
            RawValue::decode("[[1, 2], 3]"),
            RawValue::List(vec![RawValue::Text("[1, 2]".into()), RawValue::Int(3)])
        );
        assert_eq!(RawValue::decode("[1,,2]"), RawValue::Text("[1,,2]".into()));
    }

    #[test]
    fn literals_decode_back() {
        let values = [
            RawValue::Float(1e20),
            RawValue::Float(-0.25),
            RawValue::Str("say \"hi\"\n\tnow \\ here".into()),
            RawValue::List(vec![RawValue::Str("a, b".into()), RawValue::NaN, RawValue::Int(-3)]),
            RawValue::Text("randnum(1, 5)".into()),
        ];
        for value in values {
            assert_eq!(RawValue::decode(&value.to_literal()), value);
        }
    }

    proptest! {
        #[test]
        fn integer_spans_decode_to_integers(n in any::<i64>()) {
            prop_assert_eq!(RawValue::decode(&n.to_string()), RawValue::Int(n));
        }

        #[test]
        fn float_spans_decode_to_floats(v in -1e12f64..1e12f64) {
            let span = format!("{:?}", v);
            prop_assert_eq!(RawValue::decode(&span), RawValue::Float(v));
        }

        #[test]
        fn exponent_spans_decode_to_floats(m in 1u32..1000, e in -20i32..20) {
            let span = format!("{}e{}", m, e);
            prop_assert_eq!(RawValue::decode(&span), RawValue::Float(span.parse::<f64>().unwrap()));
        }

        #[test]
        fn strings_round_trip(s in "[ -~\n\t]{0,24}") {
            let value = RawValue::Str(s);
            prop_assert_eq!(RawValue::decode(&value.to_literal()), value);
        }
    }
}
