//! Expression syntax.
//!
//! The accepted language is a small, Python-flavoured arithmetic grammar:
//!
//! ```text
//! comparison := additive (("==" | "!=" | "<=" | ">=" | "<" | ">") additive)?
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/" | "%") unary)*
//! unary      := ("-" | "+") unary | power
//! power      := postfix (("**" | "^") unary)?          right-associative
//! postfix    := atom ("[" comparison "]")*
//! atom       := number | string | True | False | call | ident
//!             | "(" comparison ")" | "(" items ")" | "[" items "]" | "{" items "}"
//! call       := ident "(" (arg ("," arg)*)? ")"        arg := ident "=" expr | expr
//! ```
//!
//! There is no assignment, no attribute access and no control flow. Anything
//! that needs those belongs to a script sandbox.

use crate::EvalError;
use crate::value::Rational;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, not, opt, peek, recognize, value},
    multi::{many0, many0_count, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use std::collections::BTreeSet;
use std::fmt;

type PResult<'a, T> = IResult<&'a str, T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Rational),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    /// `[..]`, `(a, b)` and `{..}` all evaluate to lists; sets are deduplicated.
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call { callee: String, args: Vec<Expr>, kwargs: Vec<(String, Expr)> },
    Index(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Identifiers read as variables (callee names are not included).
    pub fn free_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Ident(name) => {
                out.insert(name);
            }
            Expr::List(items) | Expr::Set(items) => items.iter().for_each(|e| e.collect_names(out)),
            Expr::Unary(_, inner) => inner.collect_names(out),
            Expr::Binary(_, lhs, rhs) | Expr::Index(lhs, rhs) => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
            Expr::Call { args, kwargs, .. } => {
                args.iter().for_each(|e| e.collect_names(out));
                kwargs.iter().for_each(|(_, e)| e.collect_names(out));
            }
            Expr::Number(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) => {}
        }
    }
}

/// Parse a complete expression.
pub fn parse_expression(source: &str) -> Result<Expr, EvalError> {
    if nesting_depth(source) > MAX_NESTING {
        return Err(EvalError::Syntax("expression nested too deeply".to_string()));
    }
    match all_consuming(ws(comparison))(source) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let at: String = e.input.chars().take(24).collect();
            if at.is_empty() {
                Err(EvalError::Syntax("unexpected end of expression".to_string()))
            } else {
                Err(EvalError::Syntax(format!("unexpected input at '{}'", at)))
            }
        }
        Err(nom::Err::Incomplete(_)) => Err(EvalError::Syntax("incomplete expression".to_string())),
    }
}

/// Deepest bracket nesting plus the sign runs and power operators that the
/// parser also descends through.
const MAX_NESTING: usize = 64;

fn nesting_depth(source: &str) -> usize {
    let (mut brackets, mut signs, mut powers, mut deepest) = (0usize, 0usize, 0usize, 0usize);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = ' ';
    for c in source.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => brackets += 1,
            ')' | ']' | '}' => brackets = brackets.saturating_sub(1),
            '^' => powers += 1,
            '*' if prev == '*' => powers += 1,
            _ => {}
        }
        match c {
            '+' | '-' => signs += 1,
            c if c.is_whitespace() => {}
            _ => signs = 0,
        }
        deepest = deepest.max(brackets + signs + powers);
        prev = c;
    }
    deepest
}

// --- combinators -------------------------------------------------------------

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn symbol<'a>(s: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    ws(tag(s))
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
}

fn fold_left(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |acc, (op, rhs)| binary(op, acc, rhs))
}

// --- grammar -----------------------------------------------------------------

fn comparison(input: &str) -> PResult<'_, Expr> {
    let cmp_op = alt((
        value(BinaryOp::Eq, symbol("==")),
        value(BinaryOp::Ne, symbol("!=")),
        value(BinaryOp::Le, symbol("<=")),
        value(BinaryOp::Ge, symbol(">=")),
        value(BinaryOp::Lt, symbol("<")),
        value(BinaryOp::Gt, symbol(">")),
    ));
    let (input, lhs) = additive(input)?;
    let (input, rest) = opt(pair(cmp_op, additive))(input)?;
    Ok((input, match rest {
        Some((op, rhs)) => binary(op, lhs, rhs),
        None => lhs,
    }))
}

fn additive(input: &str) -> PResult<'_, Expr> {
    let add_op = alt((value(BinaryOp::Add, symbol("+")), value(BinaryOp::Sub, symbol("-"))));
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(add_op, term))(input)?;
    Ok((input, fold_left(first, rest)))
}

fn term(input: &str) -> PResult<'_, Expr> {
    // `*` must not swallow the first half of `**`.
    let mul_op = alt((
        value(BinaryOp::Mul, ws(terminated(char('*'), not(char('*'))))),
        value(BinaryOp::Div, symbol("/")),
        value(BinaryOp::Rem, symbol("%")),
    ));
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(mul_op, unary))(input)?;
    Ok((input, fold_left(first, rest)))
}

fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(symbol("-"), unary), |e| Expr::Unary(UnaryOp::Neg, Box::new(e))),
        map(preceded(symbol("+"), unary), |e| Expr::Unary(UnaryOp::Pos, Box::new(e))),
        power,
    ))(input)
}

fn power(input: &str) -> PResult<'_, Expr> {
    let (input, base) = postfix(input)?;
    let (input, exponent) = opt(preceded(alt((symbol("**"), symbol("^"))), unary))(input)?;
    Ok((input, match exponent {
        Some(exp) => binary(BinaryOp::Pow, base, exp),
        None => base,
    }))
}

fn postfix(input: &str) -> PResult<'_, Expr> {
    let (input, base) = atom(input)?;
    let (input, indices) = many0(delimited(symbol("["), comparison, symbol("]")))(input)?;
    Ok((input, indices.into_iter().fold(base, |acc, idx| Expr::Index(Box::new(acc), Box::new(idx)))))
}

fn atom(input: &str) -> PResult<'_, Expr> {
    ws(alt((number, map(string_literal, Expr::Str), call_or_ident, parenthesized, list_literal, set_literal)))(input)
}

fn number(input: &str) -> PResult<'_, Expr> {
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    let (rest, text) = alt((
        recognize(tuple((digit1, opt(pair(char('.'), digit0)), opt(exponent)))),
        recognize(tuple((char('.'), digit1, opt(tuple((one_of("eE"), opt(one_of("+-")), digit1)))))),
    ))(input)?;

    let is_float = text.contains(&['.', 'e', 'E'][..]);
    let expr = match (is_float, text.parse::<i64>()) {
        (false, Ok(n)) => Expr::Number(Rational::integer(n)),
        _ => match text.parse::<f64>() {
            Ok(v) => Expr::Float(v),
            Err(_) => return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))),
        },
    };
    Ok((rest, expr))
}

/// `'..'` or `".."`; `\\`, `\'` and `\"` are the only escapes, so LaTeX
/// backslashes survive untouched.
pub(crate) fn string_literal(input: &str) -> PResult<'_, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))),
    };
    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            if !matches!(c, '\\' | '\'' | '"') {
                out.push('\\');
            }
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Ok((&input[idx + c.len_utf8()..], out));
        } else {
            out.push(c);
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(alt((alpha1, tag("_"))), many0_count(alt((alphanumeric1, tag("_"))))))(input)
}

enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
}

fn call_arg(input: &str) -> PResult<'_, Arg> {
    alt((
        map(pair(terminated(ws(identifier), terminated(char('='), peek(not(char('='))))), comparison), |(k, v)| {
            Arg::Keyword(k.to_string(), v)
        }),
        map(comparison, Arg::Positional),
    ))(input)
}

fn call_or_ident(input: &str) -> PResult<'_, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        preceded(multispace0, char('(')),
        terminated(separated_list0(char(','), call_arg), opt(char(','))),
        ws(char(')')),
    ))(input)?;

    let expr = match args {
        Some(args) => {
            let mut positional = Vec::new();
            let mut kwargs = Vec::new();
            for arg in args {
                match arg {
                    Arg::Positional(e) => positional.push(e),
                    Arg::Keyword(k, e) => kwargs.push((k, e)),
                }
            }
            Expr::Call { callee: name.to_string(), args: positional, kwargs }
        }
        None => match name {
            "True" | "true" => Expr::Bool(true),
            "False" | "false" => Expr::Bool(false),
            _ => Expr::Ident(name.to_string()),
        },
    };
    Ok((input, expr))
}

fn items(input: &str) -> PResult<'_, Vec<Expr>> {
    terminated(separated_list0(char(','), comparison), opt(ws(char(','))))(input)
}

/// `(e)` is grouping; `(a, b)` and `()` are tuples.
fn parenthesized(input: &str) -> PResult<'_, Expr> {
    let (rest, (mut exprs, trailing)) = delimited(
        char('('),
        pair(separated_list0(char(','), comparison), opt(ws(char(',')))),
        ws(char(')')),
    )(input)?;
    let expr = if exprs.len() == 1 && trailing.is_none() { exprs.remove(0) } else { Expr::List(exprs) };
    Ok((rest, expr))
}

fn list_literal(input: &str) -> PResult<'_, Expr> {
    map(delimited(char('['), ws(items), char(']')), Expr::List)(input)
}

fn set_literal(input: &str) -> PResult<'_, Expr> {
    map(delimited(char('{'), ws(items), char('}')), Expr::Set)(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: i64) -> Expr {
        Expr::Number(Rational::integer(n))
    }

    fn ident(s: &str) -> Expr {
        Expr::Ident(s.to_string())
    }

    #[test]
    fn precedence_follows_python() {
        // -2**2 == -(2**2)
        assert_eq!(
            parse_expression("-2**2").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(binary(BinaryOp::Pow, num(2), num(2))))
        );
        // 2^3^2 == 2^(3^2)
        assert_eq!(
            parse_expression("2^3^2").unwrap(),
            binary(BinaryOp::Pow, num(2), binary(BinaryOp::Pow, num(3), num(2)))
        );
        assert_eq!(
            parse_expression("a + b * c").unwrap(),
            binary(BinaryOp::Add, ident("a"), binary(BinaryOp::Mul, ident("b"), ident("c")))
        );
        assert_eq!(parse_expression("a - b - c").unwrap(), binary(
            BinaryOp::Sub,
            binary(BinaryOp::Sub, ident("a"), ident("b")),
            ident("c")
        ));
    }

    #[test]
    fn calls_with_keyword_arguments() {
        let expr = parse_expression("pick(2, 1, 2, 3, exception = a)").unwrap();
        let Expr::Call { callee, args, kwargs } = expr else { panic!("expected call") };
        assert_eq!(callee, "pick");
        assert_eq!(args.len(), 4);
        assert_eq!(kwargs, vec![("exception".to_string(), ident("a"))]);
    }

    #[test]
    fn equality_inside_call_is_not_a_keyword() {
        let expr = parse_expression("f(a == 1)").unwrap();
        let Expr::Call { args, kwargs, .. } = expr else { panic!("expected call") };
        assert!(kwargs.is_empty());
        assert_eq!(args, vec![binary(BinaryOp::Eq, ident("a"), num(1))]);
    }

    #[test]
    fn literals() {
        assert_eq!(parse_expression("0.5").unwrap(), Expr::Float(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), Expr::Float(1000.0));
        assert_eq!(parse_expression(r#"'\dfrac{1}{2}'"#).unwrap(), Expr::Str("\\dfrac{1}{2}".to_string()));
        assert_eq!(parse_expression("[1, 2,]").unwrap(), Expr::List(vec![num(1), num(2)]));
        assert_eq!(parse_expression("{3}").unwrap(), Expr::Set(vec![num(3)]));
        assert_eq!(parse_expression("(1, 2)").unwrap(), Expr::List(vec![num(1), num(2)]));
        assert_eq!(parse_expression("(1)").unwrap(), num(1));
        assert_eq!(parse_expression("True").unwrap(), Expr::Bool(true));
    }

    #[test]
    fn indexing_and_free_names() {
        let expr = parse_expression("xs[i + 1] * abs(y)").unwrap();
        let names: Vec<&str> = expr.free_names().into_iter().collect();
        assert_eq!(names, vec!["i", "xs", "y"]);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(parse_expression("1 +"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expression("f(1"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expression(""), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn runaway_nesting_is_a_syntax_error() {
        let deep = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
        assert_eq!(parse_expression(&deep), Err(EvalError::Syntax("expression nested too deeply".to_string())));
        assert!(matches!(parse_expression(&"-".repeat(3000)), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expression(&vec!["2"; 500].join("^")), Err(EvalError::Syntax(_))));

        let nested = format!("{}1{}", "[".repeat(40), "]".repeat(40));
        assert!(parse_expression(&nested).is_ok());
        assert_eq!(parse_expression(&format!("'{}'", "(".repeat(500))).unwrap(), Expr::Str("(".repeat(500)));
        assert_eq!(parse_expression("- -1").unwrap(), Expr::Unary(
            UnaryOp::Neg,
            Box::new(Expr::Unary(UnaryOp::Neg, Box::new(num(1))))
        ));
    }
}
