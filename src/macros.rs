/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Patterns are crate-owned literals, so a failure here is a programming
/// error caught by the first test that touches the pattern.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Bail out of a library function with an argument error.
///
/// ```text
/// arg_error!("randnum", "step must be positive")
///   -> return Err(EvalError::InvalidArgument { function: "randnum", reason: .. })
/// ```
#[macro_export]
macro_rules! arg_error {
    ($func:expr, $($fmt:tt)+) => {
        return Err($crate::EvalError::InvalidArgument { function: $func, reason: format!($($fmt)+) })
    };
}
