use crate::algebra::{Algebra, ExactAlgebra};
use crate::engine::{self, Batch};
use crate::grammar::{parse_legacy, parse_sections};
use crate::problem::ProblemDefinition;
use crate::sandbox::ScriptSandbox;
use crate::value::{Value, ValueEnvironment};
use crate::{EvalError, ParseError};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied function callable from parameter expressions.
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Everything an expression can see besides its own parameters.
///
/// `Context` is `Send + Sync`, so one context can serve generation calls on
/// several threads.
#[derive(Clone)]
pub struct Context {
    externals: ValueEnvironment,
    functions: IndexMap<String, Function>,
    algebra: Arc<dyn Algebra>,
    sandbox: Option<Arc<dyn ScriptSandbox>>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            externals: ValueEnvironment::new(),
            functions: IndexMap::new(),
            algebra: Arc::new(ExactAlgebra::new()),
            sandbox: None,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("externals", &self.externals)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("algebra", &"<algebra>")
            .field("sandbox", &self.sandbox.as_ref().map(|_| "<sandbox>"))
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an external variable visible to every parameter and placeholder.
    pub fn with_external(mut self, name: impl Into<String>, value: Value) -> Self {
        self.externals.define(name, value);
        self
    }

    pub fn with_externals(mut self, externals: impl IntoIterator<Item = (String, Value)>) -> Self {
        for (name, value) in externals {
            self.externals.define(name, value);
        }
        self
    }

    /// Register a function; it replaces a built-in of the same name.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn with_algebra(mut self, algebra: Arc<dyn Algebra>) -> Self {
        self.algebra = algebra;
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn ScriptSandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn externals(&self) -> &ValueEnvironment {
        &self.externals
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn algebra(&self) -> &dyn Algebra {
        self.algebra.as_ref()
    }

    pub fn sandbox(&self) -> Option<&Arc<dyn ScriptSandbox>> {
        self.sandbox.as_ref()
    }
}

/// Default attempt budget for [`generate`].
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Knobs for batch generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Accept instances whose statement already appeared in the batch.
    pub duplicates_allowed: bool,
    /// Instantiations to try before giving up; `None` keeps trying forever.
    pub max_attempts: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self { duplicates_allowed: false, max_attempts: Some(DEFAULT_MAX_ATTEMPTS) }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_duplicates(mut self, allowed: bool) -> Self {
        self.duplicates_allowed = allowed;
        self
    }

    pub fn max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = Some(max);
        self
    }

    /// Retry until the batch is full. Never returns if the problem has fewer
    /// distinct statements than requested.
    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }
}

/// Input grammar of a problem file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `<<section>>` headers.
    #[default]
    Primary,
    /// `Info` / `Question` / `Answer` / `Solution` keywords with tag markup.
    Legacy,
}

/// Parse a problem written in the `<<section>>` dialect.
///
/// # Example
/// ```
/// let def = quizgen::parse("<<parameters>>\na: 2\n<<statement>>\nDouble @{a}.\n").unwrap();
/// assert_eq!(def.statement, "Double @{a}.");
/// assert_eq!(def.parameters.len(), 1);
/// ```
pub fn parse(text: &str) -> Result<ProblemDefinition, ParseError> {
    parse_with(text, Dialect::Primary)
}

pub fn parse_with(text: &str, dialect: Dialect) -> Result<ProblemDefinition, ParseError> {
    let sections = match dialect {
        Dialect::Primary => parse_sections(text)?,
        Dialect::Legacy => parse_legacy(text)?,
    };
    let definition = ProblemDefinition::from_sections(sections);
    tracing::debug!(
        problem = %definition.problem_id,
        ?dialect,
        parameters = definition.parameters.len(),
        choices = definition.choices.len(),
        "parsed problem definition"
    );
    Ok(definition)
}

/// Like [`parse_with`], for raw bytes; input must be UTF-8.
pub fn parse_bytes(bytes: &[u8], dialect: Dialect) -> Result<ProblemDefinition, ParseError> {
    parse_with(std::str::from_utf8(bytes)?, dialect)
}

/// Generate `count` instances with distinct statements under the default
/// [`Options`].
///
/// # Example
/// ```
/// use quizgen::{Context, generate, parse};
///
/// let def = parse("<<parameters>>\na: randnum(1, 50)\n<<statement>>\nHalve @{2 * a}.\n").unwrap();
/// let batch = generate(&def, 5, &Context::default());
/// assert!(batch.is_complete());
/// assert_eq!(batch.len(), 5);
/// ```
pub fn generate(definition: &ProblemDefinition, count: usize, context: &Context) -> Batch {
    generate_with(definition, count, context, &Options::default())
}

pub fn generate_with(definition: &ProblemDefinition, count: usize, context: &Context, options: &Options) -> Batch {
    engine::generate(definition, count, context, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BatchStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn dialects_agree_on_shape() {
        let primary = parse("<<info>>\nid: \"q\"\n<<statement>>\nWhat is @{a}?\n<<choices>>\n- @{a}\n- 0\n").unwrap();
        let legacy = parse_with("Info\n'id': 'q'\nQuestion\n<watex>What is $a?</watex>\nAnswer\n<watex>$a</watex>\n0\n", Dialect::Legacy).unwrap();
        assert_eq!(legacy, primary);
    }

    #[test]
    fn non_utf8_input_is_rejected() {
        let err = parse_bytes(&[b'<', b'<', 0xff, 0xfe], Dialect::Primary).unwrap_err();
        assert!(matches!(err, ParseError::InvalidUtf8(_)));
    }

    #[test]
    fn options_builders() {
        assert_eq!(Options::default().max_attempts, Some(DEFAULT_MAX_ATTEMPTS));
        assert_eq!(Options::new().unbounded().max_attempts, None);
        let opts = Options::new().allow_duplicates(true).max_attempts(3);
        assert!(opts.duplicates_allowed);
        assert_eq!(opts.max_attempts, Some(3));
    }

    #[test]
    fn allowing_duplicates_fills_any_batch() {
        let def = parse("<<statement>>\nAlways the same.\n").unwrap();
        let batch = generate_with(&def, 4, &Context::default(), &Options::new().allow_duplicates(true));
        assert_eq!(batch.status, BatchStatus::Complete);
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.metrics.attempts, 4);
    }

    #[test]
    fn context_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Context>();
    }
}
