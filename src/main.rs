mod debug_report;

use clap::Parser;
use quizgen::{
    AssignmentSandbox, Context, Dialect, ExactAlgebra, Options, ValueEnvironment, generate_with, parse_bytes,
    try_evaluate,
};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Generate distinct variants of a randomized quiz problem.
#[derive(Parser, Debug)]
#[command(name = "quizgen")]
#[command(version)]
#[command(after_help = "Exit codes:\n  0  Batch complete.\n  1  Input could not be read or parsed.\n  2  Invalid arguments.\n  3  Attempt budget exhausted; the batch is partial.")]
struct Cli {
    /// Problem file (reads stdin if omitted)
    input: Option<PathBuf>,

    /// Input is in the legacy Info/Question/Answer/Solution format
    #[arg(long)]
    legacy: bool,

    /// Number of instances to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Accept instances whose statement repeats an earlier one
    #[arg(long)]
    allow_duplicates: bool,

    /// Instantiations to try before giving up
    #[arg(long, default_value_t = quizgen::DEFAULT_MAX_ATTEMPTS, conflicts_with = "unbounded")]
    max_attempts: usize,

    /// Keep trying until the batch is full (may never finish)
    #[arg(long)]
    unbounded: bool,

    /// External variable visible to the problem, as NAME=EXPR (repeatable)
    #[arg(long = "var", value_name = "NAME=EXPR")]
    vars: Vec<String>,

    /// Free symbol for symbolic expressions, e.g. x (repeatable)
    #[arg(long = "symbol", value_name = "NAME")]
    symbols: Vec<String>,

    /// Print the batch as JSON
    #[arg(long)]
    json: bool,

    /// Force ANSI color output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let context = match build_context(&cli) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let bytes = match read_input(cli.input.as_ref()) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: failed to read input: {err}");
            return ExitCode::from(1);
        }
    };

    let dialect = if cli.legacy { Dialect::Legacy } else { Dialect::Primary };
    let definition = match parse_bytes(&bytes, dialect) {
        Ok(definition) => definition,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    let mut options = Options::new().allow_duplicates(cli.allow_duplicates).max_attempts(cli.max_attempts);
    if cli.unbounded {
        options = options.unbounded();
    }

    let batch = generate_with(&definition, cli.count, &context, &options);

    if cli.json {
        match serde_json::to_string_pretty(&batch) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: failed to serialize batch: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        let color = if cli.color {
            true
        } else if cli.no_color {
            false
        } else {
            io::stdout().is_terminal()
        };
        debug_report::print_batch(&definition, &batch, color);
    }

    if batch.is_complete() { ExitCode::SUCCESS } else { ExitCode::from(3) }
}

fn build_context(cli: &Cli) -> Result<Context, String> {
    let mut context = Context::new().with_sandbox(Arc::new(AssignmentSandbox));
    if !cli.symbols.is_empty() {
        context = context.with_algebra(Arc::new(ExactAlgebra::new().with_symbols(cli.symbols.iter().cloned())));
    }

    // each --var sees the ones before it
    for var in &cli.vars {
        let (name, expr) = var.split_once('=').ok_or_else(|| format!("--var expects NAME=EXPR, got '{var}'"))?;
        let value = try_evaluate(expr, &ValueEnvironment::new(), &context).map_err(|err| format!("--var {name}: {err}"))?;
        context = context.with_external(name.trim(), value);
    }
    Ok(context)
}

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}
