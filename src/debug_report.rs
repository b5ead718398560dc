use quizgen::{Batch, BatchStatus, GenerationMetrics, ProblemDefinition, ProblemInstance};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_batch(definition: &ProblemDefinition, batch: &Batch, color: bool) {
    let palette = ansi::Palette::new(color);
    let name = if definition.title.is_empty() { &definition.problem_id } else { &definition.title };
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Problem: \"{}\"", name), ansi::CYAN)));
    if !definition.tags.is_empty() {
        println!("   {}", palette.dim(definition.tags.join(", ")));
    }

    println!("\n{}", palette.paint("━━━ Instances ━━━", ansi::GRAY));
    if batch.is_empty() {
        println!("{}", palette.dim("  No instances produced"));
    }
    for (idx, (instance, values)) in batch.instances.iter().zip(&batch.values).enumerate() {
        print_instance(idx, instance, &palette);
        if !values.is_empty() {
            let bindings: Vec<String> = values.iter().map(|(k, v)| format!("{k} = {v}")).collect();
            println!("      {} {}", palette.dim("values:"), palette.paint(bindings.join(", "), ansi::BLUE));
        }
    }

    println!("\n{}", palette.paint("━━━ Generation ━━━", ansi::GRAY));
    print_metrics(&batch.metrics, batch.status, &palette);
    println!();
}

fn print_instance(idx: usize, instance: &ProblemInstance, palette: &ansi::Palette) {
    println!("  {} {}", palette.paint(format!("[{}]", idx), ansi::GRAY), palette.bold(&instance.statement));
    if instance.choices.is_empty() {
        println!("      {} {}", palette.dim("answer:"), palette.paint(&instance.answer, ansi::GREEN));
    } else {
        for (pos, choice) in instance.choices.iter().enumerate() {
            let marker = if pos == 0 { palette.paint("✓", ansi::GREEN) } else { palette.dim("·") };
            println!("      {} {}", marker, choice);
        }
    }
    if !instance.solution.is_empty() {
        let title = if instance.solution_title.is_empty() { "solution:" } else { instance.solution_title.as_str() };
        println!("      {} {}", palette.dim(title), instance.solution);
    }
}

fn print_metrics(metrics: &GenerationMetrics, status: BatchStatus, palette: &ansi::Palette) {
    let status = match status {
        BatchStatus::Complete => palette.paint("✓ complete", ansi::GREEN),
        BatchStatus::Exhausted => palette.paint("✗ attempt budget exhausted", ansi::YELLOW),
    };
    println!(
        "  {}  │  Accepted: {}  │  Attempts: {}  │  Duplicates: {}",
        status,
        palette.paint(metrics.accepted.to_string(), ansi::GREEN),
        palette.paint(metrics.attempts.to_string(), ansi::BLUE),
        palette.paint(metrics.duplicates_rejected.to_string(), ansi::YELLOW),
    );
    if metrics.absent_parameters > 0 || metrics.unresolved_placeholders > 0 {
        println!(
            "  {} {}  {} {}",
            palette.dim("absent parameters:"),
            palette.paint(metrics.absent_parameters.to_string(), ansi::YELLOW),
            palette.dim("unresolved placeholders:"),
            palette.paint(metrics.unresolved_placeholders.to_string(), ansi::YELLOW),
        );
    }
    println!(
        "  Total: {}  │  Compile: {}  │  Acceptance: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.dim(format!("{:?}", metrics.compile)),
        palette.paint(format!("{:.0}%", metrics.acceptance_rate() * 100.0), ansi::CYAN),
    );
}
