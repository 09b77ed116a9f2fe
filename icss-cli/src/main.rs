use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use icss_compiler::{CompileOptions, Compiler, Diagnostic, DiagnosticLevel, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Debug dump of the tree after evaluation.
    Ast,
    /// The evaluated tree as JSON.
    Json,
    /// The token stream produced by the lexer.
    Tokens,
}

#[derive(Parser)]
#[command(
    name = "icss",
    version,
    about = "Compile ICSS stylesheets to plain CSS.",
    long_about = "Check an ICSS stylesheet for scoping and typing errors, resolve its variables, \
arithmetic and if/else blocks, and write the resulting CSS."
)]
struct Cli {
    /// Path to an ICSS source file.
    input: PathBuf,

    /// Destination for the generated CSS (defaults to stdout).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only run semantic checks; do not evaluate or write CSS.
    #[arg(long)]
    check: bool,

    /// Emit additional compiler output.
    #[arg(long, value_enum)]
    emit: Vec<Emit>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)
}

/// Logging is off unless `RUST_LOG` is set, e.g. `RUST_LOG=icss_compiler=debug`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let contents = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    let source = SourceFile::new(cli.input.clone(), contents);

    let mut compiler = Compiler::new(CompileOptions {
        dump_tokens: cli.emit.contains(&Emit::Tokens),
    });

    if cli.check {
        let result = compiler.check(&source);
        report_diagnostics(&source, &compiler);
        result.context("Check failed")?;
        eprintln!("{}: no errors", source.path.display());
        return Ok(());
    }

    let compilation = match compiler.compile(&source) {
        Ok(compilation) => compilation,
        Err(err) => {
            report_diagnostics(&source, &compiler);
            return Err(err.context("Compilation failed"));
        }
    };
    report_diagnostics(&source, &compiler);

    if cli.emit.contains(&Emit::Ast) {
        println!("{:#?}", compilation.ast);
    }

    if cli.emit.contains(&Emit::Json) {
        let json = serde_json::to_string_pretty(&compilation.ast)
            .context("failed to serialize syntax tree")?;
        println!("{json}");
    }

    match &cli.output {
        Some(path) => {
            fs::write(path, &compilation.css)
                .with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!(path = %path.display(), "wrote stylesheet");
        }
        None => print!("{}", compilation.css),
    }

    Ok(())
}

fn report_diagnostics(source: &SourceFile, compiler: &Compiler) {
    if compiler.diagnostics().is_empty() {
        return;
    }
    eprintln!("Diagnostics:");
    for diagnostic in compiler.diagnostics().entries() {
        print_diagnostic(source, diagnostic);
    }
}

fn print_diagnostic(source: &SourceFile, diagnostic: &Diagnostic) {
    let (level_label, level_marker) = match diagnostic.level {
        DiagnosticLevel::Error => ("error", "  -"),
        DiagnosticLevel::Warning => ("warning", "  ~"),
    };
    eprintln!("{} {}: {}", level_marker, level_label, diagnostic.message);
    let Some(span) = diagnostic.span else {
        return;
    };
    eprintln!(
        "     --> {}:{}:{}",
        source.path.display(),
        span.line,
        span.column
    );

    if let Some(raw_line) = source.line(span.line) {
        let display_line = raw_line.replace('\t', "    ");
        eprintln!("      {}", display_line);

        let mut caret_line = String::from("      ");
        for ch in raw_line.chars().take(span.column.saturating_sub(1)) {
            match ch {
                '\t' => caret_line.push_str("    "),
                _ => caret_line.push(' '),
            }
        }

        let highlight_len = if span.end_line == span.line {
            span.end_column
                .saturating_sub(span.column)
                .saturating_add(1)
        } else {
            display_line
                .chars()
                .count()
                .saturating_sub(span.column.saturating_sub(1))
        };
        caret_line.push_str(&"^".repeat(highlight_len.max(1)));
        eprintln!("{}", caret_line);
    }
}
