//! `scpi`: command-line front end for the SCPI toolchain.
//!
//! Parses files of SCPI command lines against a command table, checks
//! tables for unusable entries, and explains diagnostic ids.

mod render;

use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use scpi_toolchain_core::grammar::tables::issue_diagnostic;
use scpi_toolchain_core::{CommandTable, ParsedCommand, ParserConfig, ParserSession};
use scpi_toolchain_diagnostics::{self as diag, Diagnostic, ErrorKind, LineIndex, Severity};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::render::{Format, print_summary, render_diagnostics};

/// Demonstration table used when `--tables` is omitted.
const EMBEDDED_TABLE_JSON: &str = include_str!("../data/commands.json");

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "scpi",
    version,
    about = "SCPI toolchain: parse instrument command lines against a command table"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log parser decisions to stderr (`-v` debug, `-vv` trace).
    /// Without it, `RUST_LOG` selects the filter.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse every command of every line in FILE (`-` for stdin).
    Parse {
        file: String,
        /// Command table JSON. When omitted, uses the built-in
        /// demonstration table.
        #[arg(long)]
        tables: Option<String>,
        /// Parser configuration JSON (suffix bounds, tree mode).
        #[arg(long)]
        config: Option<String>,
    },

    /// Check a command table for unusable or suspicious entries.
    CheckTable {
        /// Command table JSON (see `parse --help`).
        #[arg(long)]
        tables: Option<String>,
    },

    /// Explain a diagnostic id (e.g. SCPI070) or numeric error code (e.g. 70).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    let outcome = init_tracing(cli.verbose).and_then(|()| match cli.cmd {
        Cmd::Parse {
            file,
            tables,
            config,
        } => cmd_parse(&file, tables.as_deref(), config.as_deref(), format),
        Cmd::CheckTable { tables } => cmd_check_table(tables.as_deref(), format),
        Cmd::Explain { id } => cmd_explain(&id, format),
    });

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            report_failure(&err, format);
            process::exit(2);
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn")),
        1 => EnvFilter::try_new("debug"),
        _ => EnvFilter::try_new("trace"),
    }
    .context("failed to initialise tracing filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true),
        )
        .init();
    Ok(())
}

/// Report a failed command, as a JSON envelope on stdout when JSON output
/// was requested.
fn report_failure(err: &anyhow::Error, format: Format) {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "success": false,
                "error": "command_failed",
                "message": format!("{err:#}"),
            });
            println!("{out:#}");
        }
        Format::Pretty => eprintln!("error: {err:#}"),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

/// Returns whether every command parsed.
fn cmd_parse(
    file: &str,
    tables_path: Option<&str>,
    config_path: Option<&str>,
    format: Format,
) -> Result<bool> {
    let input = read_input(file)?;
    let table = load_table(tables_path)?;
    let config = load_config(config_path)?;

    let broken = table.check().iter().filter(|i| i.kind.is_error()).count();
    if broken > 0 {
        warn!(issues = broken, "command table has errors; see `scpi check-table`");
    }

    let mut session = ParserSession::with_config(&table, config);
    let lines = LineIndex::new(&input);
    let mut commands = Vec::new();
    let mut diagnostics = Vec::new();

    let mut base = 0;
    for raw in input.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\r', '\n']);
        for result in session.commands(line) {
            match result {
                Ok(command) => {
                    commands.push(CommandRecord::new(&table, &lines, line, base, command));
                }
                Err(err) => {
                    let mut d = err.to_diagnostic();
                    d.span = d.span.map(|s| s.offset(base));
                    if let (Some(span), Some(ctx)) = (d.span, d.context.as_mut()) {
                        let (row, _) = lines.line_col(span.start);
                        ctx.insert("line".to_string(), (row + 1).to_string());
                    }
                    diagnostics.push(d);
                }
            }
        }
        base += raw.len();
    }
    debug!(
        commands = commands.len(),
        errors = diagnostics.len(),
        "parse finished"
    );

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": diagnostics.is_empty(),
                "commands": commands.iter().map(CommandRecord::to_json).collect::<Vec<_>>(),
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for record in &commands {
                println!("{}:{}  {}", record.line, record.column, record.summary()?);
            }
            render_diagnostics(&input, file, &diagnostics);
            print_summary(&diagnostics);
        }
    }

    Ok(diagnostics.is_empty())
}

/// Returns whether the table has no error-level issues.
fn cmd_check_table(tables_path: Option<&str>, format: Format) -> Result<bool> {
    let table = load_table(tables_path)?;
    let diagnostics: Vec<Diagnostic> = table.check().iter().map(issue_diagnostic).collect();
    let ok = !diagnostics.iter().any(|d| d.severity == Severity::Error);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": ok,
                "commands": table.commands.len(),
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics("", tables_path.unwrap_or("<built-in>"), &diagnostics);
            print_summary(&diagnostics);
            if ok {
                eprintln!("table ok ({} commands)", table.live_commands().len());
            }
        }
    }
    Ok(ok)
}

fn cmd_explain(id: &str, format: Format) -> Result<bool> {
    let kind = match id.trim_start_matches('-').parse::<u16>() {
        Ok(code) => ErrorKind::from_code(code),
        Err(_) => ErrorKind::from_id(&id.to_ascii_uppercase()),
    };
    let resolved = kind.map_or_else(|| id.to_ascii_uppercase(), |k| k.id().to_string());
    let explanation = diag::explain(&resolved);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": resolved,
                "code": kind.map(ErrorKind::code),
                "message": kind.map(|k| k.to_string()),
                "explanation": explanation,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            use ariadne::Fmt;
            match (kind, explanation) {
                (Some(k), Some(text)) => println!(
                    "{} ({}, code {}): {text}",
                    resolved.fg(ariadne::Color::Cyan),
                    k,
                    k.code()
                ),
                (None, Some(text)) => println!("{}: {text}", resolved.fg(ariadne::Color::Cyan)),
                (_, None) => println!("{resolved}: (no explanation available)"),
            }
        }
    }
    Ok(true)
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// A parsed command together with where it came from.
struct CommandRecord<'a> {
    line: usize,
    column: usize,
    text: &'a str,
    name: Option<&'a str>,
    keywords: &'a str,
    command: ParsedCommand<'a>,
}

impl<'a> CommandRecord<'a> {
    /// `base` is the byte offset of `line` in the input; the stored span is
    /// made input-relative.
    fn new(
        table: &'a CommandTable,
        lines: &LineIndex,
        line: &'a str,
        base: usize,
        mut command: ParsedCommand<'a>,
    ) -> Self {
        let spec = table.commands.get(command.index);
        let text = line
            .get(command.span.start..command.span.end)
            .unwrap_or_default();
        command.span = command.span.offset(base);
        let (row, column) = lines.line_col(command.span.start);
        Self {
            line: row + 1,
            column: column + 1,
            text,
            name: spec.and_then(|s| s.name.as_deref()),
            keywords: spec.map_or("", |s| s.keywords.as_str()),
            command,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "line": self.line,
            "text": self.text,
            "index": self.command.index,
            "name": self.name,
            "keywords": self.keywords,
            "suffixes": self.command.suffixes,
            "params": self.command.present_params(),
            "span": self.command.span,
        })
    }

    fn summary(&self) -> Result<String> {
        let mut out = format!(
            "{}  [{}] {}",
            self.text,
            self.command.index,
            self.name.unwrap_or(self.keywords)
        );
        if !self.command.suffixes.is_empty() {
            out.push_str(&format!(
                "  suffixes={:?}",
                self.command.suffixes.as_slice()
            ));
        }
        let params = self.command.present_params();
        if !params.is_empty() {
            out.push_str(&format!("  params={}", serde_json::to_string(params)?));
        }
        Ok(out)
    }
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(input);
    }
    fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))
}

/// The table at `path`, or the built-in demonstration table.
fn load_table(path: Option<&str>) -> Result<CommandTable> {
    let Some(path) = path else {
        return CommandTable::from_json(EMBEDDED_TABLE_JSON)
            .context("built-in command table is invalid");
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read tables file '{path}'"))?;
    let table = CommandTable::from_json(&json)
        .with_context(|| format!("failed to parse tables file '{path}'"))?;
    debug!(path, commands = table.commands.len(), "loaded command table");
    Ok(table)
}

fn load_config(path: Option<&str>) -> Result<ParserConfig> {
    let Some(path) = path else {
        return Ok(ParserConfig::default());
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read config file '{path}'"))?;
    ParserConfig::from_json(&json).with_context(|| format!("failed to parse config file '{path}'"))
}
