//! Command-line runtime for Sift.
//!
//! The module owns argument parsing, option loading, input collection and
//! result rendering. It can be exercised both from the binary entrypoint
//! and from tests, which substitute in-memory writers for the standard
//! streams.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use sift::{
    CompileOptions, CompiledPattern, Engine, EngineConfig, FileMatches, SearchOptions,
    TokenCategory,
};
use tracing::debug;

mod cli;
mod errors;
mod inputs;
mod telemetry;

use cli::{Cli, CliCommand, OutputFormat, PatternArgs, SearchArgs};
use errors::AppError;
pub use telemetry::{LogFormat, TelemetryError};

/// Option tables accepted by `--options`.
///
/// Every table is optional; command-line flags are applied on top.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OptionsFile {
    engine: EngineConfig,
    compile: CompileOptions,
    search: SearchOptions,
}

impl OptionsFile {
    fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| AppError::ReadOptions {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AppError::ParseOptions {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A compiled pattern together with the engine and options it runs under.
struct Prepared {
    engine: Engine,
    pattern: CompiledPattern,
    search: SearchOptions,
}

fn prepare(args: &PatternArgs) -> Result<Prepared, AppError> {
    let file = OptionsFile::load(args.options.as_deref())?;

    let mut compile = file.compile;
    if let Some(context) = args.context {
        compile = compile.with_context(context);
    }
    if args.ignore_case {
        compile = compile.with_case_sensitive(false);
    }
    if args.strict {
        compile = compile.with_strict(true);
    }

    let engine = Engine::new(Arc::new(args.language.profile())).with_config(file.engine);
    let pattern = engine.compile(&args.pattern, &compile)?;
    debug!(
        language = %args.language,
        context = %compile.context(),
        "compiled pattern"
    );
    Ok(Prepared {
        engine,
        pattern,
        search: file.search,
    })
}

fn search<W: Write, E: Write>(
    args: &SearchArgs,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError> {
    let prepared = prepare(&args.pattern)?;
    let mut options = prepared.search;
    if args.non_overlapping {
        options = options.with_non_overlapping(true);
    }
    if args.per_match {
        options = options.with_context_match(true);
    }

    let files = inputs::collect(&args.paths, args.pattern.language)?;
    let results = prepared
        .engine
        .search_files(&files, &prepared.pattern, &options)?;

    for file in &results {
        match args.output {
            OutputFormat::Human => write_human(file, stdout)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *stdout, file)?;
                writeln!(stdout)?;
            }
        }
        if !file.failures.is_empty() {
            writeln!(
                stderr,
                "warning: {}: {} constraint evaluations failed",
                file.uri,
                file.failures.len()
            )?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Writes `path:line:column: text` per match, with one-based positions and
/// only the first line of each matched text.
fn write_human<W: Write>(file: &FileMatches, stdout: &mut W) -> Result<(), AppError> {
    for found in &file.matches {
        let start = found.span().start();
        let first_line = found.image().lines().next().unwrap_or_default();
        writeln!(
            stdout,
            "{}:{}:{}: {}",
            file.uri,
            start.line() + 1,
            start.column() + 1,
            first_line
        )?;
    }
    Ok(())
}

fn check<W: Write>(args: &PatternArgs, stdout: &mut W) -> Result<ExitCode, AppError> {
    let prepared = prepare(args)?;
    for warning in prepared.pattern.warnings() {
        writeln!(stdout, "warning: {warning}")?;
    }
    writeln!(stdout, "ok")?;
    Ok(ExitCode::SUCCESS)
}

fn plan<W: Write>(args: &PatternArgs, stdout: &mut W) -> Result<ExitCode, AppError> {
    let prepared = prepare(args)?;
    let plan = prepared.engine.plan(&prepared.pattern);
    if plan.is_trivial() {
        writeln!(stdout, "no required tokens")?;
        return Ok(ExitCode::SUCCESS);
    }
    for (category, word) in plan.required() {
        writeln!(stdout, "require {} {word}", category_label(*category))?;
    }
    for group in plan.any_of() {
        let words: Vec<&str> = group.iter().map(String::as_str).collect();
        writeln!(stdout, "any-of {}", words.join(" "))?;
    }
    Ok(ExitCode::SUCCESS)
}

const fn category_label(category: TokenCategory) -> &'static str {
    match category {
        TokenCategory::Code => "code",
        TokenCategory::Comment => "comment",
        TokenCategory::Literal => "literal",
    }
}

fn dispatch<W: Write, E: Write>(
    cli: &Cli,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError> {
    telemetry::initialise(&cli.log_filter, cli.log_format)?;
    match &cli.command {
        CliCommand::Search(args) => search(args, stdout, stderr),
        CliCommand::Check(args) => check(args, stdout),
        CliCommand::Plan(args) => plan(args, stdout),
    }
}

fn report<E: Write>(error: &AppError, stderr: &mut E) {
    let mut lines = vec![error.to_string()];
    lines.extend(error.notes().iter().map(|note| format!("  note: {note}")));
    for line in lines {
        if writeln!(stderr, "{line}").is_err() {
            return;
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            return match write!(stdout, "{}", error.render()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => {
            report(&AppError::CliUsage(error), stderr);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&cli, stdout, stderr) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            report(&error, stderr);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
