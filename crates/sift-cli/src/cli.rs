//! CLI argument definitions for the `sift` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sift::PatternContext;
use sift_syntax::SupportedLanguage;

use crate::telemetry::LogFormat;

/// Default log filter: quiet unless something goes wrong.
pub(crate) const DEFAULT_LOG_FILTER: &str = "warn";

/// Output format for search results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// One `path:line:column: text` line per match.
    #[default]
    Human,
    /// One JSON object per searched file.
    Json,
}

/// Structural search over source files.
#[derive(Parser, Debug)]
#[command(name = "sift", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Tracing filter directives, for example `sift=debug`.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Log line format on stderr.
    #[arg(long, global = true, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Subcommands of the `sift` binary.
#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Searches files for a pattern.
    Search(SearchArgs),
    /// Compiles a pattern and reports diagnostics.
    Check(PatternArgs),
    /// Prints the tokens a file must contain to match a pattern.
    Plan(PatternArgs),
}

/// Pattern and compilation flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub(crate) struct PatternArgs {
    /// The query, for example `foo('_x);`.
    #[arg(value_name = "PATTERN")]
    pub(crate) pattern: String,
    /// Host language of the pattern and the searched files.
    #[arg(long, short, default_value_t = SupportedLanguage::TypeScript)]
    pub(crate) language: SupportedLanguage,
    /// How the pattern text is parsed.
    #[arg(long)]
    pub(crate) context: Option<PatternContext>,
    /// Compares literals and regexes without regard to case.
    #[arg(long, short = 'i')]
    pub(crate) ignore_case: bool,
    /// Reports slots that can never do anything useful.
    #[arg(long)]
    pub(crate) strict: bool,
    /// JSON file with `engine`, `compile` and `search` option tables.
    #[arg(long, value_name = "FILE")]
    pub(crate) options: Option<PathBuf>,
}

/// Arguments of `sift search`.
#[derive(Args, Debug, Clone)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    pub(crate) pattern: PatternArgs,
    /// Files or directories to search.
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub(crate) paths: Vec<PathBuf>,
    /// Skips the subtrees of nodes that already matched.
    #[arg(long)]
    pub(crate) non_overlapping: bool,
    /// Reports one result per match instead of one per target node.
    #[arg(long)]
    pub(crate) per_match: bool,
    /// Result rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
}
