//! `lpm` - scan log files with problem matchers and print the problems found.
//!
//! `lpm scan` picks a parser and matchers from a settings document and scans one log file,
//! `lpm rescan` repeats the last scan remembered in a session file, and `lpm list` shows the
//! available parsers and matchers.

#![warn(missing_docs)]

mod render;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::tty::IsTty;
use lpm_core::{
    CancellationToken, LogScanner, ParserSettings, ResolvedScan, ScanOptions, ScanRequest,
    ScanSession, Selection,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log problem matcher.
#[derive(Parser, Debug)]
#[command(name = "lpm", version, about = "Scan log files with problem matchers")]
pub struct Cli {
    /// Enable verbose (debug-level) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a log file.
    Scan(ScanArgs),
    /// Repeat the last scan recorded in the session file.
    Rescan(RescanArgs),
    /// List parsers and their matchers.
    List(ListArgs),
}

/// Options shared by `scan` and `rescan`.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Settings document (JSON, or YAML for `.yaml`/`.yml`).
    #[arg(short, long)]
    pub settings: PathBuf,

    /// Workspace root substituted for `${workspaceFolder}`.
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Session file remembering the last parser, matchers and log.
    #[arg(long)]
    pub session: Option<PathBuf>,

    /// Skip matchers that have no way to determine a severity.
    #[arg(long)]
    pub strict_severity: bool,

    /// Parser to use (defaults to the remembered one, then the first in the settings).
    #[arg(short, long)]
    pub parser: Option<String>,

    /// Matcher title to enable; repeat for several (defaults to the remembered or default set).
    #[arg(short, long = "matcher")]
    pub matchers: Vec<String>,
}

/// Arguments for `lpm scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Log file to scan.
    pub log: PathBuf,

    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for `lpm rescan`.
#[derive(Args, Debug)]
pub struct RescanArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for `lpm list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Settings document (JSON, or YAML for `.yaml`/`.yml`).
    #[arg(short, long)]
    pub settings: PathBuf,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One line per problem.
    Text,
    /// Machine-readable JSON.
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color = match cli.color {
        ColorChoice::Auto => io::stdout().is_tty(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let result = match &cli.command {
        Command::Scan(args) => scan(args, color),
        Command::Rescan(args) => rescan(args, color),
        Command::List(args) => list(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_settings(path: &Path) -> Result<ParserSettings> {
    ParserSettings::load_from_path(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

fn load_session(path: Option<&Path>) -> Result<ScanSession> {
    match path {
        Some(path) => ScanSession::load(path)
            .with_context(|| format!("failed to load session from {}", path.display())),
        None => Ok(ScanSession::default()),
    }
}

/// Selection from `--parser`/`--matcher`, filling gaps from the session and the settings.
fn choose_selection(
    common: &CommonArgs,
    settings: &ParserSettings,
    session: &ScanSession,
) -> Result<Selection> {
    let parser = match (&common.parser, &session.parser) {
        (Some(parser), _) => parser.clone(),
        (None, Some(remembered)) if settings.matchers(remembered).is_ok() => remembered.clone(),
        (None, _) => settings.default_parser()?.to_string(),
    };

    if common.matchers.is_empty() {
        Ok(session.preselected(&parser, settings)?)
    } else {
        Ok(Selection::new(parser, common.matchers.clone()))
    }
}

fn scan(args: &ScanArgs, color: bool) -> Result<()> {
    let settings = load_settings(&args.common.settings)?;
    let mut session = load_session(args.common.session.as_deref())?;

    let selection = choose_selection(&args.common, &settings, &session)?;
    let resolved = session.resolve(
        ScanRequest::ScanFile(selection, args.log.clone()),
        &settings,
    )?;
    execute(resolved, &args.common, &mut session, color)
}

fn rescan(args: &RescanArgs, color: bool) -> Result<()> {
    let common = &args.common;
    if common.session.is_none() {
        bail!("`lpm rescan` needs --session to know what was scanned last");
    }
    let settings = load_settings(&common.settings)?;
    let mut session = load_session(common.session.as_deref())?;

    let request = if common.parser.is_none() && common.matchers.is_empty() {
        ScanRequest::Rescan
    } else {
        ScanRequest::RescanWithSelection(choose_selection(common, &settings, &session)?)
    };
    let resolved = session.resolve(request, &settings)?;
    execute(resolved, common, &mut session, color)
}

fn execute(
    resolved: ResolvedScan,
    common: &CommonArgs,
    session: &mut ScanSession,
    color: bool,
) -> Result<()> {
    tracing::debug!(
        parser = %resolved.selection.parser,
        matchers = ?resolved.selection.matchers,
        log = %resolved.log.display(),
        "starting scan"
    );

    let scanner = LogScanner::new(
        &resolved.definitions,
        ScanOptions {
            log_path: None,
            workspace_root: common.workspace.clone(),
            strict_severity: common.strict_severity,
        },
    );
    if scanner.matchers().is_empty() {
        bail!(
            "none of the selected matchers of parser '{}' could be compiled",
            resolved.selection.parser
        );
    }

    let output = scanner
        .scan_path(&resolved.log, &CancellationToken::new())
        .with_context(|| format!("failed to scan {}", resolved.log.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match common.format {
        ReportFormat::Text => render::write_text(&output, color, &mut out)?,
        ReportFormat::Json => render::write_json(&output, &mut out)?,
    }
    out.flush()?;

    if let Some(path) = &common.session {
        session.record(&resolved.selection, &resolved.log);
        session
            .save(path)
            .with_context(|| format!("failed to save session to {}", path.display()))?;
    }
    Ok(())
}

fn list(args: &ListArgs) -> Result<()> {
    let settings = load_settings(&args.settings)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for parser in settings.parser_names()? {
        writeln!(out, "{parser}")?;
        let defaults = match settings.default_selection(parser) {
            Ok(selection) => selection.matchers,
            Err(err) => {
                writeln!(out, "  ({err})")?;
                continue;
            }
        };
        for title in settings.matcher_titles(parser)? {
            let marker = if defaults.contains(&title) { '*' } else { ' ' };
            writeln!(out, "  {marker} {title}")?;
        }
    }
    Ok(())
}
