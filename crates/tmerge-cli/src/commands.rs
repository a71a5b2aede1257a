use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tempfile::NamedTempFile;
use tmerge_diff::{Document, HunkStream};
use tmerge_merge::{
    ConflictResolver, MergeConfig, MergeEngine, MergeOutcome, MergeStatus, MergeStrategy,
    LOCAL_LABEL, NEW_LABEL,
};
use tracing::info;

use crate::cli::*;
use crate::prompt;

const NO_DIFFERENCES: &str = "No differences found.";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Diff(args) => {
            let engine = MergeEngine::new(with_diff_flags(config, &args.diff));
            cmd_diff(&args, &engine, cli.format, &mut out)
        }
        Command::Merge(args) => {
            let engine = MergeEngine::new(with_merge_flags(config, &args));
            let strategy = selected_strategy(&args, engine.config());
            let mut terminal = strategy
                .is_interactive()
                .then(|| prompt::terminal_resolver(engine.config()));
            let resolver: Option<&mut dyn ConflictResolver> = match terminal.as_mut() {
                Some(terminal) => Some(&mut **terminal),
                None => None,
            };
            cmd_merge(
                &args,
                strategy,
                &engine,
                cli.format,
                resolver,
                &mut out,
                &mut io::stderr(),
            )
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MergeConfig> {
    match path {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MergeConfig::default()),
    }
}

fn with_diff_flags(mut config: MergeConfig, flags: &DiffFlags) -> MergeConfig {
    if let Some(context) = flags.context {
        config.diff.context_lines = context;
    }
    if let Some(algorithm) = flags.algorithm {
        config.diff.algorithm = algorithm.into();
    }
    config
}

fn with_merge_flags(config: MergeConfig, args: &MergeArgs) -> MergeConfig {
    let mut config = with_diff_flags(config, &args.diff);
    if let Some(secs) = args.timeout {
        config.resolution_timeout_secs = Some(secs);
    }
    if args.block_replacement {
        config.smart.block_replacement = true;
    }
    config
}

fn selected_strategy(args: &MergeArgs, config: &MergeConfig) -> MergeStrategy {
    args.strategy.map(MergeStrategy::from).unwrap_or(config.default_strategy)
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Document::from_bytes(&bytes).with_context(|| format!("cannot merge {}", path.display()))
}

fn read_new(input: &NewInput) -> anyhow::Result<Document> {
    match (&input.new_file, &input.new_content) {
        (Some(path), _) => read_document(path),
        (None, Some(text)) => Ok(Document::parse(text)),
        (None, None) => anyhow::bail!("either --new-file or --new-content is required"),
    }
}

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DiffReport<'a> {
    local: &'a Path,
    identical: bool,
    additions: usize,
    deletions: usize,
    hunks: &'a HunkStream,
    unified: String,
}

fn cmd_diff<W: Write>(args: &DiffArgs, engine: &MergeEngine, format: OutputFormat, out: &mut W) -> anyhow::Result<()> {
    let local = read_document(&args.local)?;
    let new = read_new(&args.new)?;
    let stream = engine.diff(&local, &new);
    info!(hunks = stream.len(), "diff computed");

    match format {
        OutputFormat::Json => {
            let report = DiffReport {
                local: &args.local,
                identical: stream.is_empty(),
                additions: stream.additions(),
                deletions: stream.deletions(),
                hunks: &stream,
                unified: stream.to_unified(LOCAL_LABEL, NEW_LABEL),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text if stream.is_empty() => writeln!(out, "{NO_DIFFERENCES}")?,
        OutputFormat::Text => {
            for line in stream.to_unified(LOCAL_LABEL, NEW_LABEL).lines() {
                writeln!(out, "{}", colorize_diff_line(line))?;
            }
        }
    }
    Ok(())
}

fn colorize_diff_line(line: &str) -> String {
    if line.starts_with("---") || line.starts_with("+++") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MergeReport<'a> {
    #[serde(flatten)]
    outcome: &'a MergeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
}

fn cmd_merge<W: Write, E: Write>(
    args: &MergeArgs,
    strategy: MergeStrategy,
    engine: &MergeEngine,
    format: OutputFormat,
    resolver: Option<&mut dyn ConflictResolver>,
    out: &mut W,
    notes: &mut E,
) -> anyhow::Result<()> {
    let local = read_document(&args.local)?;
    let new = read_new(&args.new)?;

    let outcome = match resolver {
        Some(resolver) => engine.merge_with_resolver(&local, &new, strategy, resolver),
        None => engine.merge(&local, &new, strategy),
    }
    .with_context(|| format!("{strategy} merge of {} failed", args.local.display()))?;

    if let Some(path) = &args.output {
        write_atomic(path, &outcome.text)?;
    }

    match format {
        OutputFormat::Json => {
            let report = MergeReport {
                outcome: &outcome,
                output: args.output.as_deref(),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text => {
            match outcome.status {
                MergeStatus::Unchanged => {
                    writeln!(notes, "{} Local content kept unchanged.", NO_DIFFERENCES.yellow())?
                }
                MergeStatus::Merged => writeln!(
                    notes,
                    "{} Merged with {} ({} hunks, {} conflict regions)",
                    "✓".green().bold(),
                    strategy.as_str().cyan(),
                    outcome.hunks,
                    outcome.conflicts
                )?,
            }
            match &args.output {
                Some(path) => writeln!(notes, "  Written to {}", path.display().to_string().bold())?,
                None => out.write_all(outcome.text.as_bytes())?,
            }
        }
    }
    Ok(())
}

/// Replace `path` with `text` in one step: write a sibling temp file, then
/// rename it over the target.
fn write_atomic(path: &Path, text: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(&dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    file.write_all(text.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
