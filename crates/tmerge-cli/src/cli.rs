use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tmerge_diff::DiffAlgorithm;
use tmerge_merge::MergeStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "tmerge",
    about = "Line-level text merge with selectable conflict strategies",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the unified diff between a local file and new content
    Diff(DiffArgs),
    /// Merge new content into a local file
    Merge(MergeArgs),
}

/// Where the new version comes from. Exactly one source is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct NewInput {
    /// Read the new version from a file
    #[arg(long, value_name = "PATH")]
    pub new_file: Option<PathBuf>,
    /// Take the new version verbatim from the command line
    #[arg(long, value_name = "TEXT")]
    pub new_content: Option<String>,
}

#[derive(Args, Debug)]
pub struct DiffFlags {
    /// Unchanged lines shown around each change
    #[arg(short = 'U', long = "context", value_name = "N")]
    pub context: Option<usize>,
    /// Line alignment algorithm
    #[arg(long)]
    pub algorithm: Option<AlgorithmArg>,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// The local (baseline) file
    pub local: PathBuf,
    #[command(flatten)]
    pub new: NewInput,
    #[command(flatten)]
    pub diff: DiffFlags,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// The local (baseline) file
    pub local: PathBuf,
    #[command(flatten)]
    pub new: NewInput,
    /// Merge strategy (defaults to the configured one, normally smart)
    #[arg(short, long)]
    pub strategy: Option<StrategyArg>,
    /// Write the merged document here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Seconds to wait for each interactive answer
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
    /// Let smart merges replace wholly rewritten declarations
    #[arg(long)]
    pub block_replacement: bool,
    #[command(flatten)]
    pub diff: DiffFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    PreferLocal,
    PreferNew,
    Smart,
    Interactive,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::PreferLocal => MergeStrategy::PreferLocal,
            StrategyArg::PreferNew => MergeStrategy::PreferNew,
            StrategyArg::Smart => MergeStrategy::Smart,
            StrategyArg::Interactive => MergeStrategy::Interactive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AlgorithmArg {
    Lcs,
    Myers,
    Patience,
}

impl From<AlgorithmArg> for DiffAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Lcs => DiffAlgorithm::Lcs,
            AlgorithmArg::Myers => DiffAlgorithm::Myers,
            AlgorithmArg::Patience => DiffAlgorithm::Patience,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff_with_file() {
        let cli = Cli::try_parse_from(["tmerge", "diff", "a.txt", "--new-file", "b.txt"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.local, PathBuf::from("a.txt"));
            assert_eq!(args.new.new_file, Some(PathBuf::from("b.txt")));
            assert!(args.new.new_content.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_merge_with_content_and_strategy() {
        let cli = Cli::try_parse_from([
            "tmerge", "merge", "a.txt", "--new-content", "x\ny", "--strategy", "prefer-new", "-o", "out.txt",
        ])
        .unwrap();
        if let Command::Merge(args) = cli.command {
            assert_eq!(args.new.new_content.as_deref(), Some("x\ny"));
            assert_eq!(args.strategy, Some(StrategyArg::PreferNew));
            assert_eq!(args.output, Some(PathBuf::from("out.txt")));
            assert_eq!(MergeStrategy::from(StrategyArg::PreferNew), MergeStrategy::PreferNew);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn new_source_is_required() {
        assert!(Cli::try_parse_from(["tmerge", "merge", "a.txt"]).is_err());
    }

    #[test]
    fn new_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "tmerge", "diff", "a.txt", "--new-file", "b.txt", "--new-content", "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_strategy_rejected() {
        let result = Cli::try_parse_from([
            "tmerge", "merge", "a.txt", "--new-content", "x", "--strategy", "theirs",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn every_strategy_selector_parses() {
        for name in ["prefer-local", "prefer-new", "smart", "interactive"] {
            let cli = Cli::try_parse_from(["tmerge", "merge", "a", "--new-content", "x", "-s", name]).unwrap();
            if let Command::Merge(args) = cli.command {
                let strategy = MergeStrategy::from(args.strategy.unwrap());
                assert_eq!(strategy.as_str(), name);
            } else { panic!("wrong command"); }
        }
    }

    #[test]
    fn parse_diff_flags() {
        let cli = Cli::try_parse_from([
            "tmerge", "diff", "a", "--new-content", "x", "-U", "5", "--algorithm", "patience",
        ])
        .unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.diff.context, Some(5));
            assert_eq!(args.diff.algorithm, Some(AlgorithmArg::Patience));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "tmerge", "--verbose", "--format", "json", "--config", "tmerge.toml", "diff", "a", "--new-content", "x",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("tmerge.toml")));
    }

    #[test]
    fn zero_timeout_rejected() {
        let result = Cli::try_parse_from(["tmerge", "merge", "a", "--new-content", "x", "--timeout", "0"]);
        assert!(result.is_err());
        let cli = Cli::try_parse_from(["tmerge", "merge", "a", "--new-content", "x", "--timeout", "1"]).unwrap();
        if let Command::Merge(args) = cli.command {
            assert_eq!(args.timeout, Some(1));
        } else { panic!("wrong command"); }
    }
}
