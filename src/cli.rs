use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ase",
    about = "All-seeing Eye: search PDF metadata and contents"
)]
pub struct Cli {
    /// Query for substring in metadata
    pub query: String,

    /// Directories (or PDF files) to search
    #[arg(short = 'd', long, num_args = 1..)]
    pub directories: Vec<PathBuf>,

    /// Search contents and annotations as well (slower)
    #[arg(short = 'c', long)]
    pub contents: bool,

    /// Stop after the first match in each file
    #[arg(long = "break")]
    pub brk: bool,

    /// Search score threshold (0-100)
    #[arg(
        long = "threshold",
        visible_alias = "th",
        default_value_t = 70,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub threshold: u8,

    /// Segmentize words (slow)
    #[arg(short = 's', long)]
    pub segmentize: bool,

    /// Tokenize pages into sentences (slower)
    #[arg(short = 't', long)]
    pub tokenize: bool,

    /// Let command-line values override the config file
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Ignore and rewrite the extraction cache
    #[arg(short = 'r', long)]
    pub reindex: bool,

    /// Path to the JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the extraction cache
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_defaults() {
        let cli = Cli::parse_from(["ase", "ipsum"]);
        assert_eq!(cli.query, "ipsum");
        assert_eq!(cli.threshold, 70);
        assert!(cli.directories.is_empty());
        assert!(!cli.contents);
        assert!(!cli.brk);
        assert!(!cli.segmentize);
        assert!(!cli.tokenize);
        assert!(!cli.force);
        assert!(!cli.reindex);
        assert!(cli.config.is_none());
        assert!(cli.cache_dir.is_none());
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from([
            "ase", "dolor", "-d", "/a", "/b", "-c", "-s", "-t", "--th", "85",
            "--break", "-r",
        ]);
        assert_eq!(
            cli.directories,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(cli.contents && cli.segmentize && cli.tokenize);
        assert!(cli.brk && cli.reindex);
        assert_eq!(cli.threshold, 85);
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let parsed = Cli::try_parse_from(["ase", "q", "--threshold", "101"]);
        assert!(parsed.is_err());
    }
}
