//! Run configuration: the JSON config file merged with command-line
//! arguments.
//!
//! Without `--force` a key present in the config file wins over the
//! command line and the file's directories are searched before the
//! command line's. With `--force` the command line wins for every value
//! it carries.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    cli::Cli,
    error::{Error, Result},
    fingerprint::ExtractionFlags,
    registry::Selectors,
    walker,
};

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_READER: &str = "lopdf";
pub const DEFAULT_SCORER: &str = "fuzzy";
pub const DEFAULT_SEGMENTER: &str = "wordsegment";
pub const DEFAULT_SURFACE: &str = "progress";
/// Tokenizer used with `--tokenize`.
pub const SENTENCE_TOKENIZER: &str = "sentence";
/// Tokenizer used without `--tokenize`.
pub const PERIOD_TOKENIZER: &str = "period";

/// Everything that shapes extraction for a run. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub cache_dir: Option<PathBuf>,
    pub segmentize: bool,
    pub tokenize: bool,
    pub include_contents: bool,
    pub reindex: bool,
    pub documents: Vec<PathBuf>,
}

impl RunConfig {
    /// The flags that take part in cache fingerprints.
    pub fn flags(&self) -> ExtractionFlags {
        ExtractionFlags {
            segmentize: self.segmentize,
            tokenize: self.tokenize,
            include_contents: self.include_contents,
        }
    }
}

/// How matches are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub threshold: u8,
    /// Move on to the next document after its first match.
    pub stop_after_first: bool,
}

/// The fully merged configuration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub run: RunConfig,
    pub search: SearchParams,
    pub selectors: Selectors,
}

/// A capability selector in the config file: either a plain name or an
/// object with a `module_name` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectorValue {
    Name(String),
    Module { module_name: Option<String> },
}

impl SelectorValue {
    fn into_name(self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name),
            Self::Module { module_name } => module_name,
        }
    }
}

/// The JSON config file. Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub cache_dir: Option<String>,
    pub segmentize: Option<bool>,
    pub tokenize: Option<bool>,
    pub contents: Option<bool>,
    pub reindex: Option<bool>,
    #[serde(alias = "break")]
    pub brk: Option<bool>,
    pub threshold: Option<u8>,
    #[serde(default)]
    pub directories: Vec<String>,

    #[serde(alias = "pdf")]
    pub reader: Option<SelectorValue>,
    pub tokenizer: Option<SelectorValue>,
    #[serde(alias = "segmentizer")]
    pub segmenter: Option<SelectorValue>,
    #[serde(alias = "matcher")]
    pub scorer: Option<SelectorValue>,
    #[serde(alias = "ui")]
    pub surface: Option<SelectorValue>,
}

impl FileConfig {
    /// Read `path`. A missing file yields the empty config; unreadable
    /// or invalid JSON is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        Self::parse(&contents).map_err(|e| {
            Error::Config(format!(
                "file {} contains invalid json: {e}",
                path.display()
            ))
        })
    }

    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}

/// Default config file location: `$XDG_CONFIG_HOME/ase/config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("ase")
        .get_config_home()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            Error::Config(
                "could not determine XDG config home directory".into(),
            )
        })
}

/// Expand a leading `~` and make the path absolute.
pub fn expand_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();
    let expanded = match input.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => input.to_path_buf(),
        },
        Err(_) => input.to_path_buf(),
    };
    std::path::absolute(&expanded).unwrap_or(expanded)
}

/// Pick the file's value unless `force` is set or the file has none.
fn pick<T>(force: bool, cli: T, file: Option<T>) -> T {
    match file {
        Some(value) if !force => value,
        _ => cli,
    }
}

impl Settings {
    /// Read the config file named by the command line (or the default
    /// location), merge, and discover the documents to search.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => {
                let path = expand_path(path);
                if !path.exists() {
                    return Err(Error::NotFound {
                        kind: "config file",
                        name: path.display().to_string(),
                    });
                }
                path
            }
            None => default_config_path()?,
        };
        let file = FileConfig::load(&path)?;
        let settings = Self::merge(cli, file);
        let documents = walker::discover_documents(&settings.run.documents)?;
        Ok(Self {
            run: RunConfig {
                documents,
                ..settings.run
            },
            ..settings
        })
    }

    /// Merge without touching the filesystem. `run.documents` holds the
    /// merged search roots, not yet expanded into documents.
    pub fn merge(cli: &Cli, file: FileConfig) -> Self {
        let force = cli.force;

        let mut roots: Vec<PathBuf> = Vec::new();
        if !force {
            roots.extend(file.directories.iter().map(expand_path));
        }
        roots.extend(cli.directories.iter().map(expand_path));

        let cache_dir = cli
            .cache_dir
            .as_ref()
            .map(expand_path)
            .or_else(|| file.cache_dir.as_deref().map(expand_path));

        let tokenize = pick(force, cli.tokenize, file.tokenize);
        let run = RunConfig {
            cache_dir,
            segmentize: pick(force, cli.segmentize, file.segmentize),
            tokenize,
            include_contents: pick(force, cli.contents, file.contents),
            reindex: pick(force, cli.reindex, file.reindex),
            documents: roots,
        };

        let search = SearchParams {
            query: cli.query.clone(),
            threshold: pick(force, cli.threshold, file.threshold).min(100),
            stop_after_first: pick(force, cli.brk, file.brk),
        };

        let default_tokenizer = if tokenize {
            SENTENCE_TOKENIZER
        } else {
            PERIOD_TOKENIZER
        };
        let named = |value: Option<SelectorValue>, default: &str| {
            Some(
                value
                    .and_then(SelectorValue::into_name)
                    .unwrap_or_else(|| default.to_string()),
            )
        };
        let selectors = Selectors {
            reader: named(file.reader, DEFAULT_READER),
            tokenizer: named(file.tokenizer, default_tokenizer),
            segmenter: named(file.segmenter, DEFAULT_SEGMENTER),
            scorer: named(file.scorer, DEFAULT_SCORER),
            surface: named(file.surface, DEFAULT_SURFACE),
        };

        Self {
            run,
            search,
            selectors,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["ase"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn empty_file_keeps_cli_values() {
        let settings = Settings::merge(
            &cli(&["ipsum", "-c", "-d", "/docs"]),
            FileConfig::default(),
        );

        assert!(settings.run.include_contents);
        assert!(!settings.run.segmentize);
        assert_eq!(settings.run.documents, vec![PathBuf::from("/docs")]);
        assert_eq!(settings.search.query, "ipsum");
        assert_eq!(settings.search.threshold, 70);
        assert_eq!(settings.run.cache_dir, None);
    }

    #[test]
    fn file_wins_without_force() {
        let file = FileConfig::parse(
            r#"{"contents": false, "threshold": 90, "segmentize": true}"#,
        )
        .unwrap();
        let settings = Settings::merge(&cli(&["q", "-c", "--th", "50"]), file);

        assert!(!settings.run.include_contents);
        assert!(settings.run.segmentize);
        assert_eq!(settings.search.threshold, 90);
    }

    #[test]
    fn cli_wins_with_force() {
        let file = FileConfig::parse(
            r#"{"contents": true, "threshold": 90,
                "directories": ["/from-file"]}"#,
        )
        .unwrap();
        let settings = Settings::merge(&cli(&["q", "-f", "-d", "/cli"]), file);

        assert!(!settings.run.include_contents);
        assert_eq!(settings.search.threshold, 70);
        assert_eq!(settings.run.documents, vec![PathBuf::from("/cli")]);
    }

    #[test]
    fn directories_are_concatenated_without_force() {
        let file =
            FileConfig::parse(r#"{"directories": ["/from-file"]}"#).unwrap();
        let settings = Settings::merge(&cli(&["q", "-d", "/cli"]), file);

        assert_eq!(
            settings.run.documents,
            vec![PathBuf::from("/from-file"), PathBuf::from("/cli")]
        );
    }

    #[test]
    fn default_selectors_follow_tokenize_flag() {
        let plain = Settings::merge(&cli(&["q"]), FileConfig::default());
        assert_eq!(
            plain.selectors.tokenizer.as_deref(),
            Some(PERIOD_TOKENIZER)
        );
        assert_eq!(plain.selectors.scorer.as_deref(), Some(DEFAULT_SCORER));
        assert_eq!(plain.selectors.reader.as_deref(), Some(DEFAULT_READER));

        let tokenized =
            Settings::merge(&cli(&["q", "-t"]), FileConfig::default());
        assert_eq!(
            tokenized.selectors.tokenizer.as_deref(),
            Some(SENTENCE_TOKENIZER)
        );
    }

    #[test]
    fn selectors_accept_names_and_module_objects() {
        let file = FileConfig::parse(
            r#"{"matcher": {"module_name": "exact"},
                "ui": "plain", "pdf": {}}"#,
        )
        .unwrap();
        let settings = Settings::merge(&cli(&["q"]), file);

        assert_eq!(settings.selectors.scorer.as_deref(), Some("exact"));
        assert_eq!(settings.selectors.surface.as_deref(), Some("plain"));
        assert_eq!(settings.selectors.reader.as_deref(), Some(DEFAULT_READER));
    }

    #[test]
    fn cache_dir_from_cli_overrides_file() {
        let file =
            FileConfig::parse(r#"{"cache_dir": "/file-cache"}"#).unwrap();
        let from_file = Settings::merge(&cli(&["q"]), file.clone());
        assert_eq!(from_file.run.cache_dir, Some(PathBuf::from("/file-cache")));

        let from_cli =
            Settings::merge(&cli(&["q", "--cache-dir", "/cli-cache"]), file);
        assert_eq!(from_cli.run.cache_dir, Some(PathBuf::from("/cli-cache")));
    }

    #[test]
    fn missing_file_is_empty_config() {
        let tmp = tempfile::tempdir().unwrap();
        let file = FileConfig::load(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(file, FileConfig::default());
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("invalid json"));
    }

    #[test]
    fn load_discovers_documents() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.pdf"), b"%PDF").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"text").unwrap();
        let config = tmp.path().join("config.json");
        std::fs::write(&config, "{}").unwrap();

        let root = tmp.path().to_string_lossy().into_owned();
        let config_arg = config.to_string_lossy().into_owned();
        let settings =
            Settings::load(&cli(&["q", "--config", &config_arg, "-d", &root]))
                .unwrap();

        assert_eq!(settings.run.documents, vec![tmp.path().join("a.pdf")]);
    }

    #[test]
    fn explicit_config_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.json");
        let missing = missing.to_string_lossy().into_owned();

        let err =
            Settings::load(&cli(&["q", "--config", &missing])).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn expand_path_resolves_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                expand_path("~/papers"),
                PathBuf::from(home).join("papers")
            );
        }
    }

    #[test]
    fn flags_mirror_run_config() {
        let run = RunConfig {
            segmentize: true,
            include_contents: true,
            ..RunConfig::default()
        };
        let flags = run.flags();
        assert!(flags.segmentize && !flags.tokenize && flags.include_contents);
    }
}
