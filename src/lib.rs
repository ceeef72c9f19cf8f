//! ase - the all-seeing eye: fuzzy search over PDF file names, metadata,
//! page contents and annotations.
//!
//! Each document is turned into a lazy sequence of searchable
//! [`Item`]s. Items are scored against the query and those that clear the
//! threshold are collected as [`Match`]es. Extraction results are cached
//! per document and configuration, so repeated searches skip the PDF
//! parser entirely.
//!
//! # Quick start
//!
//! ```no_run
//! use ase::{CapabilityRegistry, RunConfig, Selectors, SearchParams};
//! use std::path::PathBuf;
//!
//! let registry = CapabilityRegistry::builtin();
//! let caps = registry
//!     .resolve_all(&Selectors {
//!         reader: Some("lopdf".into()),
//!         tokenizer: Some("period".into()),
//!         segmenter: Some("separators".into()),
//!         scorer: Some("fuzzy".into()),
//!         surface: Some("plain".into()),
//!     })
//!     .unwrap();
//!
//! let config = RunConfig {
//!     documents: vec![PathBuf::from("paper.pdf")],
//!     include_contents: true,
//!     ..RunConfig::default()
//! };
//! let search = SearchParams {
//!     query: "ipsum".to_string(),
//!     threshold: 70,
//!     stop_after_first: false,
//! };
//!
//! let summary = ase::run::run(caps, &config, &search).unwrap();
//! println!("{} matches", summary.matches.len());
//! ```

pub mod cache;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fingerprint;
pub mod item;
pub mod reader;
pub mod registry;
pub mod run;
pub mod scorer;
pub mod segmenter;
pub mod surface;
pub mod text_util;
pub mod tokenizer;
pub mod walker;

pub use cache::CacheStore;
pub use collector::MatchCollector;
pub use config::{RunConfig, SearchParams, Settings};
pub use error::{Error, Result};
pub use extraction::Extractor;
pub use item::{Item, Match, Term};
pub use registry::{Capabilities, CapabilityRegistry, Selectors};
