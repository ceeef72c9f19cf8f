use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    fingerprint::Fingerprint,
    item::Item,
};

/// Extension of persisted item sequences.
pub const CACHE_EXTENSION: &str = "cache";

/// Where an [`ItemSequence`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Replayed from a cache entry.
    Cached,
    /// Freshly produced by the reader in this run.
    Extracted,
}

/// A complete, ordered item sequence for one (document, extractor kind).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSequence {
    pub items: Vec<Item>,
    pub provenance: Provenance,
}

impl ItemSequence {
    pub fn extracted(items: Vec<Item>) -> Self {
        Self {
            items,
            provenance: Provenance::Extracted,
        }
    }
}

/// Per-fingerprint item cache laid out as
/// `{root}/{ExtractorKind}/{fingerprint}.cache`.
///
/// Entries are written once and never updated in place. Stale entries are
/// left for external housekeeping.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    root: Option<PathBuf>,
    reindex: bool,
}

impl CacheStore {
    /// A store rooted at `root`. With `reindex` set, [`load`](Self::load)
    /// never returns an entry, so every stage is re-extracted and its entry
    /// overwritten.
    pub fn new(root: Option<PathBuf>, reindex: bool) -> Self {
        Self { root, reindex }
    }

    /// A store that neither loads nor persists anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The file backing `fingerprint`, if caching is enabled.
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        self.root.as_ref().map(|root| {
            root.join(fingerprint.kind().name())
                .join(format!("{}.{CACHE_EXTENSION}", fingerprint.hex()))
        })
    }

    /// Load the entry for `fingerprint`.
    ///
    /// Returns `Ok(None)` when caching is disabled, reindexing is forced,
    /// or no entry exists. An entry that cannot be decoded is an error.
    pub fn load(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ItemSequence>> {
        if self.reindex {
            return Ok(None);
        }
        let Some(path) = self.entry_path(fingerprint) else {
            return Ok(None);
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(%fingerprint, "cache miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let items: Vec<Item> = serde_json::from_slice(&bytes)
            .map_err(|source| Error::CacheCorruption {
                path: path.clone(),
                source,
            })?;
        debug!(%fingerprint, items = items.len(), "cache hit");

        Ok(Some(ItemSequence {
            items,
            provenance: Provenance::Cached,
        }))
    }

    /// Persist `sequence` under `fingerprint`.
    ///
    /// A no-op when caching is disabled or when the sequence was itself
    /// loaded from the cache.
    pub fn store(
        &self,
        fingerprint: &Fingerprint,
        sequence: &ItemSequence,
    ) -> Result<()> {
        if sequence.provenance == Provenance::Cached {
            return Ok(());
        }
        let Some(path) = self.entry_path(fingerprint) else {
            return Ok(());
        };
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec(&sequence.items)
            .map_err(std::io::Error::other)?;

        // Write beside the target and rename, so a crash never leaves a
        // truncated entry behind.
        let tmp = path.with_extension(format!("{CACHE_EXTENSION}.tmp"));
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &path)?;

        debug!(
            %fingerprint,
            items = sequence.items.len(),
            "cache entry written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fingerprint::{ExtractionFlags, ExtractorKind},
        item::Term,
    };

    fn fingerprint(kind: ExtractorKind) -> Fingerprint {
        Fingerprint::new(
            kind,
            Path::new("/docs/a.pdf"),
            ExtractionFlags::default(),
        )
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new(
                Some(PathBuf::from("/docs/a.pdf")),
                "Contents of page 1/2",
                Term::verbatim("ipsum dolor"),
            ),
            Item::new(
                Some(PathBuf::from("/docs/a.pdf")),
                "Contents of page 2/2",
                Term::derived("sit_amet", "sit amet"),
            ),
        ]
    }

    #[test]
    fn entry_path_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Some(tmp.path().to_path_buf()), false);
        let fp = fingerprint(ExtractorKind::Annotations);

        assert_eq!(
            store.entry_path(&fp).unwrap(),
            tmp.path()
                .join("Annotations")
                .join(format!("{}.cache", fp.hex()))
        );
    }

    #[test]
    fn store_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Some(tmp.path().to_path_buf()), false);
        let fp = fingerprint(ExtractorKind::Contents);

        assert!(store.load(&fp).unwrap().is_none());
        store
            .store(&fp, &ItemSequence::extracted(items()))
            .unwrap();

        let loaded = store.load(&fp).unwrap().unwrap();
        assert_eq!(loaded.items, items());
        assert_eq!(loaded.provenance, Provenance::Cached);
    }

    #[test]
    fn kinds_do_not_share_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Some(tmp.path().to_path_buf()), false);

        store
            .store(
                &fingerprint(ExtractorKind::Contents),
                &ItemSequence::extracted(items()),
            )
            .unwrap();

        assert!(
            store
                .load(&fingerprint(ExtractorKind::Annotations))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn disabled_store_is_inert() {
        let store = CacheStore::disabled();
        let fp = fingerprint(ExtractorKind::Contents);

        store
            .store(&fp, &ItemSequence::extracted(items()))
            .unwrap();
        assert!(store.load(&fp).unwrap().is_none());
        assert!(store.entry_path(&fp).is_none());
    }

    #[test]
    fn reindex_ignores_existing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let fp = fingerprint(ExtractorKind::Contents);
        CacheStore::new(Some(tmp.path().to_path_buf()), false)
            .store(&fp, &ItemSequence::extracted(items()))
            .unwrap();

        let reindexing = CacheStore::new(Some(tmp.path().to_path_buf()), true);
        assert!(reindexing.load(&fp).unwrap().is_none());
    }

    #[test]
    fn cached_sequences_are_never_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Some(tmp.path().to_path_buf()), false);
        let fp = fingerprint(ExtractorKind::Contents);

        let replayed = ItemSequence {
            items: items(),
            provenance: Provenance::Cached,
        };
        store.store(&fp, &replayed).unwrap();

        assert!(!store.entry_path(&fp).unwrap().exists());
    }

    #[test]
    fn corrupted_entry_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Some(tmp.path().to_path_buf()), false);
        let fp = fingerprint(ExtractorKind::Contents);
        let path = store.entry_path(&fp).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json at all").unwrap();

        let err = store.load(&fp).unwrap_err();
        assert!(matches!(err, Error::CacheCorruption { .. }));
        assert!(err.to_string().contains("--reindex"));
    }
}
