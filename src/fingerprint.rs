use std::{fmt, path::Path};

/// The cached extraction stages. Each kind caches independently and owns
/// its own directory in the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Metadata,
    Contents,
    Annotations,
}

impl ExtractorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Metadata => "Metadata",
            Self::Contents => "Contents",
            Self::Annotations => "Annotations",
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The run flags that change what extraction produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionFlags {
    pub segmentize: bool,
    pub tokenize: bool,
    pub include_contents: bool,
}

/// A stable cache key derived from (extractor kind, document path, flags).
///
/// Which concrete reader or tokenizer produced the items is not part of
/// the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: ExtractorKind,
    digest: blake3::Hash,
}

impl Fingerprint {
    pub fn new(
        kind: ExtractorKind,
        path: &Path,
        flags: ExtractionFlags,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        // Length-prefix the variable parts so ("ab", "c") and ("a", "bc")
        // cannot collide.
        let path = path.as_os_str().as_encoded_bytes();
        for part in [kind.name().as_bytes(), path] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.update(&[
            u8::from(flags.segmentize),
            u8::from(flags.tokenize),
            u8::from(flags.include_contents),
        ]);

        Self {
            kind,
            digest: hasher.finalize(),
        }
    }

    pub fn kind(&self) -> ExtractorKind {
        self.kind
    }

    /// Full lowercase hex digest, used as the cache file stem.
    pub fn hex(&self) -> String {
        self.digest.to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, &self.hex()[..12])
    }
}
