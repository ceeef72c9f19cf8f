//! The run driver: searches every document of a run and reports the
//! matches through the surface.

use tracing::{debug, info, warn};

use crate::{
    cache::CacheStore,
    collector::MatchCollector,
    config::{RunConfig, SearchParams},
    error::{Error, Result},
    extraction::Extractor,
    item::Match,
    registry::Capabilities,
    surface::SurfaceSession,
};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Accepted matches, highest score first.
    pub matches: Vec<Match>,
    /// The text handed to the surface.
    pub rendered: String,
    pub documents_searched: usize,
    pub documents_skipped: usize,
}

/// Search `config.documents` for `search.query`.
///
/// Documents that cannot be read are skipped with a warning. Any other
/// error aborts the run.
pub fn run(
    caps: Capabilities<'_>,
    config: &RunConfig,
    search: &SearchParams,
) -> Result<RunSummary> {
    let cache = CacheStore::new(config.cache_dir.clone(), config.reindex);
    let extractor = Extractor::from_capabilities(caps, config.flags(), &cache);
    let surface = caps.surface;

    let mut collector = MatchCollector::new(caps.scorer, search.threshold)
        .with_observer(|found| surface.on_new_match(found));

    let mut searched = 0;
    let mut skipped = 0;
    {
        let session = SurfaceSession::enter(surface, config.documents.len());
        for path in session.progress(&config.documents) {
            searched += 1;
            match search_document(&extractor, &mut collector, path, search) {
                Ok(found) => {
                    debug!(path = %path.display(), found, "document searched");
                }
                Err(Error::Reader { path, message }) => {
                    skipped += 1;
                    warn!(
                        path = %path.display(),
                        %message,
                        "skipping document"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    let rendered = collector.render();
    surface.show_results(&rendered);
    info!(
        documents = searched,
        skipped,
        matches = collector.len(),
        "search finished"
    );

    let matches = collector.matches().to_vec();
    Ok(RunSummary {
        matches,
        rendered,
        documents_searched: searched,
        documents_skipped: skipped,
    })
}

/// Feed one document's items to the collector. Returns the number of
/// matches found in it.
fn search_document(
    extractor: &Extractor<'_>,
    collector: &mut MatchCollector<'_>,
    path: &std::path::Path,
    search: &SearchParams,
) -> Result<usize> {
    let mut found = 0;
    for item in extractor.items(path) {
        if collector.consider(item?, &search.query).is_some() {
            found += 1;
            if search.stop_after_first {
                break;
            }
        }
    }
    Ok(found)
}
