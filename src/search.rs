//! Artist search with score enrichment.

use crate::enrich::ScoreEnricher;
use crate::error::SearchError;
use crate::spotify::{Album, CatalogClient, Credential};

/// Composes the catalog lookups and score enrichment into one search.
///
/// Every call is independent; overlapping searches are neither cancelled nor
/// deduplicated.
#[derive(Clone)]
pub struct SearchOrchestrator {
    credential: Credential,
    catalog: CatalogClient,
    enricher: ScoreEnricher,
}

impl SearchOrchestrator {
    pub fn new(credential: Credential, catalog: CatalogClient, enricher: ScoreEnricher) -> Self {
        Self {
            credential,
            catalog,
            enricher,
        }
    }

    /// Find the best-matching artist and return their albums in catalog
    /// order, each scored when the score service could provide one.
    pub async fn search(&self, query: &str) -> Result<Vec<Album>, SearchError> {
        let token = self.credential.bearer()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::NotFound(String::new()));
        }

        let artist_id = self.catalog.find_artist(query, token).await?;
        let albums = self.catalog.list_albums(&artist_id, token).await?;
        tracing::debug!(query, artist_id = %artist_id, albums = albums.len(), "catalog lookup complete");

        let enrichment = self.enricher.attach_scores(&artist_id, albums).await;
        tracing::info!(
            query,
            artist_id = %artist_id,
            albums = enrichment.albums().len(),
            scored = enrichment.is_scored(),
            "search complete"
        );
        Ok(enrichment.into_albums())
    }
}
