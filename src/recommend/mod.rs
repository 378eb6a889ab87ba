//! Album recommendation service.
//!
//! Scores an artist's albums and ranks them best first. This is the backend
//! the [`crate::enrich::ScoreEnricher`] talks to.

pub mod model;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::spotify::{Album, CatalogClient, Credential, ExternalUrls, Image};
use model::{LinearModel, ModelInput, ModelStore};

/// The album fields the scorer worked from, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAlbum {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub total_tracks: Option<u32>,
    pub images: Vec<Image>,
    pub external_urls: ExternalUrls,
    /// Simplified catalog albums carry none, so this is 0 for now.
    pub popularity: u32,
}

impl From<Album> for ScoredAlbum {
    fn from(album: Album) -> Self {
        Self {
            id: album.id,
            name: album.name,
            release_date: album.release_date,
            total_tracks: album.total_tracks,
            images: album.images,
            external_urls: album.external_urls,
            popularity: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlbum {
    pub album: ScoredAlbum,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended: Option<RankedAlbum>,
    pub ranked: Vec<RankedAlbum>,
}

impl Recommendation {
    /// Rank albums by score, highest first. Ties keep catalog order.
    pub fn rank(albums: Vec<Album>, scores: Vec<f64>) -> Self {
        let mut ranked: Vec<RankedAlbum> = albums
            .into_iter()
            .zip(scores)
            .map(|(album, score)| RankedAlbum { album: album.into(), score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Self {
            recommended: ranked.first().cloned(),
            ranked,
        }
    }
}

#[derive(Clone)]
pub struct Recommender {
    credential: Credential,
    catalog: CatalogClient,
    store: ModelStore,
}

impl Recommender {
    pub fn new(credential: Credential, catalog: CatalogClient, store: ModelStore) -> Self {
        Self {
            credential,
            catalog,
            store,
        }
    }

    pub async fn recommend(&self, artist_id: &str) -> Result<Recommendation, SearchError> {
        let token = self.credential.bearer()?;
        let albums = self.catalog.list_albums(artist_id, token).await?;

        let inputs: Vec<ModelInput> = albums.iter().map(ModelInput::from).collect();
        let model = self.store.load().await;
        let now = chrono::Utc::now().naive_utc();
        let scores = model::score_albums(&inputs, model.as_ref(), now);

        tracing::debug!(artist_id, albums = albums.len(), trained = model.is_some(), "scored albums");
        Ok(Recommendation::rank(albums, scores))
    }

    /// Fit a new model on labelled albums and persist it. Callers validate
    /// that `albums` and `labels` are non-empty and of equal length.
    pub async fn train(&self, albums: &[ModelInput], labels: &[f64]) -> anyhow::Result<LinearModel> {
        let model = LinearModel::fit(albums, labels, chrono::Utc::now().naive_utc());
        self.store.save(&model).await?;
        tracing::info!(samples = albums.len(), coef = ?model.coef, "trained album model");
        Ok(model)
    }
}
