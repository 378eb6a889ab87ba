//! Spotify artist album search with model-score enrichment.
//!
//! A search resolves an artist by name, lists their albums, and attaches a
//! score to each album from the recommendation service when it is reachable.
//! The same binary also serves that recommendation service.

pub mod config;
pub mod enrich;
pub mod error;
pub mod handlers;
pub mod presenter;
pub mod recommend;
pub mod search;
pub mod spotify;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::enrich::ScoreEnricher;
use crate::handlers::{router, AppState};
use crate::presenter::PresentationSlot;
use crate::recommend::model::ModelStore;
use crate::recommend::Recommender;
use crate::search::SearchOrchestrator;
use crate::spotify::{CatalogClient, Credential, TokenProvider};

/// Acquire the access token once and wire every component around it.
pub async fn build_state(config: &Config, client: reqwest::Client) -> AppState {
    let provider = TokenProvider::new(
        client.clone(),
        config.accounts_url.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    );
    let credential = Credential::acquire(&provider).await;

    let catalog = CatalogClient::new(client.clone(), config.api_base.clone());
    let enricher = ScoreEnricher::new(client, config.backend_url.clone());

    AppState {
        search: SearchOrchestrator::new(credential.clone(), catalog.clone(), enricher),
        recommender: Recommender::new(credential, catalog, ModelStore::new(config.model_path.clone())),
        slot: Arc::new(PresentationSlot::new()),
    }
}

/// The full HTTP application.
pub fn make_app(state: AppState) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
