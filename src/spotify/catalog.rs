use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Album, ALBUM_PAGE_SIZE, MARKET};
use crate::error::SearchError;

/// Artist search and album listing against the Spotify catalog.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    api_base: String,
}

impl CatalogClient {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Search artists by free text and return the id of the first hit.
    pub async fn find_artist(&self, name: &str, token: &str) -> Result<String, SearchError> {
        let url = format!("{}/search?q={}&type=artist",
            self.api_base,
            urlencoding::encode(name),
        );

        let body: ArtistSearchResponse = self.get_json(&url, token, "artist search").await?;
        first_artist_id(body, name)
    }

    /// List the artist's albums: album releases only, first page only.
    pub async fn list_albums(&self, artist_id: &str, token: &str) -> Result<Vec<Album>, SearchError> {
        let url = format!("{}/artists/{}/albums?include_groups=album&market={}&limit={}",
            self.api_base,
            urlencoding::encode(artist_id),
            MARKET,
            ALBUM_PAGE_SIZE,
        );

        let body: AlbumsPage = self.get_json(&url, token, "albums").await?;
        Ok(body
            .items
            .into_iter()
            .map(|album| Album { score: None, ..album })
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str, what: &str) -> Result<T, SearchError> {
        if token.is_empty() {
            return Err(SearchError::Unauthenticated);
        }
        tracing::debug!(url, "catalog request");

        let res = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| SearchError::Upstream(format!("{} request failed: {}", what, e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SearchError::Upstream(format!("Spotify API error {}: {}", status, body)));
        }

        res.json()
            .await
            .map_err(|e| SearchError::Upstream(format!("{} parse failed: {}", what, e)))
    }
}

fn first_artist_id(body: ArtistSearchResponse, name: &str) -> Result<String, SearchError> {
    body.artists
        .items
        .into_iter()
        .next()
        .map(|a| a.id)
        .ok_or_else(|| SearchError::NotFound(name.to_string()))
}

#[derive(Deserialize)]
struct ArtistSearchResponse {
    artists: ArtistsPage,
}

#[derive(Deserialize)]
struct ArtistsPage {
    items: Vec<ArtistItem>,
}

#[derive(Deserialize)]
struct ArtistItem {
    id: String,
}

#[derive(Deserialize)]
struct AlbumsPage {
    items: Vec<Album>,
}
