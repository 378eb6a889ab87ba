//! Spotify Web API client.
//!
//! Uses Client Credentials flow for server-to-server authentication. The
//! token is fetched once at startup and shared read-only afterwards.

mod catalog;
mod token;

use serde::{Deserialize, Serialize};

pub use catalog::CatalogClient;
pub use token::{Credential, TokenProvider};

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Market used for every album listing.
pub const MARKET: &str = "US";
/// Albums requested per listing. Only the first page is ever read.
pub const ALBUM_PAGE_SIZE: u32 = 50;

/// A Spotify album (simplified), optionally carrying a model score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tracks: Option<u32>,
    /// Always serialized, `null` when the album was not scored.
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}
