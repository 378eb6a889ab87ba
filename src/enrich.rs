//! Attaches recommendation-service scores to catalog albums.
//!
//! The score service answers `GET /recommend?artist_id=..` with a JSON body
//! that may contain a `ranked` list. Each ranked entry is either
//! `{ "id": .., "score": .. }` or `{ "album": { "id": .., .. }, "score": .. }`.
//! Anything unusable about the call degrades to unscored albums.

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::spotify::Album;

/// Outcome of an enrichment attempt. Both arms carry the full album list in
/// catalog order.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Scored(Vec<Album>),
    Unscored { albums: Vec<Album>, reason: FallbackReason },
}

impl Enrichment {
    pub fn albums(&self) -> &[Album] {
        match self {
            Enrichment::Scored(albums) | Enrichment::Unscored { albums, .. } => albums,
        }
    }

    pub fn into_albums(self) -> Vec<Album> {
        match self {
            Enrichment::Scored(albums) | Enrichment::Unscored { albums, .. } => albums,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Enrichment::Scored(_))
    }
}

/// Why albums came back without scores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FallbackReason {
    #[error("score service unreachable: {0}")]
    Transport(String),
    #[error("score service returned status {0}")]
    Status(u16),
    #[error("score service body unparsable: {0}")]
    MalformedBody(String),
    #[error("score service response has no ranked list")]
    MissingRanking,
}

/// Ranked entry exactly as received, before its shape is decided.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    album: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<f64>,
}

/// One ranked entry as sent by the score service.
#[derive(Debug, PartialEq)]
enum RankedEntry {
    /// `{ "album": { "id": .. }, "score": .. }`
    Nested { album: Value, score: Option<f64> },
    /// `{ "id": .., "score": .. }`
    Flat { id: Option<Value>, score: Option<f64> },
}

/// Normalized (album id, score) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub id: String,
    pub score: Option<f64>,
}

/// `null`, `false`, zero and the empty string count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn string_id(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

impl From<RawEntry> for RankedEntry {
    /// Any present `album` selects the nested shape; the top-level `id` is
    /// then never consulted.
    fn from(raw: RawEntry) -> Self {
        match raw.album {
            Some(album) if is_present(&album) => RankedEntry::Nested { album, score: raw.score },
            _ => RankedEntry::Flat { id: raw.id, score: raw.score },
        }
    }
}

impl RankedEntry {
    fn normalize(self) -> Option<ScoreEntry> {
        let (id, score) = match self {
            RankedEntry::Nested { album, score } => (string_id(album.get("id")), score),
            RankedEntry::Flat { id, score } => (string_id(id.as_ref()), score),
        };
        id.map(|id| ScoreEntry { id, score })
    }
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

/// Normalize raw ranked entries, skipping those without an album id.
pub fn normalize_entries(ranked: &[Value]) -> Vec<ScoreEntry> {
    ranked
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| RawEntry::deserialize(entry).ok())
        .map(RankedEntry::from)
        .filter_map(RankedEntry::normalize)
        .collect()
}

/// Set every album's score from `entries`; later entries override earlier
/// ones for the same id. Order and length are preserved.
pub fn merge_scores(albums: Vec<Album>, entries: Vec<ScoreEntry>) -> Vec<Album> {
    let scores: HashMap<String, Option<f64>> =
        entries.into_iter().map(|e| (e.id, e.score)).collect();

    albums
        .into_iter()
        .map(|album| {
            let score = scores.get(&album.id).copied().flatten();
            Album { score, ..album }
        })
        .collect()
}

fn clear_scores(albums: Vec<Album>) -> Vec<Album> {
    albums
        .into_iter()
        .map(|album| Album { score: None, ..album })
        .collect()
}

#[derive(Deserialize)]
struct RecommendBody {
    ranked: Option<Value>,
}

/// Client for the recommendation service.
#[derive(Clone)]
pub struct ScoreEnricher {
    client: Client,
    backend_url: String,
}

impl ScoreEnricher {
    pub fn new(client: Client, backend_url: impl Into<String>) -> Self {
        Self {
            client,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn recommend_url(&self, artist_id: &str) -> String {
        format!("{}/recommend?artist_id={}", self.backend_url, urlencoding::encode(artist_id))
    }

    /// Attach scores to `albums`. Never fails; see [`Enrichment`].
    pub async fn attach_scores(&self, artist_id: &str, albums: Vec<Album>) -> Enrichment {
        match self.fetch_ranking(artist_id).await {
            Ok(ranked) => {
                let entries = normalize_entries(&ranked);
                tracing::debug!(artist_id, entries = entries.len(), "merging album scores");
                Enrichment::Scored(merge_scores(albums, entries))
            }
            Err(reason) => {
                tracing::warn!(artist_id, %reason, "could not get scores from backend");
                Enrichment::Unscored {
                    albums: clear_scores(albums),
                    reason,
                }
            }
        }
    }

    async fn fetch_ranking(&self, artist_id: &str) -> Result<Vec<Value>, FallbackReason> {
        let res = self
            .client
            .get(self.recommend_url(artist_id))
            .send()
            .await
            .map_err(|e| FallbackReason::Transport(e.to_string()))?;

        if !res.status().is_success() {
            return Err(FallbackReason::Status(res.status().as_u16()));
        }

        let body: RecommendBody = res
            .json()
            .await
            .map_err(|e| FallbackReason::MalformedBody(e.to_string()))?;

        match body.ranked {
            Some(Value::Array(ranked)) => Ok(ranked),
            _ => Err(FallbackReason::MissingRanking),
        }
    }
}
