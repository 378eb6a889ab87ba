//! Album scoring: a popularity/recency heuristic, or a linear model fitted
//! with least squares and persisted as JSON.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::spotify::Album;

/// Age assumed when a release date cannot be parsed (about a century).
const UNKNOWN_AGE_DAYS: f64 = 36525.0;
/// Albums older than this get no recency bonus from the heuristic.
const RECENCY_HORIZON_DAYS: f64 = 3650.0;
const FALLBACK_RELEASE_DATE: &str = "1970-01-01";

/// Intercept plus popularity, age in days, track count.
const COEF_LEN: usize = 4;

/// The album fields the scorer reads. Deserializes from any album-shaped
/// JSON object; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInput {
    #[serde(default, deserialize_with = "lenient_number")]
    pub popularity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_tracks: Option<f64>,
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl From<&Album> for ModelInput {
    fn from(album: &Album) -> Self {
        Self {
            // simplified album objects carry no popularity
            popularity: None,
            release_date: Some(album.release_date.clone()),
            total_tracks: album.total_tracks.map(f64::from),
        }
    }
}

/// `[popularity, age_days, total_tracks]`
pub type Features = [f64; 3];

pub fn features(input: &ModelInput, now: NaiveDateTime) -> Features {
    let release_date = input
        .release_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(FALLBACK_RELEASE_DATE);

    [
        input.popularity.unwrap_or(0.0),
        age_days(release_date, now),
        input.total_tracks.unwrap_or(0.0),
    ]
}

/// Whole days between January 1st of the release year and `now`.
fn age_days(release_date: &str, now: NaiveDateTime) -> f64 {
    release_date
        .split('-')
        .next()
        .and_then(|year| year.trim().parse::<i32>().ok())
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .map(|start| (now - start.and_time(NaiveTime::MIN)).num_days() as f64)
        .unwrap_or(UNKNOWN_AGE_DAYS)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Popularity-weighted score in 0..=100 used when no model is trained.
pub fn heuristic_score(features: &Features) -> f64 {
    let popularity = features[0] / 100.0;
    let recency = (1.0 - features[1] / RECENCY_HORIZON_DAYS).max(0.0);
    round2((0.7 * popularity + 0.3 * recency) * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
}

impl LinearModel {
    /// Least-squares fit with intercept.
    pub fn fit(inputs: &[ModelInput], labels: &[f64], now: NaiveDateTime) -> Self {
        let rows: Vec<Features> = inputs.iter().map(|i| features(i, now)).collect();
        Self {
            coef: least_squares(&rows, labels).to_vec(),
        }
    }

    /// Raw prediction, or `None` when the coefficients have the wrong shape.
    pub fn predict(&self, features: &Features) -> Option<f64> {
        if self.coef.len() != COEF_LEN {
            return None;
        }
        Some(self.coef[0] + features.iter().zip(&self.coef[1..]).map(|(x, c)| x * c).sum::<f64>())
    }
}

/// Score every input. With a usable model the predictions are min-max scaled
/// to 0..=100; otherwise the heuristic is used.
pub fn score_albums(inputs: &[ModelInput], model: Option<&LinearModel>, now: NaiveDateTime) -> Vec<f64> {
    let rows: Vec<Features> = inputs.iter().map(|i| features(i, now)).collect();

    let predictions = model.and_then(|m| rows.iter().map(|r| m.predict(r)).collect::<Option<Vec<f64>>>());
    let Some(predictions) = predictions else {
        if model.is_some() {
            tracing::warn!("model coefficients have the wrong shape; using heuristic scores");
        }
        return rows.iter().map(heuristic_score).collect();
    };

    let min = predictions.iter().copied().fold(f64::INFINITY, f64::min);
    let max = predictions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min < 1e-6 {
        return predictions.iter().map(|p| round2(p * 100.0)).collect();
    }
    predictions
        .iter()
        .map(|p| round2((p - min) / (max - min) * 100.0))
        .collect()
}

/// Solves the normal equations `XᵀX·b = Xᵀy` for `X = [1 | rows]`.
///
/// A tiny relative ridge keeps rank-deficient systems (few samples, constant
/// columns) solvable; it steers toward the small-norm solution.
pub(crate) fn least_squares(rows: &[Features], labels: &[f64]) -> [f64; COEF_LEN] {
    let mut a = [[0.0f64; COEF_LEN]; COEF_LEN];
    let mut b = [0.0f64; COEF_LEN];

    for (row, &y) in rows.iter().zip(labels) {
        let x = [1.0, row[0], row[1], row[2]];
        for i in 0..COEF_LEN {
            b[i] += x[i] * y;
            for j in 0..COEF_LEN {
                a[i][j] += x[i] * x[j];
            }
        }
    }
    for (i, row) in a.iter_mut().enumerate() {
        row[i] += 1e-9 * row[i].max(1.0);
    }

    // Gaussian elimination with partial pivoting.
    for col in 0..COEF_LEN {
        let pivot = (col..COEF_LEN)
            .max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f64::MIN_POSITIVE || !a[pivot][col].is_finite() {
            tracing::warn!("least squares system is singular; using zero coefficients");
            return [0.0; COEF_LEN];
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for r in (col + 1)..COEF_LEN {
            let factor = a[r][col] / a[col][col];
            for c in col..COEF_LEN {
                a[r][c] -= factor * a[col][c];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut coef = [0.0f64; COEF_LEN];
    for row in (0..COEF_LEN).rev() {
        let tail: f64 = ((row + 1)..COEF_LEN).map(|c| a[row][c] * coef[c]).sum();
        coef[row] = (b[row] - tail) / a[row][row];
    }
    coef
}

/// JSON file holding the trained model.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored model, or `None` when there is none or it cannot be read.
    pub async fn load(&self) -> Option<LinearModel> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read model file");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "model file is malformed");
                None
            }
        }
    }

    pub async fn save(&self, model: &LinearModel) -> anyhow::Result<()> {
        let raw = serde_json::to_vec(model)?;
        tokio::fs::write(&self.path, raw).await?;
        tracing::info!(path = %self.path.display(), "saved album model");
        Ok(())
    }
}
