use std::env;
use std::path::PathBuf;

use crate::spotify::{API_BASE, TOKEN_URL};

/// Default address of the recommendation service.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub accounts_url: String,
    pub api_base: String,
    pub backend_url: String,
    pub model_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let spotify_client_id = env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_ID is required"))?;

        let spotify_client_secret = env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_SECRET is required"))?;

        let accounts_url = env::var("SPOTIFY_ACCOUNTS_URL").unwrap_or_else(|_| TOKEN_URL.into());
        let api_base = env::var("SPOTIFY_API_BASE").unwrap_or_else(|_| API_BASE.into());
        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("album_model.json"));

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            accounts_url,
            api_base,
            backend_url,
            model_path,
        })
    }
}
