//! # Spotify Integration Module
//!
//! Blocking client for the handful of Spotify Web API endpoints the pipeline
//! extracts from. Each call is a single attempt with a fixed timeout; retries
//! belong to whatever schedules the run.
//!
//! ## Endpoints
//!
//! - `POST /api/token` - client-credentials grant ([`auth`])
//! - `GET /v1/search?type=artist&limit=1` - artist lookup ([`artists`])
//! - `GET /v1/artists/{id}/top-tracks?market=` - top tracks ([`artists`])
//! - `GET /v1/me/player/recently-played?after=&limit=` - listening history ([`player`])
//!
//! ## Error Mapping
//!
//! - connection failures and timeouts become [`EtlError::Transport`]
//! - non-2xx token responses become [`EtlError::Auth`]
//! - non-2xx API responses become [`EtlError::Http`] with status and body
//! - undecodable 2xx bodies become [`EtlError::Protocol`]
//!
//! ## Raw Payloads
//!
//! Track lists are returned as raw JSON values. Decoding into the
//! optional-field schemas in [`crate::types`] happens per item in the
//! normalizer, so one malformed item cannot fail the whole page.
//!
//! ## Testing Seam
//!
//! The orchestrator only talks to the [`SpotifyApi`] trait.
//! [`SpotifyClient`] is the HTTP implementation; tests drive the pipeline
//! with in-memory fakes.

pub mod artists;
pub mod auth;
pub mod player;

use reqwest::{
    blocking::{Client, RequestBuilder},
    header,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Settings,
    error::EtlError,
    types::{Artist, ClientCredentials},
};

pub use auth::basic_auth_header;

/// Operations the pipeline needs from the Spotify Web API.
pub trait SpotifyApi {
    /// Exchanges client credentials for a bearer token.
    fn request_token(&self, credentials: &ClientCredentials) -> Result<String, EtlError>;

    /// Returns the first artist matching `name`, or [`EtlError::NotFound`].
    fn search_artist(&self, token: &str, name: &str) -> Result<Artist, EtlError>;

    /// Returns the raw track objects of an artist's top tracks in `market`.
    fn top_tracks(
        &self,
        token: &str,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<serde_json::Value>, EtlError>;

    /// Returns raw play-history items played after `after_ms`.
    /// `limit` is clamped to the page size the API accepts.
    fn recently_played(
        &self,
        token: &str,
        limit: i64,
        after_ms: i64,
    ) -> Result<Vec<serde_json::Value>, EtlError>;
}

#[derive(Clone, Debug)]
pub struct SpotifyClient {
    http: Client,
    token_url: Url,
    api_base: Url,
}

impl SpotifyClient {
    pub fn new(settings: &Settings) -> Result<Self, EtlError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(settings.http_timeout)
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EtlError::Transport(format!("build client: {e}")))?;

        Ok(Self {
            http,
            token_url: settings.token_url.clone(),
            api_base: settings.api_base.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EtlError> {
        self.api_base
            .join(path)
            .map_err(|e| EtlError::Config(format!("cannot build url for {path}: {e}")))
    }

    /// Sends a request once and decodes a 2xx JSON body into `T`.
    fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, EtlError> {
        let response = request.send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "spotify request failed");
            return Err(EtlError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        serde_json::from_str::<T>(&body)
            .map_err(|e| EtlError::Protocol(format!("unexpected response shape: {e}")))
    }
}

impl SpotifyApi for SpotifyClient {
    fn request_token(&self, credentials: &ClientCredentials) -> Result<String, EtlError> {
        SpotifyClient::request_token(self, credentials)
    }

    fn search_artist(&self, token: &str, name: &str) -> Result<Artist, EtlError> {
        SpotifyClient::search_artist(self, token, name)
    }

    fn top_tracks(
        &self,
        token: &str,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<serde_json::Value>, EtlError> {
        SpotifyClient::top_tracks(self, token, artist_id, market)
    }

    fn recently_played(
        &self,
        token: &str,
        limit: i64,
        after_ms: i64,
    ) -> Result<Vec<serde_json::Value>, EtlError> {
        SpotifyClient::recently_played(self, token, limit, after_ms)
    }
}
