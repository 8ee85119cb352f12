//! PokeAPI client with cache-aside reads
//!
//! Every read computes its request URL, serves the response from the TTL cache
//! when a fresh entry exists under that exact URL, and otherwise fetches,
//! decodes and caches it. Failed requests and undecodable bodies are never cached.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Cacheable, CachedResponse, LocationArea, LocationAreaPage, Pokemon};
use crate::cache::{CacheError, TtlCache};

/// Base URL for PokeAPI v2
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of location areas requested for the first page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Errors that can occur when reading from PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("network request failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("PokeAPI returned status {status}")]
    RemoteError { status: u16 },

    /// The response body did not match the expected shape
    #[error("failed to decode PokeAPI response: {0}")]
    DecodeError(#[from] serde_json::Error),
}

/// Client for reading location areas and pokemon from PokeAPI
///
/// Owns a single response cache for its whole lifetime so repeated reads of the
/// same URL are served locally until the entry expires.
#[derive(Debug)]
pub struct PokeClient {
    http: Client,
    base_url: String,
    cache: TtlCache<CachedResponse>,
}

impl PokeClient {
    /// Create a client against the public PokeAPI with the given cache TTL
    ///
    /// Must be called inside a tokio runtime, since the cache starts its sweep task here.
    pub fn new(cache_ttl: Duration) -> Result<Self, CacheError> {
        Ok(Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache: TtlCache::new(cache_ttl)?,
        })
    }

    /// Point the client at a different API root (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client, e.g. one with a request timeout
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The response cache, keyed by request URL
    pub fn cache(&self) -> &TtlCache<CachedResponse> {
        &self.cache
    }

    /// Stop the cache sweep as part of an orderly shutdown
    pub fn shutdown(&self) {
        self.cache.stop();
    }

    /// URL of the first page of location areas
    pub fn first_page_url(&self) -> String {
        format!(
            "{}/location-area?offset=0&limit={}",
            self.base_url, DEFAULT_PAGE_SIZE
        )
    }

    pub fn location_area_url(&self, name: &str) -> String {
        format!("{}/location-area/{}", self.base_url, path_segment(name))
    }

    pub fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, path_segment(name))
    }

    /// Fetch a page of location areas
    ///
    /// # Arguments
    /// * `page_url` - A `next`/`previous` URL from an earlier page, or `None` for the first page
    ///
    /// # Returns
    /// * `Ok(LocationAreaPage)` - The page, from cache or network
    /// * `Err(ApiError)` - If the request or decoding fails
    pub async fn list_location_areas(
        &self,
        page_url: Option<&str>,
    ) -> Result<LocationAreaPage, ApiError> {
        let url = match page_url {
            Some(url) => url.to_string(),
            None => self.first_page_url(),
        };
        self.fetch_cached(&url).await
    }

    /// Fetch a location area and its pokemon encounters by name
    pub async fn get_location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        let url = self.location_area_url(name);
        self.fetch_cached(&url).await
    }

    /// Fetch a pokemon by name
    pub async fn get_pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        let url = self.pokemon_url(name);
        self.fetch_cached(&url).await
    }

    /// Serve `url` from the cache, or fetch and cache it on a miss
    async fn fetch_cached<T>(&self, url: &str) -> Result<T, ApiError>
    where
        T: Cacheable + DeserializeOwned + Clone,
    {
        // A different shape under the same URL is treated as a miss and overwritten
        if let Some(value) = self.cache.get(url).and_then(T::from_cached) {
            debug!(url, "cache hit");
            return Ok(value);
        }

        debug!(url, "cache miss");
        let value: T = self.fetch_from_api(url).await?;
        self.cache.put(url, value.clone().into_cached());
        Ok(value)
    }

    /// Fetch and decode `url` directly from the API
    async fn fetch_from_api<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "request failed");
            ApiError::NetworkFailure(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "PokeAPI returned an error status");
            return Err(ApiError::RemoteError {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(url, error = %e, "undecodable response body");
            ApiError::DecodeError(e)
        })
    }
}

/// Escape characters that would change the meaning of a URL path segment
fn path_segment(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}
