//! PokeAPI data models and cached client
//!
//! This module contains the decoded response types for the three PokeAPI reads
//! the explorer performs, and the client that serves them through the TTL cache.

pub mod client;
pub mod location;
pub mod pokemon;

pub use client::{ApiError, PokeClient, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
pub use location::{LocationArea, LocationAreaPage, PokemonEncounter};
pub use pokemon::{Pokemon, PokemonAbility, PokemonStat, PokemonType};

use serde::{Deserialize, Serialize};

/// A `{name, url}` reference to another PokeAPI resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// Every response shape the client stores in its cache
///
/// Keeping the set closed means a cached value is always checked against the
/// shape a caller asks for, instead of trusting the key to imply the type.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResponse {
    LocationAreaPage(LocationAreaPage),
    LocationArea(LocationArea),
    Pokemon(Pokemon),
}

/// Conversion between a decoded response type and its `CachedResponse` variant
pub trait Cacheable: Sized {
    /// Wraps the value for storage
    fn into_cached(self) -> CachedResponse;

    /// Unwraps a cached value, or `None` if it holds a different shape
    fn from_cached(cached: CachedResponse) -> Option<Self>;
}

impl Cacheable for LocationAreaPage {
    fn into_cached(self) -> CachedResponse {
        CachedResponse::LocationAreaPage(self)
    }

    fn from_cached(cached: CachedResponse) -> Option<Self> {
        match cached {
            CachedResponse::LocationAreaPage(page) => Some(page),
            _ => None,
        }
    }
}

impl Cacheable for LocationArea {
    fn into_cached(self) -> CachedResponse {
        CachedResponse::LocationArea(self)
    }

    fn from_cached(cached: CachedResponse) -> Option<Self> {
        match cached {
            CachedResponse::LocationArea(area) => Some(area),
            _ => None,
        }
    }
}

impl Cacheable for Pokemon {
    fn into_cached(self) -> CachedResponse {
        CachedResponse::Pokemon(self)
    }

    fn from_cached(cached: CachedResponse) -> Option<Self> {
        match cached {
            CachedResponse::Pokemon(pokemon) => Some(pokemon),
            _ => None,
        }
    }
}
