//! Pokedex CLI Library
//!
//! Exposes the TTL cache, the cached PokeAPI client, and the REPL pieces for use
//! by the binary and integration tests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod repl;
