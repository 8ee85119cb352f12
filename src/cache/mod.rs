//! Cache module for holding API responses in memory
//!
//! This module provides a time-expiring cache keyed by request URL. Entries older
//! than the configured TTL are treated as absent on read, and a background sweep
//! owned by each cache instance physically removes them once per TTL interval.

mod ttl;

pub use ttl::{is_expired, CacheError, TtlCache};
