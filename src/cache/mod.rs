//! Response cache for REST API data
//!
//! This module provides an in-memory, time-windowed cache shared by every
//! consumer of a logical resource. Fresh entries are served without a network
//! call, stale or missing entries trigger exactly one fetch even when several
//! views request the same resource at once, and a failed fetch leaves the
//! previous entry untouched so the UI can keep showing last-known-good data.

mod store;

pub use store::{CacheError, CachedSnapshot, ResponseCache};
