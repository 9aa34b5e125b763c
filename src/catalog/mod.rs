//! In-memory catalog of projects and their APIs.
//!
//! The cache memoizes upstream reads for the lifetime of the process:
//!
//! - The project list is fetched whenever it is empty, so an empty upstream
//!   catalog is refetched on every call.
//! - Each project's API list is fetched once and then kept forever, even if
//!   the fetch degraded to an empty list. Only [`CatalogCache::clear`]
//!   forgets it.
//!
//! Concurrent callers for the same missing key share a single in-flight
//! fetch rather than issuing duplicates.

mod cache;

pub use cache::CatalogCache;
