//! Response caching for outbound model calls.
//!
//! This crate stores successful responses under a content-addressed key and
//! replays them for identical requests:
//! - [`cache_key`]: SHA-256 digest of model identity, normalized request and prefix
//! - [`CacheEnvelope`]: the stored JSON shape, decoded into a [`CacheLookup`]
//! - [`MemoryCache`], [`FileCache`], [`NoopCache`]: backends implementing
//!   [`Cache`](tollgate_interface::Cache)
//! - [`CachedCall`]: the middleware layer, which never caches streaming requests
//!
//! A cache that cannot be read, or an entry that cannot be decoded, degrades
//! to a live call. Cache failures never reach the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod call;
mod envelope;
mod file;
mod key;
mod memory;
mod namespace;
mod noop;

pub use call::CachedCall;
pub use envelope::{CacheEnvelope, CacheLookup};
pub use file::FileCache;
pub use key::cache_key;
pub use memory::{MemoryCache, MemoryCacheConfig, MemoryCacheConfigBuilder};
pub use noop::NoopCache;
