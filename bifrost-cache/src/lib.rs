//! Stale-while-revalidate caching for the Bifrost gateway.
//!
//! The cache exposes a single operation, [`SwrCache::get`], which either
//! returns a cached value, produces one synchronously on a first-ever miss,
//! or serves an expired value immediately while a background task refreshes
//! it. At most one refresh is in flight per key, so a burst of reads against
//! an expired entry triggers exactly one upstream call.
//!
//! Entries are never evicted: an expired value remains readable until a
//! refresh replaces it. This trades memory for the guarantee that, once a
//! key has been populated, reads never block on the network again.

#![warn(missing_docs)]

/// The stale-while-revalidate cache itself.
pub mod swr;

/// Cached value wrapper with its storage timestamp.
pub mod value;

pub use swr::SwrCache;
pub use value::CacheValue;
