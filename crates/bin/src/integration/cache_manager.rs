//! Location of the quote cache.

use darwin_data::{DataError, SqliteCache};
use std::path::PathBuf;

/// Platform cache directory, e.g. `~/.cache/darwin/` on Linux.
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("darwin")
}

/// Path of the cache database.
pub(crate) fn cache_path() -> PathBuf {
    default_cache_dir().join("darwin.db")
}

/// Open the cache, creating its directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let path = cache_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCache::new(&path)
}

/// Print where the cache lives and what it holds.
pub(crate) fn print_cache_info() {
    println!("  Cache location: {}", cache_path().display());
    if let Some(stats) = open_cache().ok().and_then(|cache| cache.stats().ok()) {
        println!(
            "  Cached data: {} quotes for {} symbols, {} security records",
            stats.total_quotes, stats.unique_symbols, stats.securities
        );
    }
}
