//! Cache validation functions

use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if a cache entry is still valid (not expired)
///
/// # Arguments
/// * `created_at_secs` - Creation timestamp in seconds since UNIX_EPOCH
/// * `ttl_secs` - Time-to-live in seconds
///
/// # Returns
/// `true` if cache is still valid, `false` if expired
pub fn is_cache_valid(created_at_secs: u32, ttl_secs: u32) -> bool {
	let now = SystemTime::now();
	let created = UNIX_EPOCH + std::time::Duration::from_secs(created_at_secs as u64);
	let expiry = created + std::time::Duration::from_secs(ttl_secs as u64);
	now < expiry
}

/// Check if a cache entry is valid given current mtime
///
/// This is the extracted validation from the original cache.rs:159
/// Used to verify that a cached file entry is still fresh based on
/// the file's modification time.
///
/// # Arguments
/// * `rel_path` - Relative path of the cached file
/// * `created_at_secs` - Creation timestamp of cache entry (seconds since UNIX_EPOCH)
/// * `current_mtime` - Current modification time of the file
/// * `cached_mtime` - Modification time when file was cached
///
/// # Returns
/// `true` if cache is still valid (file hasn't been modified), `false` otherwise
pub fn is_file_cache_valid(
	created_at_secs: u32,
	current_mtime: u32,
	cached_mtime: u32,
	ttl_secs: u32,
) -> Result<bool, Box<dyn Error>> {
	// Cache is invalid if:
	// 1. TTL has expired
	// 2. File has been modified since cache was created
	if !is_cache_valid(created_at_secs, ttl_secs) {
		return Ok(false);
	}

	if current_mtime != cached_mtime {
		return Ok(false);
	}

	Ok(true)
}
