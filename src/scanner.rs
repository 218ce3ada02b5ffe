//! Filesystem scanner (C3): walks a SyncGroup root and produces the set of
//! observed `(PathBuf, FileMetadata)` pairs, reusing a previously stored
//! content hash whenever mtime and size are unchanged.

use crate::conflict::is_conflict_artifact;
use crate::error::SyncError;
use crate::exclusion::ExclusionEngine;
use crate::model::FileMetadata;
use crate::vv::VersionVector;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// A single file observed on disk, not yet merged against the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ScannedEntry {
	pub rel_path: PathBuf,
	pub mtime_unix_ms: i64,
	pub size: u64,
	pub is_directory: bool,
}

/// Prior knowledge the scanner consults to avoid re-hashing unchanged files.
pub trait HashCache {
	/// Returns `Some(hash)` if `rel_path` was last seen with this exact
	/// `(mtime_unix_ms, size)` pair.
	fn cached_hash(&self, rel_path: &Path, mtime_unix_ms: i64, size: u64) -> Option<[u8; 32]>;
}

/// Walks `root`, applying `exclusion` and skipping conflict artifacts (C7),
/// and returns metadata for every live regular file and directory. The
/// returned VersionVector is always empty — callers merge in the prior
/// stored VV themselves (the scanner has no causal knowledge).
pub fn scan(
	root: &Path,
	exclusion: &ExclusionEngine,
	cache: &dyn HashCache,
) -> Result<Vec<(PathBuf, FileMetadata)>, SyncError> {
	let mut out = Vec::new();
	let walker = WalkBuilder::new(root).hidden(false).git_ignore(false).build();

	for entry in walker {
		let entry = entry.map_err(|e| SyncError::Other { message: e.to_string() })?;
		let abs_path = entry.path();
		if abs_path == root {
			continue;
		}
		let rel_path = match abs_path.strip_prefix(root) {
			Ok(p) => p.to_path_buf(),
			Err(_) => continue,
		};
		if is_conflict_artifact(&rel_path) {
			continue;
		}

		let file_type = entry.file_type();
		let is_dir = file_type.map(|t| t.is_dir()).unwrap_or(false);

		if is_dir {
			if exclusion.should_exclude_dir(&rel_path) {
				continue;
			}
			continue;
		}

		let is_regular = file_type.map(|t| t.is_file()).unwrap_or(false);
		if !is_regular {
			// Symlinks, sockets, devices: out of scope (spec Non-goals).
			continue;
		}

		let metadata = std::fs::symlink_metadata(abs_path).map_err(SyncError::Io)?;
		if exclusion.should_exclude(&rel_path, Some(&metadata)) {
			continue;
		}

		let mtime_unix_ms = metadata
			.modified()
			.map_err(SyncError::Io)?
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_millis() as i64;
		let size = metadata.len();

		let content_hash = match cache.cached_hash(&rel_path, mtime_unix_ms, size) {
			Some(h) => h,
			None => {
				let bytes = std::fs::read(abs_path).map_err(SyncError::Io)?;
				crate::util::hash_binary(&bytes)
			}
		};

		let meta = FileMetadata {
			content_hash,
			mtime_unix_ms,
			size,
			vv: VersionVector::new(),
			is_directory: false,
		};
		out.push((rel_path, meta));
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::exclusion::ExcludeConfig;
	use tempfile::TempDir;

	struct NoCache;
	impl HashCache for NoCache {
		fn cached_hash(&self, _rel_path: &Path, _mtime: i64, _size: u64) -> Option<[u8; 32]> {
			None
		}
	}

	struct StaticCache(Vec<(PathBuf, i64, u64, [u8; 32])>);
	impl HashCache for StaticCache {
		fn cached_hash(&self, rel_path: &Path, mtime: i64, size: u64) -> Option<[u8; 32]> {
			self.0
				.iter()
				.find(|(p, m, s, _)| p == rel_path && *m == mtime && *s == size)
				.map(|(_, _, _, h)| *h)
		}
	}

	fn engine(tmp: &TempDir) -> ExclusionEngine {
		ExclusionEngine::new(&ExcludeConfig::default(), tmp.path()).unwrap()
	}

	#[test]
	fn scan_finds_regular_files() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), b"hello").unwrap();
		std::fs::create_dir(tmp.path().join("sub")).unwrap();
		std::fs::write(tmp.path().join("sub/b.txt"), b"world").unwrap();

		let results = scan(tmp.path(), &engine(&tmp), &NoCache).unwrap();
		let mut paths: Vec<_> = results.iter().map(|(p, _)| p.clone()).collect();
		paths.sort();
		assert_eq!(paths, vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.txt")]);
	}

	#[test]
	fn scan_excludes_conflict_artifacts() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), b"hello").unwrap();
		std::fs::write(
			tmp.path().join("a.conflict.abc123.1700000000000.txt"),
			b"conflicted",
		)
		.unwrap();

		let results = scan(tmp.path(), &engine(&tmp), &NoCache).unwrap();
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].0, PathBuf::from("a.txt"));
	}

	#[test]
	fn scan_respects_exclusion_patterns() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("keep.txt"), b"hi").unwrap();
		std::fs::write(tmp.path().join("skip.log"), b"hi").unwrap();
		let config = ExcludeConfig { patterns: vec!["*.log".into()], ..Default::default() };
		let exclusion = ExclusionEngine::new(&config, tmp.path()).unwrap();

		let results = scan(tmp.path(), &exclusion, &NoCache).unwrap();
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].0, PathBuf::from("keep.txt"));
	}

	#[test]
	fn scan_reuses_cached_hash_when_mtime_and_size_match() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("a.txt");
		std::fs::write(&path, b"hello").unwrap();
		let metadata = std::fs::metadata(&path).unwrap();
		let mtime_ms = metadata
			.modified()
			.unwrap()
			.duration_since(UNIX_EPOCH)
			.unwrap()
			.as_millis() as i64;
		let size = metadata.len();
		let fake_hash = [0x42; 32];
		let cache = StaticCache(vec![(PathBuf::from("a.txt"), mtime_ms, size, fake_hash)]);

		let results = scan(tmp.path(), &engine(&tmp), &cache).unwrap();
		assert_eq!(results[0].1.content_hash, fake_hash);
	}

	#[test]
	fn scan_rehashes_when_size_changed_even_if_cache_has_stale_entry() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("a.txt");
		std::fs::write(&path, b"hello world").unwrap();
		let stale_hash = [0x99; 32];
		let cache = StaticCache(vec![(PathBuf::from("a.txt"), 0, 0, stale_hash)]);

		let results = scan(tmp.path(), &engine(&tmp), &cache).unwrap();
		assert_ne!(results[0].1.content_hash, stale_hash);
		assert_eq!(results[0].1.content_hash, crate::util::hash_binary(b"hello world"));
	}
}
