//! Core data types: FileMetadata, Tombstone, FileState, SyncGroup, PeerSnapshot.

use crate::vv::{PeerId, VersionVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Digest of an empty byte sequence, used by zero-length files.
pub fn empty_content_hash() -> [u8; 32] {
	*blake3::hash(&[]).as_bytes()
}

/// `{ content_hash, mtime, size, vv, is_directory }`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FileMetadata {
	pub content_hash: [u8; 32],
	/// Milliseconds since the Unix epoch.
	pub mtime_unix_ms: i64,
	pub size: u64,
	pub vv: VersionVector,
	pub is_directory: bool,
}

impl FileMetadata {
	pub fn builder() -> FileMetadataBuilder {
		FileMetadataBuilder::default()
	}
}

#[derive(Default)]
pub struct FileMetadataBuilder {
	content_hash: Option<[u8; 32]>,
	mtime_unix_ms: i64,
	size: u64,
	vv: VersionVector,
	is_directory: bool,
}

impl FileMetadataBuilder {
	pub fn content_hash(mut self, h: [u8; 32]) -> Self {
		self.content_hash = Some(h);
		self
	}

	pub fn mtime_unix_ms(mut self, t: i64) -> Self {
		self.mtime_unix_ms = t;
		self
	}

	pub fn size(mut self, s: u64) -> Self {
		self.size = s;
		self
	}

	pub fn vv(mut self, vv: VersionVector) -> Self {
		self.vv = vv;
		self
	}

	pub fn is_directory(mut self, d: bool) -> Self {
		self.is_directory = d;
		self
	}

	pub fn build(self) -> FileMetadata {
		FileMetadata {
			content_hash: self.content_hash.unwrap_or_else(empty_content_hash),
			mtime_unix_ms: self.mtime_unix_ms,
			size: self.size,
			vv: self.vv,
			is_directory: self.is_directory,
		}
	}
}

/// `{ deleted_at, deleted_by, vv }`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Tombstone {
	pub deleted_at_unix_ms: i64,
	pub deleted_by: PeerId,
	pub vv: VersionVector,
}

/// Tagged union `Live(FileMetadata) | Tombstone(Tombstone)`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum FileState {
	Live(FileMetadata),
	Tombstone(Tombstone),
}

impl FileState {
	pub fn vv(&self) -> &VersionVector {
		match self {
			FileState::Live(m) => &m.vv,
			FileState::Tombstone(t) => &t.vv,
		}
	}

	pub fn is_tombstone(&self) -> bool {
		matches!(self, FileState::Tombstone(_))
	}

	pub fn is_live(&self) -> bool {
		matches!(self, FileState::Live(_))
	}

	pub fn as_live(&self) -> Option<&FileMetadata> {
		match self {
			FileState::Live(m) => Some(m),
			FileState::Tombstone(_) => None,
		}
	}

	pub fn as_tombstone(&self) -> Option<&Tombstone> {
		match self {
			FileState::Tombstone(t) => Some(t),
			FileState::Live(_) => None,
		}
	}
}

/// Synchronization direction for a SyncGroup.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SyncMode {
	TwoWay,
	UploadOnly,
	DownloadOnly,
}

impl Default for SyncMode {
	fn default() -> Self {
		SyncMode::TwoWay
	}
}

/// `{ sync_id, root, exclude_patterns, mode }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncGroup {
	pub sync_id: String,
	pub root: PathBuf,
	pub exclude_patterns: Vec<String>,
	pub mode: SyncMode,
}

/// What a peer sends in answer to `GetStates`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerSnapshot {
	pub sync_id: String,
	pub states: BTreeMap<PathBuf, FileState>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn peer(b: u8) -> PeerId {
		let mut bytes = [0u8; 32];
		bytes[0] = b;
		PeerId(bytes)
	}

	#[test]
	fn empty_file_has_well_defined_digest() {
		let h1 = empty_content_hash();
		let h2 = empty_content_hash();
		assert_eq!(h1, h2);
		assert_ne!(h1, [0u8; 32]);
	}

	#[test]
	fn builder_defaults_empty_hash() {
		let meta = FileMetadata::builder().size(0).build();
		assert_eq!(meta.content_hash, empty_content_hash());
	}

	#[test]
	fn file_state_vv_accessor_covers_both_arms() {
		let mut vv = VersionVector::new();
		vv.inc(peer(1));
		let live = FileState::Live(FileMetadata::builder().vv(vv.clone()).build());
		let tomb = FileState::Tombstone(Tombstone {
			deleted_at_unix_ms: 0,
			deleted_by: peer(1),
			vv: vv.clone(),
		});
		assert_eq!(live.vv(), &vv);
		assert_eq!(tomb.vv(), &vv);
		assert!(live.is_live());
		assert!(tomb.is_tombstone());
	}

	#[test]
	fn file_state_equality() {
		let meta1 = FileMetadata::builder().size(4).mtime_unix_ms(10).build();
		let meta2 = FileMetadata::builder().size(4).mtime_unix_ms(10).build();
		assert_eq!(FileState::Live(meta1), FileState::Live(meta2));
	}
}
