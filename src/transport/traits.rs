//! The narrow four-verb transport contract (spec §6.3). A SyncSession never
//! sees chunking, framing, or retries — those are internal to whichever
//! `Transport` implementation is in play.

use crate::error::TransportError;
use crate::model::PeerSnapshot;
use async_trait::async_trait;
use std::path::Path;

pub type TransportResult<T> = Result<T, TransportError>;

/// A reachable peer for one SyncGroup.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Fetches the peer's full `PeerSnapshot` for `sync_id`.
	async fn get_states(&self, sync_id: &str) -> TransportResult<PeerSnapshot>;

	/// Fetches the raw bytes of a live file at `path` within `sync_id`.
	async fn get_file(&self, sync_id: &str, path: &Path) -> TransportResult<Vec<u8>>;

	/// Pushes `bytes` for `path` to the peer, to be stored as the Live
	/// state at that path once the peer verifies the content hash.
	async fn put_file(&self, sync_id: &str, path: &Path, bytes: &[u8]) -> TransportResult<()>;

	/// Asks the peer to mark `paths` as deleted (i.e. apply tombstones).
	async fn delete_files(&self, sync_id: &str, paths: &[std::path::PathBuf]) -> TransportResult<()>;
}
