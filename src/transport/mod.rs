//! Transport (C8): the narrow collaborator a SyncSession talks to in order
//! to reach a peer, independent of whatever wire protocol or bulk-transfer
//! scheme a given implementation uses internally.

pub mod inmemory;
pub mod tcp;
mod traits;

pub use traits::{Transport, TransportResult};

use crate::model::PeerSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Forwards to the boxed transport. Lets `Engine` hold one reachable peer as
/// `Arc<dyn Transport>` while `SyncSession<T>` stays generic over `T`.
#[async_trait]
impl Transport for Arc<dyn Transport> {
	async fn get_states(&self, sync_id: &str) -> TransportResult<PeerSnapshot> {
		(**self).get_states(sync_id).await
	}

	async fn get_file(&self, sync_id: &str, path: &Path) -> TransportResult<Vec<u8>> {
		(**self).get_file(sync_id, path).await
	}

	async fn put_file(&self, sync_id: &str, path: &Path, bytes: &[u8]) -> TransportResult<()> {
		(**self).put_file(sync_id, path, bytes).await
	}

	async fn delete_files(&self, sync_id: &str, paths: &[PathBuf]) -> TransportResult<()> {
		(**self).delete_files(sync_id, paths).await
	}
}
