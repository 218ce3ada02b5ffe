//! An in-process `Transport` implementation over a shared `Store`, used by
//! tests and by two `Engine`s running in the same address space. Applying a
//! write via this transport is indistinguishable, from the remote side's
//! perspective, from a local write: the remote's own peer counter advances,
//! exactly as it would if its own Journal had observed the change.

use crate::error::TransportError;
use crate::model::{FileMetadata, FileState, PeerSnapshot};
use crate::store::Store;
use crate::transport::{Transport, TransportResult};
use crate::vv::PeerId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A handle to one side of an in-memory peer pair.
pub struct InMemoryTransport {
	store: Arc<Store>,
	root: PathBuf,
	remote_peer: PeerId,
}

impl InMemoryTransport {
	pub fn new(store: Arc<Store>, root: PathBuf, remote_peer: PeerId) -> Self {
		InMemoryTransport { store, root, remote_peer }
	}
}

fn now_unix_ms() -> i64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as i64
}

#[async_trait]
impl Transport for InMemoryTransport {
	async fn get_states(&self, sync_id: &str) -> TransportResult<PeerSnapshot> {
		let entries = self.store.iter(sync_id).map_err(|e| TransportError::Protocol {
			message: format!("store read failed: {}", e),
		})?;
		let states = entries.into_iter().collect();
		Ok(PeerSnapshot { sync_id: sync_id.to_string(), states })
	}

	async fn get_file(&self, _sync_id: &str, path: &Path) -> TransportResult<Vec<u8>> {
		let abs = self.root.join(path);
		tokio::fs::read(&abs)
			.await
			.map_err(|_| TransportError::NotFound { path: path.display().to_string() })
	}

	async fn put_file(&self, sync_id: &str, path: &Path, bytes: &[u8]) -> TransportResult<()> {
		let prior_vv = self
			.store
			.get(sync_id, path)
			.map_err(|e| TransportError::Protocol { message: e.to_string() })?
			.map(|s| s.vv().clone())
			.unwrap_or_default();
		let mut vv = prior_vv;
		vv.inc(self.remote_peer);

		let meta = FileMetadata {
			content_hash: crate::util::hash_binary(bytes),
			mtime_unix_ms: now_unix_ms(),
			size: bytes.len() as u64,
			vv,
			is_directory: false,
		};
		self.store
			.atomic_apply_remote(sync_id, &self.root, path, &FileState::Live(meta), Some(bytes))
			.await
			.map_err(|e| TransportError::Protocol { message: e.to_string() })
	}

	async fn delete_files(&self, sync_id: &str, paths: &[PathBuf]) -> TransportResult<()> {
		for path in paths {
			self.store
				.atomic_delete_local(sync_id, &self.root, path, self.remote_peer, now_unix_ms())
				.await
				.map_err(|e| TransportError::Protocol { message: e.to_string() })?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn peer(b: u8) -> PeerId {
		let mut bytes = [0u8; 32];
		bytes[0] = b;
		PeerId(bytes)
	}

	#[tokio::test]
	async fn put_file_then_get_states_reflects_remote_write() {
		let tmp = TempDir::new().unwrap();
		let store = Arc::new(Store::open(&tmp.path().join("db")).unwrap());
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let transport = InMemoryTransport::new(store.clone(), root.clone(), peer(9));

		transport.put_file("g1", Path::new("a.txt"), b"hello").await.unwrap();

		let snapshot = transport.get_states("g1").await.unwrap();
		let state = snapshot.states.get(Path::new("a.txt")).unwrap();
		assert!(state.is_live());
		assert_eq!(state.vv().get(peer(9)), 1);

		let bytes = transport.get_file("g1", Path::new("a.txt")).await.unwrap();
		assert_eq!(bytes, b"hello");
	}

	#[tokio::test]
	async fn delete_files_produces_tombstone_owned_by_remote_peer() {
		let tmp = TempDir::new().unwrap();
		let store = Arc::new(Store::open(&tmp.path().join("db")).unwrap());
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let transport = InMemoryTransport::new(store.clone(), root.clone(), peer(9));
		transport.put_file("g1", Path::new("a.txt"), b"hi").await.unwrap();

		transport.delete_files("g1", &[PathBuf::from("a.txt")]).await.unwrap();
		let snapshot = transport.get_states("g1").await.unwrap();
		let state = snapshot.states.get(Path::new("a.txt")).unwrap();
		assert!(state.is_tombstone());
		assert_eq!(state.as_tombstone().unwrap().deleted_by, peer(9));
	}

	#[tokio::test]
	async fn get_file_not_found_returns_transport_error() {
		let tmp = TempDir::new().unwrap();
		let store = Arc::new(Store::open(&tmp.path().join("db")).unwrap());
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let transport = InMemoryTransport::new(store, root, peer(9));
		let err = transport.get_file("g1", Path::new("missing.txt")).await.unwrap_err();
		assert!(matches!(err, TransportError::NotFound { .. }));
	}
}
