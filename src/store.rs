//! FileState store (C2) and persistence (C9): the single source of truth for
//! local state of a SyncGroup, backed by an embedded `redb` database.
//!
//! Two table families live in the same database: the primary
//! `"<sync_id>\0<path>" -> FileState` mapping, and the secondary
//! `"<sync_id>\0<peer_id>" -> last_reconciled_snapshot_hash` bookkeeping used
//! to short-circuit no-op sessions.

use crate::error::SyncError;
use crate::model::FileState;
use crate::vv::PeerId;
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const STATES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("states");
const SNAPSHOT_HASH_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot_hashes");

fn state_key(sync_id: &str, path: &Path) -> String {
	format!("{}\0{}", sync_id, path.to_string_lossy())
}

fn state_key_prefix(sync_id: &str) -> String {
	format!("{}\0", sync_id)
}

fn snapshot_key(sync_id: &str, peer: PeerId) -> String {
	format!("{}\0{}", sync_id, peer)
}

fn encode_state(state: &FileState) -> Result<Vec<u8>, SyncError> {
	serde_json::to_vec(state).map_err(|e| SyncError::Other { message: e.to_string() })
}

fn decode_state(bytes: &[u8]) -> Result<FileState, SyncError> {
	serde_json::from_slice(bytes).map_err(|e| SyncError::Other { message: e.to_string() })
}

/// Per-path mutex striping: no two mutations on the same (sync_id, path) are
/// ever in flight concurrently (spec §5).
#[derive(Default)]
struct PathLocks {
	locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PathLocks {
	fn lock_for(&self, sync_id: &str, path: &Path) -> Arc<Mutex<()>> {
		let key = state_key(sync_id, path);
		let mut guard = self.locks.lock().unwrap();
		guard.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
	}
}

/// The embedded key-value store backing a device's SyncGroups.
pub struct Store {
	db: Database,
	path_locks: PathLocks,
}

impl Store {
	/// Open (or create) the store at `db_path`, ensuring both tables exist.
	pub fn open(db_path: &Path) -> Result<Self, SyncError> {
		let db = Database::create(db_path).map_err(|e| SyncError::StoreCorrupted {
			message: format!("failed to open store at {}: {}", db_path.display(), e),
		})?;
		{
			let write_txn = db.begin_write().map_err(|e| SyncError::StoreCorrupted {
				message: format!("failed to begin write txn: {}", e),
			})?;
			let _ = write_txn.open_table(STATES_TABLE).map_err(|e| SyncError::StoreCorrupted {
				message: format!("failed to open states table: {}", e),
			})?;
			let _ =
				write_txn.open_table(SNAPSHOT_HASH_TABLE).map_err(|e| SyncError::StoreCorrupted {
					message: format!("failed to open snapshot hash table: {}", e),
				})?;
			write_txn.commit().map_err(|e| SyncError::StoreCorrupted {
				message: format!("failed to commit table creation: {}", e),
			})?;
		}
		Ok(Store { db, path_locks: PathLocks::default() })
	}

	/// `get(sync_id, path) -> Option<FileState>`.
	pub fn get(&self, sync_id: &str, path: &Path) -> Result<Option<FileState>, SyncError> {
		let read_txn = self.db.begin_read().map_err(|e| SyncError::StoreCorrupted {
			message: format!("read txn failed: {}", e),
		})?;
		let table = read_txn.open_table(STATES_TABLE).map_err(|e| SyncError::StoreCorrupted {
			message: format!("open states table failed: {}", e),
		})?;
		let key = state_key(sync_id, path);
		match table.get(key.as_str()).map_err(|e| SyncError::StoreCorrupted {
			message: format!("table get failed: {}", e),
		})? {
			Some(v) => Ok(Some(decode_state(v.value())?)),
			None => Ok(None),
		}
	}

	/// `put_live(sync_id, path, meta)` — replaces whatever was there.
	pub async fn put_live(
		&self,
		sync_id: &str,
		path: &Path,
		meta: crate::model::FileMetadata,
	) -> Result<(), SyncError> {
		let lock = self.path_locks.lock_for(sync_id, path);
		let _guard = lock.lock().await;
		self.commit_state(sync_id, path, &FileState::Live(meta))
	}

	/// `put_tombstone(sync_id, path, ts)` — replaces whatever was there.
	pub async fn put_tombstone(
		&self,
		sync_id: &str,
		path: &Path,
		ts: crate::model::Tombstone,
	) -> Result<(), SyncError> {
		let lock = self.path_locks.lock_for(sync_id, path);
		let _guard = lock.lock().await;
		self.commit_state(sync_id, path, &FileState::Tombstone(ts))
	}

	fn commit_state(&self, sync_id: &str, path: &Path, state: &FileState) -> Result<(), SyncError> {
		let bytes = encode_state(state)?;
		let write_txn = self.db.begin_write().map_err(|e| SyncError::StoreCorrupted {
			message: format!("begin write failed: {}", e),
		})?;
		{
			let mut table =
				write_txn.open_table(STATES_TABLE).map_err(|e| SyncError::StoreCorrupted {
					message: format!("open table failed: {}", e),
				})?;
			let key = state_key(sync_id, path);
			table
				.insert(key.as_str(), bytes.as_slice())
				.map_err(|e| SyncError::StoreCorrupted { message: format!("insert failed: {}", e) })?;
		}
		write_txn
			.commit()
			.map_err(|e| SyncError::StoreCorrupted { message: format!("commit failed: {}", e) })
	}

	/// Reads the prior VV, produces a Tombstone with `inc(self_peer)`,
	/// ensures the disk file is removed, then commits both atomically.
	/// Fails with `ioError` if the file cannot be removed; state is NOT
	/// changed in that case.
	pub async fn atomic_delete_local(
		&self,
		sync_id: &str,
		root: &Path,
		path: &Path,
		self_peer: PeerId,
		deleted_at_unix_ms: i64,
	) -> Result<crate::model::Tombstone, SyncError> {
		let lock = self.path_locks.lock_for(sync_id, path);
		let _guard = lock.lock().await;

		let prior = self.get(sync_id, path)?;
		let mut vv = prior.as_ref().map(|s| s.vv().clone()).unwrap_or_default();
		vv.inc(self_peer);

		let abs = root.join(path);
		if abs.exists() {
			tokio::fs::remove_file(&abs).await.map_err(SyncError::Io)?;
		}

		let tombstone = crate::model::Tombstone { deleted_at_unix_ms, deleted_by: self_peer, vv };
		self.commit_state(sync_id, path, &FileState::Tombstone(tombstone.clone()))?;
		Ok(tombstone)
	}

	/// Applies a state received from a peer. For Live: writes `bytes` to a
	/// temp file, fsyncs, atomically renames into place, then commits the
	/// merged state — if the rename fails, no state change occurs. For
	/// Tombstone: removes the local file if present, then commits. The
	/// stored VV is always `merge(prior_vv, remote_state.vv)`.
	pub async fn atomic_apply_remote(
		&self,
		sync_id: &str,
		root: &Path,
		path: &Path,
		remote_state: &FileState,
		bytes: Option<&[u8]>,
	) -> Result<(), SyncError> {
		let lock = self.path_locks.lock_for(sync_id, path);
		let _guard = lock.lock().await;

		let prior_vv = self.get(sync_id, path)?.map(|s| s.vv().clone()).unwrap_or_default();
		let merged_vv = crate::vv::VersionVector::merge(&prior_vv, remote_state.vv());

		let abs = root.join(path);
		match remote_state {
			FileState::Live(meta) => {
				let data = bytes.ok_or_else(|| SyncError::Other {
					message: "atomic_apply_remote: Live state requires bytes".into(),
				})?;
				let actual_hash = crate::util::hash_binary(data);
				if actual_hash != meta.content_hash {
					return Err(SyncError::HashMismatch {
						expected: crate::util::hash_to_base64(&meta.content_hash),
						actual: crate::util::hash_to_base64(&actual_hash),
					});
				}
				if let Some(parent) = abs.parent() {
					tokio::fs::create_dir_all(parent).await.map_err(SyncError::Io)?;
				}
				let tmp_name = format!(
					"{}.syncr-tmp-{}",
					abs.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
					uuid::Uuid::new_v4().simple()
				);
				let tmp = abs.with_file_name(tmp_name);
				{
					let mut f = tokio::fs::File::create(&tmp).await.map_err(SyncError::Io)?;
					use tokio::io::AsyncWriteExt;
					f.write_all(data).await.map_err(SyncError::Io)?;
					f.sync_all().await.map_err(SyncError::Io)?;
				}
				if let Err(e) = tokio::fs::rename(&tmp, &abs).await {
					let _ = tokio::fs::remove_file(&tmp).await;
					return Err(SyncError::Io(e));
				}
				let mut new_meta = meta.clone();
				new_meta.vv = merged_vv;
				self.commit_state(sync_id, path, &FileState::Live(new_meta))
			}
			FileState::Tombstone(ts) => {
				if abs.exists() {
					tokio::fs::remove_file(&abs).await.map_err(SyncError::Io)?;
				}
				let mut new_ts = ts.clone();
				new_ts.vv = merged_vv;
				self.commit_state(sync_id, path, &FileState::Tombstone(new_ts))
			}
		}
	}

	/// A restartable, consistent-snapshot iterator over `(path, FileState)`.
	pub fn iter(&self, sync_id: &str) -> Result<Vec<(PathBuf, FileState)>, SyncError> {
		let read_txn = self.db.begin_read().map_err(|e| SyncError::StoreCorrupted {
			message: format!("read txn failed: {}", e),
		})?;
		let table = read_txn.open_table(STATES_TABLE).map_err(|e| SyncError::StoreCorrupted {
			message: format!("open table failed: {}", e),
		})?;
		let prefix = state_key_prefix(sync_id);
		let mut out = Vec::new();
		let range = table
			.range(prefix.as_str()..)
			.map_err(|e| SyncError::StoreCorrupted { message: format!("range failed: {}", e) })?;
		for entry in range {
			let (k, v) =
				entry.map_err(|e| SyncError::StoreCorrupted { message: format!("{}", e) })?;
			let key = k.value();
			if !key.starts_with(&prefix) {
				break;
			}
			let rel = &key[prefix.len()..];
			let state = decode_state(v.value())?;
			out.push((PathBuf::from(rel), state));
		}
		Ok(out)
	}

	/// Deletes the stored state for `path` outright (used only by confirmed
	/// tombstone GC, §4.5 step 7 — never by ordinary reconciliation).
	fn remove_entry(&self, sync_id: &str, path: &Path) -> Result<(), SyncError> {
		let write_txn = self.db.begin_write().map_err(|e| SyncError::StoreCorrupted {
			message: format!("begin write failed: {}", e),
		})?;
		{
			let mut table =
				write_txn.open_table(STATES_TABLE).map_err(|e| SyncError::StoreCorrupted {
					message: format!("open table failed: {}", e),
				})?;
			let key = state_key(sync_id, path);
			table.remove(key.as_str()).map_err(|e| SyncError::StoreCorrupted {
				message: format!("remove failed: {}", e),
			})?;
		}
		write_txn
			.commit()
			.map_err(|e| SyncError::StoreCorrupted { message: format!("commit failed: {}", e) })
	}

	/// Confirmation-based tombstone GC (spec §4.5 step 7): a tombstone may
	/// only be pruned when the given peer's snapshot confirms, for this
	/// path, a Tombstone entry. Pruning because a peer simply doesn't
	/// mention the path is forbidden.
	pub fn gc_tombstone(
		&self,
		sync_id: &str,
		path: &Path,
		peer_snapshot: &crate::model::PeerSnapshot,
	) -> Result<bool, SyncError> {
		match self.get(sync_id, path)? {
			Some(FileState::Tombstone(_)) => {}
			_ => return Ok(false),
		};
		let confirmed = matches!(peer_snapshot.states.get(path), Some(FileState::Tombstone(_)));
		if confirmed {
			self.remove_entry(sync_id, path)?;
			Ok(true)
		} else {
			Ok(false)
		}
	}

	/// Bookkeeping used to short-circuit a session against an unchanged peer
	/// snapshot.
	pub fn last_reconciled_hash(
		&self,
		sync_id: &str,
		peer: PeerId,
	) -> Result<Option<[u8; 32]>, SyncError> {
		let read_txn = self.db.begin_read().map_err(|e| SyncError::StoreCorrupted {
			message: format!("read txn failed: {}", e),
		})?;
		let table =
			read_txn.open_table(SNAPSHOT_HASH_TABLE).map_err(|e| SyncError::StoreCorrupted {
				message: format!("open table failed: {}", e),
			})?;
		let key = snapshot_key(sync_id, peer);
		match table.get(key.as_str()).map_err(|e| SyncError::StoreCorrupted {
			message: format!("get failed: {}", e),
		})? {
			Some(v) => {
				let bytes = v.value();
				if bytes.len() == 32 {
					let mut out = [0u8; 32];
					out.copy_from_slice(bytes);
					Ok(Some(out))
				} else {
					Ok(None)
				}
			}
			None => Ok(None),
		}
	}

	pub fn set_last_reconciled_hash(
		&self,
		sync_id: &str,
		peer: PeerId,
		hash: [u8; 32],
	) -> Result<(), SyncError> {
		let write_txn = self.db.begin_write().map_err(|e| SyncError::StoreCorrupted {
			message: format!("begin write failed: {}", e),
		})?;
		{
			let mut table = write_txn.open_table(SNAPSHOT_HASH_TABLE).map_err(|e| {
				SyncError::StoreCorrupted { message: format!("open table failed: {}", e) }
			})?;
			let key = snapshot_key(sync_id, peer);
			table.insert(key.as_str(), &hash[..]).map_err(|e| SyncError::StoreCorrupted {
				message: format!("insert failed: {}", e),
			})?;
		}
		write_txn
			.commit()
			.map_err(|e| SyncError::StoreCorrupted { message: format!("commit failed: {}", e) })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::FileMetadata;
	use crate::vv::VersionVector;
	use tempfile::TempDir;

	fn peer(b: u8) -> PeerId {
		let mut bytes = [0u8; 32];
		bytes[0] = b;
		PeerId(bytes)
	}

	#[tokio::test]
	async fn put_live_then_get_round_trips() {
		let tmp = TempDir::new().unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		let meta = FileMetadata::builder()
			.content_hash(crate::util::hash_binary(b"hi"))
			.size(2)
			.vv(VersionVector::initial(peer(1)))
			.build();
		store.put_live("g1", Path::new("a.txt"), meta.clone()).await.unwrap();
		let got = store.get("g1", Path::new("a.txt")).unwrap().unwrap();
		assert_eq!(got, FileState::Live(meta));
	}

	#[tokio::test]
	async fn different_sync_groups_do_not_collide() {
		let tmp = TempDir::new().unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		store
			.put_live("g1", Path::new("a.txt"), FileMetadata::builder().size(1).build())
			.await
			.unwrap();
		store
			.put_live("g2", Path::new("a.txt"), FileMetadata::builder().size(2).build())
			.await
			.unwrap();
		assert_eq!(store.get("g1", Path::new("a.txt")).unwrap().unwrap().as_live().unwrap().size, 1);
		assert_eq!(store.get("g2", Path::new("a.txt")).unwrap().unwrap().as_live().unwrap().size, 2);
		assert_eq!(store.iter("g1").unwrap().len(), 1);
	}

	#[tokio::test]
	async fn atomic_delete_local_removes_file_and_stores_tombstone() {
		let tmp = TempDir::new().unwrap();
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		tokio::fs::write(root.join("a.txt"), b"hi").await.unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		let meta = FileMetadata::builder().vv(VersionVector::initial(peer(1))).build();
		store.put_live("g1", Path::new("a.txt"), meta).await.unwrap();

		let ts = store
			.atomic_delete_local("g1", &root, Path::new("a.txt"), peer(1), 1000)
			.await
			.unwrap();
		assert_eq!(ts.vv.get(peer(1)), 2);
		assert!(!root.join("a.txt").exists());
		assert!(matches!(
			store.get("g1", Path::new("a.txt")).unwrap(),
			Some(FileState::Tombstone(_))
		));
	}

	#[tokio::test]
	async fn atomic_delete_local_of_absent_file_still_produces_tombstone() {
		let tmp = TempDir::new().unwrap();
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		let meta = FileMetadata::builder().vv(VersionVector::initial(peer(1))).build();
		store.put_live("g1", Path::new("a.txt"), meta).await.unwrap();

		let ts = store
			.atomic_delete_local("g1", &root, Path::new("a.txt"), peer(1), 1000)
			.await
			.unwrap();
		assert_eq!(ts.deleted_by, peer(1));
	}

	#[tokio::test]
	async fn atomic_apply_remote_live_writes_bytes_and_merges_vv() {
		let tmp = TempDir::new().unwrap();
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();

		let mut prior_vv = VersionVector::new();
		prior_vv.inc(peer(1));
		let prior = FileMetadata::builder().vv(prior_vv).build();
		store.put_live("g1", Path::new("a.txt"), prior).await.unwrap();

		let data = b"remote content";
		let mut remote_vv = VersionVector::new();
		remote_vv.inc(peer(2));
		let remote_meta = FileMetadata::builder()
			.content_hash(crate::util::hash_binary(data))
			.size(data.len() as u64)
			.vv(remote_vv)
			.build();
		store
			.atomic_apply_remote(
				"g1",
				&root,
				Path::new("a.txt"),
				&FileState::Live(remote_meta),
				Some(data),
			)
			.await
			.unwrap();

		let on_disk = tokio::fs::read(root.join("a.txt")).await.unwrap();
		assert_eq!(on_disk, data);
		let stored = store.get("g1", Path::new("a.txt")).unwrap().unwrap();
		assert_eq!(stored.vv().get(peer(1)), 1);
		assert_eq!(stored.vv().get(peer(2)), 1);
	}

	#[tokio::test]
	async fn atomic_apply_remote_rejects_hash_mismatch_without_mutating_state() {
		let tmp = TempDir::new().unwrap();
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();

		let remote_meta = FileMetadata::builder()
			.content_hash([0xAB; 32])
			.vv(VersionVector::initial(peer(2)))
			.build();
		let result = store
			.atomic_apply_remote(
				"g1",
				&root,
				Path::new("a.txt"),
				&FileState::Live(remote_meta),
				Some(b"mismatched bytes"),
			)
			.await;
		assert!(matches!(result, Err(SyncError::HashMismatch { .. })));
		assert!(store.get("g1", Path::new("a.txt")).unwrap().is_none());
		assert!(!root.join("a.txt").exists());
	}

	#[tokio::test]
	async fn atomic_apply_remote_tombstone_removes_local_file() {
		let tmp = TempDir::new().unwrap();
		let root = tmp.path().join("root");
		tokio::fs::create_dir_all(&root).await.unwrap();
		tokio::fs::write(root.join("a.txt"), b"hi").await.unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		let meta = FileMetadata::builder().vv(VersionVector::initial(peer(1))).build();
		store.put_live("g1", Path::new("a.txt"), meta).await.unwrap();

		let ts = crate::model::Tombstone {
			deleted_at_unix_ms: 0,
			deleted_by: peer(2),
			vv: VersionVector::initial(peer(2)),
		};
		store
			.atomic_apply_remote("g1", &root, Path::new("a.txt"), &FileState::Tombstone(ts), None)
			.await
			.unwrap();
		assert!(!root.join("a.txt").exists());
		assert!(matches!(
			store.get("g1", Path::new("a.txt")).unwrap(),
			Some(FileState::Tombstone(_))
		));
	}

	#[tokio::test]
	async fn iter_reflects_all_stored_paths() {
		let tmp = TempDir::new().unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		store.put_live("g1", Path::new("a.txt"), FileMetadata::builder().build()).await.unwrap();
		store.put_live("g1", Path::new("b.txt"), FileMetadata::builder().build()).await.unwrap();
		let entries = store.iter("g1").unwrap();
		assert_eq!(entries.len(), 2);
	}

	#[tokio::test]
	async fn gc_tombstone_only_prunes_on_confirmation() {
		let tmp = TempDir::new().unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		let ts = crate::model::Tombstone {
			deleted_at_unix_ms: 0,
			deleted_by: peer(1),
			vv: VersionVector::initial(peer(1)),
		};
		store.put_tombstone("g1", Path::new("a.txt"), ts).await.unwrap();

		let unconfirming = crate::model::PeerSnapshot {
			sync_id: "g1".into(),
			states: std::collections::BTreeMap::new(),
		};
		assert!(!store.gc_tombstone("g1", Path::new("a.txt"), &unconfirming).unwrap());
		assert!(store.get("g1", Path::new("a.txt")).unwrap().is_some());

		let mut confirming_states = std::collections::BTreeMap::new();
		confirming_states.insert(
			PathBuf::from("a.txt"),
			FileState::Tombstone(crate::model::Tombstone {
				deleted_at_unix_ms: 0,
				deleted_by: peer(2),
				vv: VersionVector::initial(peer(2)),
			}),
		);
		let confirming =
			crate::model::PeerSnapshot { sync_id: "g1".into(), states: confirming_states };
		assert!(store.gc_tombstone("g1", Path::new("a.txt"), &confirming).unwrap());
		assert!(store.get("g1", Path::new("a.txt")).unwrap().is_none());
	}

	#[tokio::test]
	async fn last_reconciled_hash_round_trips() {
		let tmp = TempDir::new().unwrap();
		let store = Store::open(&tmp.path().join("db")).unwrap();
		assert!(store.last_reconciled_hash("g1", peer(1)).unwrap().is_none());
		store.set_last_reconciled_hash("g1", peer(1), [7; 32]).unwrap();
		assert_eq!(store.last_reconciled_hash("g1", peer(1)).unwrap(), Some([7; 32]));
	}
}
