//! Engine (C1, spec §6.2): the surface embedders call. Generalizes
//! `sync.rs`'s top-level orchestration — one entry point that owns
//! configuration, state, and progress reporting — into an explicit
//! group/session/event API wiring Store, Scanner, Journal, SyncSession and
//! Transport together per SyncGroup, in the spirit of `progress/mod.rs`'s
//! callback-to-event translation.

use crate::conflict::{is_conflict_artifact, parse_conflict_entry, ConflictEntry};
use crate::decision::DecisionConfig;
use crate::delete::DeleteHandler;
use crate::error::SyncError;
use crate::exclusion::{ExcludeConfig, ExclusionEngine};
use crate::journal::{ChangeEvent, ChangeKind, DebounceConfig, Journal};
use crate::model::{FileMetadata, FileState, SyncGroup, SyncMode};
use crate::scanner::{self, HashCache};
use crate::session::{Direction, PathOutcome, SessionConfig, SyncSession};
use crate::store::Store;
use crate::transport::Transport;
use crate::vv::{PeerId, VersionVector};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, oneshot};

fn now_unix_ms() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Opaque handle returned by [`Engine::add_group`]. Stable for the lifetime
/// of the `Engine` process; not persisted across restarts (a restart
/// rediscovers groups from whatever the embedder re-adds).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GroupHandle(u64);

/// Lifecycle and per-path events a session round produces, for the
/// embedder's progress UI (spec §7's "session summary event").
#[derive(Clone, Debug)]
pub enum SyncEvent {
	SyncStarted { group: GroupHandle, peer: PeerId },
	PathSynced { group: GroupHandle, peer: PeerId, path: PathBuf, direction: Direction, bytes: u64 },
	PathDeleted { group: GroupHandle, peer: PeerId, path: PathBuf, direction: Direction },
	ConflictCreated { group: GroupHandle, peer: PeerId, path: PathBuf, conflict_path: PathBuf },
	PathFailed { group: GroupHandle, peer: PeerId, path: PathBuf, message: String },
	SyncCompleted { group: GroupHandle, peer: PeerId, synced: usize, conflicts: usize, failures: usize },
	SyncFailed { group: GroupHandle, peer: PeerId, reason: String },
}

/// Snapshot of one group's local state, for `get_stats`. `pending_*` reflect
/// the outcome counts of the most recent completed session against any
/// peer; they read zero until a session has run at least once.
#[derive(Clone, Debug, Default)]
pub struct GroupStats {
	pub file_count: usize,
	pub byte_count: u64,
	pub pending_uploads: usize,
	pub pending_downloads: usize,
}

struct StoreHashCache<'a> {
	store: &'a Store,
	sync_id: &'a str,
}

impl<'a> HashCache for StoreHashCache<'a> {
	fn cached_hash(&self, rel_path: &Path, mtime_unix_ms: i64, size: u64) -> Option<[u8; 32]> {
		match self.store.get(self.sync_id, rel_path).ok()?? {
			FileState::Live(meta) if meta.mtime_unix_ms == mtime_unix_ms && meta.size == size => {
				Some(meta.content_hash)
			}
			_ => None,
		}
	}
}

struct GroupState {
	group: SyncGroup,
	store: Arc<Store>,
	self_peer: PeerId,
	last_stats: Mutex<GroupStats>,
	transports: Mutex<HashMap<PeerId, Arc<dyn Transport>>>,
	/// Sends on this to stop the change journal's background task (and,
	/// with it, drop the `Journal`/`notify` watcher it owns). `None` if the
	/// journal failed to start or has already been stopped.
	journal_cancel: Mutex<Option<oneshot::Sender<()>>>,
}

/// Loads `<root>/.sync_state/peerid`, creating a fresh random identity on
/// first use (spec §6.4's local peer identity file).
async fn load_or_create_peer_id(state_dir: &Path) -> Result<PeerId, SyncError> {
	let path = state_dir.join("peerid");
	match tokio::fs::read(&path).await {
		Ok(bytes) if bytes.len() == 32 => {
			let mut arr = [0u8; 32];
			arr.copy_from_slice(&bytes);
			Ok(PeerId::from_bytes(arr))
		}
		_ => {
			let mut arr = [0u8; 32];
			arr[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
			arr[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
			tokio::fs::write(&path, arr).await.map_err(SyncError::Io)?;
			Ok(PeerId::from_bytes(arr))
		}
	}
}

/// Applies one debounced journal event to the store (spec §3.3/§4.3): a
/// created or modified regular file is re-hashed and its version vector
/// advanced for `self_peer`; a delete, or a path that vanished before we
/// got to it, becomes a tombstone; a rename is a delete of the source plus
/// a fresh-VV creation at the destination (see journal.rs's
/// `ChangeKind::Renamed` doc comment for why the destination doesn't
/// inherit the source's history).
async fn apply_change_event(
	store: &Store,
	root: &Path,
	sync_id: &str,
	exclusion: &ExclusionEngine,
	self_peer: PeerId,
	event: ChangeEvent,
) -> Result<(), SyncError> {
	if is_conflict_artifact(&event.path) || exclusion.should_exclude(&event.path, None) {
		return Ok(());
	}
	match event.kind {
		ChangeKind::Created | ChangeKind::Modified => {
			apply_created_or_modified(store, root, sync_id, self_peer, &event.path).await
		}
		ChangeKind::Deleted => {
			store.atomic_delete_local(sync_id, root, &event.path, self_peer, now_unix_ms()).await?;
			Ok(())
		}
		ChangeKind::Renamed { from } => {
			if !is_conflict_artifact(&from) && !exclusion.should_exclude(&from, None) {
				store.atomic_delete_local(sync_id, root, &from, self_peer, now_unix_ms()).await?;
			}
			let abs = root.join(&event.path);
			if let Ok(bytes) = tokio::fs::read(&abs).await {
				let meta = FileMetadata::builder()
					.content_hash(crate::util::hash_binary(&bytes))
					.mtime_unix_ms(now_unix_ms())
					.size(bytes.len() as u64)
					.vv(VersionVector::initial(self_peer))
					.build();
				store.put_live(sync_id, &event.path, meta).await?;
			}
			Ok(())
		}
	}
}

async fn apply_created_or_modified(
	store: &Store,
	root: &Path,
	sync_id: &str,
	self_peer: PeerId,
	rel_path: &Path,
) -> Result<(), SyncError> {
	let abs = root.join(rel_path);
	let metadata = match tokio::fs::symlink_metadata(&abs).await {
		Ok(m) => m,
		// Vanished between the debounced event firing and our processing it:
		// treat it as a delete rather than erroring the whole journal loop.
		Err(_) => {
			store.atomic_delete_local(sync_id, root, rel_path, self_peer, now_unix_ms()).await?;
			return Ok(());
		}
	};
	if !metadata.is_file() {
		return Ok(());
	}
	let bytes = tokio::fs::read(&abs).await.map_err(SyncError::Io)?;
	let mtime_unix_ms = metadata
		.modified()
		.map_err(SyncError::Io)?
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as i64;

	let prior_vv = store.get(sync_id, rel_path)?.map(|s| s.vv().clone()).unwrap_or_default();
	let mut vv = prior_vv;
	vv.inc(self_peer);

	let meta = FileMetadata::builder()
		.content_hash(crate::util::hash_binary(&bytes))
		.mtime_unix_ms(mtime_unix_ms)
		.size(bytes.len() as u64)
		.vv(vv)
		.build();
	store.put_live(sync_id, rel_path, meta).await
}

/// Seeds the store from an initial filesystem scan: every path the scanner
/// finds that is new, or whose (hash, mtime, size) disagrees with what's
/// stored, advances `self_peer`'s counter on top of whatever VV (Live or
/// Tombstone) was already on record for that path.
async fn seed_from_scan(
	store: &Store,
	root: &Path,
	sync_id: &str,
	exclusion: &ExclusionEngine,
	self_peer: PeerId,
) -> Result<(), SyncError> {
	let entries = {
		let cache = StoreHashCache { store, sync_id };
		scanner::scan(root, exclusion, &cache)?
	};
	for (rel_path, scanned) in entries {
		let prior = store.get(sync_id, &rel_path)?;
		let unchanged = matches!(
			&prior,
			Some(FileState::Live(meta))
				if meta.content_hash == scanned.content_hash
					&& meta.mtime_unix_ms == scanned.mtime_unix_ms
					&& meta.size == scanned.size
		);
		if unchanged {
			continue;
		}
		let mut vv = prior.as_ref().map(|s| s.vv().clone()).unwrap_or_default();
		vv.inc(self_peer);
		let meta = FileMetadata::builder()
			.content_hash(scanned.content_hash)
			.mtime_unix_ms(scanned.mtime_unix_ms)
			.size(scanned.size)
			.vv(vv)
			.build();
		store.put_live(sync_id, &rel_path, meta).await?;
	}
	Ok(())
}

/// Drains `journal` until cancelled or the watcher's channel closes,
/// applying every event to `store`. A single event's failure is logged and
/// skipped rather than ending the loop (spec's per-file error policy).
async fn journal_loop(
	mut journal: Journal,
	cancel: oneshot::Receiver<()>,
	store: Arc<Store>,
	root: PathBuf,
	sync_id: String,
	exclusion: Arc<ExclusionEngine>,
	self_peer: PeerId,
) {
	tokio::pin!(cancel);
	loop {
		tokio::select! {
			_ = &mut cancel => break,
			event = journal.recv() => {
				match event {
					Some(event) => {
						let path = event.path.clone();
						if let Err(e) =
							apply_change_event(&store, &root, &sync_id, &exclusion, self_peer, event).await
						{
							tracing::warn!(path = %path.display(), error = %e, "journal-driven store update failed, skipping");
						}
					}
					None => break,
				}
			}
		}
	}
}

/// Wires together the collaborators for every active SyncGroup and exposes
/// the embedder-facing operations: add/remove a group, trigger a session
/// against a reachable peer, list conflict artifacts, and read stats. Events
/// are published on a broadcast channel rather than via callback (spec §7).
pub struct Engine {
	groups: Mutex<HashMap<GroupHandle, Arc<GroupState>>>,
	in_flight: Arc<Mutex<HashSet<(GroupHandle, PeerId)>>>,
	next_handle: AtomicU64,
	events: broadcast::Sender<SyncEvent>,
	decision: DecisionConfig,
	delete: DeleteHandler,
}

impl Default for Engine {
	fn default() -> Self {
		Engine::new()
	}
}

impl Engine {
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(1024);
		Engine {
			groups: Mutex::new(HashMap::new()),
			in_flight: Arc::new(Mutex::new(HashSet::new())),
			next_handle: AtomicU64::new(1),
			events,
			decision: DecisionConfig::default(),
			delete: DeleteHandler::default(),
		}
	}

	/// Subscribes to the engine's event stream. Each subscriber gets its own
	/// lagging-tolerant receiver; events published before subscribing are
	/// not replayed.
	pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
		self.events.subscribe()
	}

	/// Registers `root` as a SyncGroup under `sync_id`, opening (or
	/// creating) its on-disk store at `<root>/.sync_state/db`, loading or
	/// minting its local peer identity, performing an initial scan to seed
	/// the store, and starting the change journal. Calling this twice for
	/// the same `root` opens a second independent store handle — callers
	/// should track handles themselves to avoid that.
	pub async fn add_group(
		&self,
		root: PathBuf,
		sync_id: String,
		mode: SyncMode,
		exclude_patterns: Vec<String>,
	) -> Result<GroupHandle, SyncError> {
		let state_dir = root.join(".sync_state");
		tokio::fs::create_dir_all(&state_dir).await.map_err(SyncError::Io)?;

		let self_peer = load_or_create_peer_id(&state_dir).await?;
		let store = Arc::new(Store::open(&state_dir.join("db"))?);
		let exclusion = Arc::new(
			ExclusionEngine::new(
				&ExcludeConfig { patterns: exclude_patterns.clone(), ..Default::default() },
				&root,
			)
			.map_err(|e| SyncError::InvalidConfig { message: e.to_string() })?,
		);

		seed_from_scan(&store, &root, &sync_id, &exclusion, self_peer).await?;

		let journal_cancel = match Journal::watch(&root, DebounceConfig::default()) {
			Ok(journal) => {
				let (cancel_tx, cancel_rx) = oneshot::channel();
				tokio::spawn(journal_loop(
					journal,
					cancel_rx,
					store.clone(),
					root.clone(),
					sync_id.clone(),
					exclusion.clone(),
					self_peer,
				));
				Some(cancel_tx)
			}
			Err(e) => {
				tracing::warn!(root = %root.display(), error = %e, "failed to start change journal, falling back to scan-only sync");
				None
			}
		};

		let group = SyncGroup { sync_id, root, exclude_patterns, mode };
		let handle = GroupHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
		let state = Arc::new(GroupState {
			group,
			store,
			self_peer,
			last_stats: Mutex::new(GroupStats::default()),
			transports: Mutex::new(HashMap::new()),
			journal_cancel: Mutex::new(journal_cancel),
		});

		self.groups.lock().unwrap().insert(handle, state);
		Ok(handle)
	}

	/// Removes a group: stops its change journal (if running) and drops its
	/// store handle. Does not touch any file on disk.
	pub fn remove_group(&self, handle: GroupHandle) -> Result<(), SyncError> {
		let state = self
			.groups
			.lock()
			.unwrap()
			.remove(&handle)
			.ok_or_else(|| SyncError::Other { message: "unknown sync group".into() })?;
		if let Some(cancel) = state.journal_cancel.lock().unwrap().take() {
			let _ = cancel.send(());
		}
		Ok(())
	}

	/// Registers (or replaces) the transport to use when reaching `peer`
	/// for `handle`'s sync group. Called once discovery (out of scope here)
	/// tells the embedder the peer is reachable and advertises this group's
	/// `sync_id`.
	pub fn connect_peer(
		&self,
		handle: GroupHandle,
		peer: PeerId,
		transport: Arc<dyn Transport>,
	) -> Result<(), SyncError> {
		let state = self.group_state(handle)?;
		state.transports.lock().unwrap().insert(peer, transport);
		Ok(())
	}

	fn group_state(&self, handle: GroupHandle) -> Result<Arc<GroupState>, SyncError> {
		self.groups
			.lock()
			.unwrap()
			.get(&handle)
			.cloned()
			.ok_or_else(|| SyncError::Other { message: "unknown sync group".into() })
	}

	/// Starts one reconciliation round against `peer`, idempotently: if a
	/// round against the same `(handle, peer)` is already running, this is
	/// a no-op (spec §6.2's "at most one pending session per (group, peer)").
	/// Runs to completion on a spawned task; progress is reported via
	/// [`Engine::subscribe`].
	pub fn trigger_sync(&self, handle: GroupHandle, peer: PeerId) -> Result<(), SyncError> {
		let state = self.group_state(handle)?;
		let transport = state
			.transports
			.lock()
			.unwrap()
			.get(&peer)
			.cloned()
			.ok_or_else(|| SyncError::PeerUnknown { peer: peer.to_string() })?;

		{
			let mut in_flight = self.in_flight.lock().unwrap();
			if !in_flight.insert((handle, peer)) {
				return Ok(());
			}
		}

		let events = self.events.clone();
		let decision = self.decision.clone();
		let delete = self.delete.clone();
		let in_flight = self.in_flight.clone();

		tokio::spawn(async move {
			let _guard = InFlightGuard { set: in_flight, key: (handle, peer) };
			let _ = events.send(SyncEvent::SyncStarted { group: handle, peer });

			let config = SessionConfig { decision, delete, mode: state.group.mode, yield_every: 64 };
			let mut session = SyncSession::new(
				state.store.clone(),
				state.group.root.clone(),
				state.group.sync_id.clone(),
				state.self_peer,
				peer,
				transport,
				config,
			);

			match session.run().await {
				Ok(summary) => {
					let (synced, conflicts, failures) =
						publish_outcomes(&events, handle, peer, &summary.outcomes);
					*state.last_stats.lock().unwrap() =
						GroupStats { pending_uploads: 0, pending_downloads: 0, ..Default::default() };
					let _ = events.send(SyncEvent::SyncCompleted {
						group: handle,
						peer,
						synced,
						conflicts,
						failures,
					});
				}
				Err(e) => {
					let _ = events.send(SyncEvent::SyncFailed { group: handle, peer, reason: e.to_string() });
				}
			}
		});

		Ok(())
	}

	/// Lists conflict-copy artifacts currently on disk under the group's
	/// root (spec §6.2's `list_conflicts`).
	pub fn list_conflicts(&self, handle: GroupHandle) -> Result<Vec<ConflictEntry>, SyncError> {
		let state = self.group_state(handle)?;
		let mut out = Vec::new();
		let walker = ignore::WalkBuilder::new(&state.group.root).hidden(false).git_ignore(false).build();
		for entry in walker {
			let entry = entry.map_err(|e| SyncError::Other { message: e.to_string() })?;
			let abs_path = entry.path();
			if abs_path == state.group.root {
				continue;
			}
			let rel_path = match abs_path.strip_prefix(&state.group.root) {
				Ok(p) => p,
				Err(_) => continue,
			};
			if let Some(parsed) = parse_conflict_entry(rel_path) {
				out.push(parsed);
			}
		}
		out.sort_by(|a, b| a.path.cmp(&b.path));
		Ok(out)
	}

	/// Reads current local stats for a group (spec §6.2's `get_stats`).
	pub fn get_stats(&self, handle: GroupHandle) -> Result<GroupStats, SyncError> {
		let state = self.group_state(handle)?;
		let entries = state.store.iter(&state.group.sync_id)?;
		let mut file_count = 0usize;
		let mut byte_count = 0u64;
		for (_, file_state) in &entries {
			if let FileState::Live(meta) = file_state {
				file_count += 1;
				byte_count += meta.size;
			}
		}
		let pending = state.last_stats.lock().unwrap().clone();
		Ok(GroupStats { file_count, byte_count, ..pending })
	}
}

fn publish_outcomes(
	events: &broadcast::Sender<SyncEvent>,
	group: GroupHandle,
	peer: PeerId,
	outcomes: &[PathOutcome],
) -> (usize, usize, usize) {
	let mut synced = 0usize;
	let mut conflicts = 0usize;
	let mut failures = 0usize;
	for outcome in outcomes {
		match outcome {
			PathOutcome::Synced { path, direction, bytes } => {
				synced += 1;
				let _ = events.send(SyncEvent::PathSynced {
					group,
					peer,
					path: path.clone(),
					direction: *direction,
					bytes: *bytes,
				});
			}
			PathOutcome::Deleted { path, direction } => {
				synced += 1;
				let _ = events.send(SyncEvent::PathDeleted {
					group,
					peer,
					path: path.clone(),
					direction: *direction,
				});
			}
			PathOutcome::Conflicted { path, conflict_path } => {
				conflicts += 1;
				let _ = events.send(SyncEvent::ConflictCreated {
					group,
					peer,
					path: path.clone(),
					conflict_path: conflict_path.clone(),
				});
			}
			PathOutcome::Failed { path, message } => {
				failures += 1;
				let _ = events.send(SyncEvent::PathFailed {
					group,
					peer,
					path: path.clone(),
					message: message.clone(),
				});
			}
		}
	}
	(synced, conflicts, failures)
}

struct InFlightGuard {
	set: Arc<Mutex<HashSet<(GroupHandle, PeerId)>>>,
	key: (GroupHandle, PeerId),
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.set.lock().unwrap().remove(&self.key);
	}
}
