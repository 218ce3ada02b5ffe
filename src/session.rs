//! Two-peer reconciliation (C6): drives one session round with exactly one
//! peer within one SyncGroup — the two-party analogue of the N-way state
//! machine and phase/callback machinery elsewhere in this crate, minus the
//! N-way/SSH plumbing, implementing the §4.5 procedure.

use crate::conflict::{conflict_path, is_conflict_artifact};
use crate::decision::{decide, Action, DecisionConfig};
use crate::delete::DeleteHandler;
use crate::error::SyncError;
use crate::model::{FileMetadata, FileState, PeerSnapshot, SyncMode};
use crate::store::Store;
use crate::transport::Transport;
use crate::vv::{PeerId, VersionVector};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session state machine (spec §4.5): `Idle -> Exchanging -> Reconciling ->
/// Applying -> Idle`. Cancelation from any state returns to `Idle`; every
/// action already applied is durable via the store, so nothing is rolled
/// back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	Exchanging,
	Reconciling,
	Applying,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Upload,
	Download,
}

/// What happened to one path this round. The session summary enumerates
/// one of these per path that had a non-Skip outcome (spec §7: "every path
/// outcome ... is enumerated in the session summary event").
#[derive(Clone, Debug, PartialEq)]
pub enum PathOutcome {
	Synced { path: PathBuf, direction: Direction, bytes: u64 },
	Deleted { path: PathBuf, direction: Direction },
	Conflicted { path: PathBuf, conflict_path: PathBuf },
	Failed { path: PathBuf, message: String },
}

impl PathOutcome {
	pub fn path(&self) -> &PathBuf {
		match self {
			PathOutcome::Synced { path, .. }
			| PathOutcome::Deleted { path, .. }
			| PathOutcome::Conflicted { path, .. }
			| PathOutcome::Failed { path, .. } => path,
		}
	}
}

/// Summary of one completed round. Idempotence (P3) means `outcomes` is
/// empty when nothing changed since the last session against this peer.
#[derive(Clone, Debug, Default)]
pub struct SessionSummary {
	pub outcomes: Vec<PathOutcome>,
}

impl SessionSummary {
	pub fn is_noop(&self) -> bool {
		self.outcomes.is_empty()
	}

	pub fn conflict_count(&self) -> usize {
		self.outcomes.iter().filter(|o| matches!(o, PathOutcome::Conflicted { .. })).count()
	}

	pub fn failure_count(&self) -> usize {
		self.outcomes.iter().filter(|o| matches!(o, PathOutcome::Failed { .. })).count()
	}
}

/// Tunables for one session. `decision` pins the §4.4 tolerances;
/// `yield_every` is the §5 cooperative-scheduling suspension interval.
#[derive(Clone)]
pub struct SessionConfig {
	pub decision: DecisionConfig,
	pub delete: DeleteHandler,
	pub mode: SyncMode,
	pub yield_every: usize,
}

impl Default for SessionConfig {
	fn default() -> Self {
		SessionConfig {
			decision: DecisionConfig::default(),
			delete: DeleteHandler::default(),
			mode: SyncMode::default(),
			yield_every: 64,
		}
	}
}

fn now_unix_ms() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Drives one reconciliation round with exactly one peer within one
/// SyncGroup (spec §4.5). Not `Send`-constrained beyond what `Transport`
/// already requires; the Engine owns one task per (peer, sync_id).
pub struct SyncSession<T: Transport> {
	store: Arc<Store>,
	root: PathBuf,
	sync_id: String,
	self_peer: PeerId,
	remote_peer: PeerId,
	transport: T,
	config: SessionConfig,
	state: SessionState,
}

impl<T: Transport> SyncSession<T> {
	pub fn new(
		store: Arc<Store>,
		root: PathBuf,
		sync_id: String,
		self_peer: PeerId,
		remote_peer: PeerId,
		transport: T,
		config: SessionConfig,
	) -> Self {
		SyncSession {
			store,
			root,
			sync_id,
			self_peer,
			remote_peer,
			transport,
			config,
			state: SessionState::Idle,
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Runs one full round: Exchange, Reconcile, Apply, back to Idle.
	pub async fn run(&mut self) -> Result<SessionSummary, SyncError> {
		self.state = SessionState::Exchanging;
		let remote_snapshot = self.transport.get_states(&self.sync_id).await?;

		let local_states: BTreeMap<PathBuf, FileState> = self
			.store
			.iter(&self.sync_id)?
			.into_iter()
			.filter(|(p, _)| !is_conflict_artifact(p))
			.collect();

		self.state = SessionState::Reconciling;
		let mut union: BTreeSet<PathBuf> = local_states.keys().cloned().collect();
		union.extend(remote_snapshot.states.keys().filter(|p| !is_conflict_artifact(p)).cloned());

		let mut plan: Vec<(PathBuf, Action)> = Vec::with_capacity(union.len());
		for path in &union {
			let ls = local_states.get(path);
			let rs = remote_snapshot.states.get(path);
			let action = self.gate_by_mode(self.resolve_action(ls, rs));
			if action != Action::Skip {
				plan.push((path.clone(), action));
			}
		}

		let delete_count =
			plan.iter().filter(|(_, a)| matches!(a, Action::DeleteLocal | Action::DeleteRemote)).count();
		let population = local_states.len().max(remote_snapshot.states.len()).max(1);
		if let Err(reason) = self.config.delete.check_delete_allowed(delete_count, population) {
			return Err(SyncError::Other { message: reason });
		}

		self.state = SessionState::Applying;
		let mut summary = SessionSummary::default();
		let mut applied = 0usize;

		// Conflict-split first, then Download, then Upload, then Deletes
		// (spec §4.5 step 4: minimizes visible intermediate states).
		for phase in [
			Action::Conflict,
			Action::Download,
			Action::Upload,
			Action::DeleteLocal,
			Action::DeleteRemote,
		] {
			for (path, action) in plan.iter().filter(|(_, a)| *a == phase) {
				let ls = local_states.get(path);
				let rs = remote_snapshot.states.get(path);
				let outcome = self.apply_one(path, *action, ls, rs).await;
				summary.outcomes.push(outcome);

				applied += 1;
				if applied % self.config.yield_every == 0 {
					tokio::task::yield_now().await;
				}
			}
		}

		// Confirmation-based tombstone GC (step 7): only for paths where
		// the peer we just talked to confirms the tombstone too.
		for path in &union {
			if let Some(FileState::Tombstone(_)) = self.store.get(&self.sync_id, path)? {
				let _ = self.store.gc_tombstone(&self.sync_id, path, &remote_snapshot);
			}
		}

		self.state = SessionState::Idle;
		Ok(summary)
	}

	/// Calls `decide` — which already implements the defensive
	/// tombstone-dominance rules with their resurrection-gap guards — then
	/// applies the session-level Uncertain disambiguation (step 3).
	fn resolve_action(&self, ls: Option<&FileState>, rs: Option<&FileState>) -> Action {
		let raw = decide(ls, rs, &self.config.decision);
		match raw {
			// Case 3: local-only Live. `rs` being None here means the peer
			// has no entry for this path at all, which by construction
			// cannot be a confirmed tombstone — so the "remote confirms a
			// tombstone" branch of step 3 is structurally unreachable and
			// this always resolves to Upload.
			Action::Uncertain if matches!(ls, Some(FileState::Live(_))) && rs.is_none() => {
				Action::Upload
			}
			// Both-Live, either VV empty: no causal history to trust either
			// way. Preserve both rather than silently picking a winner.
			Action::Uncertain => Action::Conflict,
			other => other,
		}
	}

	/// One-way groups never perform the action that would pull from, or
	/// push to, the disallowed direction.
	fn gate_by_mode(&self, action: Action) -> Action {
		match self.config.mode {
			SyncMode::TwoWay => action,
			SyncMode::UploadOnly => match action {
				Action::Download | Action::DeleteLocal => Action::Skip,
				Action::Conflict => Action::Upload,
				other => other,
			},
			SyncMode::DownloadOnly => match action {
				Action::Upload | Action::DeleteRemote => Action::Skip,
				Action::Conflict => Action::Download,
				other => other,
			},
		}
	}

	async fn apply_one(
		&self,
		path: &PathBuf,
		action: Action,
		ls: Option<&FileState>,
		rs: Option<&FileState>,
	) -> PathOutcome {
		let result = match action {
			Action::Conflict => self.apply_conflict(path, ls, rs).await,
			Action::Download => self.apply_download(path, rs).await,
			Action::Upload => self.apply_upload(path, ls).await,
			Action::DeleteLocal => self.apply_delete_local(path, rs).await,
			Action::DeleteRemote => self.apply_delete_remote(path).await,
			Action::Skip | Action::Uncertain => Ok(None),
		};
		match result {
			Ok(Some(outcome)) => outcome,
			Ok(None) => PathOutcome::Failed {
				path: path.clone(),
				message: "internal: applied action produced no outcome".into(),
			},
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "path application failed");
				PathOutcome::Failed { path: path.clone(), message: e.to_string() }
			}
		}
	}

	/// Step 5: write the foreign (remote) version to a conflict path owned
	/// by self with a fresh VV, then continue applying whichever side the
	/// policy chose — current policy keeps local's main path, so the
	/// continuation is Upload when local is Live, DeleteRemote when local
	/// is Tombstone.
	async fn apply_conflict(
		&self,
		path: &PathBuf,
		ls: Option<&FileState>,
		rs: Option<&FileState>,
	) -> Result<Option<PathOutcome>, SyncError> {
		let mut cp = None;
		if let Some(FileState::Live(r)) = rs {
			let bytes = self.transport.get_file(&self.sync_id, path).await?;
			let conflict_rel = conflict_path(path, self.self_peer, now_unix_ms());
			let meta = FileMetadata {
				content_hash: r.content_hash,
				mtime_unix_ms: r.mtime_unix_ms,
				size: r.size,
				vv: VersionVector::initial(self.self_peer),
				is_directory: false,
			};
			self.store
				.atomic_apply_remote(
					&self.sync_id,
					&self.root,
					&conflict_rel,
					&FileState::Live(meta),
					Some(&bytes),
				)
				.await?;
			cp = Some(conflict_rel);
		}

		match ls {
			Some(FileState::Live(_)) => {
				self.apply_upload(path, ls).await?;
			}
			_ => {
				self.apply_delete_remote(path).await?;
			}
		}

		Ok(cp.map(|conflict_path| PathOutcome::Conflicted { path: path.clone(), conflict_path }))
	}

	async fn apply_download(
		&self,
		path: &PathBuf,
		rs: Option<&FileState>,
	) -> Result<Option<PathOutcome>, SyncError> {
		let remote_state = rs.ok_or_else(|| SyncError::Other {
			message: "apply_download: remote has no state for path".into(),
		})?;
		match remote_state {
			FileState::Live(meta) => {
				let bytes = self.transport.get_file(&self.sync_id, path).await?;
				self.store
					.atomic_apply_remote(&self.sync_id, &self.root, path, remote_state, Some(&bytes))
					.await?;
				Ok(Some(PathOutcome::Synced {
					path: path.clone(),
					direction: Direction::Download,
					bytes: meta.size,
				}))
			}
			FileState::Tombstone(_) => {
				self.store.atomic_apply_remote(&self.sync_id, &self.root, path, remote_state, None).await?;
				Ok(Some(PathOutcome::Deleted { path: path.clone(), direction: Direction::Download }))
			}
		}
	}

	async fn apply_upload(
		&self,
		path: &PathBuf,
		ls: Option<&FileState>,
	) -> Result<Option<PathOutcome>, SyncError> {
		let meta = match ls {
			Some(FileState::Live(m)) => m,
			_ => {
				return Err(SyncError::Other {
					message: "apply_upload: local has no Live state for path".into(),
				})
			}
		};
		let abs = self.root.join(path);
		let bytes = tokio::fs::read(&abs).await.map_err(SyncError::Io)?;
		self.transport.put_file(&self.sync_id, path, &bytes).await?;
		Ok(Some(PathOutcome::Synced {
			path: path.clone(),
			direction: Direction::Upload,
			bytes: meta.size,
		}))
	}

	/// Tombstone propagation (step 6): adopt the remote's tombstone,
	/// removing the local file atomically and storing the merged VV.
	async fn apply_delete_local(
		&self,
		path: &PathBuf,
		rs: Option<&FileState>,
	) -> Result<Option<PathOutcome>, SyncError> {
		let remote_state = rs.ok_or_else(|| SyncError::Other {
			message: "apply_delete_local: remote has no tombstone for path".into(),
		})?;
		self.store.atomic_apply_remote(&self.sync_id, &self.root, path, remote_state, None).await?;
		Ok(Some(PathOutcome::Deleted { path: path.clone(), direction: Direction::Download }))
	}

	async fn apply_delete_remote(&self, path: &PathBuf) -> Result<Option<PathOutcome>, SyncError> {
		self.transport.delete_files(&self.sync_id, std::slice::from_ref(path)).await?;
		Ok(Some(PathOutcome::Deleted { path: path.clone(), direction: Direction::Upload }))
	}
}

/// Used by callers holding a full peer snapshot outside of a session run
/// (e.g. `Engine::list_conflicts` deciding whether a local tombstone is
/// now safe to prune against a cached snapshot).
pub fn confirms_tombstone(snapshot: &PeerSnapshot, path: &std::path::Path) -> bool {
	matches!(snapshot.states.get(path), Some(FileState::Tombstone(_)))
}


// vim: ts=4
