//! Change journal (C4): a debounced, coalescing filesystem watcher built on
//! `notify`. Emits one `ChangeEvent` per settled path instead of the raw
//! flood notify produces, so the SyncSession only ever sees a quiesced view
//! of what changed.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::error::SyncError;

/// What happened to a path, relative to the SyncGroup root.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeKind {
	Created,
	Modified,
	Deleted,
	/// A rename is modeled as a delete of `from` plus a create of the event
	/// path (see DESIGN.md's Open Question resolution: the destination gets
	/// a fresh version vector rather than inheriting the source's history).
	Renamed { from: PathBuf },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
	pub path: PathBuf,
	pub kind: ChangeKind,
}

/// Debounce window bounds from spec §4.3: settle quickly on quiet paths, but
/// never hold a busy path's event back indefinitely.
#[derive(Clone, Copy, Debug)]
pub struct DebounceConfig {
	pub min_quiet: Duration,
	pub max_hold: Duration,
}

impl Default for DebounceConfig {
	fn default() -> Self {
		DebounceConfig { min_quiet: Duration::from_millis(500), max_hold: Duration::from_secs(3) }
	}
}

#[derive(Clone)]
struct Pending {
	event: ChangeEvent,
	first_seen: Instant,
	last_seen: Instant,
}

fn merge_kind(old: &ChangeKind, new: ChangeKind) -> ChangeKind {
	match (old, &new) {
		(ChangeKind::Created, ChangeKind::Modified) => ChangeKind::Created,
		(ChangeKind::Created, ChangeKind::Deleted) => ChangeKind::Deleted,
		(ChangeKind::Deleted, ChangeKind::Created) => ChangeKind::Modified,
		_ => new,
	}
}

/// `notify` reports absolute paths; the rest of the crate (the `Store`,
/// `Scanner`, and the wire protocol) addresses every path relative to the
/// SyncGroup root. Paths outside `root` (shouldn't happen for a recursive
/// watch rooted there, but `notify` makes no hard guarantee) are dropped.
fn relativize(root: &Path, p: &Path) -> Option<PathBuf> {
	p.strip_prefix(root).ok().map(|p| p.to_path_buf())
}

fn convert_event(root: &Path, event: &Event) -> Vec<ChangeEvent> {
	use notify::event::{ModifyKind, RenameMode};
	match &event.kind {
		EventKind::Create(_) => event
			.paths
			.iter()
			.filter_map(|p| Some(ChangeEvent { path: relativize(root, p)?, kind: ChangeKind::Created }))
			.collect(),
		EventKind::Remove(_) => event
			.paths
			.iter()
			.filter_map(|p| Some(ChangeEvent { path: relativize(root, p)?, kind: ChangeKind::Deleted }))
			.collect(),
		EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
			match (relativize(root, &event.paths[0]), relativize(root, &event.paths[1])) {
				(Some(from), Some(to)) => {
					vec![ChangeEvent { path: to, kind: ChangeKind::Renamed { from } }]
				}
				_ => Vec::new(),
			}
		}
		EventKind::Modify(_) => event
			.paths
			.iter()
			.filter_map(|p| Some(ChangeEvent { path: relativize(root, p)?, kind: ChangeKind::Modified }))
			.collect(),
		_ => Vec::new(),
	}
}

/// Watches a SyncGroup root for filesystem changes.
pub struct Journal {
	_watcher: RecommendedWatcher,
	receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Journal {
	/// Starts watching `root` recursively, emitting debounced, classified
	/// events. Individual notify errors are logged and skipped rather than
	/// aborting the watch (spec's per-file error policy for C4).
	pub fn watch(root: &Path, cfg: DebounceConfig) -> Result<Self, SyncError> {
		let (raw_tx, raw_rx) = mpsc::unbounded_channel();
		let (out_tx, out_rx) = mpsc::unbounded_channel();

		let tx = raw_tx.clone();
		let watch_root = root.to_path_buf();
		let mut watcher =
			notify::recommended_watcher(move |res: notify::Result<Event>| match res {
				Ok(event) => {
					for change in convert_event(&watch_root, &event) {
						let _ = tx.send(change);
					}
				}
				Err(e) => {
					tracing::warn!(error = %e, "journal watch error, skipping");
				}
			})
			.map_err(|e| SyncError::Other { message: format!("failed to create watcher: {}", e) })?;

		watcher
			.watch(root, RecursiveMode::Recursive)
			.map_err(|e| SyncError::Other { message: format!("failed to watch {}: {}", root.display(), e) })?;

		tokio::spawn(debounce_loop(raw_rx, out_tx, cfg));

		Ok(Journal { _watcher: watcher, receiver: out_rx })
	}

	pub async fn recv(&mut self) -> Option<ChangeEvent> {
		self.receiver.recv().await
	}
}

async fn debounce_loop(
	mut raw_rx: mpsc::UnboundedReceiver<ChangeEvent>,
	out_tx: mpsc::UnboundedSender<ChangeEvent>,
	cfg: DebounceConfig,
) {
	let pending: Arc<Mutex<HashMap<PathBuf, Pending>>> = Arc::new(Mutex::new(HashMap::new()));
	let flush_pending = Arc::clone(&pending);

	let flush_tx = out_tx.clone();
	tokio::spawn(async move {
		let mut ticker = interval(Duration::from_millis(100));
		loop {
			ticker.tick().await;
			let now = Instant::now();
			let mut ready = Vec::new();
			{
				let mut guard = flush_pending.lock().unwrap();
				guard.retain(|_, p| {
					let quiet_elapsed = now.duration_since(p.last_seen) >= cfg.min_quiet;
					let held_too_long = now.duration_since(p.first_seen) >= cfg.max_hold;
					if quiet_elapsed || held_too_long {
						ready.push(p.event.clone());
						false
					} else {
						true
					}
				});
			}
			for event in ready {
				if flush_tx.send(event).is_err() {
					return;
				}
			}
		}
	});

	while let Some(event) = raw_rx.recv().await {
		let now = Instant::now();
		let mut guard = pending.lock().unwrap();
		guard
			.entry(event.path.clone())
			.and_modify(|p| {
				p.event.kind = merge_kind(&p.event.kind, event.kind.clone());
				p.last_seen = now;
			})
			.or_insert(Pending { event: event.clone(), first_seen: now, last_seen: now });
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_created_then_modified_stays_created() {
		assert_eq!(merge_kind(&ChangeKind::Created, ChangeKind::Modified), ChangeKind::Created);
	}

	#[test]
	fn merge_created_then_deleted_becomes_deleted() {
		assert_eq!(merge_kind(&ChangeKind::Created, ChangeKind::Deleted), ChangeKind::Deleted);
	}

	#[test]
	fn merge_deleted_then_created_becomes_modified() {
		assert_eq!(merge_kind(&ChangeKind::Deleted, ChangeKind::Created), ChangeKind::Modified);
	}

	#[test]
	fn convert_create_event() {
		let root = Path::new("/root");
		let event = Event {
			kind: EventKind::Create(notify::event::CreateKind::File),
			paths: vec![PathBuf::from("/root/a.txt")],
			attrs: Default::default(),
		};
		let changes = convert_event(root, &event);
		assert_eq!(changes.len(), 1);
		assert_eq!(changes[0].path, PathBuf::from("a.txt"));
		assert_eq!(changes[0].kind, ChangeKind::Created);
	}

	#[test]
	fn convert_rename_both_event() {
		let root = Path::new("/root");
		let event = Event {
			kind: EventKind::Modify(notify::event::ModifyKind::Name(
				notify::event::RenameMode::Both,
			)),
			paths: vec![PathBuf::from("/root/old.txt"), PathBuf::from("/root/new.txt")],
			attrs: Default::default(),
		};
		let changes = convert_event(root, &event);
		assert_eq!(changes.len(), 1);
		assert_eq!(changes[0].path, PathBuf::from("new.txt"));
		assert_eq!(changes[0].kind, ChangeKind::Renamed { from: PathBuf::from("old.txt") });
	}

	#[test]
	fn convert_event_drops_paths_outside_root() {
		let root = Path::new("/root");
		let event = Event {
			kind: EventKind::Create(notify::event::CreateKind::File),
			paths: vec![PathBuf::from("/elsewhere/a.txt")],
			attrs: Default::default(),
		};
		assert!(convert_event(root, &event).is_empty());
	}

	#[tokio::test]
	async fn watch_detects_file_creation() {
		let tmp = tempfile::TempDir::new().unwrap();
		let mut journal = Journal::watch(tmp.path(), DebounceConfig::default()).unwrap();
		tokio::time::sleep(Duration::from_millis(100)).await;
		std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();

		let result = tokio::time::timeout(Duration::from_secs(5), journal.recv()).await;
		let event = result.expect("timed out waiting for event").expect("channel closed");
		assert!(event.path.ends_with("a.txt"));
	}
}
