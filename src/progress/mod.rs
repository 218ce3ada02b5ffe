//! Progress display for CLI sync (spec §7): a thin subscriber over
//! `Engine::subscribe()` that prints a throttled status line per event,
//! replacing the N-way phase/node-stats callback with a reporter over
//! `engine::SyncEvent`.

pub mod constants;

use std::io::Write;
use std::time::Instant;
use tracing::info;

use crate::engine::SyncEvent;
use crate::session::Direction;

pub use constants::*;

/// Throttles stderr writes to roughly once per 100ms so a flurry of
/// `PathSynced` events doesn't spam the terminal.
pub struct CliProgressReporter {
	last_write: Instant,
}

impl CliProgressReporter {
	pub fn new() -> Self {
		CliProgressReporter { last_write: Instant::now() }
	}

	/// Handles one event: always logs lifecycle events via `tracing`, and
	/// throttles the per-path stderr line.
	pub fn on_event(&mut self, event: &SyncEvent) {
		match event {
			SyncEvent::SyncStarted { peer, .. } => {
				info!(peer = %peer, "sync started");
			}
			SyncEvent::PathSynced { path, direction, bytes, .. } => {
				self.write_throttled(|| {
					format!(
						"  {} {} ({:.2} MB)",
						direction_arrow(*direction),
						path.display(),
						*bytes as f64 / BYTES_PER_MB
					)
				});
			}
			SyncEvent::PathDeleted { path, direction, .. } => {
				self.write_throttled(|| {
					format!("  {} delete {}", direction_arrow(*direction), path.display())
				});
			}
			SyncEvent::ConflictCreated { path, conflict_path, .. } => {
				info!(path = %path.display(), copy = %conflict_path.display(), "conflict preserved as copy");
			}
			SyncEvent::PathFailed { path, message, .. } => {
				info!(path = %path.display(), error = %message, "path sync failed");
			}
			SyncEvent::SyncCompleted { synced, conflicts, failures, .. } => {
				let _ = writeln!(std::io::stderr());
				info!(synced, conflicts, failures, "sync completed");
			}
			SyncEvent::SyncFailed { reason, .. } => {
				info!(reason = %reason, "sync failed");
			}
		}
	}

	fn write_throttled(&mut self, line: impl FnOnce() -> String) {
		if self.last_write.elapsed().as_millis() < 100 {
			return;
		}
		self.last_write = Instant::now();
		let _ = write!(std::io::stderr(), "\r{}", line());
		let _ = std::io::stderr().flush();
	}
}

impl Default for CliProgressReporter {
	fn default() -> Self {
		Self::new()
	}
}

fn direction_arrow(direction: Direction) -> &'static str {
	match direction {
		Direction::Upload => "->",
		Direction::Download => "<-",
	}
}

// vim: ts=4
