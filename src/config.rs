#![allow(dead_code)]

//! Per-group synchronization configuration.
//!
//! Configuration follows a priority chain, highest wins:
//! 1. Built-in defaults ([`SyncGroupConfig::default`])
//! 2. Config file (`<syncr_dir>/config.toml`)
//! 3. Environment variables (`SYNCR_*` prefix)
//! 4. CLI flags
//!
//! [`Config`] is the on-disk/root document: it holds the daemon-wide state
//! directory plus the list of configured groups. [`SyncGroupConfig`] is the
//! per-group settings record consumed by [`crate::engine::Engine::add_group`]
//! and [`crate::session::SessionConfig`].

use crate::decision::DecisionConfig;
use crate::model::SyncMode;
use crate::strategies::DeleteMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-call transport timeout (§5): a single `get_states`/`get_file`/
/// `put_file`/`delete_files` round trip must complete within this window.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Whole-session timeout: an entire `SyncSession::run()` exchange between
/// two peers, covering every path, must complete within this window.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;

/// Settings for a single sync group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncGroupConfig {
	/// Stable identifier shared by every peer tracking this directory.
	pub sync_id: String,

	/// Local filesystem path of the synchronized directory.
	pub root: PathBuf,

	/// Direction of propagation relative to peers.
	pub mode: SyncMode,

	/// Glob patterns excluded from scanning and the change journal.
	pub exclude_patterns: Vec<String>,

	/// Honor `.gitignore`/`.syncignore` files found under `root`.
	pub respect_ignore_files: bool,

	/// How deletions are carried out locally when a peer's tombstone wins.
	pub delete_mode: DeleteMode,

	/// Window, in seconds, below which two Live versions with an otherwise
	/// concurrent version vector and differing hash are treated as the
	/// same edit rather than a conflict (§4.4 step 6).
	pub equal_vv_window_secs: f64,

	/// Window, in seconds, within which a fresher Live entry racing against
	/// an older Tombstone is treated as a resurrection rather than a
	/// delete-wins (§4.4 step 7).
	pub resurrection_window_secs: f64,

	/// Per-call transport timeout.
	#[serde(with = "duration_secs")]
	pub call_timeout: Duration,

	/// Whole-session transport timeout.
	#[serde(with = "duration_secs")]
	pub session_timeout: Duration,
}

impl Default for SyncGroupConfig {
	fn default() -> Self {
		SyncGroupConfig {
			sync_id: String::new(),
			root: PathBuf::new(),
			mode: SyncMode::default(),
			exclude_patterns: Vec::new(),
			respect_ignore_files: true,
			delete_mode: DeleteMode::Sync,
			equal_vv_window_secs: 0.2,
			resurrection_window_secs: 0.5,
			call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
			session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
		}
	}
}

impl SyncGroupConfig {
	pub fn new(sync_id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		SyncGroupConfig { sync_id: sync_id.into(), root: root.into(), ..Default::default() }
	}

	/// Builds the tolerance config consumed by the pure decision function.
	pub fn decision_config(&self) -> DecisionConfig {
		DecisionConfig {
			equal_vv_tolerance_secs: self.equal_vv_window_secs,
			resurrection_tolerance_secs: self.resurrection_window_secs,
		}
	}

	/// Overlays `SYNCR_*` environment variables onto this config.
	pub fn apply_env_overrides(&mut self) {
		if let Ok(v) = std::env::var("SYNCR_MODE") {
			if let Ok(mode) = v.parse::<SyncMode>() {
				self.mode = mode;
			}
		}
		if let Ok(v) = std::env::var("SYNCR_DELETE_MODE") {
			if let Ok(mode) = v.parse::<DeleteMode>() {
				self.delete_mode = mode;
			}
		}
		if let Ok(v) = std::env::var("SYNCR_RESPECT_IGNORE_FILES") {
			if let Ok(b) = v.parse::<bool>() {
				self.respect_ignore_files = b;
			}
		}
	}
}

impl std::str::FromStr for SyncMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"twoway" | "two-way" | "bidirectional" => Ok(SyncMode::TwoWay),
			"upload" | "upload-only" | "uploadonly" => Ok(SyncMode::UploadOnly),
			"download" | "download-only" | "downloadonly" => Ok(SyncMode::DownloadOnly),
			other => Err(format!("unknown sync mode: {}", other)),
		}
	}
}

mod duration_secs {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
		d.as_secs_f64().serialize(s)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
		let secs = f64::deserialize(d)?;
		Ok(Duration::from_secs_f64(secs))
	}
}

/// Daemon-wide configuration: the state directory plus every configured
/// sync group, loaded from `<syncr_dir>/config.toml` and overridable by
/// environment and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
	/// Directory holding the cross-group config file and peer identity.
	/// Per-group on-disk state (`<root>/.sync_state`) lives alongside each
	/// group's own root, not under `syncr_dir`.
	pub syncr_dir: PathBuf,

	/// Configured sync groups, keyed by `sync_id`.
	pub groups: Vec<SyncGroupConfig>,
}

impl Default for Config {
	fn default() -> Self {
		let syncr_dir = std::env::var("HOME")
			.map(|home| PathBuf::from(home).join(".syncr"))
			.unwrap_or_else(|_| PathBuf::from(".syncr"));
		Config { syncr_dir, groups: Vec::new() }
	}
}

impl Config {
	/// Path to the on-disk config file under `syncr_dir`.
	pub fn config_file_path(&self) -> PathBuf {
		self.syncr_dir.join("config.toml")
	}

	/// Loads config from disk, falling back to defaults if the file is
	/// absent, then overlays `SYNCR_*` environment variables.
	pub fn load(syncr_dir: &Path) -> Result<Self, crate::error::SyncError> {
		let path = syncr_dir.join("config.toml");
		let mut config = if path.exists() {
			let text = std::fs::read_to_string(&path)?;
			toml::from_str(&text).map_err(|e| crate::error::SyncError::StoreCorrupted {
				message: format!("invalid config.toml: {}", e),
			})?
		} else {
			Config { syncr_dir: syncr_dir.to_path_buf(), ..Default::default() }
		};
		config.syncr_dir = syncr_dir.to_path_buf();
		for group in &mut config.groups {
			group.apply_env_overrides();
		}
		Ok(config)
	}

	/// Writes the config to `<syncr_dir>/config.toml`, creating the
	/// directory if needed.
	pub fn save(&self) -> Result<(), crate::error::SyncError> {
		std::fs::create_dir_all(&self.syncr_dir)?;
		let text = toml::to_string_pretty(self).map_err(|e| crate::error::SyncError::StoreCorrupted {
			message: format!("failed to serialize config: {}", e),
		})?;
		std::fs::write(self.config_file_path(), text)?;
		Ok(())
	}

	pub fn group(&self, sync_id: &str) -> Option<&SyncGroupConfig> {
		self.groups.iter().find(|g| g.sync_id == sync_id)
	}

	pub fn group_mut(&mut self, sync_id: &str) -> Option<&mut SyncGroupConfig> {
		self.groups.iter_mut().find(|g| g.sync_id == sync_id)
	}

	pub fn upsert_group(&mut self, group: SyncGroupConfig) {
		if let Some(existing) = self.group_mut(&group.sync_id) {
			*existing = group;
		} else {
			self.groups.push(group);
		}
	}

	pub fn remove_group(&mut self, sync_id: &str) -> bool {
		let before = self.groups.len();
		self.groups.retain(|g| g.sync_id != sync_id);
		self.groups.len() != before
	}
}


// vim: ts=4
