//! Conflict artifact path grammar and per-pattern resolution rules (C7).

pub mod rules;

pub use rules::{ConflictRule, ConflictRuleSet};

use crate::vv::PeerId;
use std::path::{Path, PathBuf};

/// A basename is a conflict artifact iff it contains the literal segment
/// `.conflict.`. Such paths are excluded from Scanner enumeration, from
/// journal-driven state updates, and from Session snapshots, preventing
/// recursive conflict explosion.
pub const CONFLICT_MARKER: &str = ".conflict.";

pub fn is_conflict_artifact(path: &Path) -> bool {
	path.file_name().and_then(|n| n.to_str()).map(|n| n.contains(CONFLICT_MARKER)).unwrap_or(false)
}

/// Builds `<stem>.conflict.<peer_id>.<unix_ms>.<ext>` for `path`.
pub fn conflict_path(path: &Path, peer: PeerId, unix_ms: i64) -> PathBuf {
	let parent = path.parent().unwrap_or_else(|| Path::new(""));
	let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
	let (stem, ext) = match file_name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
		_ => (file_name, None),
	};
	let mut name = format!("{}{}{}.{}", stem, CONFLICT_MARKER, peer, unix_ms);
	if let Some(ext) = ext {
		name.push('.');
		name.push_str(ext);
	}
	parent.join(name)
}

/// A conflict copy recognized by [`list_conflicts`] on an existing on-disk
/// path, parsed back out of the path grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictEntry {
	pub path: PathBuf,
	pub original_stem: String,
	pub peer_label: String,
	pub unix_ms: i64,
}

pub fn parse_conflict_entry(path: &Path) -> Option<ConflictEntry> {
	let file_name = path.file_name()?.to_str()?;
	let idx = file_name.find(CONFLICT_MARKER)?;
	let stem = &file_name[..idx];
	let rest = &file_name[idx + CONFLICT_MARKER.len()..];
	let mut parts = rest.splitn(3, '.');
	let peer_label = parts.next()?.to_string();
	let ts_str = parts.next()?;
	let unix_ms: i64 = ts_str.parse().ok()?;
	Some(ConflictEntry { path: path.to_path_buf(), original_stem: stem.to_string(), peer_label, unix_ms })
}
