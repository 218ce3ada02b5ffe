//! Metadata handling and reconciliation
//!
//! Provides per-node capability detection and metadata reconciliation strategies
//! for handling asymmetric permissions across sync nodes.

mod capabilities;
mod reconciliation;
mod strategy;

pub use capabilities::NodeCapabilities;
#[allow(unused_imports)]
pub use reconciliation::{MetadataReconciler, ReconciliationMode};
pub use strategy::MetadataComparison;
// MetadataStrategy is now consolidated in crate::strategies module
#[allow(unused_imports)]
pub use crate::strategies::MetadataStrategy;

use std::error::Error;
use std::path::PathBuf;

/// POSIX metadata for one path, orthogonal to the authoritative
/// `{hash, mtime, size, vv, is_directory}` fields of [`crate::model::FileMetadata`].
/// This layer decides what *else* is safe to compare/reconcile across
/// heterogeneous peers; it never feeds the DecisionEngine.
#[derive(Debug, Clone, PartialEq)]
pub struct PosixMetadata {
	pub path: PathBuf,
	pub is_directory: bool,
	pub size: u64,
	pub mtime: i64,
	pub mode: u32,
	pub user: u32,
	pub group: u32,
}

impl PosixMetadata {
	pub fn builder(is_directory: bool, path: PathBuf) -> PosixMetadataBuilder {
		PosixMetadataBuilder {
			path,
			is_directory,
			size: 0,
			mtime: 0,
			mode: 0,
			user: 0,
			group: 0,
		}
	}
}

pub struct PosixMetadataBuilder {
	path: PathBuf,
	is_directory: bool,
	size: u64,
	mtime: i64,
	mode: u32,
	user: u32,
	group: u32,
}

impl PosixMetadataBuilder {
	pub fn mode(mut self, mode: u32) -> Self {
		self.mode = mode;
		self
	}

	pub fn user(mut self, user: u32) -> Self {
		self.user = user;
		self
	}

	pub fn group(mut self, group: u32) -> Self {
		self.group = group;
		self
	}

	pub fn ctime(self, _ctime: i64) -> Self {
		// ctime is not authoritative anywhere in this crate; accepted for
		// builder-call-site parity with mtime/size and otherwise ignored.
		self
	}

	pub fn mtime(mut self, mtime: i64) -> Self {
		self.mtime = mtime;
		self
	}

	pub fn size(mut self, size: u64) -> Self {
		self.size = size;
		self
	}

	pub fn build(self) -> PosixMetadata {
		PosixMetadata {
			path: self.path,
			is_directory: self.is_directory,
			size: self.size,
			mtime: self.mtime,
			mode: self.mode,
			user: self.user,
			group: self.group,
		}
	}
}

/// Errors that can occur during metadata operations
#[derive(Debug)]
#[allow(dead_code)]
pub enum MetadataError {
	/// Failed to detect capabilities
	DetectionFailed(String),

	/// Invalid reconciliation configuration
	InvalidConfig(String),

	/// Metadata conflict that cannot be auto-resolved
	ConflictUnresolvable(String),
}

impl std::fmt::Display for MetadataError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			MetadataError::DetectionFailed(msg) => {
				write!(f, "Capability detection failed: {}", msg)
			}
			MetadataError::InvalidConfig(msg) => {
				write!(f, "Invalid metadata configuration: {}", msg)
			}
			MetadataError::ConflictUnresolvable(msg) => {
				write!(f, "Unresolvable metadata conflict: {}", msg)
			}
		}
	}
}

impl Error for MetadataError {}

/// Compare metadata between two files considering reconciliation strategy
///
/// Returns true if the metadata differs in a way that matters according to the strategy.
#[allow(dead_code)]
pub fn metadata_differs(
	file1: &PosixMetadata,
	file2: &PosixMetadata,
	comparison: &MetadataComparison,
) -> bool {
	// Size always matters
	if file1.size != file2.size {
		return true;
	}

	// Type always matters
	if file1.is_directory != file2.is_directory {
		return true;
	}

	// Timestamp comparison (with tolerance)
	if comparison.compare_timestamps {
		let time_diff = if file1.mtime > file2.mtime {
			(file1.mtime - file2.mtime) as u64
		} else {
			(file2.mtime - file1.mtime) as u64
		};

		if time_diff > comparison.time_tolerance_secs {
			return true;
		}
	}

	// Permissions comparison
	if comparison.compare_permissions && file1.mode != file2.mode {
		return true;
	}

	// Ownership comparison
	if comparison.compare_owner && (file1.user != file2.user || file1.group != file2.group) {
		return true;
	}

	// Extended attributes comparison
	if comparison.compare_xattrs {
		// TODO: PosixMetadata doesn't carry xattrs yet.
	}

	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_metadata_differs_size() {
		let file1 = create_test_file();
		let mut file2 = create_test_file();

		file2.size = 999;

		let comparison = MetadataComparison::content_only();
		assert!(metadata_differs(&file1, &file2, &comparison));
	}

	#[test]
	fn test_metadata_differs_type() {
		let file1 = create_test_file();
		let mut file2 = create_test_file();

		file2.is_directory = true;

		let comparison = MetadataComparison::content_only();
		assert!(metadata_differs(&file1, &file2, &comparison));
	}

	#[test]
	fn test_metadata_differs_ownership_ignored() {
		let file1 = create_test_file();
		let mut file2 = create_test_file();

		file2.user = 999;
		file2.group = 999;

		// Content-only mode ignores ownership
		let comparison = MetadataComparison::content_only();
		assert!(!metadata_differs(&file1, &file2, &comparison));

		// Strict mode compares ownership
		let comparison = MetadataComparison::strict();
		assert!(metadata_differs(&file1, &file2, &comparison));
	}

	#[test]
	fn test_metadata_differs_permissions() {
		let file1 = create_test_file();
		let mut file2 = create_test_file();

		file2.mode = 0o644;

		// Relaxed mode ignores permissions
		let comparison = MetadataComparison::relaxed();
		assert!(!metadata_differs(&file1, &file2, &comparison));

		// Strict mode compares permissions
		let comparison = MetadataComparison::strict();
		assert!(metadata_differs(&file1, &file2, &comparison));
	}

	#[test]
	fn test_metadata_differs_time_tolerance() {
		let mut file1 = create_test_file();
		let mut file2 = create_test_file();

		file1.mtime = 1000;
		file2.mtime = 1001; // 1 second difference

		// Smart mode has 1-second tolerance
		let comparison = MetadataComparison::smart();
		assert!(!metadata_differs(&file1, &file2, &comparison));

		// Strict mode has 0-second tolerance
		let comparison = MetadataComparison::strict();
		assert!(metadata_differs(&file1, &file2, &comparison));
	}

	fn create_test_file() -> PosixMetadata {
		use std::path::PathBuf;

		PosixMetadata::builder(false, PathBuf::from("test.txt"))
			.mode(0o755)
			.user(1000)
			.group(1000)
			.ctime(1000)
			.mtime(1000)
			.size(100)
			.build()
	}
}
