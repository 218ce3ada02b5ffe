//! # syncr-core — peer-to-peer directory synchronization engine
//!
//! Synchronizes the contents of one or more local directories across a set
//! of peer devices on a local network without any central server. Every
//! device holds a full copy of a shared directory (a "sync group"); any
//! device may create, modify, rename, or delete a file; all devices
//! converge to a single consistent state, and concurrent edits are
//! preserved as explicit conflict artifacts.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use syncr::engine::Engine;
//! use syncr::model::SyncMode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new();
//!     let handle = engine
//!         .add_group("./shared".into(), "my-group".into(), SyncMode::TwoWay, vec![])
//!         .await?;
//!     let stats = engine.get_stats(handle)?;
//!     println!("{} files tracked", stats.file_count);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(dead_code)]

pub mod chunk_tracker;
pub mod chunking;
pub mod config;
pub mod conflict;
pub mod decision;
pub mod delete;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod journal;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod node_labels;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod store;
pub mod strategies;
pub mod transport;
pub mod util;
pub mod utils;
pub mod validation;
pub mod vv;

// Re-export commonly used types and functions
pub use chunk_tracker::{ChunkTracker, ChunkTrackerError, TransferStatus};
pub use conflict::rules::{ConflictRule, ConflictRuleSet};
pub use conflict::{conflict_path, is_conflict_artifact};
pub use decision::{decide, Action, DecisionConfig};
pub use delete::{DeleteHandler, DeleteProtection};
pub use engine::{Engine, GroupHandle, GroupStats, SyncEvent};
pub use error::{ChunkError, SyncError, TransportError};
pub use exclusion::{ExclusionEngine, ExclusionError};
#[allow(unused_imports)]
pub use metadata::{
	MetadataComparison, MetadataError, MetadataReconciler, MetadataStrategy, NodeCapabilities,
	ReconciliationMode,
};
pub use model::{FileMetadata, FileState, PeerSnapshot, SyncGroup, SyncMode, Tombstone};
pub use strategies::DeleteMode;
pub use vv::{PeerId, VersionVector, VvOrder};

// vim: ts=4
