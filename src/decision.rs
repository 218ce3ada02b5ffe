//! Pure reconciliation decision function (no I/O).

use crate::model::FileState;
use crate::vv::{VersionVector, VvOrder};

/// The outcome of comparing one path's local and remote state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
	Skip,
	Download,
	Upload,
	DeleteLocal,
	DeleteRemote,
	Conflict,
	Uncertain,
}

/// The numeric tie-break tolerances are part of the contract (spec §4.4);
/// defaults are the pinned values, not guesses.
#[derive(Clone, Copy, Debug)]
pub struct DecisionConfig {
	/// Below this gap, a VV-equal hash mismatch is treated as a race, not a conflict.
	pub equal_vv_tolerance_secs: f64,
	/// Above this gap, a newer mtime is taken as evidence of intentional action
	/// (resurrection / recreation) rather than noise.
	pub resurrection_tolerance_secs: f64,
}

impl Default for DecisionConfig {
	fn default() -> Self {
		DecisionConfig { equal_vv_tolerance_secs: 0.2, resurrection_tolerance_secs: 0.5 }
	}
}

fn secs_between(a_ms: i64, b_ms: i64) -> f64 {
	(a_ms - b_ms) as f64 / 1000.0
}

/// `decide(local, remote, path) -> Action`, per spec §4.4.
pub fn decide(local: Option<&FileState>, remote: Option<&FileState>, cfg: &DecisionConfig) -> Action {
	match (local, remote) {
		// 1. (None, None) -> Skip
		(None, None) => Action::Skip,

		// 2. Both tombstones -> Skip
		(Some(FileState::Tombstone(_)), Some(FileState::Tombstone(_))) => Action::Skip,

		// 3. local = Live, remote = None -> Uncertain
		(Some(FileState::Live(_)), None) => Action::Uncertain,

		// 4. local = None, remote = Live -> Download
		(None, Some(FileState::Live(_))) => Action::Download,

		// local = Tombstone, remote = None: the remote never mentioned this
		// path; nothing to reconcile against.
		(Some(FileState::Tombstone(_)), None) => Action::Skip,

		// 5. local = Tombstone(T), remote = Live(R)
		(Some(FileState::Tombstone(t)), Some(FileState::Live(r))) => {
			let gap = secs_between(r.mtime_unix_ms, t.deleted_at_unix_ms);
			match VersionVector::cmp(&t.vv, &r.vv) {
				VvOrder::After | VvOrder::Equal => {
					if gap > cfg.resurrection_tolerance_secs {
						Action::Conflict
					} else {
						Action::DeleteRemote
					}
				}
				VvOrder::Before => {
					if gap.abs() < cfg.equal_vv_tolerance_secs {
						Action::Conflict
					} else {
						Action::Download
					}
				}
				VvOrder::Concurrent => {
					if gap > cfg.resurrection_tolerance_secs {
						Action::Download
					} else {
						Action::Conflict
					}
				}
			}
		}

		// 6. local = Live(L), remote = Tombstone(T)
		(Some(FileState::Live(l)), Some(FileState::Tombstone(t))) => {
			if l.vv.is_empty() {
				return Action::Upload;
			}
			let gap = secs_between(l.mtime_unix_ms, t.deleted_at_unix_ms);
			match VersionVector::cmp(&t.vv, &l.vv) {
				VvOrder::After => {
					if gap > cfg.resurrection_tolerance_secs {
						Action::Conflict
					} else {
						Action::DeleteLocal
					}
				}
				VvOrder::Before => {
					if gap.abs() >= cfg.equal_vv_tolerance_secs {
						Action::Upload
					} else {
						Action::Conflict
					}
				}
				VvOrder::Equal => {
					if gap > cfg.equal_vv_tolerance_secs {
						Action::Upload
					} else {
						Action::DeleteLocal
					}
				}
				VvOrder::Concurrent => {
					if gap > cfg.resurrection_tolerance_secs {
						Action::Upload
					} else {
						Action::Conflict
					}
				}
			}
		}

		// 7 & 8. Both Live
		(Some(FileState::Live(l)), Some(FileState::Live(r))) => {
			if l.content_hash == r.content_hash {
				return Action::Skip;
			}
			if l.vv.is_empty() || r.vv.is_empty() {
				return Action::Uncertain;
			}
			match VersionVector::cmp(&l.vv, &r.vv) {
				VvOrder::Before => Action::Download,
				VvOrder::After => Action::Upload,
				VvOrder::Concurrent => Action::Conflict,
				VvOrder::Equal => {
					let gap = secs_between(l.mtime_unix_ms, r.mtime_unix_ms);
					if gap.abs() >= cfg.resurrection_tolerance_secs {
						if gap > 0.0 {
							Action::Upload
						} else {
							Action::Download
						}
					} else {
						Action::Conflict
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{FileMetadata, Tombstone};
	use crate::vv::PeerId;

	fn peer(b: u8) -> PeerId {
		let mut bytes = [0u8; 32];
		bytes[0] = b;
		PeerId(bytes)
	}

	fn live(vv: VersionVector, mtime: i64, hash: [u8; 32]) -> FileState {
		FileState::Live(FileMetadata { content_hash: hash, mtime_unix_ms: mtime, size: 1, vv, is_directory: false })
	}

	fn tomb(vv: VersionVector, deleted_at: i64, by: PeerId) -> FileState {
		FileState::Tombstone(Tombstone { deleted_at_unix_ms: deleted_at, deleted_by: by, vv })
	}

	#[test]
	fn both_none_skip() {
		assert_eq!(decide(None, None, &DecisionConfig::default()), Action::Skip);
	}

	#[test]
	fn both_tombstone_skip() {
		let vv = VersionVector::initial(peer(1));
		let t = tomb(vv.clone(), 0, peer(1));
		assert_eq!(decide(Some(&t), Some(&t), &DecisionConfig::default()), Action::Skip);
	}

	#[test]
	fn only_local_live_is_uncertain() {
		let l = live(VersionVector::initial(peer(1)), 0, [1; 32]);
		assert_eq!(decide(Some(&l), None, &DecisionConfig::default()), Action::Uncertain);
	}

	#[test]
	fn only_remote_live_downloads() {
		let r = live(VersionVector::initial(peer(1)), 0, [1; 32]);
		assert_eq!(decide(None, Some(&r), &DecisionConfig::default()), Action::Download);
	}

	// S3: delete survives offline peer. Local Tombstone VV{pA:2}, remote stale
	// Live VV{pA:1}: T.vv After R.vv, small mtime gap -> DeleteRemote.
	#[test]
	fn tombstone_after_stale_live_deletes_remote() {
		let mut t_vv = VersionVector::new();
		t_vv.inc(peer(1));
		t_vv.inc(peer(1));
		let r_vv = VersionVector::initial(peer(1));
		let local = tomb(t_vv, 0, peer(1));
		let remote = live(r_vv, 0, [1; 32]);
		let cfg = DecisionConfig::default();
		assert_eq!(decide(Some(&local), Some(&remote), &cfg), Action::DeleteRemote);
	}

	// S4: resurrection by explicit recreation.
	#[test]
	fn resurrection_concurrent_with_large_mtime_gap_downloads() {
		let mut t_vv = VersionVector::new();
		t_vv.inc(peer(1));
		t_vv.inc(peer(1));
		let mut r_vv = VersionVector::new();
		r_vv.inc(peer(1));
		r_vv.inc(peer(2));
		let local = tomb(t_vv, 0, peer(1));
		let remote = live(r_vv, 10_000, [2; 32]);
		let cfg = DecisionConfig::default();
		assert_eq!(VersionVector::cmp(local.vv(), remote.vv()), VvOrder::Concurrent);
		assert_eq!(decide(Some(&local), Some(&remote), &cfg), Action::Download);
	}

	#[test]
	fn resurrection_concurrent_with_small_mtime_gap_conflicts() {
		let mut t_vv = VersionVector::new();
		t_vv.inc(peer(1));
		t_vv.inc(peer(1));
		let mut r_vv = VersionVector::new();
		r_vv.inc(peer(1));
		r_vv.inc(peer(2));
		let local = tomb(t_vv, 0, peer(1));
		let remote = live(r_vv, 100, [2; 32]);
		let cfg = DecisionConfig::default();
		assert_eq!(decide(Some(&local), Some(&remote), &cfg), Action::Conflict);
	}

	#[test]
	fn local_live_empty_vv_never_silently_deleted() {
		let l = live(VersionVector::new(), 0, [1; 32]);
		let t = tomb(VersionVector::initial(peer(1)), 0, peer(1));
		assert_eq!(decide(Some(&l), Some(&t), &DecisionConfig::default()), Action::Upload);
	}

	#[test]
	fn both_live_equal_hash_skips() {
		let vv = VersionVector::initial(peer(1));
		let l = live(vv.clone(), 0, [9; 32]);
		let r = live(vv, 0, [9; 32]);
		assert_eq!(decide(Some(&l), Some(&r), &DecisionConfig::default()), Action::Skip);
	}

	// S5: VV-equal, hash-differ race, gap >= 0.5s -> newer wins, no conflict.
	#[test]
	fn vv_equal_hash_differ_large_gap_picks_newer() {
		let vv = VersionVector::initial(peer(1));
		let l = live(vv.clone(), 100_000, [1; 32]);
		let r = live(vv, 100_800, [2; 32]);
		assert_eq!(decide(Some(&l), Some(&r), &DecisionConfig::default()), Action::Download);
	}

	#[test]
	fn vv_equal_hash_differ_small_gap_conflicts() {
		let vv = VersionVector::initial(peer(1));
		let l = live(vv.clone(), 100_000, [1; 32]);
		let r = live(vv, 100_100, [2; 32]);
		assert_eq!(decide(Some(&l), Some(&r), &DecisionConfig::default()), Action::Conflict);
	}

	#[test]
	fn both_live_concurrent_conflicts() {
		let l = live(VersionVector::initial(peer(1)), 0, [1; 32]);
		let r = live(VersionVector::initial(peer(2)), 0, [2; 32]);
		assert_eq!(decide(Some(&l), Some(&r), &DecisionConfig::default()), Action::Conflict);
	}

	#[test]
	fn both_live_causal_order_picks_direction() {
		let mut before_vv = VersionVector::new();
		before_vv.inc(peer(1));
		let mut after_vv = before_vv.clone();
		after_vv.inc(peer(1));
		let l = live(before_vv, 0, [1; 32]);
		let r = live(after_vv, 0, [2; 32]);
		assert_eq!(decide(Some(&l), Some(&r), &DecisionConfig::default()), Action::Download);
	}
}
