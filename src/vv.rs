//! Version vectors: per-peer logical clocks encoding causal order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque stable identifier of a device. Equality and hashing only.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
	pub fn from_bytes(bytes: [u8; 32]) -> Self {
		PeerId(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}
}

impl fmt::Debug for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "PeerId({})", crate::util::hash_to_base64(&self.0))
	}
}

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", crate::util::hash_to_base64(&self.0))
	}
}

/// The four-valued partial order over version vectors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VvOrder {
	Equal,
	Before,
	After,
	Concurrent,
}

/// Per-peer logical clock. Keys with value 0 are indistinguishable from absent.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct VersionVector(BTreeMap<PeerId, u32>);

impl VersionVector {
	pub fn new() -> Self {
		VersionVector(BTreeMap::new())
	}

	/// A fresh vector with a single peer's counter at 1.
	pub fn initial(peer: PeerId) -> Self {
		let mut vv = VersionVector::new();
		vv.inc(peer);
		vv
	}

	pub fn is_empty(&self) -> bool {
		self.0.values().all(|&v| v == 0)
	}

	pub fn get(&self, peer: PeerId) -> u32 {
		self.0.get(&peer).copied().unwrap_or(0)
	}

	/// Raises `v[p]` by 1. Saturates at u32::MAX; overflow is a fatal bug
	/// and is reported via the `overflowed` flag on the return value rather
	/// than panicking, so callers can surface `storeCorruption`.
	pub fn inc(&mut self, peer: PeerId) -> bool {
		let entry = self.0.entry(peer).or_insert(0);
		match entry.checked_add(1) {
			Some(v) => {
				*entry = v;
				false
			}
			None => {
				tracing::error!(?peer, "version vector counter overflowed u32::MAX");
				true
			}
		}
	}

	/// Pointwise maximum.
	pub fn merge(a: &VersionVector, b: &VersionVector) -> VersionVector {
		let mut out = a.0.clone();
		for (peer, &v) in &b.0 {
			let entry = out.entry(*peer).or_insert(0);
			if v > *entry {
				*entry = v;
			}
		}
		VersionVector(out)
	}

	/// The four-valued partial order comparison.
	pub fn cmp(a: &VersionVector, b: &VersionVector) -> VvOrder {
		let mut a_less = false;
		let mut b_less = false;
		let peers = a.0.keys().chain(b.0.keys());
		for peer in peers {
			let av = a.get(*peer);
			let bv = b.get(*peer);
			if av < bv {
				a_less = true;
			} else if av > bv {
				b_less = true;
			}
		}
		match (a_less, b_less) {
			(false, false) => VvOrder::Equal,
			(true, false) => VvOrder::Before,
			(false, true) => VvOrder::After,
			(true, true) => VvOrder::Concurrent,
		}
	}

	/// Canonical serialization: sorted by peer id, zero entries omitted.
	pub fn canonical_entries(&self) -> Vec<(PeerId, u32)> {
		self.0.iter().filter(|(_, &v)| v != 0).map(|(&p, &v)| (p, v)).collect()
	}

	pub fn from_entries(entries: impl IntoIterator<Item = (PeerId, u32)>) -> Self {
		let mut map = BTreeMap::new();
		for (p, v) in entries {
			if v != 0 {
				map.insert(p, v);
			}
		}
		VersionVector(map)
	}
}
