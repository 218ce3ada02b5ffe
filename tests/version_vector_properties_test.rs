//! Algebraic properties of the causal clock (spec §4.1 / P4): `merge` forms
//! a join semi-lattice and `cmp` is the partial order it induces.

use syncr::vv::{PeerId, VersionVector, VvOrder};

fn peer(b: u8) -> PeerId {
	let mut bytes = [0u8; 32];
	bytes[0] = b;
	PeerId::from_bytes(bytes)
}

#[test]
fn identical_vectors_compare_equal() {
	let mut a = VersionVector::new();
	a.inc(peer(1));
	a.inc(peer(2));
	let b = a.clone();
	assert_eq!(VersionVector::cmp(&a, &b), VvOrder::Equal);
}

#[test]
fn incrementing_moves_strictly_after() {
	let before = VersionVector::initial(peer(1));
	let mut after = before.clone();
	after.inc(peer(1));
	assert_eq!(VersionVector::cmp(&before, &after), VvOrder::Before);
	assert_eq!(VersionVector::cmp(&after, &before), VvOrder::After);
}

#[test]
fn independent_increments_are_concurrent() {
	let base = VersionVector::initial(peer(1));
	let mut a = base.clone();
	a.inc(peer(1));
	let mut b = base;
	b.inc(peer(2));
	assert_eq!(VersionVector::cmp(&a, &b), VvOrder::Concurrent);
	assert_eq!(VersionVector::cmp(&b, &a), VvOrder::Concurrent);
}

#[test]
fn merge_is_commutative() {
	let mut a = VersionVector::new();
	a.inc(peer(1));
	a.inc(peer(1));
	let mut b = VersionVector::new();
	b.inc(peer(2));

	assert_eq!(VersionVector::merge(&a, &b), VersionVector::merge(&b, &a));
}

#[test]
fn merge_is_idempotent() {
	let mut a = VersionVector::new();
	a.inc(peer(1));
	a.inc(peer(3));
	assert_eq!(VersionVector::merge(&a, &a), a);
}

#[test]
fn merge_dominates_both_inputs() {
	let mut a = VersionVector::new();
	a.inc(peer(1));
	a.inc(peer(1));
	let mut b = VersionVector::new();
	b.inc(peer(2));

	let merged = VersionVector::merge(&a, &b);
	assert_eq!(VersionVector::cmp(&a, &merged), VvOrder::Before);
	assert_eq!(VersionVector::cmp(&b, &merged), VvOrder::Before);
}

// P4: a sequence of local edits on a single device only ever moves a
// version vector Equal (no-op) or strictly Before its successor — it can
// never move After or Concurrent relative to its own prior state.
#[test]
fn sequential_local_increments_are_monotonic() {
	let mut vv = VersionVector::new();
	let self_peer = peer(7);
	let mut prior = vv.clone();
	for _ in 0..5 {
		prior = vv.clone();
		vv.inc(self_peer);
		let order = VersionVector::cmp(&prior, &vv);
		assert!(matches!(order, VvOrder::Equal | VvOrder::Before));
	}
}

#[test]
fn empty_vector_is_empty_and_before_any_increment() {
	let empty = VersionVector::new();
	assert!(empty.is_empty());
	let mut incremented = empty.clone();
	incremented.inc(peer(1));
	assert!(!incremented.is_empty());
	assert_eq!(VersionVector::cmp(&empty, &incremented), VvOrder::Before);
}
