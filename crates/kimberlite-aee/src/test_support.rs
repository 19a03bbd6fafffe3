//! Hand-written fakes for the external collaborators, used by every test
//! module in this crate. Kept as plain structs rather than a mocking
//! framework, following this workspace's VSR test style.

use bytes::Bytes;

use crate::capability::{ClockOps, TreeOps};
use crate::types::{BranchId, LeafIndex};

/// A root blob is an array of 4-byte "branch slots"; a branch blob is an
/// array of 1-byte "leaf slots". Real hash-tree libraries pack far more
/// into a node, but this is enough to exercise merge/compare semantics
/// deterministically in tests.
pub struct FakeTreeOps;

impl TreeOps for FakeTreeOps {
    fn merge_blob(&self, acc: &Bytes, incoming: &Bytes) -> Bytes {
        let len = acc.len().max(incoming.len());
        let mut out = vec![0u8; len];
        for i in 0..len {
            let a = acc.get(i).copied().unwrap_or(0);
            let b = incoming.get(i).copied().unwrap_or(0);
            out[i] = a ^ b;
        }
        Bytes::from(out)
    }

    fn compare_roots(&self, blue_root: &Bytes, pink_root: &Bytes) -> Vec<BranchId> {
        let slots = (blue_root.len().max(pink_root.len())).div_ceil(4);
        (0..slots)
            .filter(|&i| slot(blue_root, i) != slot(pink_root, i))
            .map(|i| BranchId::new(i as u32))
            .collect()
    }

    fn dirty_segments(&self, blue_branch: &Bytes, pink_branch: &Bytes) -> Vec<LeafIndex> {
        let len = blue_branch.len().max(pink_branch.len());
        (0..len)
            .filter(|&i| {
                blue_branch.get(i).copied().unwrap_or(0) != pink_branch.get(i).copied().unwrap_or(0)
            })
            .map(|i| i as u32)
            .collect()
    }
}

fn slot(blob: &Bytes, slot_index: usize) -> u32 {
    let start = slot_index * 4;
    let mut bytes = [0u8; 4];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = blob.get(start + i).copied().unwrap_or(0);
    }
    u32::from_be_bytes(bytes)
}

/// `KeyClock = (key, version)`, ordered lexicographically by key then
/// version, which is also complete-tuple equality.
pub struct FakeClockOps;

impl ClockOps for FakeClockOps {
    type KeyClock = (String, u64);

    fn compare(&self, a: &Self::KeyClock, b: &Self::KeyClock) -> std::cmp::Ordering {
        a.cmp(b)
    }
}

#[must_use]
pub fn fake_clock(key: &str, version: u64) -> (String, u64) {
    (key.to_string(), version)
}

/// Builds a root blob with a non-zero slot at `branch`, so
/// `compare_roots(root_with_dirty_slot(b), Bytes::new())` yields `[b]`.
#[must_use]
pub fn root_with_dirty_slot(branch: u32) -> Bytes {
    let mut out = vec![0u8; (branch as usize + 1) * 4];
    out[branch as usize * 4 + 3] = 1;
    Bytes::from(out)
}

/// Builds a branch blob with a non-zero byte at `leaf`, so
/// `dirty_segments(branch_with_dirty_leaf(l), Bytes::new())` yields `[l]`.
#[must_use]
pub fn branch_with_dirty_leaf(leaf: u32) -> Bytes {
    let mut out = vec![0u8; leaf as usize + 1];
    out[leaf as usize] = 1;
    Bytes::from(out)
}
