//! Merge & Compare Kernel: the three merge functions and the three compare
//! functions of §4.4. Every function here is pure and non-suspending — no
//! compute-bound step in this module ever awaits.

use bytes::Bytes;

use crate::capability::{ClockOps, TreeOps};
use crate::types::{BranchId, SegmentId};

/// Merges an incoming root blob into the accumulator. Merging with the
/// empty blob (the accumulator's initial value) is the identity; the
/// tree library's merge operator is associative and commutative, so
/// reply arrival order never affects the final blob.
pub fn merge_root(tree: &impl TreeOps, acc: &Bytes, incoming: &Bytes) -> Bytes {
    tree.merge_blob(acc, incoming)
}

/// Merges an incoming `(BranchId, Blob)` batch into the accumulator.
/// For each entry: if the accumulator has no entry for that `BranchId`,
/// append it; otherwise replace it with the merge of the two blobs.
/// Result order within the sequence is unspecified.
pub fn merge_branches(tree: &impl TreeOps, acc: &mut Vec<(BranchId, Bytes)>, incoming: Vec<(BranchId, Bytes)>) {
    for (branch, blob) in incoming {
        match acc.iter().position(|(id, _)| *id == branch) {
            Some(i) => acc[i].1 = tree.merge_blob(&acc[i].1, &blob),
            None => acc.push((branch, blob)),
        }
    }
}

/// Merges an incoming clock batch into the accumulator: the incoming batch
/// is deduplicated and sorted by the clock library's total order, then
/// folded into the (already sorted, unique) accumulator.
pub fn merge_clocks<C: ClockOps>(clocks: &C, acc: &mut Vec<C::KeyClock>, mut incoming: Vec<C::KeyClock>) {
    incoming.sort_by(|a, b| clocks.compare(a, b));
    incoming.dedup_by(|a, b| clocks.key_clock_eq(a, b));

    acc.extend(incoming);
    acc.sort_by(|a, b| clocks.compare(a, b));
    acc.dedup_by(|a, b| clocks.key_clock_eq(a, b));
}

/// Returns the `BranchId`s at which the two root blobs' segments differ,
/// as located by the hash-tree library's dirty-segment finder.
pub fn compare_roots(tree: &impl TreeOps, blue_root: &Bytes, pink_root: &Bytes) -> Vec<BranchId> {
    tree.compare_roots(blue_root, pink_root)
}

/// Returns the `SegmentId`s at which paired branch lists differ.
///
/// For each `BranchId` present in both lists, locates dirty segments
/// between the two blobs and joins each with the `BranchId`. A `BranchId`
/// present on only one side contributes nothing — both lists are reached
/// via the same redispatch, so this should not occur; if it does, the
/// phase still produces a well-defined (merely incomplete) result.
pub fn compare_branches(
    tree: &impl TreeOps,
    blue_branches: &[(BranchId, Bytes)],
    pink_branches: &[(BranchId, Bytes)],
) -> Vec<SegmentId> {
    let mut out = Vec::new();
    for (branch, blue_blob) in blue_branches {
        let Some((_, pink_blob)) = pink_branches.iter().find(|(id, _)| id == branch) else {
            continue;
        };
        for leaf in tree.dirty_segments(blue_blob, pink_blob) {
            out.push(tree.join_segment(*branch, leaf));
        }
    }
    out
}

/// Symmetric difference of two clock lists: entries present in blue but
/// not pink, merged with entries present in pink but not blue, producing a
/// sorted unique sequence. Equality is by complete tuple value.
pub fn compare_clocks<C: ClockOps>(
    clocks: &C,
    blue_clocks: &[C::KeyClock],
    pink_clocks: &[C::KeyClock],
) -> Vec<C::KeyClock> {
    let mut out: Vec<C::KeyClock> = blue_clocks
        .iter()
        .filter(|b| !pink_clocks.iter().any(|p| clocks.key_clock_eq(b, p)))
        .cloned()
        .collect();
    out.extend(
        pink_clocks
            .iter()
            .filter(|p| !blue_clocks.iter().any(|b| clocks.key_clock_eq(b, p)))
            .cloned(),
    );
    out.sort_by(|a, b| clocks.compare(a, b));
    out
}
