//! Capability interfaces for the engine's external collaborators: the
//! hash-tree library, the version-clock library, and the transport.
//!
//! None of these are implemented in this crate — per the engine's scope,
//! the hash-tree binary format and the clock representation are opaque and
//! owned elsewhere. Production and test code each supply their own small
//! implementation.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::AeeError;
use crate::types::{BranchId, Colour, LeafIndex, Phase, SegmentId};

/// The hash-tree operations the Merge & Compare kernel needs: merging two
/// node blobs, locating dirty segments, and joining a branch with a leaf
/// index into a [`SegmentId`]. Node blobs (root or branch) are treated as
/// opaque bytes; this crate never inspects their contents.
pub trait TreeOps: Send + Sync {
    /// Merges two node blobs (root-level or branch-level). Identity is the
    /// empty blob; the operator must be associative and commutative.
    fn merge_blob(&self, acc: &Bytes, incoming: &Bytes) -> Bytes;

    /// Returns the `BranchId`s at which two root blobs' segments differ.
    fn compare_roots(&self, blue_root: &Bytes, pink_root: &Bytes) -> Vec<BranchId>;

    /// Returns the leaf indices at which two same-branch blobs differ.
    fn dirty_segments(&self, blue_branch: &Bytes, pink_branch: &Bytes) -> Vec<LeafIndex>;

    /// Combines a branch id and a leaf index into a `SegmentId`.
    fn join_segment(&self, branch: BranchId, leaf: LeafIndex) -> SegmentId {
        SegmentId::join(branch, leaf)
    }
}

/// The version-clock operations the kernel needs: a total order (for
/// dedup/sort in the clock merge) and a tuple-equality test (for the
/// symmetric difference in `compare_clocks`). `KeyClock` is an opaque
/// `(key, version-clock)` pair whose representation is owned by the
/// external clock library.
pub trait ClockOps: Send + Sync {
    type KeyClock: Clone + Send + Sync + 'static;

    /// Total order used to sort and deduplicate clock lists.
    fn compare(&self, a: &Self::KeyClock, b: &Self::KeyClock) -> std::cmp::Ordering;

    /// Equality by complete tuple value, used by the symmetric difference.
    fn key_clock_eq(&self, a: &Self::KeyClock, b: &Self::KeyClock) -> bool {
        self.compare(a, b) == std::cmp::Ordering::Equal
    }
}

/// Opaque descriptor for one target within a preflist; the send capability
/// knows how to resolve it to an actual network destination.
pub type TargetDescriptor = u64;

/// Opaque list of target descriptors handed to a send capability.
pub type Preflist = Vec<TargetDescriptor>;

/// One of the three messages a phase can dispatch.
#[derive(Debug, Clone)]
pub enum PhaseRequest {
    FetchRoot,
    FetchBranches(Vec<BranchId>),
    FetchClocks(Vec<SegmentId>),
}

/// The reply payload a send capability eventually delivers, shaped to match
/// the request that produced it.
#[derive(Debug, Clone)]
pub enum PhaseReply<C: ClockOps> {
    Root(Bytes),
    Branches(Vec<(BranchId, Bytes)>),
    Clocks(Vec<C::KeyClock>),
}

impl<C: ClockOps> PhaseReply<C> {
    /// Name used in `MalformedReply` diagnostics.
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            PhaseReply::Root(_) => "root",
            PhaseReply::Branches(_) => "branches",
            PhaseReply::Clocks(_) => "clocks",
        }
    }

    /// Validates that this reply's shape matches what `phase` expects.
    pub(crate) fn validate_shape(&self, phase: Phase, colour: Colour) -> Result<(), AeeError> {
        let matches = matches!(
            (phase, self),
            (Phase::RootCompare | Phase::RootConfirm, PhaseReply::Root(_))
                | (
                    Phase::BranchCompare | Phase::BranchConfirm,
                    PhaseReply::Branches(_)
                )
                | (Phase::ClockCompare, PhaseReply::Clocks(_))
        );
        if matches {
            Ok(())
        } else {
            Err(AeeError::MalformedReply {
                phase,
                colour,
                got: self.shape_name(),
            })
        }
    }
}

/// Event fed into an exchange's pure transition function. Owning this as an
/// explicit enum (rather than a re-entrant wait loop) is what lets the FSM
/// be modeled as a `match (state, event)` with no re-entrancy hazards.
#[derive(Debug, Clone)]
pub enum ExchangeEvent<C: ClockOps> {
    /// A reply arrived from one colour's target set.
    Reply { colour: Colour, result: PhaseReply<C> },
    /// The current phase's collection deadline elapsed.
    Deadline,
    /// The inter-phase (or initial Prepare) jittered pause elapsed.
    Resume,
}

/// Handle a send capability uses to deliver a reply back to the exchange
/// that dispatched the request. Cloning is cheap; every target in a fan-out
/// gets its own clone.
#[derive(Clone)]
pub struct ReplyHandle<C: ClockOps> {
    tx: mpsc::UnboundedSender<ExchangeEvent<C>>,
}

impl<C: ClockOps> ReplyHandle<C> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ExchangeEvent<C>>) -> Self {
        Self { tx }
    }

    /// Delivers a reply. Silently dropped if the exchange has already
    /// terminated (the receiving end was closed) — late replies after
    /// termination are discarded by design.
    pub fn reply(&self, colour: Colour, result: PhaseReply<C>) {
        let _ = self.tx.send(ExchangeEvent::Reply { colour, result });
    }
}

/// A three-argument callable: deliver `msg` to the targets named by
/// `preflist`, eventually calling back on `reply_to` with the result.
/// Dispatch is expected to be non-blocking; a failure inside `send` is
/// invisible to the engine and manifests only as a phase deadline.
pub trait SendCapability<C: ClockOps>: Send + Sync {
    fn send(&self, msg: PhaseRequest, preflist: &Preflist, colour: Colour, reply_to: ReplyHandle<C>);
}

/// One `(send_capability, preflist)` pair from a target list.
pub type Target<C> = (Arc<dyn SendCapability<C>>, Preflist);
