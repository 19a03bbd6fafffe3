//! Core identifiers and the phase/accumulator vocabulary shared by every
//! other module in this crate.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use crate::capability::ClockOps;

/// Tag distinguishing the two replica groups being compared.
///
/// Carries no data beyond the tag itself; `blue_targets`/`pink_targets`
/// carry the actual target lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    Blue,
    Pink,
}

impl Colour {
    /// The opposing colour.
    #[must_use]
    pub fn other(self) -> Colour {
        match self {
            Colour::Blue => Colour::Pink,
            Colour::Pink => Colour::Blue,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colour::Blue => write!(f, "blue"),
            Colour::Pink => write!(f, "pink"),
        }
    }
}

/// Process-scoped, opaque identifier for one exchange.
///
/// Not persisted across restarts; drawn from a monotonic in-process
/// counter (see [`next_exchange_id`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exchange-{}", self.0)
    }
}

static NEXT_EXCHANGE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next process-scoped exchange identifier.
///
/// Exchange identifiers are never reused within a process and never
/// persisted; a restart is free to start the counter over.
#[must_use]
pub fn next_exchange_id() -> ExchangeId {
    ExchangeId(NEXT_EXCHANGE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Identifier for a branch of the hash tree (a fixed-size region, e.g. 1 KB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchId(u32);

impl BranchId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        u64::from(self.0)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch-{}", self.0)
    }
}

/// Index of a leaf within a branch, as produced by the hash-tree library's
/// dirty-segment finder.
pub type LeafIndex = u32;

/// Composite identifier for a tree leaf: `join(BranchId, LeafIndex)`.
///
/// Packs both halves into a single orderable `u64` so the [`crate::selector`]
/// window search can treat segment ids the same way it treats branch ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(u64);

impl SegmentId {
    #[must_use]
    pub fn join(branch: BranchId, leaf: LeafIndex) -> Self {
        Self((branch.as_u64() << 32) | u64::from(leaf))
    }

    #[must_use]
    pub fn branch(self) -> BranchId {
        BranchId::new((self.0 >> 32) as u32)
    }

    #[must_use]
    pub fn leaf(self) -> LeafIndex {
        self.0 as u32
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment({}, {})", self.branch(), self.leaf())
    }
}

/// The six driving phases plus the two terminals, in the exact order the
/// exchange moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    RootCompare,
    RootConfirm,
    BranchCompare,
    BranchConfirm,
    ClockCompare,
    Complete,
    TimedOut,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prepare => "prepare",
            Phase::RootCompare => "root_compare",
            Phase::RootConfirm => "root_confirm",
            Phase::BranchCompare => "branch_compare",
            Phase::BranchConfirm => "branch_confirm",
            Phase::ClockCompare => "clock_compare",
            Phase::Complete => "complete",
            Phase::TimedOut => "timed_out",
        };
        write!(f, "{name}")
    }
}

/// The phase-tagged accumulator: a root blob, a branch-id-keyed blob list,
/// or a clock list. Keeping this as a sum type (rather than three loose
/// `Option<_>` fields) pairs the merge function with the reply shape
/// statically, per the design note against stringly-typed messages.
#[derive(Debug, Clone)]
pub enum Acc<C: ClockOps> {
    Root(Bytes),
    Branches(Vec<(BranchId, Bytes)>),
    Clocks(Vec<C::KeyClock>),
}

impl<C: ClockOps> Acc<C> {
    /// The identity accumulator for the given phase's reply shape.
    #[must_use]
    pub fn initial_for(phase: Phase) -> Self {
        match phase {
            Phase::RootCompare | Phase::RootConfirm => Acc::Root(Bytes::new()),
            Phase::BranchCompare | Phase::BranchConfirm => Acc::Branches(Vec::new()),
            Phase::ClockCompare => Acc::Clocks(Vec::new()),
            Phase::Prepare | Phase::Complete | Phase::TimedOut => {
                unreachable!("{phase} never collects replies")
            }
        }
    }
}
