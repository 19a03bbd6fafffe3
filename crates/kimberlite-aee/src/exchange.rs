//! Exchange FSM: the pure core of one exchange. Holds no IO and suspends on
//! nothing; `(state, event) -> (state, actions)` is a plain function, tested
//! directly without a reactor. Mirrors the split between `replica::state`
//! and `replica::mod`'s shell in this workspace's VSR implementation.

use std::time::Instant;

use bytes::Bytes;
use tracing::{error, info, warn};

use crate::capability::{ClockOps, ExchangeEvent, PhaseRequest, TreeOps};
use crate::collector::ReplyCollector;
use crate::config::AeeConfig;
use crate::merge;
use crate::selector;
use crate::types::{Acc, BranchId, ExchangeId, Phase, SegmentId};

/// What the FSM is doing right now.
#[derive(Debug, Clone)]
pub enum Lifecycle<C: ClockOps> {
    /// Waiting out the jittered pause before running `enter`'s logic.
    /// `finished` carries the just-completed collection forward across the
    /// pause (`None` only for the very first, pre-Prepare pause).
    Pausing {
        enter: Phase,
        finished: Option<ReplyCollector<C>>,
    },
    /// Waiting for both colours to reply to the current phase's request.
    Collecting(ReplyCollector<C>),
    /// Terminated. Further events are discarded.
    Done,
}

/// A side-effecting instruction for [`crate::agent`] to carry out. Kept as
/// data, rather than called directly, so `on_event` stays synchronous.
#[derive(Debug, Clone)]
pub enum Action<C: ClockOps> {
    /// Fan `request` out to both colours' target sets.
    Dispatch(PhaseRequest),
    /// Arm the jittered inter-phase pause; the shell owns the RNG and the
    /// base duration, so no parameters travel with this action.
    SchedulePause,
    /// Invoke the repair callback with the computed symmetric difference.
    Repair(Vec<C::KeyClock>),
    /// Invoke the reply callback with the terminal phase name and release
    /// this exchange's resources.
    Terminate(Phase),
}

/// Everything `on_event` produced for one event, in the order the shell
/// should carry them out.
#[derive(Debug, Clone)]
pub struct ExchangeOutput<C: ClockOps> {
    pub actions: Vec<Action<C>>,
}

impl<C: ClockOps> ExchangeOutput<C> {
    fn none() -> Self {
        Self { actions: Vec::new() }
    }

    fn one(action: Action<C>) -> Self {
        Self { actions: vec![action] }
    }

    fn two(a: Action<C>, b: Action<C>) -> Self {
        Self { actions: vec![a, b] }
    }
}

/// One exchange's full state: the current lifecycle plus the narrowing
/// deltas carried across the pause/redispatch boundaries at the root and
/// branch tiers.
#[derive(Debug, Clone)]
pub struct ExchangeState<C: ClockOps> {
    pub id: ExchangeId,
    blue_expected: u32,
    pink_expected: u32,
    lifecycle: Lifecycle<C>,
    root_compare_deltas: Vec<BranchId>,
    branch_ids_in_flight: Vec<BranchId>,
    branch_compare_deltas: Vec<SegmentId>,
}

impl<C: ClockOps> ExchangeState<C> {
    #[must_use]
    pub fn new(id: ExchangeId, blue_expected: u32, pink_expected: u32) -> Self {
        Self {
            id,
            blue_expected,
            pink_expected,
            lifecycle: Lifecycle::Pausing {
                enter: Phase::Prepare,
                finished: None,
            },
            root_compare_deltas: Vec::new(),
            branch_ids_in_flight: Vec::new(),
            branch_compare_deltas: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Done)
    }

    /// The phase currently being awaited, if any. The shell uses this to
    /// pick the collection deadline: the scan timeout for `ClockCompare`,
    /// the cache timeout otherwise.
    #[must_use]
    pub fn collecting_phase(&self) -> Option<Phase> {
        match &self.lifecycle {
            Lifecycle::Collecting(c) => Some(c.phase),
            _ => None,
        }
    }

    /// `(phase_start, missing_count)` of the current collection, if any —
    /// used by the shell to re-arm the deadline after a partial reply.
    #[must_use]
    pub fn collection_progress(&self) -> Option<(Instant, u32)> {
        match &self.lifecycle {
            Lifecycle::Collecting(c) => Some((c.phase_start, c.missing_count())),
            _ => None,
        }
    }

    /// Advances the state machine by one event.
    pub fn on_event<T: TreeOps>(
        &mut self,
        tree: &T,
        clocks: &C,
        cfg: &AeeConfig,
        event: ExchangeEvent<C>,
        now: Instant,
    ) -> ExchangeOutput<C> {
        let lifecycle = std::mem::replace(&mut self.lifecycle, Lifecycle::Done);
        let (next, output) = match (lifecycle, event) {
            (
                Lifecycle::Pausing { enter, finished },
                ExchangeEvent::Resume,
            ) => self.enter_phase(tree, clocks, cfg, enter, finished, now),

            (Lifecycle::Collecting(mut collector), ExchangeEvent::Reply { colour, result }) => {
                match collector.merge(tree, clocks, colour, result) {
                    Ok(()) => {
                        if collector.both_complete() {
                            let phase = collector.phase;
                            (
                                Lifecycle::Pausing {
                                    enter: phase,
                                    finished: Some(collector),
                                },
                                ExchangeOutput::one(Action::SchedulePause),
                            )
                        } else {
                            (Lifecycle::Collecting(collector), ExchangeOutput::none())
                        }
                    }
                    Err(err) => {
                        let phase = collector.phase;
                        error!(exchange_id = %self.id, phase = %phase, %err, "malformed reply, terminating exchange");
                        (Lifecycle::Done, ExchangeOutput::one(Action::Terminate(phase)))
                    }
                }
            }

            (Lifecycle::Collecting(collector), ExchangeEvent::Deadline) => {
                let missing = collector.missing_count();
                warn!(exchange_id = %self.id, code = "EX002", phase = %collector.phase, missing, "phase deadline elapsed");
                (
                    Lifecycle::Done,
                    ExchangeOutput::one(Action::Terminate(Phase::TimedOut)),
                )
            }

            // A reply or deadline that doesn't match a live collection (a
            // duplicate send, a timer that fired after termination) has
            // nothing to act on.
            (other, _) => (other, ExchangeOutput::none()),
        };
        self.lifecycle = next;
        output
    }

    fn enter_phase<T: TreeOps>(
        &mut self,
        tree: &T,
        clocks: &C,
        cfg: &AeeConfig,
        phase: Phase,
        finished: Option<ReplyCollector<C>>,
        now: Instant,
    ) -> (Lifecycle<C>, ExchangeOutput<C>) {
        match phase {
            Phase::Prepare => {
                let next = Lifecycle::Collecting(ReplyCollector::new(
                    Phase::RootCompare,
                    self.blue_expected,
                    self.pink_expected,
                    now,
                ));
                (next, ExchangeOutput::one(Action::Dispatch(PhaseRequest::FetchRoot)))
            }

            Phase::RootCompare => {
                let collector = finished.expect("RootCompare only entered after a completed root collection");
                let (blue_root, pink_root) = unpack_roots(collector);
                let branch_ids = merge::compare_roots(tree, &blue_root, &pink_root);
                if branch_ids.is_empty() {
                    self.terminate_normally(Phase::RootCompare)
                } else {
                    self.root_compare_deltas = branch_ids;
                    let next = Lifecycle::Collecting(ReplyCollector::new(
                        Phase::RootConfirm,
                        self.blue_expected,
                        self.pink_expected,
                        now,
                    ));
                    (next, ExchangeOutput::one(Action::Dispatch(PhaseRequest::FetchRoot)))
                }
            }

            Phase::RootConfirm => {
                let collector = finished.expect("RootConfirm only entered after a completed root collection");
                let (blue_root, pink_root) = unpack_roots(collector);
                let second = merge::compare_roots(tree, &blue_root, &pink_root);
                let narrowed = narrow_branch_ids(&self.root_compare_deltas, &second, cfg.max_branch_results);
                if narrowed.is_empty() {
                    self.terminate_normally(Phase::RootConfirm)
                } else {
                    self.branch_ids_in_flight = narrowed.clone();
                    let next = Lifecycle::Collecting(ReplyCollector::new(
                        Phase::BranchCompare,
                        self.blue_expected,
                        self.pink_expected,
                        now,
                    ));
                    (
                        next,
                        ExchangeOutput::one(Action::Dispatch(PhaseRequest::FetchBranches(narrowed))),
                    )
                }
            }

            Phase::BranchCompare => {
                let collector = finished.expect("BranchCompare only entered after a completed branch collection");
                let (blue_branches, pink_branches) = unpack_branches(collector);
                let segment_ids = merge::compare_branches(tree, &blue_branches, &pink_branches);
                if segment_ids.is_empty() {
                    self.terminate_normally(Phase::BranchCompare)
                } else {
                    self.branch_compare_deltas = segment_ids;
                    let next = Lifecycle::Collecting(ReplyCollector::new(
                        Phase::BranchConfirm,
                        self.blue_expected,
                        self.pink_expected,
                        now,
                    ));
                    (
                        next,
                        ExchangeOutput::one(Action::Dispatch(PhaseRequest::FetchBranches(
                            self.branch_ids_in_flight.clone(),
                        ))),
                    )
                }
            }

            Phase::BranchConfirm => {
                let collector = finished.expect("BranchConfirm only entered after a completed branch collection");
                let (blue_branches, pink_branches) = unpack_branches(collector);
                let second = merge::compare_branches(tree, &blue_branches, &pink_branches);
                let narrowed = narrow_segment_ids(&self.branch_compare_deltas, &second, cfg.max_clock_results);
                if narrowed.is_empty() {
                    self.terminate_normally(Phase::BranchConfirm)
                } else {
                    let next = Lifecycle::Collecting(ReplyCollector::new(
                        Phase::ClockCompare,
                        self.blue_expected,
                        self.pink_expected,
                        now,
                    ));
                    (
                        next,
                        ExchangeOutput::one(Action::Dispatch(PhaseRequest::FetchClocks(narrowed))),
                    )
                }
            }

            Phase::ClockCompare => {
                let collector = finished.expect("ClockCompare only entered after a completed clock collection");
                let (blue_clocks, pink_clocks) = unpack_clocks(collector);
                let repair_set = merge::compare_clocks(clocks, &blue_clocks, &pink_clocks);
                info!(exchange_id = %self.id, code = "EX004", repairs = repair_set.len(), "clock compare complete");
                info!(exchange_id = %self.id, code = "EX003", phase = %Phase::Complete, "exchange terminated");
                (
                    Lifecycle::Done,
                    ExchangeOutput::two(Action::Repair(repair_set), Action::Terminate(Phase::Complete)),
                )
            }

            Phase::Complete | Phase::TimedOut => {
                unreachable!("{phase} is a terminal name, never re-entered")
            }
        }
    }

    fn terminate_normally(&self, name: Phase) -> (Lifecycle<C>, ExchangeOutput<C>) {
        info!(exchange_id = %self.id, code = "EX003", phase = %name, "exchange terminated with empty delta");
        (Lifecycle::Done, ExchangeOutput::one(Action::Terminate(name)))
    }
}

fn unpack_roots<C: ClockOps>(collector: ReplyCollector<C>) -> (Bytes, Bytes) {
    let blue = match collector.blue_acc {
        Acc::Root(blob) => blob,
        _ => unreachable!("root-tier collector always holds Acc::Root"),
    };
    let pink = match collector.pink_acc {
        Acc::Root(blob) => blob,
        _ => unreachable!("root-tier collector always holds Acc::Root"),
    };
    (blue, pink)
}

fn unpack_branches<C: ClockOps>(collector: ReplyCollector<C>) -> (Vec<(BranchId, Bytes)>, Vec<(BranchId, Bytes)>) {
    let blue = match collector.blue_acc {
        Acc::Branches(list) => list,
        _ => unreachable!("branch-tier collector always holds Acc::Branches"),
    };
    let pink = match collector.pink_acc {
        Acc::Branches(list) => list,
        _ => unreachable!("branch-tier collector always holds Acc::Branches"),
    };
    (blue, pink)
}

fn unpack_clocks<C: ClockOps>(collector: ReplyCollector<C>) -> (Vec<C::KeyClock>, Vec<C::KeyClock>) {
    let blue = match collector.blue_acc {
        Acc::Clocks(list) => list,
        _ => unreachable!("clock-tier collector always holds Acc::Clocks"),
    };
    let pink = match collector.pink_acc {
        Acc::Clocks(list) => list,
        _ => unreachable!("clock-tier collector always holds Acc::Clocks"),
    };
    (blue, pink)
}

/// Intersects the two observations of a root-tier compare, sorts ascending,
/// and narrows to `max_n` via the ID Selector.
fn narrow_branch_ids(first: &[BranchId], second: &[BranchId], max_n: usize) -> Vec<BranchId> {
    let mut first_u64: Vec<u64> = first.iter().map(|b| b.as_u64()).collect();
    first_u64.sort_unstable();
    let mut second_u64: Vec<u64> = second.iter().map(|b| b.as_u64()).collect();
    second_u64.sort_unstable();
    let intersected = selector::intersect(&second_u64, &first_u64);
    selector::select(&intersected, max_n)
        .into_iter()
        .map(|v| BranchId::new(v as u32))
        .collect()
}

/// Same narrowing as [`narrow_branch_ids`] for the branch-tier SegmentId
/// observations.
fn narrow_segment_ids(first: &[SegmentId], second: &[SegmentId], max_n: usize) -> Vec<SegmentId> {
    let mut first_u64: Vec<u64> = first.iter().map(|s| s.as_u64()).collect();
    first_u64.sort_unstable();
    let mut second_u64: Vec<u64> = second.iter().map(|s| s.as_u64()).collect();
    second_u64.sort_unstable();
    let intersected = selector::intersect(&second_u64, &first_u64);
    selector::select(&intersected, max_n)
        .into_iter()
        .map(SegmentId::from_u64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PhaseReply;
    use crate::test_support::{
        FakeClockOps, FakeTreeOps, branch_with_dirty_leaf, fake_clock, root_with_dirty_slot,
    };
    use crate::types::Colour;

    fn state(blue_n: u32, pink_n: u32) -> ExchangeState<FakeClockOps> {
        ExchangeState::new(crate::types::next_exchange_id(), blue_n, pink_n)
    }

    fn resume<T: TreeOps>(
        s: &mut ExchangeState<FakeClockOps>,
        tree: &T,
        clocks: &FakeClockOps,
        cfg: &AeeConfig,
        now: Instant,
    ) -> ExchangeOutput<FakeClockOps> {
        s.on_event(tree, clocks, cfg, ExchangeEvent::Resume, now)
    }

    fn reply<T: TreeOps>(
        s: &mut ExchangeState<FakeClockOps>,
        tree: &T,
        clocks: &FakeClockOps,
        cfg: &AeeConfig,
        colour: Colour,
        result: PhaseReply<FakeClockOps>,
        now: Instant,
    ) -> ExchangeOutput<FakeClockOps> {
        s.on_event(tree, clocks, cfg, ExchangeEvent::Reply { colour, result }, now)
    }

    #[test]
    fn identical_roots_terminate_at_root_compare_with_no_redispatch() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(out.actions.as_slice(), [Action::Dispatch(PhaseRequest::FetchRoot)]));

        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(Bytes::new()), now);
        let out = reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        assert!(matches!(out.actions.as_slice(), [Action::SchedulePause]));

        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(out.actions.as_slice(), [Action::Terminate(Phase::RootCompare)]));
        assert!(s.is_done());
    }

    #[test]
    fn differing_roots_redispatch_and_reach_root_confirm() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        resume(&mut s, &tree, &clocks, &cfg, now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(root_with_dirty_slot(0)), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);

        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(out.actions.as_slice(), [Action::Dispatch(PhaseRequest::FetchRoot)]));
        assert_eq!(s.root_compare_deltas, vec![BranchId::new(0)]);
        assert_eq!(s.collecting_phase(), Some(Phase::RootConfirm));
    }

    #[test]
    fn root_confirm_intersection_empty_terminates() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        resume(&mut s, &tree, &clocks, &cfg, now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(root_with_dirty_slot(0)), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        resume(&mut s, &tree, &clocks, &cfg, now);

        // Second observation disagrees at a different branch: no overlap.
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(root_with_dirty_slot(1)), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(out.actions.as_slice(), [Action::Terminate(Phase::RootConfirm)]));
        assert!(s.is_done());
    }

    #[test]
    fn full_run_reaches_clock_compare_and_emits_repair() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        // Prepare -> RootCompare (first observation).
        resume(&mut s, &tree, &clocks, &cfg, now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(root_with_dirty_slot(0)), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        resume(&mut s, &tree, &clocks, &cfg, now);

        // RootConfirm: identical second observation confirms branch 0.
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(root_with_dirty_slot(0)), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(
            out.actions.as_slice(),
            [Action::Dispatch(PhaseRequest::FetchBranches(ids))] if ids == &[BranchId::new(0)]
        ));
        assert_eq!(s.collecting_phase(), Some(Phase::BranchCompare));

        // BranchCompare: blue's branch 0 has a dirty leaf.
        reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Blue,
            PhaseReply::Branches(vec![(BranchId::new(0), branch_with_dirty_leaf(3))]),
            now,
        );
        reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Pink,
            PhaseReply::Branches(vec![(BranchId::new(0), Bytes::new())]),
            now,
        );
        resume(&mut s, &tree, &clocks, &cfg, now);

        // BranchConfirm: identical second observation confirms leaf 3.
        reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Blue,
            PhaseReply::Branches(vec![(BranchId::new(0), branch_with_dirty_leaf(3))]),
            now,
        );
        reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Pink,
            PhaseReply::Branches(vec![(BranchId::new(0), Bytes::new())]),
            now,
        );
        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(out.actions.as_slice(), [Action::Dispatch(PhaseRequest::FetchClocks(_))]));
        assert_eq!(s.collecting_phase(), Some(Phase::ClockCompare));

        // ClockCompare: blue has a key pink lacks.
        reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Blue,
            PhaseReply::Clocks(vec![fake_clock("k", 1)]),
            now,
        );
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Clocks(vec![]), now);
        let out = resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(matches!(
            out.actions.as_slice(),
            [Action::Repair(repairs), Action::Terminate(Phase::Complete)] if repairs == &vec![fake_clock("k", 1)]
        ));
        assert!(s.is_done());
    }

    #[test]
    fn deadline_during_collection_times_out() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        resume(&mut s, &tree, &clocks, &cfg, now);
        let out = s.on_event(&tree, &clocks, &cfg, ExchangeEvent::Deadline, now);
        assert!(matches!(out.actions.as_slice(), [Action::Terminate(Phase::TimedOut)]));
        assert!(s.is_done());
    }

    #[test]
    fn malformed_reply_terminates_immediately_with_collecting_phase_name() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        resume(&mut s, &tree, &clocks, &cfg, now);
        let out = reply(
            &mut s,
            &tree,
            &clocks,
            &cfg,
            Colour::Blue,
            PhaseReply::Clocks(vec![fake_clock("k", 1)]),
            now,
        );
        assert!(matches!(out.actions.as_slice(), [Action::Terminate(Phase::RootCompare)]));
        assert!(s.is_done());
    }

    #[test]
    fn events_after_termination_are_discarded() {
        let tree = FakeTreeOps;
        let clocks = FakeClockOps;
        let cfg = AeeConfig::default();
        let now = Instant::now();
        let mut s = state(1, 1);

        resume(&mut s, &tree, &clocks, &cfg, now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(Bytes::new()), now);
        reply(&mut s, &tree, &clocks, &cfg, Colour::Pink, PhaseReply::Root(Bytes::new()), now);
        resume(&mut s, &tree, &clocks, &cfg, now);
        assert!(s.is_done());

        let out = reply(&mut s, &tree, &clocks, &cfg, Colour::Blue, PhaseReply::Root(Bytes::new()), now);
        assert!(out.actions.is_empty());
    }
}
