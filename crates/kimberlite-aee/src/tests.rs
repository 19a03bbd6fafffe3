//! End-to-end integration tests driving the async shell (`crate::start` +
//! `agent::run`) rather than the pure `ExchangeState` transition function
//! directly — the scenarios from the protocol spec's testable-properties
//! section that require the dispatcher, the reply channel, and the
//! jittered-pause timers all wired together.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::oneshot;

use crate::capability::{PhaseReply, PhaseRequest, Preflist, ReplyHandle, SendCapability};
use crate::config::AeeConfig;
use crate::test_support::{FakeClockOps, FakeTreeOps, branch_with_dirty_leaf, fake_clock, root_with_dirty_slot};
use crate::types::{BranchId, Colour, Phase};

use bytes::Bytes;

/// One colour's full content, served synchronously from `send` — there is
/// no real transport in these tests, so "eventually delivers a reply" is
/// satisfied trivially and immediately.
struct Fixture {
    root: Bytes,
    branches: Vec<(BranchId, Bytes)>,
    clocks: Vec<(String, u64)>,
}

struct FixtureCapability {
    fixture: Arc<Fixture>,
}

impl SendCapability<FakeClockOps> for FixtureCapability {
    fn send(&self, msg: PhaseRequest, _preflist: &Preflist, colour: Colour, reply_to: ReplyHandle<FakeClockOps>) {
        let reply = match msg {
            PhaseRequest::FetchRoot => PhaseReply::Root(self.fixture.root.clone()),
            PhaseRequest::FetchBranches(ids) => PhaseReply::Branches(
                ids.iter()
                    .filter_map(|id| self.fixture.branches.iter().find(|(b, _)| b == id).cloned())
                    .collect(),
            ),
            PhaseRequest::FetchClocks(_ids) => PhaseReply::Clocks(self.fixture.clocks.clone()),
        };
        reply_to.reply(colour, reply);
    }
}

fn one_target_each(
    blue: Fixture,
    pink: Fixture,
) -> (Vec<crate::capability::Target<FakeClockOps>>, Vec<crate::capability::Target<FakeClockOps>>) {
    let blue_cap: Arc<dyn SendCapability<FakeClockOps>> = Arc::new(FixtureCapability { fixture: Arc::new(blue) });
    let pink_cap: Arc<dyn SendCapability<FakeClockOps>> = Arc::new(FixtureCapability { fixture: Arc::new(pink) });
    (vec![(blue_cap, vec![1])], vec![(pink_cap, vec![2])])
}

#[tokio::test(start_paused = true)]
async fn identical_content_terminates_at_root_compare_with_no_repair() {
    let (blue_targets, pink_targets) = one_target_each(
        Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
        Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    let (repair_tx, mut repair_rx) = oneshot::channel::<Vec<(String, u64)>>();

    crate::start(
        Arc::new(FakeTreeOps),
        Arc::new(FakeClockOps),
        AeeConfig::default(),
        blue_targets,
        pink_targets,
        move |repair_set| {
            let _ = repair_tx.send(repair_set);
        },
        move |terminal_phase| {
            let _ = reply_tx.send(terminal_phase);
        },
        StdRng::seed_from_u64(1),
    )
    .unwrap();

    let terminal = reply_rx.await.unwrap();
    assert_eq!(terminal, Phase::RootCompare);
    // repair_action must not have been invoked: the sender was dropped
    // without sending, so the receiver observes a closed channel.
    assert!(repair_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn agreeing_through_branch_confirm_but_differing_clocks_reaches_clock_compare() {
    let (blue_targets, pink_targets) = one_target_each(
        Fixture {
            root: root_with_dirty_slot(0),
            branches: vec![(BranchId::new(0), branch_with_dirty_leaf(3))],
            clocks: vec![fake_clock("only-on-blue", 1)],
        },
        Fixture { root: Bytes::new(), branches: vec![(BranchId::new(0), Bytes::new())], clocks: Vec::new() },
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    let (repair_tx, repair_rx) = oneshot::channel();

    crate::start(
        Arc::new(FakeTreeOps),
        Arc::new(FakeClockOps),
        AeeConfig::default(),
        blue_targets,
        pink_targets,
        move |repair_set: Vec<(String, u64)>| {
            let _ = repair_tx.send(repair_set);
        },
        move |terminal_phase| {
            let _ = reply_tx.send(terminal_phase);
        },
        StdRng::seed_from_u64(2),
    )
    .unwrap();

    let terminal = reply_rx.await.unwrap();
    assert_eq!(terminal, Phase::Complete);

    let repair_set = repair_rx.await.unwrap();
    assert_eq!(repair_set, vec![fake_clock("only-on-blue", 1)]);
}

#[tokio::test(start_paused = true)]
async fn a_stalled_colour_times_out_instead_of_hanging_forever() {
    struct NeverReplies;
    impl SendCapability<FakeClockOps> for NeverReplies {
        fn send(&self, _msg: PhaseRequest, _preflist: &Preflist, _colour: Colour, _reply_to: ReplyHandle<FakeClockOps>) {
            // Drops the reply on the floor, simulating a failed send capability.
        }
    }

    let blue_cap: Arc<dyn SendCapability<FakeClockOps>> = Arc::new(FixtureCapability {
        fixture: Arc::new(Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() }),
    });
    let pink_cap: Arc<dyn SendCapability<FakeClockOps>> = Arc::new(NeverReplies);

    let (reply_tx, reply_rx) = oneshot::channel();

    let mut cfg = AeeConfig::default();
    cfg.cache_timeout_ms = 50;

    crate::start(
        Arc::new(FakeTreeOps),
        Arc::new(FakeClockOps),
        cfg,
        vec![(blue_cap, vec![1])],
        vec![(pink_cap, vec![2])],
        |_repair_set: Vec<(String, u64)>| {},
        move |terminal_phase| {
            let _ = reply_tx.send(terminal_phase);
        },
        StdRng::seed_from_u64(3),
    )
    .unwrap();

    let terminal = tokio::time::timeout(Duration::from_secs(5), reply_rx).await.unwrap().unwrap();
    assert_eq!(terminal, Phase::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn reply_action_is_invoked_exactly_once() {
    let (blue_targets, pink_targets) = one_target_each(
        Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
        Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
    );

    let call_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counted = call_count.clone();
    let (done_tx, done_rx) = oneshot::channel();

    crate::start(
        Arc::new(FakeTreeOps),
        Arc::new(FakeClockOps),
        AeeConfig::default(),
        blue_targets,
        pink_targets,
        |_repair_set: Vec<(String, u64)>| {},
        move |_terminal_phase| {
            counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let _ = done_tx.send(());
        },
        StdRng::seed_from_u64(4),
    )
    .unwrap();

    done_rx.await.unwrap();
    assert_eq!(call_count.load(std::sync::atomic::Ordering::SeqCst), 1);
}
