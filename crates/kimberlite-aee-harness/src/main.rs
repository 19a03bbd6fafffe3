//! Anti-entropy exchange smoke-test harness.
//!
//! Wires up two in-memory fake replica groups — "blue" and "pink" — behind
//! a synthetic hash tree and clock set, runs one exchange between them, and
//! prints the terminal phase and repair set. Useful for exercising
//! [`kimberlite_aee`] without a real cluster, the way `kimberlite-dev`
//! exercises the kernel/runtime without one.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use clap::{Parser, ValueEnum};
use kimberlite_aee::capability::{PhaseReply, PhaseRequest, Preflist, ReplyHandle, SendCapability};
use kimberlite_aee::config::AeeConfig;
use kimberlite_aee::test_support::{FakeClockOps, FakeTreeOps, branch_with_dirty_leaf, fake_clock, root_with_dirty_slot};
use kimberlite_aee::types::{BranchId, Colour};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::oneshot;
use tracing::Level;

#[derive(Parser)]
#[command(name = "aee-harness")]
#[command(about = "Runs one anti-entropy exchange against synthetic fixtures", long_about = None)]
struct Cli {
    /// Which synthetic fixture pair to reconcile.
    #[arg(long, value_enum, default_value = "diverging")]
    scenario: Scenario,

    /// Emit debug-level tracing instead of info-level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// Blue and pink hold identical content; the exchange should terminate
    /// at `RootCompare` with no repair set.
    Identical,
    /// Blue holds one key pink lacks, reachable only once the tree walk
    /// narrows all the way to `ClockCompare`.
    Diverging,
}

/// An in-memory replica's full content, as the fake hash tree/clock ops
/// would see it: a root blob, the branch blobs it decomposes into, and the
/// full clock list a `fetch_clocks` ultimately returns.
struct Fixture {
    root: Bytes,
    branches: Vec<(BranchId, Bytes)>,
    clocks: Vec<(String, u64)>,
}

/// A [`SendCapability`] serving one colour's fixture directly, in-task —
/// there is no real transport here, so replies are delivered synchronously
/// from inside `send`, which is a degenerate but valid case of "eventually".
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

fn fixtures_for(scenario: Scenario) -> (Fixture, Fixture) {
    match scenario {
        Scenario::Identical => (
            Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
            Fixture { root: Bytes::new(), branches: Vec::new(), clocks: Vec::new() },
        ),
        Scenario::Diverging => (
            Fixture {
                root: root_with_dirty_slot(0),
                branches: vec![(BranchId::new(0), branch_with_dirty_leaf(3))],
                clocks: vec![fake_clock("only-on-blue", 1)],
            },
            Fixture {
                root: Bytes::new(),
                branches: vec![(BranchId::new(0), Bytes::new())],
                clocks: Vec::new(),
            },
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let (blue_fixture, pink_fixture) = fixtures_for(cli.scenario);
    let blue_cap: Arc<dyn SendCapability<FakeClockOps>> =
        Arc::new(FixtureCapability { fixture: Arc::new(blue_fixture) });
    let pink_cap: Arc<dyn SendCapability<FakeClockOps>> =
        Arc::new(FixtureCapability { fixture: Arc::new(pink_fixture) });

    let blue_targets = vec![(blue_cap, vec![1_u64])];
    let pink_targets = vec![(pink_cap, vec![2_u64])];

    let (reply_tx, reply_rx) = oneshot::channel();
    let (repair_tx, repair_rx) = oneshot::channel();

    kimberlite_aee::start(
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
        StdRng::from_entropy(),
    )?;

    let terminal_phase = reply_rx.await?;
    println!("terminal phase: {terminal_phase}");

    if let Ok(repair_set) = repair_rx.await {
        println!("repair set ({} entries):", repair_set.len());
        for (key, clock) in repair_set {
            println!("  {key} @ {clock}");
        }
    } else {
        println!("repair action not invoked (converged before ClockCompare)");
    }

    Ok(())
}
