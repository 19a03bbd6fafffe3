//! # kimberlite-aee: Anti-Entropy Exchange Engine
//!
//! Reconciles two logical replica groups ("blue" and "pink") of a
//! key-value dataset by comparing hashed summaries of their contents with
//! progressively finer granularity, down to the minimal set of keys whose
//! version clocks disagree.
//!
//! ## Architecture
//!
//! The engine is split the way [`kimberlite_vsr`]'s replica is: a pure
//! functional core plus a thin async shell.
//!
//! - [`exchange`]: the pure `ExchangeState` transition function — no IO,
//!   no suspension, tested directly as `(state, event) -> (state, actions)`.
//! - [`agent`]: the `tokio` actor shell that owns one exchange's reply
//!   channel and timers and carries out the actions the core emits.
//! - [`merge`]: the Merge & Compare Kernel (§4.4 of the protocol).
//! - [`selector`]: the ID Selector's intersect/narrow-to-window logic (§4.5).
//! - [`dispatcher`]: fans a phase request out to both colours' targets (§4.2).
//! - [`collector`]: per-colour reply accumulation and completion tracking (§4.3).
//! - [`capability`]: the trait boundary to the external hash-tree, clock,
//!   and transport collaborators this crate never implements itself.
//! - [`scheduler`]: the jittered inter-phase pause (§4.6).
//! - [`config`]: tunable timing/narrowing constants (§6).
//! - [`error`]: the small error taxonomy of contract violations (§7).
//!
//! ## Example
//!
//! ```ignore
//! use kimberlite_aee::{start, config::AeeConfig};
//!
//! let exchange_id = start(
//!     tree_ops, clock_ops, AeeConfig::default(),
//!     blue_targets, pink_targets,
//!     move |repair_set| { /* hand off to the repair action */ },
//!     move |terminal_phase| { /* record EX003 and move on */ },
//!     rand::thread_rng(),
//! )?;
//! ```

pub mod agent;
pub mod capability;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod exchange;
pub mod merge;
pub mod metrics;
pub mod scheduler;
pub mod selector;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;

pub use agent::{ReplyAction, RepairAction};
pub use capability::{ClockOps, SendCapability, Target, TreeOps};
pub use config::AeeConfig;
pub use error::{AeeError, Result};
pub use exchange::ExchangeState;
pub use types::{BranchId, Colour, ExchangeId, Phase, SegmentId};

/// Validates the target lists, allocates an exchange id, and spawns the
/// exchange's driving task on the current `tokio` runtime.
///
/// Returns immediately with the new exchange's id; the exchange itself
/// runs to completion on its own task, invoking `reply_action` exactly
/// once at termination and `repair_action` at most once, at the
/// `ClockCompare` exit.
///
/// # Errors
///
/// Returns [`AeeError::EmptyTargets`] if either target list is empty,
/// without spawning anything.
#[allow(clippy::too_many_arguments)]
pub fn start<T, C, R>(
    tree: Arc<T>,
    clocks: Arc<C>,
    cfg: AeeConfig,
    blue_targets: Vec<Target<C>>,
    pink_targets: Vec<Target<C>>,
    repair_action: impl RepairAction<C>,
    reply_action: impl ReplyAction,
    rng: R,
) -> Result<ExchangeId>
where
    T: TreeOps + 'static,
    C: ClockOps + 'static,
    R: Rng + Send + 'static,
{
    if blue_targets.is_empty() || pink_targets.is_empty() {
        return Err(AeeError::EmptyTargets);
    }

    let id = types::next_exchange_id();
    let blue_expected = u32::try_from(blue_targets.len()).unwrap_or(u32::MAX);
    let pink_expected = u32::try_from(pink_targets.len()).unwrap_or(u32::MAX);

    info!(
        exchange_id = %id,
        code = "EX001",
        blue_targets = blue_expected,
        pink_targets = pink_expected,
        "exchange started"
    );

    let state = ExchangeState::new(id, blue_expected, pink_expected);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(agent::run(
        state,
        tree,
        clocks,
        cfg,
        blue_targets,
        pink_targets,
        tx,
        rx,
        Box::new(repair_action),
        Box::new(reply_action),
        rng,
    ));

    Ok(id)
}
