//! Async actor shell: owns one exchange's reply channel and timers, drives
//! the pure [`ExchangeState`] transition function, and carries out the
//! actions it produces (dispatching requests, invoking the outbound
//! callbacks). Modeled on the `tokio::select!` loop in
//! `kimberlite_cluster::supervisor::ClusterSupervisor::monitor_loop`, scoped
//! to a single exchange instead of a whole cluster.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant as TokioInstant;
use tracing::debug;

use crate::capability::{ClockOps, ExchangeEvent, Target, TreeOps};
use crate::config::AeeConfig;
use crate::dispatcher;
use crate::exchange::{Action, ExchangeState};
use crate::metrics::METRICS;
use crate::scheduler;
use crate::types::Phase;

/// Invoked exactly once, when the exchange terminates, with the final
/// phase name.
pub trait ReplyAction: Send + 'static {
    fn call(self: Box<Self>, terminal_phase: Phase);
}

impl<F: FnOnce(Phase) + Send + 'static> ReplyAction for F {
    fn call(self: Box<Self>, terminal_phase: Phase) {
        (*self)(terminal_phase)
    }
}

/// Invoked at most once, at the `ClockCompare` exit, with the computed
/// repair set (which may be empty).
pub trait RepairAction<C: ClockOps>: Send + 'static {
    fn call(self: Box<Self>, repair_set: Vec<C::KeyClock>);
}

impl<C, F> RepairAction<C> for F
where
    C: ClockOps,
    F: FnOnce(Vec<C::KeyClock>) + Send + 'static,
{
    fn call(self: Box<Self>, repair_set: Vec<C::KeyClock>) {
        (*self)(repair_set)
    }
}

fn to_tokio_instant(std_instant: std::time::Instant) -> TokioInstant {
    TokioInstant::from_std(std_instant)
}

fn jittered_deadline(cfg: &AeeConfig, rng: &mut impl Rng) -> TokioInstant {
    TokioInstant::now() + scheduler::jittered_pause(cfg.transition_pause_ms, rng)
}

/// Runs one exchange to completion on the current task.
///
/// `reply_tx`/`reply_rx` are the two ends of the channel every dispatched
/// target's [`crate::capability::ReplyHandle`] is built from; the caller
/// creates the pair once and hands both halves here.
#[allow(clippy::too_many_arguments)]
pub async fn run<T, C, R>(
    mut state: ExchangeState<C>,
    tree: Arc<T>,
    clocks: Arc<C>,
    cfg: AeeConfig,
    blue_targets: Vec<Target<C>>,
    pink_targets: Vec<Target<C>>,
    reply_tx: mpsc::UnboundedSender<ExchangeEvent<C>>,
    mut reply_rx: mpsc::UnboundedReceiver<ExchangeEvent<C>>,
    repair_action: Box<dyn RepairAction<C>>,
    reply_action: Box<dyn ReplyAction>,
    mut rng: R,
) where
    T: TreeOps,
    C: ClockOps,
    R: Rng + Send + 'static,
{
    METRICS.record_started();

    let mut repair_action = Some(repair_action);
    let mut reply_action = Some(reply_action);
    let mut pause_deadline = Some(jittered_deadline(&cfg, &mut rng));

    while !state.is_done() {
        let wake = if let Some((phase_start, _)) = state.collection_progress() {
            let budget = match state.collecting_phase() {
                Some(Phase::ClockCompare) => cfg.scan_timeout(),
                _ => cfg.cache_timeout(),
            };
            (to_tokio_instant(phase_start) + budget, ExchangeEvent::Deadline)
        } else {
            (
                pause_deadline.expect("a Pausing exchange always has a pause deadline armed"),
                ExchangeEvent::Resume,
            )
        };
        let (wake_at, wake_event) = wake;

        let event = tokio::select! {
            biased;

            () = tokio::time::sleep_until(wake_at) => wake_event,

            Some(ev) = reply_rx.recv() => ev,
        };

        let now = std::time::Instant::now();
        let output = state.on_event(tree.as_ref(), clocks.as_ref(), &cfg, event, now);

        for action in output.actions {
            match action {
                Action::Dispatch(request) => {
                    debug!(exchange_id = %state.id, ?request, "dispatching");
                    dispatcher::dispatch(&request, &blue_targets, &pink_targets, &reply_tx);
                }
                Action::SchedulePause => {
                    pause_deadline = Some(jittered_deadline(&cfg, &mut rng));
                }
                Action::Repair(repair_set) => {
                    METRICS.record_repairs(repair_set.len() as u64);
                    if let Some(callback) = repair_action.take() {
                        callback.call(repair_set);
                    }
                }
                Action::Terminate(terminal_phase) => {
                    METRICS.record_terminal(terminal_phase);
                    if let Some(callback) = reply_action.take() {
                        callback.call(terminal_phase);
                    }
                }
            }
        }
    }
}
