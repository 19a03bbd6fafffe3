//! Reply Collector: the per-colour progress tracking and merge-on-arrival
//! bookkeeping the FSM occupies while `Collecting` for a phase.

use std::time::{Duration, Instant};

use crate::capability::{ClockOps, PhaseReply, TreeOps};
use crate::error::AeeError;
use crate::merge;
use crate::types::{Acc, Colour, Phase};

/// `(received, expected)` for one colour within the current phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub received: u32,
    pub expected: u32,
}

impl Progress {
    #[must_use]
    pub fn new(expected: u32) -> Self {
        Self { received: 0, expected }
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.received >= self.expected
    }
}

/// State the FSM occupies while awaiting replies for one phase.
#[derive(Debug, Clone)]
pub struct ReplyCollector<C: ClockOps> {
    pub phase: Phase,
    pub blue: Progress,
    pub pink: Progress,
    pub blue_acc: Acc<C>,
    pub pink_acc: Acc<C>,
    pub phase_start: Instant,
}

impl<C: ClockOps> ReplyCollector<C> {
    #[must_use]
    pub fn new(phase: Phase, blue_expected: u32, pink_expected: u32, now: Instant) -> Self {
        Self {
            phase,
            blue: Progress::new(blue_expected),
            pink: Progress::new(pink_expected),
            blue_acc: Acc::initial_for(phase),
            pink_acc: Acc::initial_for(phase),
            phase_start: now,
        }
    }

    /// Folds one reply into the colour-specific accumulator using this
    /// phase's merge function, then marks that colour's progress.
    ///
    /// # Errors
    ///
    /// Returns [`AeeError::MalformedReply`] if `result`'s shape doesn't
    /// match `self.phase`; the caller terminates the exchange on this path.
    pub fn merge(
        &mut self,
        tree: &impl TreeOps,
        clocks: &C,
        colour: Colour,
        result: PhaseReply<C>,
    ) -> Result<(), AeeError> {
        result.validate_shape(self.phase, colour)?;

        let progress = match colour {
            Colour::Blue => &mut self.blue,
            Colour::Pink => &mut self.pink,
        };
        if progress.is_complete() {
            // Already at expected for this colour; a further reply (a
            // duplicate send, a straggler from a retried dispatch) would
            // push received past expected, which §3/§8.1 forbid. Folding it
            // in would also be unobservable to the caller (both_complete is
            // already true), so treat it as a no-op.
            return Ok(());
        }
        progress.received += 1;

        let acc = match colour {
            Colour::Blue => &mut self.blue_acc,
            Colour::Pink => &mut self.pink_acc,
        };
        match (acc, result) {
            (Acc::Root(acc_blob), PhaseReply::Root(incoming)) => {
                *acc_blob = merge::merge_root(tree, acc_blob, &incoming);
            }
            (Acc::Branches(acc_list), PhaseReply::Branches(incoming)) => {
                merge::merge_branches(tree, acc_list, incoming);
            }
            (Acc::Clocks(acc_list), PhaseReply::Clocks(incoming)) => {
                merge::merge_clocks(clocks, acc_list, incoming);
            }
            _ => unreachable!("validate_shape already rejected any mismatch"),
        }

        Ok(())
    }

    #[must_use]
    pub fn both_complete(&self) -> bool {
        self.blue.is_complete() && self.pink.is_complete()
    }

    #[must_use]
    pub fn missing_count(&self) -> u32 {
        (self.blue.expected + self.pink.expected).saturating_sub(self.blue.received + self.pink.received)
    }

    /// Time remaining before this phase's deadline fires, given its budget.
    /// Re-armed after every partial reply so total phase time is bounded
    /// irrespective of how many replies have arrived so far.
    #[must_use]
    pub fn remaining(&self, budget: Duration, now: Instant) -> Duration {
        budget.saturating_sub(now.saturating_duration_since(self.phase_start))
    }
}
