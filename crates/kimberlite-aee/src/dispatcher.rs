//! Request Dispatcher: fans a phase request out to both colours' target
//! sets, alternating between colours so neither starves when the lists are
//! unequal in length. Dispatch itself never blocks; a send capability that
//! fails is invisible here and manifests only as a phase deadline.

use tokio::sync::mpsc;

use crate::capability::{ClockOps, ExchangeEvent, PhaseRequest, ReplyHandle, Target};

/// Walks `blue_targets` and `pink_targets` in lockstep by index, invoking
/// each target's send capability. The relative dispatch order among
/// individual targets is unspecified; only the blue/pink alternation is
/// part of the contract.
pub fn dispatch<C: ClockOps>(
    msg: &PhaseRequest,
    blue_targets: &[Target<C>],
    pink_targets: &[Target<C>],
    reply_tx: &mpsc::UnboundedSender<ExchangeEvent<C>>,
) {
    let max_len = blue_targets.len().max(pink_targets.len());
    for i in 0..max_len {
        if let Some((capability, preflist)) = blue_targets.get(i) {
            let reply_to = ReplyHandle::new(reply_tx.clone());
            capability.send(msg.clone(), preflist, crate::types::Colour::Blue, reply_to);
        }
        if let Some((capability, preflist)) = pink_targets.get(i) {
            let reply_to = ReplyHandle::new(reply_tx.clone());
            capability.send(msg.clone(), preflist, crate::types::Colour::Pink, reply_to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SendCapability;
    use crate::types::Colour;
    use std::sync::{Arc, Mutex};

    struct RecordingCapability {
        seen: Arc<Mutex<Vec<Colour>>>,
    }

    impl<C: ClockOps> SendCapability<C> for RecordingCapability {
        fn send(&self, _msg: PhaseRequest, _preflist: &crate::capability::Preflist, colour: Colour, _reply_to: ReplyHandle<C>) {
            self.seen.lock().unwrap().push(colour);
        }
    }

    #[test]
    fn dispatch_alternates_colours_with_unequal_list_lengths() {
        use crate::test_support::FakeClockOps;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let cap: Arc<dyn SendCapability<FakeClockOps>> = Arc::new(RecordingCapability { seen: seen.clone() });
        let blue_targets = vec![(cap.clone(), vec![1]), (cap.clone(), vec![2])];
        let pink_targets = vec![(cap.clone(), vec![3])];

        let (tx, _rx) = mpsc::unbounded_channel::<ExchangeEvent<FakeClockOps>>();
        dispatch(&PhaseRequest::FetchRoot, &blue_targets, &pink_targets, &tx);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Colour::Blue);
        assert_eq!(seen[1], Colour::Pink);
        assert_eq!(seen[2], Colour::Blue);
    }
}
