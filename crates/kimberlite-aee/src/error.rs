//! Error taxonomy for the exchange engine.
//!
//! Most of the taxonomy in the protocol spec — `PhaseTimeout`,
//! `EmptyDeltaEarlyExit` — is normal control flow, not a `Result::Err`: it
//! surfaces as a terminal [`crate::types::Phase`] passed to `reply_action`,
//! not as an error value. Only contract violations that the caller could
//! have avoided are represented here.

use thiserror::Error;

use crate::types::{Colour, Phase};

/// Errors an exchange can report synchronously from `start`, or that a
/// malformed reply raises mid-exchange.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeeError {
    /// `start` was called with an empty blue or pink target list.
    #[error("blue and pink target lists must both be non-empty")]
    EmptyTargets,

    /// A reply's payload shape didn't match the phase that requested it
    /// (e.g. a branch list arrived while collecting for `ClockCompare`).
    /// Treated as fatal for the exchange: the implementation fails loudly
    /// rather than silently discarding the reply, matching the signature
    /// rejection path in this workspace's VSR replica.
    #[error("malformed reply for phase {phase} from {colour}: got {got} shaped reply")]
    MalformedReply {
        phase: Phase,
        colour: Colour,
        got: &'static str,
    },
}

/// Result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, AeeError>;
