//! Client session management for VSR.
//!
//! # VRR Paper Bugs Fixed
//!
//! This module fixes two bugs found in the original Viewstamped Replication Revisited paper,
//! as documented by TigerBeetle:
//!
//! ## Bug 1: Successive Client Crashes
//!
//! **Problem:** When a client crashes and restarts, it resets its request number to 0.
//! If the server still has the old session cached, it returns the reply for request #0
//! from the *previous* client incarnation, not the current one.
//!
//! **Fix:** Explicit session registration. Each client must register before sending requests.
//! Registration creates a new session with a fresh request number space.
//!
//! ## Bug 2: Uncommitted Request Table Updates
//!
//! **Problem:** The VRR paper updates the client table when a request is *prepared* (not yet committed).
//! During a view change, the new leader doesn't have uncommitted prepares, so it rejects
//! requests from clients whose table was updated but not committed. Client is locked out.
//!
//! **Fix:** Separate committed vs uncommitted tracking. Only update the committed table
//! after a request is actually committed. Track uncommitted requests separately and discard
//! them on view change.
//!
//! # References
//!
//! - TigerBeetle: `src/vsr/client_sessions.zig`
//! - VRR paper: "Viewstamped Replication Revisited" (Liskov & Cowling, 2012)

use std::collections::{BinaryHeap, HashMap};
use std::cmp::Reverse;

use kimberlite_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::types::OpNumber;

// ============================================================================
// ClientId
// ============================================================================

/// Unique identifier for a client session.
///
/// A client registers once and gets assigned a unique ID. All subsequent
/// requests from that client include this ID.
///
/// # Design Note
///
/// We use u64 for simplicity. Production systems might want UUIDs for
/// cross-cluster uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Creates a new client ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the client ID as a u64.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

// ============================================================================
// CommittedSession
// ============================================================================

/// A committed client session with cached reply.
///
/// This represents a client whose requests have been committed. The cached
/// reply enables idempotent retry - if the client resends the same request
/// number, we return the cached reply instead of re-executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedSession {
    /// The highest request number committed for this client.
    pub request_number: u64,

    /// The operation number where this request was committed.
    pub committed_op: OpNumber,

    /// Cached reply data (for idempotent retry).
    ///
    /// Stores the Effects produced when this request was committed.
    /// When a duplicate request is detected, we return these cached effects
    /// instead of re-executing the command.
    pub reply_op: OpNumber,

    /// Cached effects from the committed operation.
    ///
    /// These are the exact effects produced when the kernel applied this
    /// command. Replaying these effects provides idempotent retry.
    pub cached_effects: Vec<kimberlite_kernel::Effect>,

    /// Timestamp when this session was last committed.
    ///
    /// Used for deterministic eviction: all replicas evict the session
    /// with the oldest commit timestamp.
    pub commit_timestamp: Timestamp,
}

impl CommittedSession {
    /// Creates a new committed session.
    pub fn new(
        request_number: u64,
        committed_op: OpNumber,
        reply_op: OpNumber,
        cached_effects: Vec<kimberlite_kernel::Effect>,
        commit_timestamp: Timestamp,
    ) -> Self {
        Self {
            request_number,
            committed_op,
            reply_op,
            cached_effects,
            commit_timestamp,
        }
    }
}

// ============================================================================
// UncommittedSession
// ============================================================================

/// An uncommitted client session.
///
/// This tracks requests that have been prepared but not yet committed.
/// If a view change occurs, these are discarded (the new leader doesn't
/// have them). This prevents the "client lockout" bug from the VRR paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedSession {
    /// The request number being prepared (not yet committed).
    pub request_number: u64,

    /// The operation number where this request is being prepared.
    pub preparing_op: OpNumber,
}

impl UncommittedSession {
    /// Creates a new uncommitted session.
    pub fn new(request_number: u64, preparing_op: OpNumber) -> Self {
        Self {
            request_number,
            preparing_op,
        }
    }
}

// ============================================================================
// SessionEviction (for priority queue)
// ============================================================================

/// Entry for the eviction priority queue.
///
/// We maintain a min-heap of sessions ordered by commit_timestamp.
/// When eviction is needed, we remove the session with the oldest timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionEviction {
    client_id: ClientId,
    commit_timestamp: Timestamp,
}

impl PartialOrd for SessionEviction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SessionEviction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Normal order - used with Reverse wrapper for min-heap
        self.commit_timestamp.cmp(&other.commit_timestamp)
    }
}

// ============================================================================
// ClientSessions
// ============================================================================

/// Configuration for client session management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSessionsConfig {
    /// Maximum number of committed sessions to retain.
    ///
    /// When exceeded, the session with the oldest commit_timestamp is evicted.
    pub max_sessions: usize,
}

impl Default for ClientSessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100_000, // Support 100k concurrent clients
        }
    }
}

impl ClientSessionsConfig {
    /// Configuration for testing (small limits).
    pub fn testing() -> Self {
        Self { max_sessions: 100 }
    }
}

/// Client session manager.
///
/// Tracks both committed and uncommitted sessions to provide idempotent
/// request processing while avoiding VRR paper bugs.
///
/// # Design Invariants
///
/// 1. **Committed sessions** are durable across view changes
/// 2. **Uncommitted sessions** are discarded on view change
/// 3. **Eviction is deterministic** - all replicas evict the same session (oldest commit_timestamp)
/// 4. **Request numbers are monotonic** - each client's request numbers only increase
#[derive(Debug, Clone)]
pub struct ClientSessions {
    /// Committed sessions with cached replies.
    committed: HashMap<ClientId, CommittedSession>,

    /// Uncommitted sessions (prepared but not committed).
    uncommitted: HashMap<ClientId, UncommittedSession>,

    /// Priority queue for deterministic eviction.
    ///
    /// Min-heap ordered by commit_timestamp. Oldest sessions evicted first.
    eviction_queue: BinaryHeap<Reverse<SessionEviction>>,

    /// Next client ID to assign.
    next_client_id: u64,

    /// Configuration.
    config: ClientSessionsConfig,
}

impl ClientSessions {
    /// Creates a new empty client session manager.
    pub fn new(config: ClientSessionsConfig) -> Self {
        Self {
            committed: HashMap::new(),
            uncommitted: HashMap::new(),
            eviction_queue: BinaryHeap::new(),
            next_client_id: 1, // Start at 1 (0 reserved for special use)
            config,
        }
    }

    /// Creates a manager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClientSessionsConfig::default())
    }

    /// Registers a new client session.
    ///
    /// Returns the assigned `ClientId`. The client must include this ID
    /// in all subsequent requests.
    ///
    /// # Design Note
    ///
    /// In production, registration might include authentication, rate limiting,
    /// etc. For now, we just assign IDs monotonically.
    pub fn register_client(&mut self) -> ClientId {
        let client_id = ClientId::new(self.next_client_id);
        self.next_client_id = self.next_client_id.saturating_add(1);
        client_id
    }

    /// Checks if a request is a duplicate of a committed request.
    ///
    /// # Returns
    ///
    /// - `Some(session)` if this request was already committed (return cached reply)
    /// - `None` if this is a new request or higher request number
    ///
    /// # Design
    ///
    /// We only check committed sessions. Uncommitted sessions don't have replies yet.
    pub fn check_duplicate(
        &self,
        client_id: ClientId,
        request_number: u64,
    ) -> Option<&CommittedSession> {
        let session = self.committed.get(&client_id)?;

        // If request number matches, this is a duplicate
        if session.request_number == request_number {
            Some(session)
        } else {
            None
        }
    }

    /// Records an uncommitted request (during prepare phase).
    ///
    /// This tracks that a request is being prepared but not yet committed.
    /// If a view change occurs, uncommitted sessions are discarded.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Client sending the request
    /// * `request_number` - Request number (must be > any committed request)
    /// * `preparing_op` - Operation number being prepared
    ///
    /// # Returns
    ///
    /// - `Ok(())` if recorded successfully
    /// - `Err(msg)` if request number is invalid (not monotonic)
    pub fn record_uncommitted(
        &mut self,
        client_id: ClientId,
        request_number: u64,
        preparing_op: OpNumber,
    ) -> Result<(), String> {
        // Check monotonicity: request number must be > any committed request
        if let Some(committed) = self.committed.get(&client_id) {
            if request_number <= committed.request_number {
                return Err(format!(
                    "request number {} not greater than committed {}",
                    request_number, committed.request_number
                ));
            }
        }

        // Record uncommitted session
        let session = UncommittedSession::new(request_number, preparing_op);
        self.uncommitted.insert(client_id, session);

        Ok(())
    }

    /// Commits a request (move from uncommitted to committed).
    ///
    /// This is called after a request reaches consensus and is committed.
    /// The session moves from uncommitted to committed, and a reply is cached.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Client whose request is being committed
    /// * `request_number` - Request number being committed
    /// * `committed_op` - Operation number where committed
    /// * `reply_op` - Operation number to return as reply
    /// * `cached_effects` - Effects produced by this request (for idempotent retry)
    /// * `commit_timestamp` - When this was committed (for eviction)
    ///
    /// # Returns
    ///
    /// - `Ok(())` if committed successfully
    /// - `Err(msg)` if request number doesn't match uncommitted
    pub fn commit_request(
        &mut self,
        client_id: ClientId,
        request_number: u64,
        committed_op: OpNumber,
        reply_op: OpNumber,
        cached_effects: Vec<kimberlite_kernel::Effect>,
        commit_timestamp: Timestamp,
    ) -> Result<(), String> {
        // Validate that this request is uncommitted
        if let Some(uncommitted) = self.uncommitted.get(&client_id) {
            if uncommitted.request_number != request_number {
                return Err(format!(
                    "committing request {} but uncommitted is {}",
                    request_number, uncommitted.request_number
                ));
            }
        }

        // Remove from uncommitted
        self.uncommitted.remove(&client_id);

        // Add to committed
        let session = CommittedSession::new(
            request_number,
            committed_op,
            reply_op,
            cached_effects,
            commit_timestamp,
        );
        self.committed.insert(client_id, session);

        // Add to eviction queue
        self.eviction_queue.push(Reverse(SessionEviction {
            client_id,
            commit_timestamp,
        }));

        // Check if eviction is needed
        if self.committed.len() > self.config.max_sessions {
            self.evict_oldest();
        }

        Ok(())
    }

    /// Discards all uncommitted sessions.
    ///
    /// Called during view change. The new leader doesn't have uncommitted
    /// prepares from the old leader, so we discard them to avoid client lockout.
    pub fn discard_uncommitted(&mut self) {
        self.uncommitted.clear();
    }

    /// Evicts the session with the oldest commit timestamp.
    ///
    /// This is deterministic - all replicas will evict the same session
    /// because they all use commit_timestamp for ordering.
    fn evict_oldest(&mut self) {
        while let Some(Reverse(eviction)) = self.eviction_queue.pop() {
            // Check if this session still exists (might have been evicted already)
            if let Some(session) = self.committed.get(&eviction.client_id) {
                // Verify timestamp matches (session might have been updated)
                if session.commit_timestamp == eviction.commit_timestamp {
                    self.committed.remove(&eviction.client_id);
                    tracing::debug!(
                        client = %eviction.client_id,
                        timestamp = ?eviction.commit_timestamp,
                        "evicted oldest client session"
                    );
                    return;
                }
            }
        }
    }

    /// Returns the number of committed sessions.
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Returns the number of uncommitted sessions.
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted.len()
    }

    /// Returns true if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.uncommitted.is_empty()
    }
}

impl Default for ClientSessions {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================
