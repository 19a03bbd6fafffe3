//! Continuous workload scheduler for marathon stress tests.
//!
//! This module provides a stateful scheduler that generates operations
//! throughout a simulation run, enabling stress tests that reach max_events
//! or max_time limits rather than stopping when initial work drains.
//!
//! **Always Enabled**: The workload scheduler is always active in VOPR
//! simulations. All simulations use continuous workload generation.
//!
//! # Architecture
//!
//! The scheduler uses an event-based approach:
//! 1. Initial `WorkloadTick` event is scheduled at simulation start
//! 2. When processed, it generates a batch of operations (e.g., 5 ops)
//! 3. Each operation is scheduled as a Custom or VsrClientRequest event
//! 4. The scheduler reschedules itself for the next tick
//! 5. Process repeats until max_scheduled_ops, max_events, or max_time reached
//!
//! # Determinism
//!
//! All RNG calls happen in strict event time order, maintaining determinism.
//! Same seed produces identical operation sequences regardless of queue depth.

use crate::{EventKind, SimRng};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for continuous workload generation.
#[derive(Debug, Clone)]
pub struct WorkloadSchedulerConfig {
    /// Operations to schedule per tick.
    pub ops_per_tick: usize,

    /// Interval between ticks (nanoseconds).
    pub tick_interval_ns: u64,

    /// Whether to use enhanced workloads (RMW, scans).
    pub enhanced_workloads: bool,

    /// Stop generating when this many events have been scheduled.
    /// None = no limit (will respect sim max_events).
    pub max_scheduled_ops: Option<usize>,

    /// For VSR mode: schedule client requests instead of Custom events.
    pub vsr_mode: bool,

    /// Simulation-level event limit (passed from SimulationConfig).
    /// Used to prevent infinite rescheduling when max_scheduled_ops is None.
    pub sim_max_events: Option<u64>,

    /// Simulation-level time limit in nanoseconds (passed from SimulationConfig).
    /// Used to prevent scheduling beyond simulation time limit.
    pub sim_max_time_ns: Option<u64>,
}

impl Default for WorkloadSchedulerConfig {
    fn default() -> Self {
        Self {
            ops_per_tick: 5,                    // 5 ops per batch
            tick_interval_ns: 10_000_000,       // 10ms between batches = 500 ops/sec
            enhanced_workloads: true,
            max_scheduled_ops: None,
            vsr_mode: false,
            sim_max_events: None,
            sim_max_time_ns: None,
        }
    }
}

// ============================================================================
// Workload Scheduler
// ============================================================================

/// Stateful workload scheduler that generates operations throughout simulation.
pub struct WorkloadScheduler {
    config: WorkloadSchedulerConfig,
    ops_scheduled: usize,
    enabled: bool,

    /// Estimate of events processed (updated via update_sim_context).
    events_processed_estimate: u64,

    /// Current simulation time in nanoseconds (updated via update_sim_context).
    current_sim_time_ns: u64,
}

impl WorkloadScheduler {
    /// Creates a new workload scheduler with the given configuration.
    pub fn new(config: WorkloadSchedulerConfig) -> Self {
        Self {
            config,
            ops_scheduled: 0,
            enabled: true,
            events_processed_estimate: 0,
            current_sim_time_ns: 0,
        }
    }

    /// Returns true if the scheduler should generate more operations.
    fn should_continue(&self) -> bool {
        if !self.enabled {
            return false;
        }

        // Check workload-specific operation limit
        if let Some(max) = self.config.max_scheduled_ops {
            if self.ops_scheduled >= max {
                return false;
            }
        }

        // Check simulation event limit (with 100-event buffer for safety)
        // This prevents infinite rescheduling when max_scheduled_ops is None
        if let Some(max_events) = self.config.sim_max_events {
            if self.events_processed_estimate + 100 >= max_events {
                return false;
            }
        }

        // Check simulation time limit (with 100ms buffer for safety)
        // This prevents scheduling beyond the simulation time horizon
        if let Some(max_time) = self.config.sim_max_time_ns {
            if self.current_sim_time_ns + 100_000_000 >= max_time {
                return false;
            }
        }

        true
    }

    /// Schedules the initial workload tick event.
    ///
    /// Call this during simulation initialization to seed the first tick.
    pub fn schedule_initial_tick(&self, events: &mut Vec<(u64, EventKind)>, current_time_ns: u64) {
        if self.enabled {
            events.push((
                current_time_ns + self.config.tick_interval_ns,
                EventKind::WorkloadTick,
            ));
        }
    }

    /// Updates the simulation context for limit-aware termination.
    ///
    /// This should be called before `handle_tick()` to ensure the scheduler
    /// has current information about simulation progress.
    ///
    /// # Arguments
    ///
    /// * `events_processed` - Total events processed by the simulation
    /// * `current_time_ns` - Current simulation time in nanoseconds
    pub fn update_sim_context(&mut self, events_processed: u64, current_time_ns: u64) {
        self.events_processed_estimate = events_processed;
        self.current_sim_time_ns = current_time_ns;
    }

    /// Handles a WorkloadTick event by scheduling a batch of operations.
    ///
    /// Returns a list of (time, event) tuples to schedule, plus an optional
    /// next WorkloadTick event.
    ///
    /// # Arguments
    ///
    /// * `current_time_ns` - Current simulation time
    /// * `events_processed` - Total events processed (for limit awareness)
    /// * `rng` - Deterministic random number generator
    ///
    /// # Returns
    ///
    /// Vector of (time_ns, EventKind) pairs to schedule.
    pub fn handle_tick(
        &mut self,
        current_time_ns: u64,
        events_processed: u64,
        rng: &mut SimRng,
    ) -> Vec<(u64, EventKind)> {
        // Update simulation context first
        self.update_sim_context(events_processed, current_time_ns);

        if !self.should_continue() {
            return Vec::new();
        }

        let mut scheduled = Vec::new();

        // Calculate batch size (respect max_scheduled_ops if set)
        let remaining = self.config.max_scheduled_ops.map(|max| max.saturating_sub(self.ops_scheduled));
        let batch_size = remaining
            .map(|r| r.min(self.config.ops_per_tick))
            .unwrap_or(self.config.ops_per_tick);

        // Schedule operations
        let op_count = if self.config.enhanced_workloads { 6 } else { 4 };

        for _ in 0..batch_size {
            let delay = rng.delay_ns(1_000_000, 10_000_000); // 1-10ms

            let event = if self.config.vsr_mode {
                // VSR mode: schedule client request
                EventKind::VsrClientRequest {
                    replica_id: 0, // Leader
                    command_bytes: vec![],
                    idempotency_id: None,
                }
            } else {
                // Simplified mode: schedule custom event with operation type
                let op_type = rng.next_u64() % op_count;
                EventKind::Custom(op_type)
            };

            scheduled.push((current_time_ns + delay, event));
            self.ops_scheduled += 1;
        }

        // Schedule next tick if we should continue
        if self.should_continue() {
            scheduled.push((
                current_time_ns + self.config.tick_interval_ns,
                EventKind::WorkloadTick,
            ));
        }

        scheduled
    }

    /// Returns the number of operations scheduled so far.
    pub fn ops_scheduled(&self) -> usize {
        self.ops_scheduled
    }

    /// Disables future tick scheduling (for graceful shutdown).
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Returns true if the scheduler is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Tests
// ============================================================================
