// This module provides the per-report session for layout-metrics, built on the bumpalo
// crate. MetricsSession borrows an arena owned by the caller and every derived container of
// a report (the block address table, the reverse call graph, the per-function and per-page
// sample totals) is allocated inside it and dropped together with the arena. The session
// also carries the MetricsConfig in effect and a SessionStats record filled in by the
// passes: blocks mapped under each addressing mode, call sites scanned, and how many calls
// were dropped for each reason.

//! Arena-based metrics session.
//!
//! All derived tables of a report are tied to the session lifetime.

use super::config::MetricsConfig;
use super::error::MetricsResult;
use bumpalo::Bump;
use hashbrown::{DefaultHashBuilder, HashMap};
use std::cell::RefCell;
use std::fmt;

/// Hash map allocated in the session arena.
pub type ArenaMap<'arena, K, V> = HashMap<K, V, DefaultHashBuilder, &'arena Bump>;

/// Per-report session.
pub struct MetricsSession<'arena> {
    arena: &'arena Bump,
    config: MetricsConfig,
    stats: RefCell<SessionStats>,
}

impl<'arena> MetricsSession<'arena> {
    /// Create a new session with the given arena and configuration.
    ///
    /// Fails with `InvalidConfig` when the configuration does not validate.
    pub fn new(arena: &'arena Bump, config: MetricsConfig) -> MetricsResult<Self> {
        config.validate()?;
        Ok(Self {
            arena,
            config,
            stats: RefCell::new(SessionStats::default()),
        })
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Create an empty map in the session arena.
    pub fn new_map<K, V>(&self) -> ArenaMap<'arena, K, V> {
        HashMap::new_in(self.arena)
    }

    /// Snapshot of the statistics gathered so far.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }

    pub(crate) fn update_stats(&self, f: impl FnOnce(&mut SessionStats)) {
        f(&mut self.stats.borrow_mut());
    }

    /// Bytes currently allocated in the arena.
    pub fn allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }
}

/// Statistics gathered while computing a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub functions_scanned: usize,
    pub blocks_output_mode: usize,
    pub blocks_input_mode: usize,
    pub call_sites: usize,
    pub calls_recorded: usize,
    pub calls_unresolved: usize,
    pub calls_zero_count: usize,
    pub calls_empty_target: usize,
    pub calls_recursive: usize,
}

impl SessionStats {
    /// Calls that were seen but not recorded as call graph edges.
    pub fn calls_skipped(&self) -> usize {
        self.calls_unresolved + self.calls_zero_count + self.calls_empty_target + self.calls_recursive
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session statistics:")?;
        writeln!(f, "  Functions scanned: {}", self.functions_scanned)?;
        writeln!(
            f,
            "  Blocks mapped: {} output, {} input",
            self.blocks_output_mode, self.blocks_input_mode
        )?;
        writeln!(f, "  Call sites: {}", self.call_sites)?;
        writeln!(f, "  Calls recorded: {}", self.calls_recorded)?;
        write!(
            f,
            "  Calls skipped: {} unresolved, {} zero count, {} empty target, {} recursive",
            self.calls_unresolved, self.calls_zero_count, self.calls_empty_target, self.calls_recursive
        )
    }
}
