// This module is the hub of the shared layout-metrics infrastructure: the BinaryAdaptor
// trait through which the metric passes read the host's binary representation, the
// configuration of the cache and TLB models, the arena-backed MetricsSession that owns all
// per-report derived tables and statistics, and the error types used by the parser and the
// command-line tool.

//! Core layout-metrics infrastructure
//!
//! # Key Components
//!
//! ## Adaptor (`adaptor`)
//! - Read-only view of functions, blocks and instructions
//! - Opaque Copy handles, no dependency on a concrete representation
//!
//! ## Session Management (`session`)
//! - Arena-based allocation using `bumpalo`
//! - Arena-allocated `hashbrown` maps for the derived tables
//! - Statistics about mapped blocks and skipped calls
//!
//! ## Configuration (`config`)
//! - i-TLB page size and entry count
//! - Huge page size for the footprint statistic

pub mod adaptor;
pub mod config;
pub mod error;
pub mod session;

pub use adaptor::{BinaryAdaptor, BranchCount};
pub use config::{CacheModel, MetricsConfig};
pub use error::{MetricsError, MetricsResult};
pub use session::{ArenaMap, MetricsSession, SessionStats};
