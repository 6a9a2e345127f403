//! layout-metrics - static i-cache and i-TLB metrics for laid-out code.
//!
//! Given a binary whose functions and basic blocks already have their final
//! addresses, this crate estimates how well the layout will behave without
//! running the program. It reports the share of branch executions that fall
//! through (the TSP score), the expected i-TLB hit ratio under a page
//! residency model, and hot/cold code statistics.
//!
//! # Primary Usage
//!
//! ```ignore
//! use layout_metrics::{CacheMetrics, LayoutIR, LayoutIRAdaptor, MetricsConfig, MetricsSession};
//! use bumpalo::Bump;
//!
//! let ir = LayoutIR::parse(&text)?;
//! let adaptor = LayoutIRAdaptor::new(&ir);
//!
//! // All derived tables of the report live in the arena
//! let arena = Bump::new();
//! let session = MetricsSession::new(&arena, MetricsConfig::default())?;
//! let metrics = CacheMetrics::compute(&session, &adaptor);
//! print!("{metrics}");
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Adaptor trait, configuration, session and errors
//! - [`metrics`] - Address table, TSP score, call graph, i-TLB model, report
//! - [`layout_ir`] - Textual layout description and its adaptor

pub mod core;
pub mod layout_ir;
pub mod metrics;

pub use crate::core::{
    BinaryAdaptor, BranchCount, CacheModel, MetricsConfig, MetricsError, MetricsResult, MetricsSession,
    SessionStats,
};
pub use layout_ir::{LayoutIR, LayoutIRAdaptor};
pub use metrics::{AddressMode, CacheMetrics, TspScore};
