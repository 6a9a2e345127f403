//! Layout quality metrics.
//!
//! The passes run leaf-first over a [`BinaryAdaptor`](crate::core::BinaryAdaptor):
//!
//! - [`addresses`] - per-block address/size table for the chosen addressing mode
//! - [`tsp`] - fraction of branch weight that falls through
//! - [`call_graph`] - callee -> weighted callers
//! - [`itlb`] - expected i-TLB hit ratio from page residency
//! - [`report`] - aggregate statistics and the printed summary
//!
//! All derived tables are allocated in the [`MetricsSession`](crate::core::MetricsSession)
//! arena and dropped with it.

pub mod addresses;
pub mod call_graph;
pub mod itlb;
pub mod report;
pub mod tsp;

pub use addresses::{address_mode, extract_block_info, print_address_table, AddressMode, AddressTable, BlockExtent};
pub use call_graph::{extract_function_calls, print_call_graph, CallGraph, CallerEdge};
pub use itlb::expected_cache_hit_ratio;
pub use report::CacheMetrics;
pub use tsp::{calc_tsp_score, TspScore};
