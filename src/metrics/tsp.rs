// This module computes the TSP score of a layout: the share of profiled branch executions
// that are physical fallthroughs. Only functions with profile data take part. Their blocks
// are walked in layout order and every successor edge with a known count adds that count
// to the total; the count also adds to the fallthrough weight when the destination starts
// exactly at the first byte past the source in the address table. A self-loop block never
// falls through into itself even if its extent is empty and the addresses coincide.

//! Fallthrough ("TSP") score.

use super::addresses::AddressTable;
use crate::core::adaptor::BinaryAdaptor;

/// Fallthrough weight against total branch weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TspScore {
    pub fallthrough: u64,
    pub total: u64,
}

impl TspScore {
    /// Score as a percentage; the total is floored at 1.
    pub fn percent(&self) -> f64 {
        100.0 * self.fallthrough as f64 / self.total.max(1) as f64
    }
}

/// Compute the TSP score over all profiled functions.
///
/// Self-loop counts are part of `total`. LLVM BOLT leaves them out of the
/// jump count entirely, so scores on loops read lower than its report.
pub fn calc_tsp_score<A: BinaryAdaptor>(adaptor: &A, table: &AddressTable<'_, A::BlockRef>) -> TspScore {
    let mut score = TspScore::default();

    for func in adaptor.funcs() {
        if !adaptor.func_has_profile(func) {
            continue;
        }
        for src in adaptor.func_blocks(func) {
            let src_end = table.extent(src).end();
            for (dst, count) in adaptor.block_succs(src) {
                let Some(count) = count else {
                    continue;
                };
                score.total = score.total.saturating_add(count);
                if src != dst && src_end == table.addr(dst) {
                    score.fallthrough = score.fallthrough.saturating_add(count);
                }
            }
        }
    }

    log::debug!(
        "TSP score: {} fallthrough out of {} branches",
        score.fallthrough,
        score.total
    );
    score
}
