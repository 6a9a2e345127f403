// This module assembles the cache metrics report. It counts functions (all, hot, profiled)
// and blocks (all, hot), where a function is hot when it received a valid placement index
// and a block is hot when its function is hot and the block was not split out as cold. The
// hot and total code spans are the distance between the lowest output start and the highest
// output end of the respective block sets, and the hot span is also expressed in huge pages.
// It then builds the address table and the call graph in the session arena and runs the
// i-TLB estimator and the TSP scorer. The Display implementation renders the familiar
// five-line summary with percentages to two decimal places.

//! Cache metrics report.

use super::addresses::extract_block_info;
use super::call_graph::extract_function_calls;
use super::itlb::expected_cache_hit_ratio;
use super::tsp::{calc_tsp_score, TspScore};
use crate::core::adaptor::BinaryAdaptor;
use crate::core::session::MetricsSession;
use std::fmt;

/// Lowest start and highest end over a set of address ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CodeSpan {
    bounds: Option<(u64, u64)>,
}

impl CodeSpan {
    fn include(&mut self, (start, end): (u64, u64)) {
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(start), max.max(end)),
            None => (start, end),
        });
    }

    fn size(&self) -> u64 {
        self.bounds.map_or(0, |(min, max)| max.saturating_sub(min))
    }
}

/// Summary of the layout quality of a binary.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheMetrics {
    pub num_functions: usize,
    pub num_hot_functions: usize,
    pub num_profiled_functions: usize,
    pub num_blocks: usize,
    pub num_hot_blocks: usize,
    /// Hot code span in bytes.
    pub hot_code_size: u64,
    /// Total code span in bytes.
    pub total_code_size: u64,
    pub huge_page_size: u64,
    /// Expected i-TLB hit ratio in percent; `None` without samples.
    pub itlb_hit_ratio: Option<f64>,
    pub tsp: TspScore,
}

fn percent(num: u64, den: u64) -> f64 {
    100.0 * num as f64 / den.max(1) as f64
}

impl CacheMetrics {
    /// Compute all metrics for the functions exposed by the adaptor.
    pub fn compute<A: BinaryAdaptor>(session: &MetricsSession<'_>, adaptor: &A) -> Self {
        let mut num_functions = 0;
        let mut num_hot_functions = 0;
        let mut num_profiled_functions = 0;
        let mut num_blocks = 0;
        let mut num_hot_blocks = 0;
        let mut total_span = CodeSpan::default();
        let mut hot_span = CodeSpan::default();

        for func in adaptor.funcs() {
            num_functions += 1;
            if adaptor.func_has_profile(func) {
                num_profiled_functions += 1;
            }
            let hot = adaptor.func_has_valid_index(func);
            if hot {
                num_hot_functions += 1;
            }
            for block in adaptor.func_blocks(func) {
                num_blocks += 1;
                let range = adaptor.block_output_range(block);
                total_span.include(range);
                if hot && !adaptor.block_is_cold(block) {
                    num_hot_blocks += 1;
                    hot_span.include(range);
                }
            }
        }

        let table = extract_block_info(session, adaptor);
        let calls = extract_function_calls(session, adaptor);
        let itlb_hit_ratio = expected_cache_hit_ratio(session, adaptor, &table, &calls);
        let tsp = calc_tsp_score(adaptor, &table);

        log::debug!(
            "Report: {} functions, {} blocks, arena holds {} bytes",
            num_functions,
            num_blocks,
            session.allocated_bytes()
        );

        Self {
            num_functions,
            num_hot_functions,
            num_profiled_functions,
            num_blocks,
            num_hot_blocks,
            hot_code_size: hot_span.size(),
            total_code_size: total_span.size(),
            huge_page_size: session.config().huge_page_size,
            itlb_hit_ratio,
            tsp,
        }
    }

    pub fn hot_function_percent(&self) -> f64 {
        percent(self.num_hot_functions as u64, self.num_functions as u64)
    }

    pub fn profiled_function_percent(&self) -> f64 {
        percent(self.num_profiled_functions as u64, self.num_functions as u64)
    }

    pub fn hot_block_percent(&self) -> f64 {
        percent(self.num_hot_blocks as u64, self.num_blocks as u64)
    }

    pub fn hot_code_percent(&self) -> f64 {
        percent(self.hot_code_size, self.total_code_size)
    }

    /// Hot code size in units of huge pages.
    pub fn hot_huge_pages(&self) -> f64 {
        self.hot_code_size as f64 / self.huge_page_size.max(1) as f64
    }
}

impl fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  There are {} functions; {} ({:.2}%) are in the hot section, {} ({:.2}%) have profile",
            self.num_functions,
            self.num_hot_functions,
            self.hot_function_percent(),
            self.num_profiled_functions,
            self.profiled_function_percent()
        )?;
        if self.num_blocks == 0 {
            writeln!(f, "  There are 0 basic blocks")?;
        } else {
            writeln!(
                f,
                "  There are {} basic blocks; {} ({:.2}%) are in the hot section",
                self.num_blocks,
                self.num_hot_blocks,
                self.hot_block_percent()
            )?;
        }
        writeln!(
            f,
            "  Hot code takes {:.2}% of binary ({} bytes out of {}, {:.2} huge pages)",
            self.hot_code_percent(),
            self.hot_code_size,
            self.total_code_size,
            self.hot_huge_pages()
        )?;
        match self.itlb_hit_ratio {
            Some(ratio) => writeln!(f, "  Expected i-TLB cache hit ratio: {:.2}%", ratio)?,
            None => writeln!(f, "  Expected i-TLB cache hit ratio: n/a")?,
        }
        writeln!(
            f,
            "  TSP score: {:.2}% ({} out of {})",
            self.tsp.percent(),
            self.tsp.fallthrough,
            self.tsp.total
        )
    }
}
