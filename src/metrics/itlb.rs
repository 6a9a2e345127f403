// This module estimates the expected i-TLB hit ratio of a layout, following the model the
// HFSort+ function ordering optimizes for. Function "hotness" is the weight of the calls
// arriving at it, but never less than its own execution count (entry points and functions
// reached through unattributed calls). Page hotness is the sum over the functions whose
// first block starts on the page. Calls are then split into short ones, where caller and
// callee start on the same page and are assumed to hit, and long ones. Assuming pages enter
// the TLB in random order with probability proportional to their hotness, a long call misses
// with probability (1 - page share) ^ entries, and the same probability is charged to the
// samples not explained by any recorded caller. A program without samples has no meaningful
// ratio, which is reported as None rather than a made-up percentage.

//! Expected i-TLB hit ratio.

use super::addresses::AddressTable;
use super::call_graph::CallGraph;
use crate::core::adaptor::BinaryAdaptor;
use crate::core::session::MetricsSession;

/// Compute the expected i-TLB hit ratio in percent.
///
/// Returns `None` when the program carries no samples at all.
pub fn expected_cache_hit_ratio<'arena, A: BinaryAdaptor>(
    session: &MetricsSession<'arena>,
    adaptor: &A,
    table: &AddressTable<'arena, A::BlockRef>,
    calls: &CallGraph<'arena, A::FuncRef>,
) -> Option<f64> {
    let model = session.config().cache_model;
    let page_of_func = |func: A::FuncRef| {
        adaptor
            .func_first_block(func)
            .map(|block| model.page_of(table.addr(block)))
    };

    // Compute 'hotness' of the functions
    let mut total_samples: f64 = 0.0;
    let mut function_samples = session.new_map();
    let mut functions = 0;
    for func in adaptor.funcs() {
        let incoming = calls.incoming_weight(func);
        let samples = incoming.max(adaptor.func_known_execution_count(func) as f64);
        function_samples.insert(func, samples);
        total_samples += samples;
        functions += 1;
    }
    session.update_stats(|stats| stats.functions_scanned += functions);

    if total_samples <= 0.0 {
        log::warn!("No execution samples; i-TLB hit ratio is not applicable");
        return None;
    }

    // Compute 'hotness' of the pages
    let mut page_samples = session.new_map();
    for func in adaptor.funcs() {
        let Some(page) = page_of_func(func) else {
            continue;
        };
        *page_samples.entry(page).or_insert(0.0) += function_samples[&func];
    }
    log::debug!(
        "i-TLB model: {} samples over {} pages",
        total_samples,
        page_samples.len()
    );

    let mut misses: f64 = 0.0;
    for func in adaptor.funcs() {
        let samples: f64 = function_samples[&func];
        if samples == 0.0 {
            continue;
        }
        let Some(page) = page_of_func(func) else {
            continue;
        };
        // The probability that the page is not present in the cache
        let miss_prob = model.miss_probability(page_samples[&page] / total_samples);

        for edge in calls.callers(func) {
            let src_page = page_of_func(edge.caller);
            if src_page != Some(page) {
                misses += miss_prob * edge.weight as f64;
            }
        }
        // The remaining samples likely come from jitted or indirectly reached code
        let remaining = samples - calls.incoming_weight(func);
        debug_assert!(remaining >= 0.0, "function samples computed incorrectly");
        misses += remaining * miss_prob;

        log::trace!(
            "{}: page {} miss probability {:.6}",
            adaptor.func_name(func),
            page,
            miss_prob
        );
    }

    Some(100.0 * (1.0 - misses / total_samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MetricsConfig;
    use crate::layout_ir::{LayoutIR, LayoutIRAdaptor};
    use crate::metrics::{extract_block_info, extract_function_calls};
    use bumpalo::Bump;

    fn hit_ratio(text: &str, config: MetricsConfig) -> Option<f64> {
        let ir = LayoutIR::parse(text).unwrap();
        let adaptor = LayoutIRAdaptor::new(&ir);
        let arena = Bump::new();
        let session = MetricsSession::new(&arena, config).unwrap();
        let table = extract_block_info(&session, &adaptor);
        let calls = extract_function_calls(&session, &adaptor);
        expected_cache_hit_ratio(&session, &adaptor, &table, &calls)
    }

    #[test]
    fn test_no_samples_is_not_applicable() {
        let text = r#"
func idle {
entry: out=0x0..0x10
  ret
}
"#;
        assert_eq!(hit_ratio(text, MetricsConfig::default()), None);
        assert_eq!(hit_ratio("", MetricsConfig::default()), None);
    }

    #[test]
    fn test_two_pages_long_call() {
        // caller: 100 samples on page 0, callee: 100 samples on page 1.
        // Each page holds half the samples, so miss = 0.5^2 = 0.25 with 2 entries.
        // Caller samples are unattributed: 100 * 0.25; the long call: 100 * 0.25.
        let text = r#"
func caller count=100 {
entry: out=0x0..0x10 count=100
  call @callee
  ret
}
func callee {
entry: out=0x100..0x110
  ret
}
"#;
        let config = MetricsConfig::new().with_page_size(0x100).with_tlb_entries(2);
        let ratio = hit_ratio(text, config).unwrap();
        assert!((ratio - 75.0).abs() < 1e-9, "ratio = {ratio}");
    }

    #[test]
    fn test_empty_function_samples_count_in_total() {
        // The declared function has its own count but no page; it only dilutes the total.
        let text = r#"
declare external count=100
func hot count=100 {
entry: out=0x0..0x10 count=100
  ret
}
"#;
        let config = MetricsConfig::new().with_tlb_entries(1);
        let ratio = hit_ratio(text, config).unwrap();
        // miss = 1 - 100/200 = 0.5, charged on 100 of 200 samples.
        assert!((ratio - 75.0).abs() < 1e-9, "ratio = {ratio}");
    }
}
