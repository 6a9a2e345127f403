// This test suite validates the full cache metrics report. It pins the exact five-line output
// for the checked-in fixture, checks the hot function and hot block percentages on a program
// where only some functions were placed, and makes sure degenerate inputs (no blocks at all,
// or no samples) render without dividing by zero.

//! Test the cache metrics report.

use bumpalo::Bump;
use layout_metrics::{CacheMetrics, LayoutIR, LayoutIRAdaptor, MetricsConfig, MetricsError, MetricsSession};

fn report(text: &str, config: MetricsConfig) -> CacheMetrics {
    let _ = env_logger::builder().is_test(true).try_init();
    let ir = LayoutIR::parse(text).expect("Failed to parse LIR");
    let adaptor = LayoutIRAdaptor::new(&ir);
    let arena = Bump::new();
    let session = MetricsSession::new(&arena, config).unwrap();
    CacheMetrics::compute(&session, &adaptor)
}

fn read_data(name: &str) -> String {
    std::fs::read_to_string(format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name))
        .expect("Failed to read test data")
}

#[test]
fn test_fixture_report_matches_expected() {
    let metrics = report(&read_data("hot_loop.lir"), MetricsConfig::default());
    let expected = read_data("hot_loop.expected");
    assert_eq!(metrics.to_string(), expected);

    assert_eq!(metrics.num_functions, 4);
    assert_eq!(metrics.num_hot_functions, 2);
    assert_eq!(metrics.num_blocks, 6);
    assert_eq!(metrics.num_hot_blocks, 4);
    assert_eq!(metrics.hot_code_size, 4160);
    assert_eq!(metrics.total_code_size, 1048592);
}

#[test]
fn test_hot_function_share() {
    let mut text = String::new();
    for idx in 0..10u64 {
        let index = if idx < 3 { format!(" index={idx}") } else { String::new() };
        let start = idx * 0x10;
        text.push_str(&format!(
            "func f{idx}{index} {{\nb: out=0x{start:x}..0x{end:x}\n  ret\n}}\n",
            end = start + 0x10
        ));
    }
    let metrics = report(&text, MetricsConfig::default());
    let output = metrics.to_string();

    assert!(
        output.contains("  There are 10 functions; 3 (30.00%) are in the hot section, 0 (0.00%) have profile\n"),
        "{output}"
    );
    assert!(output.contains("  There are 10 basic blocks; 3 (30.00%) are in the hot section\n"));
    assert!(output.contains("  Hot code takes 30.00% of binary (48 bytes out of 160, 0.00 huge pages)\n"));
    assert!(output.contains("  Expected i-TLB cache hit ratio: n/a\n"));
    assert!(output.contains("  TSP score: 0.00% (0 out of 0)\n"));
}

#[test]
fn test_cold_blocks_leave_hot_span() {
    let text = r#"
func f index=0 {
hot: out=0x0..0x100
  jcc ^cold
cold: out=0x300000..0x300100 cold
  ret
}
"#;
    let metrics = report(text, MetricsConfig::new().with_huge_page_size(0x80));
    assert_eq!(metrics.num_hot_blocks, 1);
    assert_eq!(metrics.hot_code_size, 0x100);
    assert_eq!(metrics.total_code_size, 0x300100);
    assert_eq!(metrics.hot_huge_pages(), 2.0);
}

#[test]
fn test_empty_program_report() {
    let metrics = report("", MetricsConfig::default());
    assert_eq!(
        metrics.to_string(),
        "  There are 0 functions; 0 (0.00%) are in the hot section, 0 (0.00%) have profile\n\
         \x20 There are 0 basic blocks\n\
         \x20 Hot code takes 0.00% of binary (0 bytes out of 0, 0.00 huge pages)\n\
         \x20 Expected i-TLB cache hit ratio: n/a\n\
         \x20 TSP score: 0.00% (0 out of 0)\n"
    );
}

#[test]
fn test_declarations_only_report() {
    let metrics = report("declare puts\ndeclare malloc count=3\n", MetricsConfig::default());
    let output = metrics.to_string();
    assert!(output.contains("  There are 2 functions; 0 (0.00%) are in the hot section"));
    assert!(output.contains("  There are 0 basic blocks\n"));
    // Samples exist but no function has a page, so nothing can miss.
    assert!(output.contains("  Expected i-TLB cache hit ratio: 100.00%\n"));
}

#[test]
fn test_zero_page_size_is_rejected_before_compute() {
    let arena = Bump::new();
    for config in [
        MetricsConfig::new().with_page_size(0),
        MetricsConfig::new().with_tlb_entries(0),
        MetricsConfig::new().with_huge_page_size(0),
    ] {
        let err = MetricsSession::new(&arena, config).err().expect("config should be rejected");
        assert!(matches!(err, MetricsError::InvalidConfig { .. }), "{err}");
    }
}
