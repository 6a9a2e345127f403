//! Command-line front end for the cache metrics report.
//!
//! Reads a layout IR file (or stdin) and prints the metrics summary.

use bumpalo::Bump;
use clap::Parser;
use layout_metrics::metrics::{extract_block_info, extract_function_calls, print_address_table, print_call_graph};
use layout_metrics::{CacheMetrics, LayoutIR, LayoutIRAdaptor, MetricsConfig, MetricsResult, MetricsSession};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "layout-metrics", version, about = "Estimate i-cache and i-TLB quality of a code layout")]
struct Args {
    /// Layout IR file to read; stdin when omitted
    input: Option<PathBuf>,

    /// Page size of the modelled i-TLB in bytes
    #[arg(long, default_value_t = layout_metrics::core::config::DEFAULT_ITLB_PAGE_SIZE)]
    itlb_page_size: u64,

    /// Number of resident i-TLB entries
    #[arg(long, default_value_t = layout_metrics::core::config::DEFAULT_ITLB_ENTRIES)]
    itlb_entries: u32,

    /// Huge page size in bytes
    #[arg(long, default_value_t = layout_metrics::core::config::DEFAULT_HUGE_PAGE_SIZE)]
    huge_page_size: u64,

    /// Print the parsed input
    #[arg(long)]
    print_ir: bool,

    /// Print the block address table
    #[arg(long)]
    print_addresses: bool,

    /// Print the reverse call graph
    #[arg(long)]
    print_calls: bool,
}

fn read_input(input: Option<&PathBuf>) -> MetricsResult<String> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(text)
}

fn run(args: &Args) -> MetricsResult<()> {
    let config = MetricsConfig::new()
        .with_page_size(args.itlb_page_size)
        .with_tlb_entries(args.itlb_entries)
        .with_huge_page_size(args.huge_page_size);

    let text = read_input(args.input.as_ref())?;
    let ir = LayoutIR::parse(&text)?;
    let adaptor = LayoutIRAdaptor::new(&ir);

    if args.print_ir {
        print!("{}", ir.print());
    }

    let arena = Bump::new();
    let session = MetricsSession::new(&arena, config)?;

    if args.print_addresses || args.print_calls {
        let debug_session = MetricsSession::new(&arena, config)?;
        if args.print_addresses {
            let table = extract_block_info(&debug_session, &adaptor);
            print!("{}", print_address_table(&adaptor, &table));
        }
        if args.print_calls {
            let calls = extract_function_calls(&debug_session, &adaptor);
            print!("{}", print_call_graph(&adaptor, &calls));
        }
    }

    let metrics = CacheMetrics::compute(&session, &adaptor);
    print!("{}", metrics);
    log::debug!("{}", session.stats());
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
