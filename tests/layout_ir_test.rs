// This test suite parses the checked-in LIR fixture and checks the resulting structure: the
// function list in declaration order, block ranges and their defaulted input placement, edge
// counts, and call resolution. It also pins the human-readable dump produced by print() for a
// few representative lines, and makes sure the adaptor view agrees with the raw IR.

//! Test LIR parsing and printing against the fixture.

use layout_metrics::layout_ir::InstKind;
use layout_metrics::{BinaryAdaptor, LayoutIR, LayoutIRAdaptor};

fn fixture() -> LayoutIR {
    let _ = env_logger::builder().is_test(true).try_init();
    let text = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/hot_loop.lir"))
        .expect("Failed to read fixture");
    LayoutIR::parse(&text).expect("Failed to parse LIR")
}

#[test]
fn test_fixture_structure() {
    let ir = fixture();
    assert!(ir.uses_relocations);

    let names: Vec<&str> = ir.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["abort", "main", "work", "init"]);
    assert_eq!(ir.blocks.len(), 6);

    let main = &ir.functions[1];
    assert_eq!(main.address, 0x400000);
    assert_eq!(main.index, Some(0));
    assert_eq!(main.exec_count, Some(10));
    assert!(main.has_profile);
    assert!(!main.simple);

    let blocks: Vec<&str> = ir.func_blocks(main).iter().map(|b| b.name.as_str()).collect();
    assert_eq!(blocks, vec!["entry", "loop", "exit", "error"]);

    let error = &ir.blocks[ir.block_ref("main", "error").unwrap().0 as usize];
    assert!(error.cold);
    assert_eq!(error.exec_count, None);
    assert_eq!(error.input_offset, 0x100000);
    assert_eq!(error.original_size, 16);

    let lp = &ir.blocks[ir.block_ref("main", "loop").unwrap().0 as usize];
    let counts: Vec<Option<u64>> = ir.block_succs(lp).iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![Some(990), Some(10)]);
}

#[test]
fn test_fixture_calls_resolve() {
    let ir = fixture();
    let abort = ir.func_ref("abort").unwrap();
    let error = &ir.blocks[ir.block_ref("main", "error").unwrap().0 as usize];
    let call = &ir.block_insts(error)[0];
    assert_eq!(call.mnemonic, "call");
    assert_eq!(call.kind, InstKind::Call { target: Some(abort.0) });

    let adaptor = LayoutIRAdaptor::new(&ir);
    let init = ir.func_ref("init").unwrap();
    let main = ir.func_ref("main").unwrap();
    let start = adaptor.func_first_block(init).unwrap();
    let targets: Vec<_> = adaptor
        .block_insts(start)
        .filter(|&inst| adaptor.inst_is_call(inst))
        .map(|inst| adaptor.call_target(inst))
        .collect();
    assert_eq!(targets, vec![Some(main)]);

    assert!(adaptor.func_is_empty(abort));
    assert!(!adaptor.func_has_valid_index(init));
    assert_eq!(adaptor.func_known_execution_count(init), 0);
}

#[test]
fn test_fixture_print() {
    let ir = fixture();
    let output = ir.print();

    assert!(output.starts_with("Printing IR\nRelocations\n"));
    assert!(output.contains("Function abort @0x0\n"));
    assert!(output.contains("Function main @0x400000 profile index 0 count 10\n"));
    assert!(output.contains("  Block entry 0x400000..0x400010 in 0x0+16 count 10\n"));
    assert!(output.contains("    Succ loop (990)\n"));
    assert!(output.contains("    Inst call @work\n"));
    assert!(output.contains("  Block error 0x500000..0x500010 in 0x100000+16 cold\n"));
    assert!(output.contains("    Inst ud2\n"));
    assert!(output.contains("Function init @0x480000\n"));
}

#[test]
fn test_reparse_is_stable() {
    let text = r#"
func f addr=0x10 {
a: out=0x10..0x18 count=2
  jcc ^b, ^a:?
b: out=0x18..0x20
  ret
}
"#;
    let first = LayoutIR::parse(text).unwrap();
    let second = LayoutIR::parse(text).unwrap();
    assert_eq!(first, second);
    assert!(first.print().contains("    Succ b (no profile)\n    Succ a (no profile)\n"));
}
