//! Layout IR (LIR): a textual description of a laid-out binary.
//!
//! This module provides a small format for feeding the metric passes without
//! a full binary rewriter behind them. It describes exactly what the passes
//! need: functions, blocks with their output and input placement, branch
//! counts on successor edges, and call instructions.
//!
//! # LIR Format
//!
//! ```text
//! ; Comments start with semicolon
//! relocs
//! declare printf
//! func main addr=0x1000 count=10 profile simple index=0 {
//! entry: out=0x1000..0x1010 count=10
//!     call @printf
//!     jcc ^exit:10, ^slow:?
//! slow: out=0x1010..0x1020 cold
//!     jmp ^exit
//! exit: out=0x1020..0x1024
//!     ret
//! }
//! ```
//!
//! `^block:count` operands are successor edges (`?` for no profile), `@name`
//! operands name call targets.

pub mod adaptor;
pub mod parser;

pub use adaptor::{BlockRef, FuncRef, InstRef, LayoutIRAdaptor};

use crate::core::error::MetricsResult;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutIR {
    /// The binary is linked with relocations.
    pub uses_relocations: bool,
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub insts: Vec<Inst>,
    pub succs: Vec<Successor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub address: u64,
    pub simple: bool,
    pub has_profile: bool,
    /// Placement index in the hot section.
    pub index: Option<u32>,
    pub exec_count: Option<u64>,
    pub block_begin_idx: u32,
    pub block_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub output_start: u64,
    pub output_end: u64,
    pub input_offset: u64,
    pub original_size: u64,
    pub exec_count: Option<u64>,
    pub cold: bool,
    pub succ_begin_idx: u32,
    pub succ_end_idx: u32,
    pub inst_begin_idx: u32,
    pub inst_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    pub mnemonic: String,
    pub kind: InstKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstKind {
    Other,
    /// Call; `target` is the function index when the symbol resolved.
    Call { target: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successor {
    pub block: u32,
    pub count: Option<u64>,
}

impl LayoutIR {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> MetricsResult<Self> {
        parser::parse_ir(text)
    }

    /// Handle of the function with the given name.
    pub fn func_ref(&self, name: &str) -> Option<FuncRef> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|idx| FuncRef(idx as u32))
    }

    /// Handle of a block by function and block name.
    pub fn block_ref(&self, func: &str, block: &str) -> Option<BlockRef> {
        let f = &self.functions[self.func_ref(func)?.0 as usize];
        (f.block_begin_idx..f.block_end_idx)
            .find(|&idx| self.blocks[idx as usize].name == block)
            .map(BlockRef)
    }

    pub fn func_blocks(&self, func: &Function) -> &[Block] {
        &self.blocks[func.block_begin_idx as usize..func.block_end_idx as usize]
    }

    pub fn block_insts(&self, block: &Block) -> &[Inst] {
        &self.insts[block.inst_begin_idx as usize..block.inst_end_idx as usize]
    }

    pub fn block_succs(&self, block: &Block) -> &[Successor] {
        &self.succs[block.succ_begin_idx as usize..block.succ_end_idx as usize]
    }

    /// Print the IR in a human-readable format.
    pub fn print(&self) -> String {
        let mut output = String::new();

        output.push_str("Printing IR\n");
        if self.uses_relocations {
            output.push_str("Relocations\n");
        }
        for func in &self.functions {
            output.push_str(&format!("Function {} @0x{:x}", func.name, func.address));
            if func.simple {
                output.push_str(" simple");
            }
            if func.has_profile {
                output.push_str(" profile");
            }
            if let Some(index) = func.index {
                output.push_str(&format!(" index {}", index));
            }
            if let Some(count) = func.exec_count {
                output.push_str(&format!(" count {}", count));
            }
            output.push('\n');

            for block in self.func_blocks(func) {
                output.push_str(&format!(
                    "  Block {} 0x{:x}..0x{:x} in 0x{:x}+{}",
                    block.name, block.output_start, block.output_end, block.input_offset, block.original_size
                ));
                if let Some(count) = block.exec_count {
                    output.push_str(&format!(" count {}", count));
                }
                if block.cold {
                    output.push_str(" cold");
                }
                output.push('\n');

                for succ in self.block_succs(block) {
                    let target = &self.blocks[succ.block as usize].name;
                    match succ.count {
                        Some(count) => output.push_str(&format!("    Succ {} ({})\n", target, count)),
                        None => output.push_str(&format!("    Succ {} (no profile)\n", target)),
                    }
                }

                for inst in self.block_insts(block) {
                    match inst.kind {
                        InstKind::Call { target: Some(target) } => output.push_str(&format!(
                            "    Inst {} @{}\n",
                            inst.mnemonic, self.functions[target as usize].name
                        )),
                        InstKind::Call { target: None } => {
                            output.push_str(&format!("    Inst {} (unresolved)\n", inst.mnemonic))
                        }
                        InstKind::Other => output.push_str(&format!("    Inst {}\n", inst.mnemonic)),
                    }
                }
            }
        }

        output
    }
}
