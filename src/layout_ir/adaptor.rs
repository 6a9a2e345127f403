//! LayoutIR adaptor implementation.
//!
//! Lets the metric passes run directly on a parsed [`LayoutIR`] module.

use super::{InstKind, LayoutIR};
use crate::core::adaptor::{BinaryAdaptor, BranchCount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef(pub u32);

/// Adaptor that implements BinaryAdaptor for LayoutIR
pub struct LayoutIRAdaptor<'ir> {
    ir: &'ir LayoutIR,
}

impl<'ir> LayoutIRAdaptor<'ir> {
    pub fn new(ir: &'ir LayoutIR) -> Self {
        Self { ir }
    }
}

impl<'ir> BinaryAdaptor for LayoutIRAdaptor<'ir> {
    type FuncRef = FuncRef;
    type BlockRef = BlockRef;
    type InstRef = InstRef;

    fn uses_relocations(&self) -> bool {
        self.ir.uses_relocations
    }

    fn funcs(&self) -> Box<dyn Iterator<Item = FuncRef> + '_> {
        Box::new((0..self.ir.functions.len() as u32).map(FuncRef))
    }

    fn func_name(&self, func: FuncRef) -> &str {
        &self.ir.functions[func.0 as usize].name
    }

    fn func_blocks(&self, func: FuncRef) -> Box<dyn Iterator<Item = BlockRef> + '_> {
        let f = &self.ir.functions[func.0 as usize];
        Box::new((f.block_begin_idx..f.block_end_idx).map(BlockRef))
    }

    fn func_is_simple(&self, func: FuncRef) -> bool {
        self.ir.functions[func.0 as usize].simple
    }

    fn func_has_profile(&self, func: FuncRef) -> bool {
        self.ir.functions[func.0 as usize].has_profile
    }

    fn func_has_valid_index(&self, func: FuncRef) -> bool {
        self.ir.functions[func.0 as usize].index.is_some()
    }

    fn func_known_execution_count(&self, func: FuncRef) -> u64 {
        self.ir.functions[func.0 as usize].exec_count.unwrap_or(0)
    }

    fn func_address(&self, func: FuncRef) -> u64 {
        self.ir.functions[func.0 as usize].address
    }

    fn block_output_range(&self, block: BlockRef) -> (u64, u64) {
        let b = &self.ir.blocks[block.0 as usize];
        (b.output_start, b.output_end)
    }

    fn block_input_offset(&self, block: BlockRef) -> u64 {
        self.ir.blocks[block.0 as usize].input_offset
    }

    fn block_original_size(&self, block: BlockRef) -> u64 {
        self.ir.blocks[block.0 as usize].original_size
    }

    fn block_is_cold(&self, block: BlockRef) -> bool {
        self.ir.blocks[block.0 as usize].cold
    }

    fn block_known_execution_count(&self, block: BlockRef) -> u64 {
        self.ir.blocks[block.0 as usize].exec_count.unwrap_or(0)
    }

    fn block_succs(&self, block: BlockRef) -> Box<dyn Iterator<Item = (BlockRef, BranchCount)> + '_> {
        let b = &self.ir.blocks[block.0 as usize];
        Box::new(
            self.ir.block_succs(b)
                .iter()
                .map(|succ| (BlockRef(succ.block), succ.count)),
        )
    }

    fn block_insts(&self, block: BlockRef) -> Box<dyn Iterator<Item = InstRef> + '_> {
        let b = &self.ir.blocks[block.0 as usize];
        Box::new((b.inst_begin_idx..b.inst_end_idx).map(InstRef))
    }

    fn inst_is_call(&self, inst: InstRef) -> bool {
        matches!(self.ir.insts[inst.0 as usize].kind, InstKind::Call { .. })
    }

    fn call_target(&self, inst: InstRef) -> Option<FuncRef> {
        match self.ir.insts[inst.0 as usize].kind {
            InstKind::Call { target } => target.map(FuncRef),
            InstKind::Other => None,
        }
    }
}
