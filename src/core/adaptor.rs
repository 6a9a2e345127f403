// This module defines the BinaryAdaptor trait, the bridge between layout-metrics and
// whatever representation of a laid-out binary the host tool maintains. The metric passes
// never see concrete function, block, or instruction types; they only query the adaptor
// through opaque Copy reference handles. The trait exposes the binary-wide relocation mode,
// the function list, per-function layout order and profile/placement/address state, per-block
// output and original address ranges, successor edges paired with branch counts, hot/cold
// classification and execution counts, and finally whether an instruction is a call and
// which function it resolves to. Symbol resolution itself stays on the host side.

//! BinaryAdaptor responsibilities.
//!
//! The adaptor is the glue between the estimators and the host's binary
//! representation. The estimators assume:
//! - Every block belongs to exactly one function.
//! - [`BinaryAdaptor::func_blocks`] yields blocks in their final layout order.
//! - Successors and their branch counts are reported together, so the two
//!   lists can never disagree in length.
//! - Call targets are already resolved to functions where possible.
//!
//! The input is read-only for the whole duration of a report.

use std::hash::Hash;

/// Branch execution count of a successor edge; `None` when the edge has no
/// profile data.
pub type BranchCount = Option<u64>;

/// Bridge between a laid-out binary and the metric passes.
///
/// ```ignore
/// let arena = Bump::new();
/// let session = MetricsSession::new(&arena, MetricsConfig::default())?;
/// let metrics = CacheMetrics::compute(&session, &adaptor);
/// println!("{metrics}");
/// ```
pub trait BinaryAdaptor {
    type FuncRef: Copy + Eq + Hash;
    type BlockRef: Copy + Eq + Hash;
    type InstRef: Copy + Eq;

    /// Whether the output binary as a whole is linked with relocations.
    fn uses_relocations(&self) -> bool;

    /// Iterator over all functions of the binary.
    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_>;

    /// Name of the function (for printing).
    fn func_name(&self, func: Self::FuncRef) -> &str;

    /// Blocks of the function in layout order.
    fn func_blocks(&self, func: Self::FuncRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// First block in layout order, if the function has any.
    fn func_first_block(&self, func: Self::FuncRef) -> Option<Self::BlockRef> {
        self.func_blocks(func).next()
    }

    /// Whether the function was successfully reprocessed into simple form.
    fn func_is_simple(&self, func: Self::FuncRef) -> bool;

    /// Whether execution profile data is attached to the function.
    fn func_has_profile(&self, func: Self::FuncRef) -> bool;

    /// Whether the function was assigned a valid (hot) placement index.
    fn func_has_valid_index(&self, func: Self::FuncRef) -> bool;

    /// Execution count of the function, or 0 when unknown.
    fn func_known_execution_count(&self, func: Self::FuncRef) -> u64;

    /// Base address of the function in the input binary.
    fn func_address(&self, func: Self::FuncRef) -> u64;

    /// Output address range `(start, end)` of the block.
    fn block_output_range(&self, block: Self::BlockRef) -> (u64, u64);

    /// Size of the block in the output binary.
    fn block_output_size(&self, block: Self::BlockRef) -> u64 {
        let (start, end) = self.block_output_range(block);
        end - start
    }

    /// Start of the block in the input, relative to the function address.
    fn block_input_offset(&self, block: Self::BlockRef) -> u64;

    /// Size of the block in the input binary.
    fn block_original_size(&self, block: Self::BlockRef) -> u64;

    /// Whether the block was split out into the cold section.
    fn block_is_cold(&self, block: Self::BlockRef) -> bool;

    /// Execution count of the block, or 0 when unknown.
    fn block_known_execution_count(&self, block: Self::BlockRef) -> u64;

    /// Successor edges of the block together with their branch counts.
    fn block_succs(
        &self,
        block: Self::BlockRef,
    ) -> Box<dyn Iterator<Item = (Self::BlockRef, BranchCount)> + '_>;

    /// Instructions of the block in order.
    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_>;

    /// Whether the instruction is a call.
    fn inst_is_call(&self, inst: Self::InstRef) -> bool;

    /// Function the call instruction resolves to, if any.
    fn call_target(&self, inst: Self::InstRef) -> Option<Self::FuncRef>;

    /// Whether the function has no blocks at all.
    fn func_is_empty(&self, func: Self::FuncRef) -> bool {
        self.func_first_block(func).is_none()
    }
}
