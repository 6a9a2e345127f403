// This module builds the block address table shared by the TSP scorer and the i-TLB
// estimator. Every function is first classified by address_mode(): a function that was
// reprocessed into simple form, or any function of a binary linked with relocations, is
// measured at its output addresses and output sizes. Otherwise the body was left untouched
// at its original location, and the input offset of each block (relative to the function)
// plus the function's base address, together with the original block size, describe where
// the code really lives. The table is an arena-allocated hashbrown map from block handle to
// BlockExtent and holds exactly one entry per block of the function list.

//! Block address/size table.

use crate::core::adaptor::BinaryAdaptor;
use crate::core::session::{ArenaMap, MetricsSession};
use std::fmt;

/// Which addressing regime describes a function's blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Addresses and sizes as emitted in the output binary.
    Output,
    /// Original input addresses; the body was kept in place.
    Input,
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressMode::Output => write!(f, "output"),
            AddressMode::Input => write!(f, "input"),
        }
    }
}

/// Resolve the addressing regime of a function.
pub fn address_mode<A: BinaryAdaptor>(adaptor: &A, func: A::FuncRef, uses_relocations: bool) -> AddressMode {
    if adaptor.func_is_simple(func) || uses_relocations {
        AddressMode::Output
    } else {
        AddressMode::Input
    }
}

/// Address and size of a block in the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockExtent {
    pub addr: u64,
    pub size: u64,
}

impl BlockExtent {
    /// First address past the block.
    pub fn end(&self) -> u64 {
        self.addr.saturating_add(self.size)
    }
}

/// Mapping from every block to its extent.
pub struct AddressTable<'arena, B> {
    extents: ArenaMap<'arena, B, BlockExtent>,
}

impl<'arena, B> AddressTable<'arena, B>
where
    B: Copy + Eq + std::hash::Hash,
{
    /// Extent of a block.
    ///
    /// Panics if the block was not part of the function list the table was
    /// built from.
    pub fn extent(&self, block: B) -> BlockExtent {
        match self.extents.get(&block) {
            Some(extent) => *extent,
            None => panic!("block missing from address table"),
        }
    }

    pub fn addr(&self, block: B) -> u64 {
        self.extent(block).addr
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }
}

/// Build the address table for all blocks of all functions.
pub fn extract_block_info<'arena, A: BinaryAdaptor>(
    session: &MetricsSession<'arena>,
    adaptor: &A,
) -> AddressTable<'arena, A::BlockRef> {
    let uses_relocations = adaptor.uses_relocations();
    let mut extents = session.new_map();
    let mut output_blocks = 0;
    let mut input_blocks = 0;

    for func in adaptor.funcs() {
        let mode = address_mode(adaptor, func, uses_relocations);
        for block in adaptor.func_blocks(func) {
            let extent = match mode {
                AddressMode::Output => {
                    output_blocks += 1;
                    BlockExtent {
                        addr: adaptor.block_output_range(block).0,
                        size: adaptor.block_output_size(block),
                    }
                }
                AddressMode::Input => {
                    input_blocks += 1;
                    BlockExtent {
                        addr: adaptor.block_input_offset(block).saturating_add(adaptor.func_address(func)),
                        size: adaptor.block_original_size(block),
                    }
                }
            };
            extents.insert(block, extent);
        }
    }

    session.update_stats(|stats| {
        stats.blocks_output_mode += output_blocks;
        stats.blocks_input_mode += input_blocks;
    });
    log::debug!(
        "Address table: {} blocks ({} output, {} input)",
        extents.len(),
        output_blocks,
        input_blocks
    );

    AddressTable { extents }
}

/// Render the address table in function and layout order.
pub fn print_address_table<A: BinaryAdaptor>(adaptor: &A, table: &AddressTable<'_, A::BlockRef>) -> String {
    let uses_relocations = adaptor.uses_relocations();
    let mut out = String::from("Address table\n");
    for func in adaptor.funcs() {
        let mode = address_mode(adaptor, func, uses_relocations);
        out.push_str(&format!("  Function {} ({})\n", adaptor.func_name(func), mode));
        for (idx, block) in adaptor.func_blocks(func).enumerate() {
            let extent = table.extent(block);
            out.push_str(&format!(
                "    {}: 0x{:x}..0x{:x} ({} bytes)\n",
                idx,
                extent.addr,
                extent.end(),
                extent.size
            ));
        }
    }
    out.push_str("End address table\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MetricsConfig;
    use crate::layout_ir::{LayoutIR, LayoutIRAdaptor};
    use bumpalo::Bump;

    const TWO_MODES: &str = r#"
func moved addr=0x1000 simple {
a: out=0x5000..0x5010 in=0x0 size=12
  ret
}
func kept addr=0x2000 {
b: out=0x6000..0x6020 in=0x8 size=24
  ret
}
"#;

    #[test]
    fn test_mode_is_resolved_per_function() {
        let ir = LayoutIR::parse(TWO_MODES).unwrap();
        let adaptor = LayoutIRAdaptor::new(&ir);
        let arena = Bump::new();
        let session = MetricsSession::new(&arena, MetricsConfig::default()).unwrap();
        let table = extract_block_info(&session, &adaptor);

        let funcs: Vec<_> = adaptor.funcs().collect();
        assert_eq!(address_mode(&adaptor, funcs[0], false), AddressMode::Output);
        assert_eq!(address_mode(&adaptor, funcs[1], false), AddressMode::Input);

        let a = adaptor.func_first_block(funcs[0]).unwrap();
        let b = adaptor.func_first_block(funcs[1]).unwrap();
        assert_eq!(table.extent(a), BlockExtent { addr: 0x5000, size: 0x10 });
        assert_eq!(table.extent(b), BlockExtent { addr: 0x2008, size: 24 });

        let stats = session.stats();
        assert_eq!(stats.blocks_output_mode, 1);
        assert_eq!(stats.blocks_input_mode, 1);
    }

    #[test]
    fn test_relocations_force_output_mode() {
        let text = format!("relocs\n{}", TWO_MODES);
        let ir = LayoutIR::parse(&text).unwrap();
        let adaptor = LayoutIRAdaptor::new(&ir);
        let arena = Bump::new();
        let session = MetricsSession::new(&arena, MetricsConfig::default()).unwrap();
        let table = extract_block_info(&session, &adaptor);

        let kept = adaptor.funcs().nth(1).unwrap();
        let b = adaptor.func_first_block(kept).unwrap();
        assert_eq!(table.extent(b), BlockExtent { addr: 0x6000, size: 0x20 });
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "missing from address table")]
    fn test_missing_block_panics() {
        let ir = LayoutIR::parse(TWO_MODES).unwrap();
        let adaptor = LayoutIRAdaptor::new(&ir);
        let arena = Bump::new();
        let session = MetricsSession::new(&arena, MetricsConfig::default()).unwrap();
        let table = extract_block_info(&session, &adaptor);
        table.extent(crate::layout_ir::BlockRef(99));
    }
}
