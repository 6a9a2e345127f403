// This module reduces the program's call instructions to a simplified inter-procedural
// call graph: for every callee, the list of its callers and the frequency of each call
// site. Every instruction of every block is scanned and calls are kept only when they carry
// information worth modelling. A call without a resolved target, a call from a block that
// never executed, a call to a function without any blocks, and a recursive call back into
// the same function are all dropped, each counted separately in the session statistics.
// Call sites are not merged: two calls from the same caller produce two caller entries.
// Caller lists are bumpalo vectors and the map itself lives in the session arena.

//! Reverse call graph with call frequencies.

use crate::core::adaptor::BinaryAdaptor;
use crate::core::session::{ArenaMap, MetricsSession};
use bumpalo::collections::Vec as BumpVec;

/// One call site arriving at a callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerEdge<F> {
    pub caller: F,
    /// Execution count of the block containing the call.
    pub weight: u64,
}

/// Callee -> callers mapping.
pub struct CallGraph<'arena, F> {
    callers: ArenaMap<'arena, F, BumpVec<'arena, CallerEdge<F>>>,
}

impl<'arena, F> CallGraph<'arena, F>
where
    F: Copy + Eq + std::hash::Hash,
{
    /// Caller entries of a function; empty when nothing calls it.
    pub fn callers(&self, callee: F) -> &[CallerEdge<F>] {
        self.callers.get(&callee).map(|edges| edges.as_slice()).unwrap_or(&[])
    }

    /// Sum of the weights of all calls arriving at a function.
    pub fn incoming_weight(&self, callee: F) -> f64 {
        self.callers(callee).iter().map(|edge| edge.weight as f64).sum()
    }

    /// Number of functions with at least one caller.
    pub fn callee_count(&self) -> usize {
        self.callers.len()
    }

    /// Total number of caller entries.
    pub fn edge_count(&self) -> usize {
        self.callers.values().map(|edges| edges.len()).sum()
    }

    /// Iterate over `(callee, callers)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &[CallerEdge<F>])> + '_ {
        self.callers.iter().map(|(callee, edges)| (*callee, edges.as_slice()))
    }
}

/// Build the reverse call graph of all functions.
pub fn extract_function_calls<'arena, A: BinaryAdaptor>(
    session: &MetricsSession<'arena>,
    adaptor: &A,
) -> CallGraph<'arena, A::FuncRef> {
    let arena = session.arena();
    let mut callers: ArenaMap<'arena, A::FuncRef, BumpVec<'arena, CallerEdge<A::FuncRef>>> = session.new_map();

    let mut call_sites = 0;
    let mut recorded = 0;
    let mut unresolved = 0;
    let mut zero_count = 0;
    let mut empty_target = 0;
    let mut recursive = 0;

    for src in adaptor.funcs() {
        for block in adaptor.func_blocks(src) {
            let count = adaptor.block_known_execution_count(block);
            for inst in adaptor.block_insts(block) {
                if !adaptor.inst_is_call(inst) {
                    continue;
                }
                call_sites += 1;

                let Some(dst) = adaptor.call_target(inst) else {
                    unresolved += 1;
                    continue;
                };
                if count == 0 {
                    zero_count += 1;
                    continue;
                }
                if adaptor.func_is_empty(dst) {
                    empty_target += 1;
                    continue;
                }
                if dst == src {
                    log::trace!("Ignoring recursive call in {}", adaptor.func_name(src));
                    recursive += 1;
                    continue;
                }

                callers
                    .entry(dst)
                    .or_insert_with(|| BumpVec::new_in(arena))
                    .push(CallerEdge { caller: src, weight: count });
                recorded += 1;
            }
        }
    }

    session.update_stats(|stats| {
        stats.call_sites += call_sites;
        stats.calls_recorded += recorded;
        stats.calls_unresolved += unresolved;
        stats.calls_zero_count += zero_count;
        stats.calls_empty_target += empty_target;
        stats.calls_recursive += recursive;
    });
    log::debug!(
        "Call graph: {} call sites, {} recorded into {} callees",
        call_sites,
        recorded,
        callers.len()
    );

    CallGraph { callers }
}

/// Render the call graph with callees in function order.
pub fn print_call_graph<A: BinaryAdaptor>(adaptor: &A, calls: &CallGraph<'_, A::FuncRef>) -> String {
    let mut out = String::from("Call graph\n");
    for func in adaptor.funcs() {
        let edges = calls.callers(func);
        if edges.is_empty() {
            continue;
        }
        out.push_str(&format!("  {} <- ", adaptor.func_name(func)));
        let callers: Vec<String> = edges
            .iter()
            .map(|edge| format!("{} ({})", adaptor.func_name(edge.caller), edge.weight))
            .collect();
        out.push_str(&callers.join(", "));
        out.push('\n');
    }
    out.push_str("End call graph\n");
    out
}
