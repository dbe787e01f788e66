//! On-demand, memoised decomposition of wide nodes into narrow shards and
//! narrow memories into shallow shards.
//!
//! Shardings are computed lazily and cached in side-tables keyed by
//! [`NodeId`], so two look-ups of the same parent return the exact same
//! shard ids — sharding is pure.

use std::collections::HashMap;

use tracing::warn;

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::node::Node;

/// Memoised sharding tables, one instance per pass invocation.
#[derive(Debug, Default)]
pub struct ShardTable {
    narrow: HashMap<NodeId, Vec<NodeId>>,
    catd: HashMap<NodeId, Vec<NodeId>>,
    shallow: HashMap<NodeId, Vec<NodeId>>,
}

impl ShardTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `N(x)`: the narrow shards of a wide (or already-narrow) node,
    /// computing and caching them on first use.
    pub fn narrow_shards(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        cfg: &LoweringConfig,
    ) -> &[NodeId] {
        if !self.narrow.contains_key(&node) {
            let shards = compute_narrow_shards(arena, node, cfg);
            self.narrow.insert(node, shards);
        }
        &self.narrow[&node]
    }

    /// Returns `C(x)`: the CATD (monotonically-growing-width) shards used
    /// only when emitting the debug reassembly chain.
    pub fn catd_shards(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        cfg: &LoweringConfig,
    ) -> &[NodeId] {
        if !self.catd.contains_key(&node) {
            let shards = compute_catd_shards(arena, node, cfg);
            self.catd.insert(node, shards);
        }
        &self.catd[&node]
    }

    /// Returns `S(x)`: the shallow (depth) shards of a narrow memory node.
    pub fn shallow_shards(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        cfg: &LoweringConfig,
    ) -> &[NodeId] {
        if !self.shallow.contains_key(&node) {
            let shards = compute_shallow_shards(arena, node, cfg);
            self.shallow.insert(node, shards);
        }
        &self.shallow[&node]
    }
}

fn shard_widths(width: u32, word: u32) -> Vec<u32> {
    let k = width.div_ceil(word) as usize;
    let mut widths = vec![word; k];
    widths[k - 1] = (width - 1) % word + 1;
    widths
}

fn compute_narrow_shards(arena: &mut NodeArena, node: NodeId, cfg: &LoweringConfig) -> Vec<NodeId> {
    let parent = arena.get(node).clone();
    let word = cfg.word();
    let widths = shard_widths(parent.width, word);
    let k = widths.len();

    (0..k)
        .map(|i| {
            let name = if k == 1 {
                parent.name.clone()
            } else {
                format!("{}.{}", parent.name, i)
            };
            let (name, is_const) = if parent.is_const && i > 0 {
                if i == 1 {
                    warn!(
                        constant = %parent.name,
                        width = parent.width,
                        word,
                        "wide constant truncated to 0 on shards beyond the first"
                    );
                }
                ("0".to_string(), true)
            } else {
                (name, parent.is_const)
            };
            let shard = Node::narrow(name, widths[i], parent.depth, parent.is_mem, is_const, word, false)
                .expect("shard width computed to fit within one word");
            arena.insert(shard)
        })
        .collect()
}

fn compute_catd_shards(arena: &mut NodeArena, node: NodeId, cfg: &LoweringConfig) -> Vec<NodeId> {
    let parent = arena.get(node).clone();
    let word = cfg.word();
    let k = parent.width.div_ceil(word) as usize;

    (0..k)
        .map(|i| {
            let width = ((i as u32 + 1) * word).min(parent.width);
            let last = i == k - 1;
            let name = if last {
                parent.name.clone()
            } else {
                format!("{}.c{}", parent.name, i)
            };
            let mut shard = Node::narrow(name, width, parent.depth, parent.is_mem, false, word, true)
                .expect("CATD shard permitted to exceed word length");
            shard.cycle = parent.cycle;
            arena.insert(shard)
        })
        .collect()
}

fn compute_shallow_shards(arena: &mut NodeArena, node: NodeId, cfg: &LoweringConfig) -> Vec<NodeId> {
    let parent = arena.get(node).clone();
    let max_depth = cfg.depth();

    // Non-memory operands have depth 0, which isn't subject to the depth
    // ceiling at all: pass them through as a single shard rather than
    // running the memory-bank split formula below on a degenerate depth.
    if parent.depth == 0 {
        let shard = parent
            .clone_as_shallow(cfg.word(), max_depth)
            .expect("non-memory operand already satisfies the shallow width invariant");
        return vec![arena.insert(shard)];
    }

    let m = parent.depth.div_ceil(max_depth) as usize;
    let mut depths = vec![max_depth; m];
    depths[m - 1] = (parent.depth - 1) % max_depth + 1;

    (0..m)
        .map(|i| {
            let name = format!("{}.c{}", parent.name, i);
            let shard = Node::shallow(
                name,
                parent.width,
                depths[i],
                parent.is_mem,
                parent.is_const,
                cfg.word(),
                max_depth,
            )
            .expect("shallow shard depth computed to fit within max_depth");
            arena.insert(shard)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatdPolicy;

    fn cfg() -> LoweringConfig {
        LoweringConfig::new(32, 256, CatdPolicy::OnChain).unwrap()
    }

    #[test]
    fn narrow_shard_count_and_widths() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let x = arena.insert(Node::wide("x", 65, 0, false, false));
        let shards = table.narrow_shards(&mut arena, x, &cfg).to_vec();
        assert_eq!(shards.len(), 3);
        assert_eq!(arena.get(shards[0]).width(), 32);
        assert_eq!(arena.get(shards[1]).width(), 32);
        assert_eq!(arena.get(shards[2]).width(), 1);
        assert_eq!(arena.get(shards[0]).name(), "x.0");
        assert_eq!(arena.get(shards[2]).name(), "x.2");
    }

    #[test]
    fn single_shard_keeps_bare_name() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let x = arena.insert(Node::wide("x", 32, 0, false, false));
        let shards = table.narrow_shards(&mut arena, x, &cfg).to_vec();
        assert_eq!(shards.len(), 1);
        assert_eq!(arena.get(shards[0]).name(), "x");
    }

    #[test]
    fn constant_truncates_above_shard_zero() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let c = arena.insert(Node::wide("12345", 96, 0, false, true));
        let shards = table.narrow_shards(&mut arena, c, &cfg).to_vec();
        assert_eq!(shards.len(), 3);
        assert_eq!(arena.get(shards[0]).name(), "12345");
        assert_eq!(arena.get(shards[1]).name(), "0");
        assert_eq!(arena.get(shards[2]).name(), "0");
        assert!(arena.get(shards[1]).is_const());
    }

    #[test]
    fn sharding_is_pure() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let x = arena.insert(Node::wide("x", 64, 0, false, false));
        let first = table.narrow_shards(&mut arena, x, &cfg).to_vec();
        let second = table.narrow_shards(&mut arena, x, &cfg).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn catd_shards_grow_monotonically_and_keep_name_on_last() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let x = arena.insert(Node::wide("d", 70, 0, false, false));
        let shards = table.catd_shards(&mut arena, x, &cfg).to_vec();
        assert_eq!(shards.len(), 3);
        assert_eq!(arena.get(shards[0]).width(), 32);
        assert_eq!(arena.get(shards[1]).width(), 64);
        assert_eq!(arena.get(shards[2]).width(), 70);
        assert_eq!(arena.get(shards[2]).name(), "d");
    }

    #[test]
    fn shallow_shard_count_and_depths() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut table = ShardTable::new();
        let m = arena
            .insert(Node::narrow("mem", 32, 1024, true, false, 32, false).unwrap());
        let shards = table.shallow_shards(&mut arena, m, &cfg).to_vec();
        assert_eq!(shards.len(), 4);
        assert_eq!(arena.get(shards[0]).depth(), 256);
        assert_eq!(arena.get(shards[3]).depth(), 256);
        assert_eq!(arena.get(shards[0]).name(), "mem.c0");
    }
}
