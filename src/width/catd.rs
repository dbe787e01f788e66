//! Trailing CATD debug-reassembly chain.
//!
//! After the per-opcode body, glue the destination's narrow shards back
//! together into one wider debug-visible node: shard 0 moves to
//! `catdnode(0)`, each later `catdnode(i)` is `CATD(d_i, catdnode(i-1))`.
//! For `REG` the chain reads `t`'s shards instead of `d`'s.

use crate::arena::NodeArena;
use crate::config::{CatdPolicy, LoweringConfig};
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

/// Whether the trailing CATD chain should be appended for this operation,
/// given the caller's request and the configured policy.
pub fn should_emit(op: &Op, requested: bool, policy: CatdPolicy) -> bool {
    if !requested || matches!(op.opcode, Opcode::In) {
        return false;
    }
    match policy {
        CatdPolicy::None => false,
        CatdPolicy::OnChain => !matches!(op.opcode, Opcode::Wr),
        CatdPolicy::OnChainExceptWr => !matches!(op.opcode, Opcode::Wr),
    }
}

/// Appends the reassembly chain for `op`, reading from `t`'s shards for
/// `REG` and `d`'s shards otherwise. No-ops when there is only one shard.
pub fn emit_chain(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Vec<Op> {
    let source_node = if op.opcode == Opcode::Reg { op.sources[0] } else { op.dest };
    let chain_shards = shards.narrow_shards(arena, source_node, cfg).to_vec();
    if chain_shards.len() <= 1 {
        return Vec::new();
    }

    let word = cfg.word();
    let mut out = Vec::with_capacity(chain_shards.len());
    let mut prev = temps.fresh_narrow_temp(arena, arena.get(chain_shards[0]).width(), word, false);
    out.push(Op::new(Opcode::Mov, prev, vec![chain_shards[0]]));

    for &shard in &chain_shards[1..] {
        let width = arena.get(shard).width() + arena.get(prev).width();
        let next = temps.fresh_narrow_temp(arena, width, word, true);
        out.push(Op::new(Opcode::Catd, next, vec![shard, prev]));
        prev = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeArena;
    use crate::node::Node;

    fn cfg() -> LoweringConfig {
        LoweringConfig::new(32, 256, CatdPolicy::OnChain).unwrap()
    }

    #[test]
    fn wr_is_suppressed_under_either_chain_policy() {
        let mut arena = NodeArena::new();
        let d = arena.insert(Node::wide("d", 64, 0, true, false));
        let op = Op::new(Opcode::Wr, d, vec![]);
        assert!(!should_emit(&op, true, CatdPolicy::OnChain));
        assert!(!should_emit(&op, true, CatdPolicy::OnChainExceptWr));
    }

    #[test]
    fn in_is_always_suppressed() {
        let mut arena = NodeArena::new();
        let d = arena.insert(Node::wide("d", 64, 0, false, false));
        let op = Op::new(Opcode::In, d, vec![]);
        assert!(!should_emit(&op, true, CatdPolicy::OnChain));
    }

    #[test]
    fn chain_glues_shards_in_order() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let d = arena.insert(Node::wide("d", 70, 0, false, false));
        let op = Op::new(Opcode::Add, d, vec![]);
        let chain = emit_chain(&mut arena, &mut shards, &mut temps, &cfg, &op);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].opcode, Opcode::Mov);
        assert_eq!(chain[1].opcode, Opcode::Catd);
        assert_eq!(chain[2].opcode, Opcode::Catd);
    }
}
