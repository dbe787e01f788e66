//! Bit-field extract: the helper shared by shift, CAT, and MUL lowering to
//! pull a contiguous `[offset, offset + count)` bit window out of a wide
//! source into a narrow destination.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

/// Extracts `count` bits of `src` starting at bit `offset` into a fresh
/// narrow node, returning the ops that compute it and the destination id.
///
/// `count` must be `<= cfg.word()`; the window then spans at most two
/// narrow shards of `src`. Callers never produce non-contiguous windows
/// wider than that with a legal word length.
pub fn extract_bits(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    src: NodeId,
    offset: u32,
    count: u32,
) -> Result<(Vec<Op>, NodeId), FloError> {
    let word = cfg.word();
    if count > word {
        return Err(FloError::NonContiguousExtract {
            offset,
            count,
            width: arena.get(src).width(),
        });
    }
    if count == 0 {
        let zero = temps.fresh_narrow_word(arena, 1, word);
        arena.get_mut(zero).is_const = true;
        arena.get_mut(zero).name = "0".to_string();
        return Ok((vec![], zero));
    }

    let src_shards = shards.narrow_shards(arena, src, cfg).to_vec();
    let lo_shard_idx = (offset / word) as usize;
    let hi_shard_idx = ((offset + count - 1) / word) as usize;

    if lo_shard_idx == hi_shard_idx {
        let local_off = offset % word;
        let (op, dest) = single_window(arena, temps, word, &src_shards, lo_shard_idx, local_off, count);
        return Ok((op.into_iter().collect(), dest));
    }

    // Straddles two shards: low part from the tail of the low shard, high
    // part from the head of the next shard, glued with CAT.
    let local_off = offset % word;
    let low_count = word - local_off;
    let high_count = count - low_count;

    let (low_op, low_dest) = single_window(arena, temps, word, &src_shards, lo_shard_idx, local_off, low_count);
    let (high_op, high_dest) = single_window(arena, temps, word, &src_shards, hi_shard_idx, 0, high_count);

    let dest = temps.fresh_narrow_word(arena, count, word);
    let cat_op = Op::new(Opcode::Cat, dest, vec![high_dest, low_dest]);

    let mut ops: Vec<Op> = low_op.into_iter().chain(high_op).collect();
    ops.push(cat_op);

    Ok((ops, dest))
}

/// Builds one `RSH` op extracting `count` bits starting at `local_off`
/// within `shards[idx]`, or a bare constant `0` node with no computing op
/// if `idx` is out of range: reads off the high end of a value are filled
/// with constant 0.
fn single_window(
    arena: &mut NodeArena,
    temps: &mut TempPool,
    word: u32,
    shards: &[NodeId],
    idx: usize,
    local_off: u32,
    count: u32,
) -> (Option<Op>, NodeId) {
    let out_of_range = idx >= shards.len() || {
        let shard_width = arena.get(shards[idx]).width();
        local_off >= shard_width
    };
    if out_of_range {
        let dest = temps.fresh_narrow_word(arena, count, word);
        arena.get_mut(dest).is_const = true;
        arena.get_mut(dest).name = "0".to_string();
        return (None, dest);
    }
    let dest = temps.fresh_narrow_word(arena, count, word);
    let shard = shards[idx];
    let off_const = temps.fresh_narrow_word(arena, word, word);
    arena.get_mut(off_const).is_const = true;
    arena.get_mut(off_const).name = local_off.to_string();
    (Some(Op::new(Opcode::Rsh, dest, vec![shard, off_const])), dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatdPolicy;
    use crate::node::Node;

    fn cfg() -> LoweringConfig {
        LoweringConfig::new(32, 256, CatdPolicy::OnChain).unwrap()
    }

    #[test]
    fn single_shard_window() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 64, 0, false, false));
        let (ops, dest) = extract_bits(&mut arena, &mut shards, &mut temps, &cfg, s, 4, 8).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(arena.get(dest).width(), 8);
    }

    #[test]
    fn straddling_window() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 64, 0, false, false));
        let (ops, dest) = extract_bits(&mut arena, &mut shards, &mut temps, &cfg, s, 24, 16).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(arena.get(dest).width(), 16);
    }

    #[test]
    fn out_of_range_yields_constant_zero() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 40, 0, false, false));
        let (_, dest) = extract_bits(&mut arena, &mut shards, &mut temps, &cfg, s, 64, 8).unwrap();
        assert!(arena.get(dest).is_const());
        assert_eq!(arena.get(dest).name(), "0");
    }
}
