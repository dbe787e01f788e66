//! `LOG2` lowering (bit-length).
//!
//! Each shard's local `LOG2` gives the position of its own highest set bit;
//! adding that shard's base bit offset (`i * W`) gives the position within
//! the whole wide value. The overall result is the offset from the highest
//! shard that isn't all-zero, selected with a chain of muxes scanned from
//! the least to the most significant shard.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

pub fn lower_log2(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let word = cfg.word();
    let src = op.sources[0];
    let s_shards = shards.narrow_shards(arena, src, cfg).to_vec();
    let k = s_shards.len();

    let mut out = Vec::new();
    let mut per_shard_offset = Vec::with_capacity(k);
    let mut per_shard_nonzero = Vec::with_capacity(k);

    for (i, &s_i) in s_shards.iter().enumerate() {
        let local = temps.fresh_narrow_word(arena, word, word);
        out.push(Op::new(Opcode::Log2, local, vec![s_i]));

        let offset = if i == 0 {
            local
        } else {
            let base_const = const_node(arena, temps, word, i as u32 * word);
            let combined = temps.fresh_narrow_word(arena, word, word);
            out.push(Op::new(Opcode::Add, combined, vec![local, base_const]));
            combined
        };
        per_shard_offset.push(offset);

        let zero = const_node(arena, temps, word, 0);
        let nonzero = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(Opcode::Neq, nonzero, vec![s_i, zero]));
        per_shard_nonzero.push(nonzero);
    }

    let mut acc = per_shard_offset[0];
    for i in 1..k {
        let next = temps.fresh_narrow_word(arena, word, word);
        out.push(Op::new(
            Opcode::Mux,
            next,
            vec![per_shard_nonzero[i], per_shard_offset[i], acc],
        ));
        acc = next;
    }

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    out.push(Op::new(Opcode::Mov, d_shards[0], vec![acc]));

    if d_shards.len() > 1 {
        // Sign-extend acc across the remaining shards: pull out its top
        // bit and broadcast it to all-ones or all-zero the same way
        // addsub.rs turns a single carry bit into a shard-width value, via
        // a SUB from zero rather than zero-extension.
        let sign_shift = const_node(arena, temps, word, word - 1);
        let sign_bit = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(Opcode::Rsh, sign_bit, vec![acc, sign_shift]));

        let zero = const_node(arena, temps, word, 0);
        let sign_ext = temps.fresh_narrow_word(arena, word, word);
        out.push(Op::new(Opcode::Sub, sign_ext, vec![zero, sign_bit]));

        for &extra in &d_shards[1..] {
            out.push(Op::new(Opcode::Mov, extra, vec![sign_ext]));
        }
    }

    Ok(out)
}

fn const_node(arena: &mut NodeArena, temps: &mut TempPool, word: u32, value: u32) -> NodeId {
    let n = temps.fresh_narrow_word(arena, word, word);
    arena.get_mut(n).is_const = true;
    arena.get_mut(n).name = value.to_string();
    n
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
    fn log2_scans_shards_high_to_low_priority() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 64, 0, false, false));
        let d = arena.insert(Node::wide("d", 32, 0, false, false));
        let op = Op::new(Opcode::Log2, d, vec![s]);
        let lowered = lower_log2(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();
        assert_eq!(lowered.iter().filter(|o| o.opcode == Opcode::Log2).count(), 2);
        assert!(lowered.iter().any(|o| o.opcode == Opcode::Mux));
    }

    #[test]
    fn multi_shard_destination_sign_extends_past_the_first_shard() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 32, 0, false, false));
        let d = arena.insert(Node::wide("d", 64, 0, false, false));
        let op = Op::new(Opcode::Log2, d, vec![s]);
        let lowered = lower_log2(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();

        let d_shards = shards.narrow_shards(&mut arena, d, &cfg).to_vec();
        assert_eq!(d_shards.len(), 2);

        // The extra shard is fed from a SUB-derived sign broadcast, not a
        // bare zero constant.
        assert!(lowered.iter().any(|o| o.opcode == Opcode::Sub));
        let extra_mov = lowered
            .iter()
            .find(|o| o.opcode == Opcode::Mov && o.dest == d_shards[1])
            .unwrap();
        assert!(!arena.get(extra_mov.sources[0]).is_const());
    }
}
