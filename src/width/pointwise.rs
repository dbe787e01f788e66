//! Pointwise Boolean/select lowering:
//! `AND, OR, XOR, NOT, MOV, MUX, OUT, REG, IN, RD, WR`.
//!
//! For each destination shard, emit the same opcode over the matching
//! shard of every source — except sources of width 1 (selects, enables),
//! which are always read from shard 0 regardless of the destination
//! shard index. `REG` additionally gets a synthesized constant-1 enable
//! prepended to its source list.

use crate::arena::NodeArena;
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

pub fn lower_pointwise(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let word = cfg.word();
    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();

    let mut source_shards: Vec<Vec<_>> = Vec::with_capacity(op.sources.len() + 1);
    for &src in &op.sources {
        if arena.get(src).width() == 1 {
            source_shards.push(vec![src]);
        } else {
            source_shards.push(shards.narrow_shards(arena, src, cfg).to_vec());
        }
    }

    if op.opcode == Opcode::Reg {
        let one = temps.fresh_narrow_word(arena, 1, word);
        arena.get_mut(one).is_const = true;
        arena.get_mut(one).name = "1".to_string();
        source_shards.insert(0, vec![one]);
    }

    let mut out = Vec::with_capacity(d_shards.len());
    for (i, &dest_i) in d_shards.iter().enumerate() {
        let srcs = source_shards
            .iter()
            .map(|shard_list| if shard_list.len() == 1 { shard_list[0] } else { shard_list[i] })
            .collect();
        out.push(Op::new(op.opcode, dest_i, srcs));
    }
    Ok(out)
}
