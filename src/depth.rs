//! Depth lowering (`split_mem`).
//!
//! `split_mem(op, D) -> [shallow_op]` rewrites a depth-illegal memory
//! operation into depth-legal operations over `D`-deep sub-memories. The
//! fast path covers operations whose memory operands already fit within
//! `D`; the wide path handles `RD` (address-steered mux chain) and `WR`
//! (enable-masked fanout).

use crate::arena::NodeArena;
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

pub fn split_mem(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let max_depth = cfg.depth();
    let dest_depth = arena.get(op.dest).depth();
    let needs_split =
        dest_depth > max_depth || op.sources.iter().any(|&s| arena.get(s).depth() > max_depth);

    if !needs_split {
        let dest = shards.shallow_shards(arena, op.dest, cfg)[0];
        let sources = op
            .sources
            .iter()
            .map(|&s| shards.shallow_shards(arena, s, cfg)[0])
            .collect();
        return Ok(vec![Op::new(op.opcode, dest, sources)]);
    }

    match op.opcode {
        Opcode::Rd => lower_rd(arena, shards, temps, cfg, op),
        Opcode::Wr => lower_wr(arena, shards, temps, cfg, op),
        _ => Err(FloError::UnsupportedOpcode(op.opcode, op.dest.to_string())),
    }
}

fn bank_index_const(
    arena: &mut NodeArena,
    temps: &mut TempPool,
    word: u32,
    width: u32,
    i: usize,
) -> crate::arena::NodeId {
    let n = temps.fresh_shallow_temp(arena, width, word, 1);
    arena.get_mut(n).is_const = true;
    arena.get_mut(n).name = i.to_string();
    n
}

fn lower_rd(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let word = cfg.word();
    let mem = op.sources[0];
    let addr = op.sources[1];
    let addr_width = arena.get(addr).width();
    let addr_bits = cfg.depth_addr_bits();

    let mem_shards = shards.shallow_shards(arena, mem, cfg).to_vec();
    let mut out = Vec::new();

    let bits_const = bank_index_const(arena, temps, word, word, addr_bits as usize);
    let a_hi = temps.fresh_shallow_word(arena, addr_width, word, 1);
    out.push(Op::new(Opcode::Rsh, a_hi, vec![addr, bits_const]));

    let zero_const = bank_index_const(arena, temps, word, word, 0);
    let a_lo = temps.fresh_shallow_word(arena, addr_bits, word, 1);
    out.push(Op::new(Opcode::Rsh, a_lo, vec![addr, zero_const]));

    let mut acc = None;
    for (i, &mem_i) in mem_shards.iter().enumerate() {
        let r_i = temps.fresh_shallow_temp(arena, arena.get(op.dest).width(), word, cfg.depth());
        out.push(Op::new(Opcode::Rd, r_i, vec![mem_i, a_lo]));

        acc = Some(match acc {
            None => r_i,
            Some(prev) => {
                let i_const = bank_index_const(arena, temps, word, addr_width, i);
                let match_i = temps.fresh_shallow_temp(arena, 1, word, 1);
                out.push(Op::new(Opcode::Eq, match_i, vec![a_hi, i_const]));
                let next = temps.fresh_shallow_temp(arena, arena.get(op.dest).width(), word, cfg.depth());
                out.push(Op::new(Opcode::Mux, next, vec![match_i, r_i, prev]));
                next
            }
        });
    }

    out.push(Op::new(Opcode::Mov, op.dest, vec![acc.expect("memory has at least one shard")]));
    Ok(out)
}

fn lower_wr(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let word = cfg.word();
    let enable = op.sources[0];
    let mem = op.sources[1];
    let addr = op.sources[2];
    let value = op.sources[3];
    let addr_bits = cfg.depth_addr_bits();

    let mem_shards = shards.shallow_shards(arena, mem, cfg).to_vec();
    let mut out = Vec::new();

    let addr_width = arena.get(addr).width();
    let bits_const = bank_index_const(arena, temps, word, word, addr_bits as usize);
    let a_hi = temps.fresh_shallow_word(arena, addr_width, word, 1);
    out.push(Op::new(Opcode::Rsh, a_hi, vec![addr, bits_const]));

    let zero_const = bank_index_const(arena, temps, word, word, 0);
    let a_lo = temps.fresh_shallow_word(arena, addr_bits, word, 1);
    out.push(Op::new(Opcode::Rsh, a_lo, vec![addr, zero_const]));

    for (i, &mem_i) in mem_shards.iter().enumerate() {
        let i_const = bank_index_const(arena, temps, word, addr_width, i);
        let match_i = temps.fresh_shallow_temp(arena, 1, word, 1);
        out.push(Op::new(Opcode::Eq, match_i, vec![a_hi, i_const]));
        let enable_i = temps.fresh_shallow_temp(arena, 1, word, 1);
        out.push(Op::new(Opcode::And, enable_i, vec![match_i, enable]));
        out.push(Op::new(Opcode::Wr, mem_i, vec![enable_i, a_lo, value]));
    }
    Ok(out)
}
