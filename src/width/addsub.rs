//! `ADD`/`SUB` carry and borrow chains.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

/// Lowers a wide `ADD` or `SUB` into a shard-by-shard carry/borrow chain.
///
/// The carry/borrow bit is tracked as a width-1 narrow node throughout;
/// zero-extending it into a shard-width value is simply an `RSH c, 0`
/// whose destination is declared at the shard's width — reading past a
/// narrower source's bits already yields zero by the bit-field convention,
/// so this is zero-extension without needing the carry itself to be
/// shard-width.
pub fn lower_add_sub(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let is_add = matches!(op.opcode, Opcode::Add);
    let word = cfg.word();
    let s = op.sources[0];
    let t = op.sources[1];

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    let s_shards = shards.narrow_shards(arena, s, cfg).to_vec();
    let t_shards = shards.narrow_shards(arena, t, cfg).to_vec();
    let k = d_shards.len();

    let mut out = Vec::new();

    // c0 = s_0 ^ s_0, a known zero.
    let mut carry = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::Xor, carry, vec![s_shards[0], s_shards[0]]));

    for i in 0..k {
        let shard_width = arena.get(d_shards[i]).width();
        let partial = temps.fresh_narrow_word(arena, shard_width, word);
        out.push(Op::new(
            if is_add { Opcode::Add } else { Opcode::Sub },
            partial,
            vec![s_shards[i], t_shards[i]],
        ));

        let carry_ext = temps.fresh_narrow_word(arena, shard_width, word);
        let zero_off = const_node(arena, temps, word, 0);
        out.push(Op::new(Opcode::Rsh, carry_ext, vec![carry, zero_off]));

        let dest_i = d_shards[i];
        out.push(Op::new(
            if is_add { Opcode::Add } else { Opcode::Sub },
            dest_i,
            vec![partial, carry_ext],
        ));

        if i + 1 < k {
            carry = if is_add {
                next_add_carry(arena, temps, word, s_shards[i], t_shards[i], dest_i, &mut out)
            } else {
                next_sub_borrow(arena, temps, word, s_shards[i], t_shards[i], carry, &mut out)
            };
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

#[allow(clippy::too_many_arguments)]
fn next_add_carry(
    arena: &mut NodeArena,
    temps: &mut TempPool,
    word: u32,
    s_i: NodeId,
    t_i: NodeId,
    d_i: NodeId,
    out: &mut Vec<Op>,
) -> NodeId {
    let shard_width = arena.get(s_i).width();
    let and_st = temps.fresh_narrow_word(arena, shard_width, word);
    out.push(Op::new(Opcode::And, and_st, vec![s_i, t_i]));
    let or_st = temps.fresh_narrow_word(arena, shard_width, word);
    out.push(Op::new(Opcode::Or, or_st, vec![s_i, t_i]));
    let not_d = temps.fresh_narrow_word(arena, shard_width, word);
    out.push(Op::new(Opcode::Not, not_d, vec![d_i]));
    let masked = temps.fresh_narrow_word(arena, shard_width, word);
    out.push(Op::new(Opcode::And, masked, vec![or_st, not_d]));
    let combined = temps.fresh_narrow_word(arena, shard_width, word);
    out.push(Op::new(Opcode::Or, combined, vec![and_st, masked]));
    let shift_amt = const_node(arena, temps, word, shard_width - 1);
    let carry = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::Rsh, carry, vec![combined, shift_amt]));
    carry
}

fn next_sub_borrow(
    arena: &mut NodeArena,
    temps: &mut TempPool,
    word: u32,
    s_i: NodeId,
    t_i: NodeId,
    prev_carry: NodeId,
    out: &mut Vec<Op>,
) -> NodeId {
    let carry_here = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::Lt, carry_here, vec![s_i, t_i]));
    let eq = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::Eq, eq, vec![s_i, t_i]));
    let eq_and_c = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::And, eq_and_c, vec![eq, prev_carry]));
    let carry = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(Opcode::Or, carry, vec![carry_here, eq_and_c]));
    carry
}
