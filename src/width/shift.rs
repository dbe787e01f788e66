//! `RSH`/`LSH` lowering.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

use super::bitfield::extract_bits;

fn shift_amount(arena: &NodeArena, offset_node: NodeId) -> Result<u32, FloError> {
    let node = arena.get(offset_node);
    node.literal_value()
        .map(|v| v as u32)
        .ok_or_else(|| FloError::NonConstantShiftOffset(node.name().to_string()))
}

/// `RSH`: only constant offsets are supported. For each destination shard,
/// the source window is `[i*W + off, i*W + off + w)`; ranges past the
/// source's high end are zero-filled (handled by [`extract_bits`]).
pub fn lower_rsh(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let src = op.sources[0];
    let off = shift_amount(arena, op.sources[1])?;
    let word = cfg.word();

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    let mut out = Vec::new();
    for (i, &dest_i) in d_shards.iter().enumerate() {
        let w = arena.get(dest_i).width();
        let lo = i as u32 * word + off;
        let (ops, tmp) = extract_bits(arena, shards, temps, cfg, src, lo, w)?;
        out.extend(ops);
        out.push(Op::new(Opcode::Mov, dest_i, vec![tmp]));
    }
    Ok(out)
}

/// `LSH` with a constant offset: output bit `p` comes from source bit
/// `p - off`; bits below 0 are shifted-in zeros.
pub fn lower_lsh_const(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let src = op.sources[0];
    let off = shift_amount(arena, op.sources[1])? as i64;
    let word = cfg.word();

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    let mut out = Vec::new();
    for (i, &dest_i) in d_shards.iter().enumerate() {
        let w = arena.get(dest_i).width();
        let lo = i as i64 * word as i64 - off;
        let (ops, tmp) = lsh_window(arena, shards, temps, cfg, src, lo, w)?;
        out.extend(ops);
        out.push(Op::new(Opcode::Mov, dest_i, vec![tmp]));
    }
    Ok(out)
}

fn lsh_window(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    src: NodeId,
    lo: i64,
    count: u32,
) -> Result<(Vec<Op>, NodeId), FloError> {
    let word = cfg.word();
    if lo >= 0 {
        return extract_bits(arena, shards, temps, cfg, src, lo as u32, count);
    }
    let zero_bits = (-lo) as u32;
    if zero_bits >= count {
        let z = temps.fresh_narrow_word(arena, count, word);
        arena.get_mut(z).is_const = true;
        arena.get_mut(z).name = "0".to_string();
        return Ok((vec![], z));
    }
    let hi_count = count - zero_bits;
    let (mut ops, hi_part) = extract_bits(arena, shards, temps, cfg, src, 0, hi_count)?;
    let zero_part = temps.fresh_narrow_word(arena, zero_bits, word);
    arena.get_mut(zero_part).is_const = true;
    arena.get_mut(zero_part).name = "0".to_string();
    let dest = temps.fresh_narrow_word(arena, count, word);
    ops.push(Op::new(Opcode::Cat, dest, vec![hi_part, zero_part]));
    Ok((ops, dest))
}

/// `LSH` with a non-constant offset: a barrel shifter built from
/// conditional shifts by each power-of-two bit of the shift amount, muxed
/// in. The synthesized wide operations are recursed through
/// [`super::narrow_op`] (Design Note "Recursive lowering").
pub fn lower_lsh_variable(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
    emit_catd: bool,
    depth: u32,
) -> Result<Vec<Op>, FloError> {
    let width = arena.get(op.dest).width();
    let src = op.sources[0];
    let amount = op.sources[1];
    let num_bits = 32 - (width.max(1) - 1).leading_zeros();

    let mut out = Vec::new();
    let mut current = src;
    for j in 0..num_bits {
        let shift_const = temps.fresh_wide_word(arena, width);
        arena.get_mut(shift_const).is_const = true;
        arena.get_mut(shift_const).name = (1u64 << j).to_string();

        let candidate = temps.fresh_wide_word(arena, width);
        let shift_op = Op::new(Opcode::Lsh, candidate, vec![current, shift_const]);

        let bit_const = temps.fresh_wide_word(arena, 1);
        arena.get_mut(bit_const).is_const = true;
        arena.get_mut(bit_const).name = j.to_string();
        let amount_bit = temps.fresh_wide_temp(arena, 1);
        let extract_op = Op::new(Opcode::Rsh, amount_bit, vec![amount, bit_const]);

        let muxed = temps.fresh_wide_word(arena, width);
        let mux_op = Op::new(Opcode::Mux, muxed, vec![amount_bit, candidate, current]);

        for wide_op in [shift_op, extract_op, mux_op] {
            out.extend(super::narrow_op(
                arena, shards, temps, cfg, &wide_op, emit_catd, depth + 1,
            )?);
        }
        current = muxed;
    }

    let final_shards = shards.narrow_shards(arena, current, cfg).to_vec();
    let dest_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    for (d, s) in dest_shards.iter().zip(final_shards.iter()) {
        out.push(Op::new(Opcode::Mov, *d, vec![*s]));
    }
    Ok(out)
}
