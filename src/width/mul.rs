//! `MUL` lowering (netlist component design, "Multiplication").
//!
//! The base primitive is single-word-to-double-word: split each operand
//! into low/high half-words, form the four cross products at full width,
//! and sum the shifted products. That primitive alone only covers operands
//! that already fit in one word. The concrete scenario this pass must
//! support (`MUL` of two 64-bit operands at `W = 32`) needs operands wider
//! than that, so operands over one word are first brought down to
//! word-size by the same halving idea one level up: each half becomes a
//! wide `RSH` extraction and each cross product a new wide `MUL`, both fed
//! back through [`super::narrow_op`] (Design Note "Recursive lowering"),
//! until the halves are word-sized and the base primitive applies. See
//! `DESIGN.md` for why this reading was chosen over the letter of
//! "single-word-to-double-word" alone.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::node::Node;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

use super::bitfield::extract_bits;

#[allow(clippy::too_many_arguments)]
pub fn lower_mul(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
    emit_catd: bool,
    depth: u32,
) -> Result<Vec<Op>, FloError> {
    let s = op.sources[0];
    let t = op.sources[1];
    let sw = arena.get(s).width();
    let tw = arena.get(t).width();
    if sw != tw {
        return Err(FloError::MulWidthMismatch(sw, tw));
    }
    let dest_width = arena.get(op.dest).width();

    let (mut ops, product) = mul_tree(arena, shards, temps, cfg, s, t, sw, dest_width, emit_catd, depth)?;

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    let p_shards = shards.narrow_shards(arena, product, cfg).to_vec();
    for (d, p) in d_shards.iter().zip(p_shards.iter()) {
        ops.push(Op::new(Opcode::Mov, *d, vec![*p]));
    }
    Ok(ops)
}

/// Builds the wide product tree for two equal-width operands, returning the
/// ops that compute it and the id of a wide node holding `dest_width` bits
/// of the result.
#[allow(clippy::too_many_arguments)]
fn mul_tree(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    s: NodeId,
    t: NodeId,
    width: u32,
    dest_width: u32,
    emit_catd: bool,
    depth: u32,
) -> Result<(Vec<Op>, NodeId), FloError> {
    if depth > super::MAX_RECURSION {
        return Err(FloError::RecursionLimitExceeded);
    }
    let word = cfg.word();
    let mut out = Vec::new();

    if width <= 1 {
        let dest = arena.insert(Node::wide(format!("{}.mulresult", arena.get(s).name()), 1, 0, false, false));
        out.push(Op::new(Opcode::And, dest, vec![s, t]));
        return Ok((out, dest));
    }

    let half = width / 2;
    let hi_width = width - half;

    // Splits into halves. Below one word, this is the base half-word split
    // and the cross products are already narrow-legal (no further
    // recursion needed for them). Above one word, the halves are still
    // wide and the split is a wide RSH extraction instead.
    let (sl, sh, tl, th, mut ops) = if width <= word {
        let (sl_ops, sl) = extract_bits(arena, shards, temps, cfg, s, 0, half)?;
        let (sh_ops, sh) = extract_bits(arena, shards, temps, cfg, s, half, hi_width)?;
        let (tl_ops, tl) = extract_bits(arena, shards, temps, cfg, t, 0, half)?;
        let (th_ops, th) = extract_bits(arena, shards, temps, cfg, t, half, hi_width)?;
        let mut ops = sl_ops;
        ops.extend(sh_ops);
        ops.extend(tl_ops);
        ops.extend(th_ops);
        (sl, sh, tl, th, ops)
    } else {
        let sl = temps.fresh_wide_word(arena, half);
        let sh = temps.fresh_wide_word(arena, hi_width);
        let tl = temps.fresh_wide_word(arena, half);
        let th = temps.fresh_wide_word(arena, hi_width);
        let mut ops = Vec::new();
        for (dest, src, off) in [(sl, s, 0), (sh, s, half), (tl, t, 0), (th, t, half)] {
            let off_const = temps.fresh_wide_word(arena, word);
            arena.get_mut(off_const).is_const = true;
            arena.get_mut(off_const).name = off.to_string();
            let rsh_op = Op::new(Opcode::Rsh, dest, vec![src, off_const]);
            ops.extend(super::narrow_op(arena, shards, temps, cfg, &rsh_op, emit_catd, depth + 1)?);
        }
        (sl, sh, tl, th, ops)
    };
    out.append(&mut ops);

    let mul_pair = |arena: &mut NodeArena,
                    shards: &mut ShardTable,
                    temps: &mut TempPool,
                    out: &mut Vec<Op>,
                    a: NodeId,
                    b: NodeId,
                    aw: u32,
                    bw: u32|
     -> Result<NodeId, FloError> {
        if aw <= word && bw <= word {
            let dest = temps.fresh_wide_word(arena, aw + bw);
            out.push(Op::new(Opcode::Mul, dest, vec![a, b]));
            Ok(dest)
        } else {
            let (ops, dest) = mul_tree(arena, shards, temps, cfg, a, b, aw.max(bw), aw + bw, emit_catd, depth + 1)?;
            out.extend(ops);
            Ok(dest)
        }
    };

    let ll = mul_pair(arena, shards, temps, &mut out, sl, tl, half, half)?;
    let lh = mul_pair(arena, shards, temps, &mut out, sh, tl, hi_width, half)?;
    let hl = mul_pair(arena, shards, temps, &mut out, sl, th, half, hi_width)?;
    let hh = mul_pair(arena, shards, temps, &mut out, sh, th, hi_width, hi_width)?;

    // ADD lowering (src/dest must share width, §4.C step 1-4 threads a
    // same-width carry chain) so every addend below is zero-extended to a
    // common full width before being summed.
    let full_width = (2 * width).max(dest_width);
    let ll = zero_extend(arena, shards, temps, cfg, ll, half + half, full_width, emit_catd, depth)?;
    out.extend(ll.0);
    let lh = zero_extend(arena, shards, temps, cfg, lh, hi_width + half, full_width, emit_catd, depth)?;
    out.extend(lh.0);
    let hl = zero_extend(arena, shards, temps, cfg, hl, half + hi_width, full_width, emit_catd, depth)?;
    out.extend(hl.0);
    let hh = zero_extend(arena, shards, temps, cfg, hh, hi_width + hi_width, full_width, emit_catd, depth)?;
    out.extend(hh.0);
    let (ll, lh, hl, hh) = (ll.1, lh.1, hl.1, hh.1);

    // mid = lh + hl
    let mid = arena.insert(Node::wide("mid.mulresult", full_width, 0, false, false));
    let add_mid = Op::new(Opcode::Add, mid, vec![lh, hl]);
    out.extend(super::narrow_op(arena, shards, temps, cfg, &add_mid, emit_catd, depth + 1)?);

    // mid_shifted = mid << half
    let mid_shifted = arena.insert(Node::wide("mid_shifted.mulresult", full_width, 0, false, false));
    let shift_const = temps.fresh_wide_word(arena, word);
    arena.get_mut(shift_const).is_const = true;
    arena.get_mut(shift_const).name = half.to_string();
    let lsh_op = Op::new(Opcode::Lsh, mid_shifted, vec![mid, shift_const]);
    out.extend(super::narrow_op(arena, shards, temps, cfg, &lsh_op, emit_catd, depth + 1)?);

    // sum1 = ll + mid_shifted
    let sum1 = arena.insert(Node::wide("sum1.mulresult", full_width, 0, false, false));
    let add1 = Op::new(Opcode::Add, sum1, vec![ll, mid_shifted]);
    out.extend(super::narrow_op(arena, shards, temps, cfg, &add1, emit_catd, depth + 1)?);

    // hh_shifted = hh << width
    let hh_shifted = arena.insert(Node::wide("hh_shifted.mulresult", full_width, 0, false, false));
    let shift2_const = temps.fresh_wide_word(arena, word);
    arena.get_mut(shift2_const).is_const = true;
    arena.get_mut(shift2_const).name = width.to_string();
    let lsh2_op = Op::new(Opcode::Lsh, hh_shifted, vec![hh, shift2_const]);
    out.extend(super::narrow_op(arena, shards, temps, cfg, &lsh2_op, emit_catd, depth + 1)?);

    // sum = sum1 + hh_shifted; truncated to dest_width by lower_mul's final Mov.
    let sum = arena.insert(Node::wide("sum.mulresult", full_width, 0, false, false));
    let add2 = Op::new(Opcode::Add, sum, vec![sum1, hh_shifted]);
    out.extend(super::narrow_op(arena, shards, temps, cfg, &add2, emit_catd, depth + 1)?);

    Ok((out, sum))
}

/// Zero-extends `value` (declared width `value_width`) into a fresh node of
/// `target_width` bits, so it can be safely added to other operands at that
/// width. A no-op when the widths already match.
#[allow(clippy::too_many_arguments)]
fn zero_extend(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    value: NodeId,
    value_width: u32,
    target_width: u32,
    emit_catd: bool,
    depth: u32,
) -> Result<(Vec<Op>, NodeId), FloError> {
    if value_width >= target_width {
        return Ok((Vec::new(), value));
    }
    let zero_width = target_width - value_width;
    let zero = temps.fresh_wide_word(arena, zero_width);
    arena.get_mut(zero).is_const = true;
    arena.get_mut(zero).name = "0".to_string();

    let dest = arena.insert(Node::wide(format!("{}.zext", arena.get(value).name()), target_width, 0, false, false));
    let cat_op = Op::new(Opcode::Cat, dest, vec![zero, value]);
    let ops = super::narrow_op(arena, shards, temps, cfg, &cat_op, emit_catd, depth + 1)?;
    Ok((ops, dest))
}
