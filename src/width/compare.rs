//! `EQ`/`NEQ`/`LT`/`GTE` lowering.
//!
//! `EQ`/`NEQ` reduce per-shard equality with an AND/OR fold. `LT`/`GTE`
//! thread a "still equal so far" bit through the shards from the most
//! significant down, so a strict inequality at any shard decides the
//! result unless a higher shard already did.

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

/// `EQ`: AND-fold of per-shard equality. `NEQ`: OR-fold of per-shard
/// inequality (De Morgan's dual of the same shard comparisons).
pub fn lower_eq_neq(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let is_eq = matches!(op.opcode, Opcode::Eq);
    let word = cfg.word();
    let s = op.sources[0];
    let t = op.sources[1];

    let s_shards = shards.narrow_shards(arena, s, cfg).to_vec();
    let t_shards = shards.narrow_shards(arena, t, cfg).to_vec();
    let k = s_shards.len();

    let mut out = Vec::new();
    let per_shard_op = if is_eq { Opcode::Eq } else { Opcode::Neq };
    let fold_op = if is_eq { Opcode::And } else { Opcode::Or };

    let mut acc = temps.fresh_narrow_word(arena, 1, word);
    out.push(Op::new(per_shard_op, acc, vec![s_shards[0], t_shards[0]]));
    for i in 1..k {
        let cmp = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(per_shard_op, cmp, vec![s_shards[i], t_shards[i]]));
        let next = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(fold_op, next, vec![acc, cmp]));
        acc = next;
    }

    out.push(Op::new(Opcode::Mov, op.dest, vec![acc]));
    Ok(out)
}

/// `LT`: `s < t` iff some shard (scanned from the most significant) has
/// `s_i < t_i` while every shard above it is equal. `GTE` is the negation,
/// built from the same per-shard signals.
pub fn lower_lt_gte(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let is_lt = matches!(op.opcode, Opcode::Lt);
    let word = cfg.word();
    let s = op.sources[0];
    let t = op.sources[1];

    let s_shards = shards.narrow_shards(arena, s, cfg).to_vec();
    let t_shards = shards.narrow_shards(arena, t, cfg).to_vec();
    let k = s_shards.len();

    let mut out = Vec::new();

    // still_equal starts true above the top shard.
    let mut still_equal: Option<NodeId> = None;
    let mut result: Option<NodeId> = None;

    for i in (0..k).rev() {
        let lt_here = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(Opcode::Lt, lt_here, vec![s_shards[i], t_shards[i]]));

        let decided_here = match still_equal {
            None => lt_here,
            Some(prev_eq) => {
                let gated = temps.fresh_narrow_word(arena, 1, word);
                out.push(Op::new(Opcode::And, gated, vec![prev_eq, lt_here]));
                gated
            }
        };

        result = Some(match result {
            None => decided_here,
            Some(prev) => {
                let combined = temps.fresh_narrow_word(arena, 1, word);
                out.push(Op::new(Opcode::Or, combined, vec![prev, decided_here]));
                combined
            }
        });

        if i > 0 {
            let eq_here = temps.fresh_narrow_word(arena, 1, word);
            out.push(Op::new(Opcode::Eq, eq_here, vec![s_shards[i], t_shards[i]]));
            still_equal = Some(match still_equal {
                None => eq_here,
                Some(prev_eq) => {
                    let combined = temps.fresh_narrow_word(arena, 1, word);
                    out.push(Op::new(Opcode::And, combined, vec![prev_eq, eq_here]));
                    combined
                }
            });
        }
    }

    let lt_result = result.expect("at least one shard");
    if is_lt {
        out.push(Op::new(Opcode::Mov, op.dest, vec![lt_result]));
    } else {
        let negated = temps.fresh_narrow_word(arena, 1, word);
        out.push(Op::new(Opcode::Not, negated, vec![lt_result]));
        out.push(Op::new(Opcode::Mov, op.dest, vec![negated]));
    }
    Ok(out)
}
