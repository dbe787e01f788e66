//! Width lowering (`narrow_op`).
//!
//! `narrow_op(op, W, emit_catd) -> [narrow_op]` rewrites one wide operation
//! into an ordered list of word-legal operations with the same effect. The
//! fast path covers operations whose operands already fit in `W` bits; the
//! wide path is an exhaustive dispatch over the opcode alphabet, one
//! submodule per rewrite family.

mod addsub;
mod bitfield;
mod cat;
mod catd;
mod compare;
mod log2;
mod mul;
mod pointwise;
mod shift;

use crate::arena::NodeArena;
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::node::NodeKind;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

/// Bound on recursive width-lowering depth (MUL/NEG/CAT/variable-shift
/// synthesize new wide operations and feed them back through this
/// function; Design Note "Recursive lowering"). Any legitimate input
/// terminates in a handful of levels, so this only guards against a
/// malformed config or a logic error in a rewrite rule causing runaway
/// recursion.
pub(crate) const MAX_RECURSION: u32 = 64;

/// Rewrites one wide operation into word-legal operations.
pub fn narrow_op(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
    emit_catd: bool,
    depth: u32,
) -> Result<Vec<Op>, FloError> {
    if depth > MAX_RECURSION {
        return Err(FloError::RecursionLimitExceeded);
    }

    if op.opcode.is_unsplittable() {
        return Err(FloError::UnsplittableInInput(op.opcode));
    }
    if op.opcode.is_unsupported() {
        return Err(FloError::UnsupportedOpcode(op.opcode, op.dest.to_string()));
    }

    let word = cfg.word();
    let fast_path = op.sources.iter().all(|&s| arena.get(s).width() <= word) && arena.get(op.dest).width() <= word;

    let mut ops = if fast_path {
        lower_fast_path(arena, shards, cfg, op)
    } else {
        match op.opcode {
            Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Not
            | Opcode::Mov
            | Opcode::Mux
            | Opcode::Out
            | Opcode::Reg
            | Opcode::In
            | Opcode::Rd
            | Opcode::Wr => pointwise::lower_pointwise(arena, shards, temps, cfg, op)?,

            Opcode::Add | Opcode::Sub => addsub::lower_add_sub(arena, shards, temps, cfg, op)?,

            Opcode::Rsh => shift::lower_rsh(arena, shards, temps, cfg, op)?,
            Opcode::Lsh => {
                let offset_is_const = arena.get(op.sources[1]).is_const();
                if offset_is_const {
                    shift::lower_lsh_const(arena, shards, temps, cfg, op)?
                } else {
                    shift::lower_lsh_variable(arena, shards, temps, cfg, op, emit_catd, depth)?
                }
            }

            Opcode::Cat => cat::lower_cat(arena, shards, temps, cfg, op)?,

            Opcode::Mul => mul::lower_mul(arena, shards, temps, cfg, op, emit_catd, depth)?,

            Opcode::Neg => {
                let word_const = zero_const(arena, temps, word);
                let sub_op = Op::new(Opcode::Sub, op.dest, vec![word_const, op.sources[0]]);
                narrow_op(arena, shards, temps, cfg, &sub_op, emit_catd, depth + 1)?
            }

            Opcode::Eq | Opcode::Neq => compare::lower_eq_neq(arena, shards, temps, cfg, op)?,
            Opcode::Lt | Opcode::Gte => compare::lower_lt_gte(arena, shards, temps, cfg, op)?,

            Opcode::Log2 => log2::lower_log2(arena, shards, temps, cfg, op)?,

            Opcode::Catd | Opcode::Rshd => return Err(FloError::UnsplittableInInput(op.opcode)),

            _ => return Err(FloError::UnsupportedOpcode(op.opcode, op.dest.to_string())),
        }
    };

    if catd::should_emit(op, emit_catd, cfg.catd_policy()) {
        ops.extend(catd::emit_chain(arena, shards, temps, cfg, op));
    }

    Ok(ops)
}

/// Every operand already fits in one word: clone the op onto the
/// operands' (sole) narrow shards.
fn lower_fast_path(arena: &mut NodeArena, shards: &mut ShardTable, cfg: &LoweringConfig, op: &Op) -> Vec<Op> {
    let dest = shards.narrow_shards(arena, op.dest, cfg)[0];
    let sources = op
        .sources
        .iter()
        .map(|&s| shards.narrow_shards(arena, s, cfg)[0])
        .collect();
    vec![Op::new(op.opcode, dest, sources)]
}

fn zero_const(arena: &mut NodeArena, temps: &mut TempPool, word: u32) -> crate::arena::NodeId {
    let n = temps.fresh_wide_word(arena, word);
    arena.get_mut(n).is_const = true;
    arena.get_mut(n).name = "0".to_string();
    n
}

/// True when `node` already satisfies the narrow-family width invariant,
/// used by callers deciding whether a node needs lowering at all.
pub fn is_already_narrow(arena: &NodeArena, node: crate::arena::NodeId, word: u32) -> bool {
    let n = arena.get(node);
    matches!(n.kind(), NodeKind::Narrow | NodeKind::Shallow) && n.is_word_legal(word)
}
