//! `CAT` lowering.
//!
//! `CAT(d, s, t)` sets `d = (s << width(t)) | t`. Each destination shard's
//! bit window falls into one of three regions relative to the `s`/`t`
//! boundary at bit `width(t)`.

use crate::arena::NodeArena;
use crate::config::LoweringConfig;
use crate::error::FloError;
use crate::op::{Op, Opcode};
use crate::shard::ShardTable;
use crate::temp::TempPool;

use super::bitfield::extract_bits;

pub fn lower_cat(
    arena: &mut NodeArena,
    shards: &mut ShardTable,
    temps: &mut TempPool,
    cfg: &LoweringConfig,
    op: &Op,
) -> Result<Vec<Op>, FloError> {
    let s = op.sources[0];
    let t = op.sources[1];
    let t_width = arena.get(t).width();
    let word = cfg.word();

    let d_shards = shards.narrow_shards(arena, op.dest, cfg).to_vec();
    let mut out = Vec::new();

    for (i, &dest_i) in d_shards.iter().enumerate() {
        let w = arena.get(dest_i).width();
        let lo = i as u32 * word;
        let hi = lo + w;

        let tmp = if hi <= t_width {
            let (ops, tmp) = extract_bits(arena, shards, temps, cfg, t, lo, w)?;
            out.extend(ops);
            tmp
        } else if lo >= t_width {
            let (ops, tmp) = extract_bits(arena, shards, temps, cfg, s, lo - t_width, w)?;
            out.extend(ops);
            tmp
        } else {
            let t_bits = t_width - lo;
            let (low_ops, low) = extract_bits(arena, shards, temps, cfg, t, lo, t_bits)?;
            out.extend(low_ops);
            let (high_ops, high) = extract_bits(arena, shards, temps, cfg, s, 0, w - t_bits)?;
            out.extend(high_ops);
            let dest = temps.fresh_narrow_word(arena, w, word);
            out.push(Op::new(Opcode::Cat, dest, vec![high, low]));
            dest
        };
        out.push(Op::new(Opcode::Mov, dest_i, vec![tmp]));
    }

    Ok(out)
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
    fn cat_straddling_boundary() {
        let cfg = cfg();
        let mut arena = NodeArena::new();
        let mut shards = ShardTable::new();
        let mut temps = TempPool::new();
        let s = arena.insert(Node::wide("s", 32, 0, false, false));
        let t = arena.insert(Node::wide("t", 16, 0, false, false));
        let d = arena.insert(Node::wide("d", 48, 0, false, false));
        let op = Op::new(Opcode::Cat, d, vec![s, t]);
        let lowered = lower_cat(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();
        assert!(!lowered.is_empty());
    }
}
