//! Fresh temporary-node name generation.
//!
//! Six monotonic counters, one per `(family, kind)` pair, so emitted
//! netlists are deterministic: `MWEnW#`/`MWEnT#` for narrow-lowering
//! temporaries (carry/borrow words and one-bit reduction temps), `MWEsW#`/
//! `MWEsT#` for depth-lowering temporaries (bank reads and match signals),
//! and `MWEwW#`/`MWEwT#` for the wide intermediate operations MUL/NEG/CAT/
//! variable-shift synthesize before recursing back through `narrow_op`.
//!
//! The counters live on the [`Driver`](crate::driver::Driver), not as
//! process statics, so two invocations in the same process don't share
//! state.

use crate::arena::{NodeArena, NodeId};
use crate::node::Node;

#[derive(Debug, Default)]
pub struct TempPool {
    narrow_word: u64,
    narrow_temp: u64,
    shallow_word: u64,
    shallow_temp: u64,
    wide_word: u64,
    wide_temp: u64,
}

impl TempPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh one-word-wide narrow temporary (carry/borrow/partial-sum).
    pub fn fresh_narrow_word(&mut self, arena: &mut NodeArena, width: u32, word: u32) -> NodeId {
        let name = format!("MWEnW{}", self.narrow_word);
        self.narrow_word += 1;
        arena.insert(Node::narrow(name, width, 0, false, false, word, false).expect("temp width <= word"))
    }

    /// A fresh general-purpose narrow temporary (CATD chain link, reduction
    /// accumulator).
    pub fn fresh_narrow_temp(&mut self, arena: &mut NodeArena, width: u32, word: u32, catd_escape: bool) -> NodeId {
        let name = format!("MWEnT{}", self.narrow_temp);
        self.narrow_temp += 1;
        arena.insert(
            Node::narrow(name, width, 0, false, false, word, catd_escape).expect("temp width legal"),
        )
    }

    /// A fresh shallow "word" temporary used while splitting a memory op
    /// (bank read result).
    pub fn fresh_shallow_word(
        &mut self,
        arena: &mut NodeArena,
        width: u32,
        word: u32,
        max_depth: u32,
    ) -> NodeId {
        let name = format!("MWEsW{}", self.shallow_word);
        self.shallow_word += 1;
        arena.insert(
            Node::shallow(name, width, 0, false, false, word, max_depth).expect("temp width/depth legal"),
        )
    }

    /// A fresh shallow "temp" (bank-match signal, mux accumulator).
    pub fn fresh_shallow_temp(
        &mut self,
        arena: &mut NodeArena,
        width: u32,
        word: u32,
        max_depth: u32,
    ) -> NodeId {
        let name = format!("MWEsT{}", self.shallow_temp);
        self.shallow_temp += 1;
        arena.insert(
            Node::shallow(name, width, 0, false, false, word, max_depth).expect("temp width/depth legal"),
        )
    }

    /// A fresh wide "word" temporary: a synthesized intermediate operation
    /// result (e.g. a MUL cross product) that still needs lowering.
    pub fn fresh_wide_word(&mut self, arena: &mut NodeArena, width: u32) -> NodeId {
        let name = format!("MWEwW{}", self.wide_word);
        self.wide_word += 1;
        arena.insert(Node::wide(name, width, 0, false, false))
    }

    /// A fresh wide "temp" (e.g. a barrel-shifter per-bit mux condition).
    pub fn fresh_wide_temp(&mut self, arena: &mut NodeArena, width: u32) -> NodeId {
        let name = format!("MWEwT{}", self.wide_temp);
        self.wide_temp += 1;
        arena.insert(Node::wide(name, width, 0, false, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotonic_and_independent() {
        let mut arena = NodeArena::new();
        let mut pool = TempPool::new();
        let a = pool.fresh_narrow_word(&mut arena, 32, 32);
        let b = pool.fresh_narrow_word(&mut arena, 32, 32);
        assert_eq!(arena.get(a).name(), "MWEnW0");
        assert_eq!(arena.get(b).name(), "MWEnW1");

        let c = pool.fresh_wide_word(&mut arena, 64);
        assert_eq!(arena.get(c).name(), "MWEwW0");
    }
}
