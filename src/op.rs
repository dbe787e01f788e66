//! Operations over nodes.
//!
//! An operation has a destination, a fixed-arity source list, and an
//! opcode drawn from the closed alphabet below. The enum uses `strum` for
//! the textual round-trip the parse/emit library needs.

use std::fmt;

use crate::arena::NodeId;

/// The closed opcode alphabet. Exhaustively dispatched by the
/// width lowerer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Opcode {
    Add,
    And,
    Arsh,
    Cat,
    Catd,
    Div,
    Eat,
    Eq,
    Gte,
    In,
    Init,
    Ld,
    Lit,
    Log2,
    Lsh,
    Lt,
    Mem,
    Mov,
    Msk,
    Mul,
    Mux,
    Neg,
    Neq,
    Nop,
    Not,
    Or,
    Out,
    Rd,
    Reg,
    Rnd,
    Rsh,
    Rshd,
    Rst,
    St,
    Sub,
    Wr,
    Xor,
}

impl Opcode {
    /// Opcodes that may never appear in the pass's input because they are
    /// only ever synthesized as debug-only output.
    pub const fn is_unsplittable(self) -> bool {
        matches!(self, Opcode::Catd | Opcode::Rshd)
    }

    /// Opcodes this pass does not know how to lower.
    pub const fn is_unsupported(self) -> bool {
        matches!(
            self,
            Opcode::Arsh
                | Opcode::Div
                | Opcode::Eat
                | Opcode::Init
                | Opcode::Ld
                | Opcode::Lit
                | Opcode::Mem
                | Opcode::Msk
                | Opcode::Nop
                | Opcode::Rnd
                | Opcode::Rst
                | Opcode::St
        )
    }

    /// Sources of width 1 (selects/enables) that are always read from shard
    /// 0 regardless of destination shard index, per the pointwise rewrite
    /// rule.
    pub const fn has_width_one_selects(self) -> bool {
        matches!(self, Opcode::Mux | Opcode::Reg | Opcode::Wr)
    }
}

/// An operation: an opcode, a destination node, and an ordered source list.
#[derive(Debug, Clone)]
pub struct Op {
    pub opcode: Opcode,
    pub dest: NodeId,
    pub sources: Vec<NodeId>,
    /// Line number in the originating netlist, for diagnostics.
    pub line: Option<usize>,
}

impl Op {
    /// Builds a new operation.
    pub fn new(opcode: Opcode, dest: NodeId, sources: Vec<NodeId>) -> Self {
        Self {
            opcode,
            dest,
            sources,
            line: None,
        }
    }

    /// Builds a new operation tagged with a source line for diagnostics.
    pub fn with_line(opcode: Opcode, dest: NodeId, sources: Vec<NodeId>, line: usize) -> Self {
        Self {
            opcode,
            dest,
            sources,
            line: Some(line),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dest, self.opcode)?;
        for s in &self.sources {
            write!(f, " {s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_text_roundtrip() {
        use std::str::FromStr;
        assert_eq!(Opcode::from_str("ADD").unwrap(), Opcode::Add);
        assert_eq!(Opcode::Add.to_string(), "ADD");
        assert_eq!(Opcode::from_str("RSHD").unwrap(), Opcode::Rshd);
    }

    #[test]
    fn unsplittable_set() {
        assert!(Opcode::Catd.is_unsplittable());
        assert!(Opcode::Rshd.is_unsplittable());
        assert!(!Opcode::Add.is_unsplittable());
    }

    #[test]
    fn unsupported_set_matches_spec() {
        for op in [
            Opcode::Arsh,
            Opcode::Div,
            Opcode::Eat,
            Opcode::Init,
            Opcode::Ld,
            Opcode::Lit,
            Opcode::Mem,
            Opcode::Msk,
            Opcode::Nop,
            Opcode::Rnd,
            Opcode::Rst,
            Opcode::St,
        ] {
            assert!(op.is_unsupported(), "{op:?} should be unsupported");
        }
        assert!(!Opcode::Add.is_unsupported());
    }
}
