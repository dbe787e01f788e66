//! Flo netlist parse/emit.
//!
//! The lowering pass itself neither parses nor pretty-prints the full
//! opcode-specific textual form; this module is a minimal line-oriented
//! stand-in, just enough to drive the two CLI binaries and the integration
//! tests.
//!
//! Grammar, one statement per line (blank lines and `#` comments ignored):
//!
//! ```text
//! <name> = wide <width> [<depth> [mem]]
//! <name> = mem/<width> <depth>
//! <dest> <OPCODE> <src> <src> ...
//! ```
//!
//! A declared name that parses as an integer literal (`42`, `0xFF`) is
//! automatically marked `is_const`, matching the rule that a constant's
//! name *is* its literal value. Operation lines use the same textual shape
//! as [`Op`]'s `Display` impl, so a written netlist re-parses.

use std::collections::HashMap;
use std::str::FromStr;

use crate::arena::{NodeArena, NodeId};
use crate::error::FloError;
use crate::node::Node;
use crate::op::{Op, Opcode};

/// A parsed wide netlist: every declared node plus its operations, in
/// source order.
pub struct ParsedNetlist {
    pub arena: NodeArena,
    pub ops: Vec<Op>,
    /// Declaration order, for emitting nodes deterministically downstream.
    pub node_order: Vec<NodeId>,
}

/// Parses a wide netlist from its textual form.
pub fn parse(text: &str) -> Result<ParsedNetlist, FloError> {
    let mut arena = NodeArena::new();
    let mut names: HashMap<String, NodeId> = HashMap::new();
    let mut node_order = Vec::new();
    let mut ops = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let parse_err = || FloError::ParseError {
            line: line_no,
            text: line.to_string(),
        };

        if tokens.len() >= 2 && tokens[1] == "=" {
            let name = tokens[0];
            let (width, depth, is_mem) = parse_decl(&tokens[2..]).ok_or_else(parse_err)?;
            let is_const = parse_literal_name(name).is_some();
            let node = Node::wide(name, width, depth, is_mem, is_const);
            let id = arena.insert(node);
            names.insert(name.to_string(), id);
            node_order.push(id);
            continue;
        }

        let dest = *names.get(tokens[0]).ok_or_else(parse_err)?;
        let opcode = Opcode::from_str(tokens[1]).map_err(|_| parse_err())?;
        let sources = tokens[2..]
            .iter()
            .map(|t| names.get(*t).copied().ok_or_else(parse_err))
            .collect::<Result<Vec<_>, _>>()?;
        ops.push(Op::with_line(opcode, dest, sources, line_no));
    }

    Ok(ParsedNetlist { arena, ops, node_order })
}

fn parse_decl(rest: &[&str]) -> Option<(u32, u32, bool)> {
    match rest {
        ["wide", w] => Some((w.parse().ok()?, 0, false)),
        ["wide", w, d] => Some((w.parse().ok()?, d.parse().ok()?, false)),
        ["wide", w, d, tag] if *tag == "mem" => Some((w.parse().ok()?, d.parse().ok()?, true)),
        [mem_tag, d] if mem_tag.starts_with("mem/") => {
            Some((mem_tag.strip_prefix("mem/")?.parse().ok()?, d.parse().ok()?, true))
        }
        _ => None,
    }
}

fn parse_literal_name(name: &str) -> Option<i128> {
    if let Some(hex) = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
        return i128::from_str_radix(hex, 16).ok();
    }
    name.parse::<i128>().ok()
}

/// Writes a shallow (output) netlist: a `mem/W depth` declaration for every
/// shallow memory node in `mem_nodes`, then every operation's textual form,
/// in the order given.
///
/// Operations are rendered from `arena` directly (by node name) rather than
/// through [`Op`]'s `Display` impl, which prints raw [`NodeId`]s and is
/// meant for debug output, not netlist text.
pub fn write(arena: &NodeArena, mem_nodes: &[NodeId], ops: &[Op]) -> String {
    let mut out = String::new();
    for &id in mem_nodes {
        let n = arena.get(id);
        if n.is_mem() && n.depth() > 0 {
            out.push_str(&format!("{} = mem/{} {}\n", n.name(), n.width(), n.depth()));
        }
    }
    for op in ops {
        out.push_str(arena.get(op.dest).name());
        out.push(' ');
        out.push_str(&op.opcode.to_string());
        for &src in &op.sources {
            out.push(' ');
            out.push_str(arena.get(src).name());
        }
        out.push('\n');
    }
    out
}
