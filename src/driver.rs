//! Parses a wide netlist, runs width then depth lowering over every
//! operation, and collects the shallow result.

use tracing::debug;

use crate::arena::{NodeArena, NodeId};
use crate::config::LoweringConfig;
use crate::depth::split_mem;
use crate::error::{Diagnostic, FloError};
use crate::format::{self, ParsedNetlist};
use crate::op::Op;
use crate::shard::ShardTable;
use crate::temp::TempPool;
use crate::width::narrow_op;

/// Tags an input-violation error with the operation that raised it, giving
/// callers "opcode X in operation at line N" context. Errors outside that
/// category (configuration, I/O, recursion) pass through unchanged.
fn with_diagnostic(op: &Op, err: FloError) -> FloError {
    if err.is_input_violation() {
        FloError::InputViolation(Box::new(Diagnostic::new(op.opcode, op.line, err)))
    } else {
        err
    }
}

/// Owns the arena, shard table, and temporary-name pool for one invocation
/// of the pass: counters live per invocation, not as statics, so two
/// invocations in the same process never share state.
pub struct Driver {
    arena: NodeArena,
    shards: ShardTable,
    temps: TempPool,
}

impl Driver {
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            shards: ShardTable::new(),
            temps: TempPool::new(),
        }
    }

    /// Runs the full pipeline over a parsed wide netlist, returning the
    /// rendered shallow netlist text.
    pub fn run(mut self, parsed: ParsedNetlist, cfg: &LoweringConfig, emit_catd: bool) -> Result<String, FloError> {
        self.arena = parsed.arena;

        let mut output_nodes: Vec<NodeId> = Vec::new();
        for &node in &parsed.node_order {
            let narrow = self.shards.narrow_shards(&mut self.arena, node, cfg).to_vec();
            for shard in narrow {
                let shallow = self.shards.shallow_shards(&mut self.arena, shard, cfg).to_vec();
                output_nodes.extend(shallow);
            }
        }

        let mut output_ops: Vec<Op> = Vec::new();
        for op in &parsed.ops {
            debug!(opcode = %op.opcode, dest = %op.dest, "narrowing operation");
            let narrowed = narrow_op(&mut self.arena, &mut self.shards, &mut self.temps, cfg, op, emit_catd, 0)
                .map_err(|e| with_diagnostic(op, e))?;
            for n_op in &narrowed {
                debug!(opcode = %n_op.opcode, dest = %n_op.dest, "splitting operation");
                let shallowed = split_mem(&mut self.arena, &mut self.shards, &mut self.temps, cfg, n_op)
                    .map_err(|e| with_diagnostic(op, e))?;
                output_ops.extend(shallowed);
            }
        }

        Ok(format::write(&self.arena, &output_nodes, &output_ops))
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}
