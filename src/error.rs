//! Error taxonomy for the lowering pass.
//!
//! Every error is fatal: the pass is batch and pure, so there is nothing
//! useful to do beyond reporting a diagnostic and aborting.

use std::fmt;
use std::io;

use crate::op::Opcode;

/// All ways the pass can fail, grouped into the three categories from the
/// design: configuration, input-violation, and I/O.
#[derive(Debug, thiserror::Error)]
pub enum FloError {
    /// `word` or `depth` was constructed with a degenerate value.
    #[error("invalid lowering configuration: {0}")]
    InvalidConfig(String),

    /// `CATD`/`RSHD` appeared in the input netlist; they are debug-only
    /// products of this pass and may never be fed back into it.
    #[error("opcode {0:?} may not appear in input")]
    UnsplittableInInput(Opcode),

    /// An opcode outside the set this pass knows how to lower.
    #[error("unsupported opcode {0:?} in operation destined for {1:?}")]
    UnsupportedOpcode(Opcode, String),

    /// `MUL` operands did not have equal width.
    #[error("MUL operands must have equal width, got {0} and {1}")]
    MulWidthMismatch(u32, u32),

    /// A shift offset was not a constant node.
    #[error("shift offset must be a constant, got node {0:?}")]
    NonConstantShiftOffset(String),

    /// A bit-field window spanned more than two source shards.
    #[error("non-contiguous bit-field extract: offset {offset}, count {count}, source width {width}")]
    NonContiguousExtract {
        /// Offset of the requested window, in bits.
        offset: u32,
        /// Width of the requested window, in bits.
        count: u32,
        /// Width of the source node being extracted from.
        width: u32,
    },

    /// Failure to parse or write a Flo netlist.
    #[error("netlist I/O error: {0}")]
    Io(#[from] io::Error),

    /// Recursive lowering (MUL/NEG/CAT/variable-shift) exceeded the
    /// iteration bound guarding against runaway recursion (Design Note
    /// "Recursive lowering for MUL/NEG/variable-shift/CAT").
    #[error("recursive width lowering exceeded its iteration bound")]
    RecursionLimitExceeded,

    /// A line of the input netlist could not be parsed.
    #[error("malformed netlist line {line}: {text}")]
    ParseError {
        /// 1-based line number in the source file.
        line: usize,
        /// The offending text.
        text: String,
    },

    /// An input-violation error re-tagged with the opcode and source line of
    /// the operation that raised it. Only the driver attaches this, so
    /// callers that exercise a lowering rule directly still see the plain
    /// variant.
    #[error(transparent)]
    InputViolation(Box<Diagnostic>),
}

impl FloError {
    /// Whether this error belongs to category (b) of the taxonomy — a
    /// malformed input operation, as opposed to configuration or I/O — and
    /// is thus eligible for line-tagged diagnostics.
    pub fn is_input_violation(&self) -> bool {
        matches!(
            self,
            FloError::UnsplittableInInput(_)
                | FloError::UnsupportedOpcode(_, _)
                | FloError::MulWidthMismatch(_, _)
                | FloError::NonConstantShiftOffset(_)
                | FloError::NonContiguousExtract { .. }
        )
    }
}

/// Attaches the offending opcode and source line to an input-violation
/// error, rendering as "opcode X in operation at line N: ...".
#[derive(Debug, thiserror::Error)]
#[error("opcode {opcode:?} in operation at line {line}: {source}")]
pub struct Diagnostic {
    pub opcode: Opcode,
    line: LineNo,
    #[source]
    pub source: FloError,
}

impl Diagnostic {
    pub fn new(opcode: Opcode, line: Option<usize>, source: FloError) -> Self {
        Self { opcode, line: LineNo(line), source }
    }
}

#[derive(Debug)]
struct LineNo(Option<usize>);

impl fmt::Display for LineNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "<unknown>"),
        }
    }
}
