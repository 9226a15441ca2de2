//! Sequence text format.
//!
//! One line per statement, `vN = <operation text> :` followed by the input
//! variables. Component files hold several sequences separated by blank
//! lines; lines starting with `#` are comments.
//!
//! ```text
//! # two lists
//! v0 = java.util.ArrayList.<init>() :
//! v1 = java.util.ArrayList.<init>(java.util.Collection) : v0
//! ```

use crate::error::SequenceError;
use crate::Sequence;
use opseq_operation::{Operation, ParseError};
use opseq_registry::TypeRegistry;
use thiserror::Error;

/// Errors while reading sequence text. Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequenceParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: {source}")]
    Operation { line: usize, source: ParseError },

    #[error("line {line}: {source}")]
    Invalid { line: usize, source: SequenceError },
}

impl Sequence {
    /// The sequence in text form, one statement per line.
    pub fn to_parsable_text(&self) -> String {
        let mut out = String::new();
        for (i, statement) in self.statements().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("v{} = {} :", i, statement.operation().to_parsable_text()));
            for input in statement.inputs() {
                out.push_str(&format!(" v{}", input));
            }
        }
        out
    }

    /// Read one sequence.
    pub fn parse(text: &str, registry: &TypeRegistry) -> Result<Sequence, SequenceParseError> {
        let mut sequences = parse_many(text, registry)?;
        match sequences.len() {
            0 => Ok(Sequence::new()),
            1 => Ok(sequences.remove(0)),
            n => Err(SequenceParseError::Malformed {
                line: 1,
                message: format!("expected one sequence, found {}", n),
            }),
        }
    }
}

/// Write sequences separated by blank lines.
pub fn write_many<'a>(sequences: impl IntoIterator<Item = &'a Sequence>) -> String {
    let blocks: Vec<String> = sequences
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(Sequence::to_parsable_text)
        .collect();
    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Read every sequence in a component file, failing on the first bad block.
pub fn parse_many(text: &str, registry: &TypeRegistry) -> Result<Vec<Sequence>, SequenceParseError> {
    parse_blocks(text, registry).into_iter().collect()
}

/// Read a component file block by block. A block that fails to parse
/// yields its error and does not affect the blocks around it.
pub fn parse_blocks(text: &str, registry: &TypeRegistry) -> Vec<Result<Sequence, SequenceParseError>> {
    let mut blocks = Vec::new();
    let mut current: Result<Sequence, SequenceParseError> = Ok(Sequence::new());
    let mut open = false;

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let trimmed = raw.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.is_empty() {
            if open {
                blocks.push(std::mem::replace(&mut current, Ok(Sequence::new())));
                open = false;
            }
            continue;
        }

        open = true;
        // the rest of a failed block is skipped
        if let Ok(seq) = &current {
            current = parse_line(trimmed, line, seq.len(), registry).and_then(|(operation, inputs)| {
                seq.append(operation, inputs, registry)
                    .map_err(|source| SequenceParseError::Invalid { line, source })
            });
        }
    }
    if open {
        blocks.push(current);
    }
    blocks
}

fn parse_line(
    text: &str,
    line: usize,
    expected_index: usize,
    registry: &TypeRegistry,
) -> Result<(Operation, Vec<usize>), SequenceParseError> {
    let malformed = |message: String| SequenceParseError::Malformed { line, message };

    let (var, rest) = text
        .split_once(" = ")
        .ok_or_else(|| malformed(format!("expected `vN = ...`: {}", text)))?;
    let index = parse_var(var).ok_or_else(|| malformed(format!("bad variable `{}`", var)))?;
    if index != expected_index {
        return Err(malformed(format!(
            "expected v{}, found v{}",
            expected_index, index
        )));
    }

    // the input list never contains " :", so the last one is the separator
    let (op_text, input_text) = rest
        .rsplit_once(" :")
        .ok_or_else(|| malformed(format!("missing ` :` separator: {}", text)))?;
    let operation = Operation::parse(op_text, registry)
        .map_err(|source| SequenceParseError::Operation { line, source })?;
    let inputs = input_text
        .split_whitespace()
        .map(|v| parse_var(v).ok_or_else(|| malformed(format!("bad input `{}`", v))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((operation, inputs))
}

fn parse_var(text: &str) -> Option<usize> {
    text.trim().strip_prefix('v')?.parse().ok()
}
