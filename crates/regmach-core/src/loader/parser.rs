//! Program Parser
//!
//! Splits source text into instructions and builds the label table.
//! This layer performs tokenization only; arity and operand checks belong to
//! the validator.
//!
//! # Syntax
//!
//! ```text
//! [label:] OPCODE arg1, arg2   // optional comment
//! ```
//!
//! - Opcodes are case-insensitive and stored upper-cased
//! - Arguments are separated by whitespace and/or commas
//! - Lines starting with `//` and blank lines are skipped

use log::warn;

use crate::error::ParseError;
use crate::isa::{Instruction, Program};

const COMMENT_PREFIX: &str = "//";
const LABEL_SUFFIX: char = ':';

/// Parse program source into a [`Program`]
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let mut instructions = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        let (label, body) = split_label(text, line)?;
        let mut tokens = tokenize(body);
        let mnemonic = tokens
            .next()
            .ok_or(ParseError::MissingOpcode { line })?
            .to_ascii_uppercase();
        let args = tokens.map(str::to_string).collect();

        instructions.push(Instruction {
            label,
            mnemonic,
            args,
            line,
        });
    }

    let program = Program::from_instructions(instructions);
    for (label, line) in program.duplicate_labels() {
        warn!("line {}: label `{}` already defined, keeping the first definition", line, label);
    }
    Ok(program)
}

fn strip_comment(raw: &str) -> &str {
    match raw.find(COMMENT_PREFIX) {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

/// Split an optional `label:` prefix off a trimmed line
fn split_label(text: &str, line: usize) -> Result<(Option<String>, &str), ParseError> {
    let Some((head, rest)) = text.split_once(LABEL_SUFFIX) else {
        return Ok((None, text));
    };

    let label = head.trim();
    if label.chars().any(|c| c.is_whitespace() || c == ',') {
        // The colon belongs to an operand, not to a label
        return Ok((None, text));
    }
    if label.is_empty() {
        return Err(ParseError::InvalidLabel {
            line,
            label: label.to_string(),
        });
    }

    Ok((Some(label.to_string()), rest))
}

fn tokenize(body: &str) -> impl Iterator<Item = &str> {
    body.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}
