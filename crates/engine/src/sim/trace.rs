//! Block trace parsing.
//!
//! A trace is plain text holding one block id per token. Tokens are
//! separated by whitespace or commas, `#` starts a comment that runs to the
//! end of the line, and blank lines are ignored.

use std::fs;
use std::path::Path;

use crate::common::{BlockId, TraceError};

/// Parses a trace held in memory.
///
/// # Errors
///
/// `TraceError::InvalidToken` for the first token that is not a
/// non-negative integer, with its 1-based line number.
pub fn parse(text: &str) -> Result<Vec<BlockId>, TraceError> {
    let mut blocks = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let data = line.split('#').next().unwrap_or_default();
        for token in data
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let block = token.parse().map_err(|_| TraceError::InvalidToken {
                line: idx + 1,
                token: token.to_owned(),
            })?;
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// `TraceError::Io` if the file cannot be read, otherwise as [`parse`].
pub fn read_path(path: impl AsRef<Path>) -> Result<Vec<BlockId>, TraceError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}
