//! Trace Parsing Tests.
//!
//! Verifies separators, comments, error positions and file reading.

use std::io::Write;

use clump_core::common::TraceError;
use clump_core::sim::trace::{parse, read_path};
use pretty_assertions::assert_eq;

use crate::common::TestResult;

/// Whitespace and commas both separate tokens.
#[test]
fn mixed_separators() -> TestResult {
    assert_eq!(parse("1 2\t3,4, 5\n6,,7")?, vec![1, 2, 3, 4, 5, 6, 7]);
    Ok(())
}

/// Comments and blank lines are ignored.
#[test]
fn comments_and_blank_lines() -> TestResult {
    let text = "# boot trace\n\n10 11 # loader\n   \n12\n";
    assert_eq!(parse(text)?, vec![10, 11, 12]);
    Ok(())
}

/// An empty trace is valid.
#[test]
fn empty_text_is_empty_trace() -> TestResult {
    assert!(parse("")?.is_empty());
    assert!(parse("# nothing here\n")?.is_empty());
    Ok(())
}

/// The first bad token is reported with its 1-based line.
#[test]
fn invalid_token_reports_line() {
    match parse("1 2\n3 x4 5\n-1") {
        Err(TraceError::InvalidToken { line, token }) => {
            assert_eq!(line, 2);
            assert_eq!(token, "x4");
        }
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

/// Negative block ids are rejected.
#[test]
fn negative_block_is_invalid() {
    assert!(matches!(
        parse("0\n-3"),
        Err(TraceError::InvalidToken { line: 2, .. })
    ));
}

/// Files are read and parsed.
#[test]
fn reads_trace_file() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "# two chunks")?;
    writeln!(file, "0,1,2,3")?;
    writeln!(file, "4 5 6 7")?;
    assert_eq!(read_path(file.path())?, (0..8).collect::<Vec<_>>());
    Ok(())
}

/// A missing file surfaces as an I/O error.
#[test]
fn missing_file_is_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let result = read_path(dir.path().join("absent.trace"));
    assert!(matches!(result, Err(TraceError::Io(_))));
    Ok(())
}
