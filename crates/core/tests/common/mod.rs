//! Shared test helpers for `scpi_toolchain_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::LazyLock;
use scpi_toolchain_core::{CommandError, CommandTable, ErrorKind, ParsedCommand, ParserSession};

/// Demonstration table loaded once per test binary via LazyLock.
pub static TABLE: LazyLock<CommandTable> = LazyLock::new(|| {
    let path =
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../cli/data/commands.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    CommandTable::from_json(&json)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
});

// ─── Line helpers ────────────────────────────────────────────────────────────

/// Parse every command of `line` with a fresh session.
#[allow(dead_code)]
pub fn parse_line(line: &str) -> Vec<Result<ParsedCommand<'_>, CommandError>> {
    let mut session = ParserSession::new(&TABLE);
    session.commands(line).collect()
}

/// Parse the single command in `line`, panicking on failure.
#[allow(dead_code)]
pub fn parse_ok(line: &str) -> ParsedCommand<'_> {
    let mut session = ParserSession::new(&TABLE);
    session
        .parse_one(line, true)
        .unwrap_or_else(|e| panic!("{line:?} failed: {e}"))
}

/// Error kind of the single command in `line`, panicking on success.
#[allow(dead_code)]
pub fn parse_err(line: &str) -> ErrorKind {
    let mut session = ParserSession::new(&TABLE);
    match session.parse_one(line, true) {
        Ok(c) => panic!("{line:?} unexpectedly parsed as command {}", c.index),
        Err(e) => e.kind,
    }
}

/// Name of the matched command, as declared in the table.
#[allow(dead_code)]
pub fn name_of(command: &ParsedCommand<'_>) -> &'static str {
    TABLE.commands[command.index]
        .name
        .as_deref()
        .unwrap_or_else(|| panic!("command {} has no name", command.index))
}

/// Names of every command on `line`, or the error kind for failures.
#[allow(dead_code)]
pub fn names(line: &str) -> Vec<Result<&'static str, ErrorKind>> {
    parse_line(line)
        .iter()
        .map(|r| r.as_ref().map(name_of).map_err(|e| e.kind))
        .collect()
}
