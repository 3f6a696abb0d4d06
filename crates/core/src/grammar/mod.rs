/// Byte classes and digit helpers shared by the scanners.
pub mod chars;
/// Re-exports from the diagnostics crate.
pub mod diag;
/// JSON serialization helpers for parse results.
pub mod dump;
/// Keyword patterns, numeric suffixes, and the matcher.
pub mod keyword;
/// Command and parameter splitting.
pub mod split;
/// Re-exports of command-table types used by the parser.
pub mod tables;
/// Command tree carried between commands of one line.
pub mod tree;
