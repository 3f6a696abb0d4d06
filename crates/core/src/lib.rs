//! SCPI toolchain core library.
//!
//! Table-driven parsing of SCPI (Standard Commands for Programmable
//! Instruments) command lines. A [`CommandTable`] declares the keyword
//! pattern and parameter kinds of every command; a [`ParserSession`] splits
//! input lines, matches each command against the table, and decodes its
//! parameters without copying them out of the input.
//!
//! ```
//! use scpi_toolchain_core::{CommandSpec, CommandTable, NumericAttrs, ParamKind, ParamSpec, ParserSession, Unit};
//!
//! let volts = ParamKind::Numeric(NumericAttrs { units: Unit::Volt, ..NumericAttrs::default() });
//! let table = CommandTable::new(vec![
//!     CommandSpec::new("[SOURce#:]VOLTage[:LEVel]", vec![ParamSpec::required(volts)]),
//! ]);
//! let mut session = ParserSession::new(&table);
//! let cmd = session.parse_one("SOUR2:VOLT 500 mV", true).unwrap();
//! assert_eq!(cmd.suffixes.as_slice(), &[2]);
//! assert!((cmd.params[0].to_f64().unwrap() - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]

/// Parser configuration.
pub mod config;
/// SCPI grammar: keyword matcher, splitting, command tree, and related utilities.
pub mod grammar;
/// Numeric program data: scanner and canonical value type.
pub mod number;
/// Decoded parameters, list grammars, and per-kind translators.
pub mod params;
/// Command dispatch over a table.
pub mod session;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Session
pub use session::{CommandError, Commands, ParsedCommand, ParserSession};

// Config
pub use config::{OptionalNodes, ParserConfig};

// Values
pub use number::{NumericSubtype, NumericValue};
pub use params::{ChannelList, NumericList, ParsedKind, ParsedParam, QuotedString};

// Keywords
pub use grammar::keyword::{SuffixRules, SuffixSet};

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, ErrorKind, Severity, Span, codes};

// Tables
pub use grammar::tables::{
    BooleanAttrs, ChannelListAttrs, CharDataAttrs, CommandSpec, CommandTable, NumericAttrs,
    NumericListAttrs, ParamKind, ParamSpec, TableIssue, Unit, ValueRange,
};

// Serialization helpers
pub use grammar::dump::to_pretty_json;
