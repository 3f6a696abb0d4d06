//! Diagnostics for the SCPI toolchain.
//!
//! Provides the closed [`ErrorKind`] set returned by every parser operation,
//! its specificity ranking, and the [`Diagnostic`], [`Severity`], [`Span`],
//! and [`LineIndex`] types used to report problems to users. Diagnostic ids
//! are defined in the [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── ErrorKind ────────────────────────────────────────────────────────────

/// Every way a parse can fail.
///
/// Each kind carries a numeric code (the value an instrument reports on its
/// error queue). Codes double as a specificity rank: when several candidate
/// command specs fail, the kind with the lowest code is reported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// A keyword pattern holds more `#` placeholders than the suffix capacity.
    #[error("too many numeric suffixes in command pattern")]
    TooManyNumericSuffixes,
    /// There was no command to parse.
    #[error("no command")]
    NoCommand,
    /// A numeric suffix overflowed or fell outside the allowed bounds.
    #[error("numeric suffix is invalid")]
    NumericSuffixInvalid,
    /// A numeric-list or channel-list value violated its attributes.
    #[error("invalid value in list")]
    InvalidValue,
    /// A channel-list entry has the wrong number of dimensions.
    #[error("invalid dimensions in channel list")]
    InvalidDims,
    /// A numeric value cannot be stored.
    #[error("parameter overflow")]
    ParamOverflow,
    /// Units were unknown or not allowed for the parameter.
    #[error("invalid parameter units")]
    ParamUnits,
    /// A parameter had the wrong type.
    #[error("invalid parameter type")]
    ParamType,
    /// The command received the wrong number of parameters.
    #[error("wrong number of parameters")]
    ParamCount,
    /// A quote was never closed.
    #[error("unmatched quotation mark")]
    UnmatchedQuote,
    /// Brackets were not balanced.
    #[error("unmatched bracket")]
    UnmatchedBracket,
    /// The command keywords matched no known command.
    #[error("invalid command")]
    InvalidCommand,
    /// A list entry index was past the end of the list.
    #[error("no entry in list")]
    NoEntry,
    /// A channel-list entry has more dimensions than the caller can receive.
    #[error("too many dimensions in entry")]
    TooManyDims,
}

/// Every [`ErrorKind`] paired with its code, ordered from most to least specific.
const RANKING: &[(ErrorKind, u16)] = &[
    (ErrorKind::TooManyNumericSuffixes, 5),
    (ErrorKind::NoCommand, 10),
    (ErrorKind::NumericSuffixInvalid, 14),
    (ErrorKind::InvalidValue, 16),
    (ErrorKind::InvalidDims, 17),
    (ErrorKind::ParamOverflow, 20),
    (ErrorKind::ParamUnits, 30),
    (ErrorKind::ParamType, 40),
    (ErrorKind::ParamCount, 50),
    (ErrorKind::UnmatchedQuote, 60),
    (ErrorKind::UnmatchedBracket, 65),
    (ErrorKind::InvalidCommand, 70),
    (ErrorKind::NoEntry, 200),
    (ErrorKind::TooManyDims, 210),
];

impl ErrorKind {
    /// All kinds, most specific first.
    pub fn all() -> impl Iterator<Item = ErrorKind> {
        RANKING.iter().map(|&(kind, _)| kind)
    }

    /// Numeric error code reported for this kind.
    pub fn code(self) -> u16 {
        RANKING
            .get(self.rank())
            .map_or(u16::MAX, |&(_, code)| code)
    }

    /// Look up the kind reporting `code`.
    pub fn from_code(code: u16) -> Option<ErrorKind> {
        RANKING
            .iter()
            .find(|&&(_, c)| c == code)
            .map(|&(kind, _)| kind)
    }

    /// Position in the specificity ranking (0 is the most specific).
    pub fn rank(self) -> usize {
        RANKING
            .iter()
            .position(|&(kind, _)| kind == self)
            .unwrap_or(RANKING.len())
    }

    /// The more specific of two kinds. Ties keep `a`.
    pub fn most_specific(a: ErrorKind, b: ErrorKind) -> ErrorKind {
        if b.rank() < a.rank() { b } else { a }
    }

    /// Stable diagnostic id (e.g., `"SCPI070"`).
    pub fn id(self) -> &'static str {
        match self {
            ErrorKind::TooManyNumericSuffixes => codes::TOO_MANY_NUMERIC_SUFFIXES,
            ErrorKind::NoCommand => codes::NO_COMMAND,
            ErrorKind::NumericSuffixInvalid => codes::NUMERIC_SUFFIX_INVALID,
            ErrorKind::InvalidValue => codes::INVALID_VALUE,
            ErrorKind::InvalidDims => codes::INVALID_DIMS,
            ErrorKind::ParamOverflow => codes::PARAM_OVERFLOW,
            ErrorKind::ParamUnits => codes::PARAM_UNITS,
            ErrorKind::ParamType => codes::PARAM_TYPE,
            ErrorKind::ParamCount => codes::PARAM_COUNT,
            ErrorKind::UnmatchedQuote => codes::UNMATCHED_QUOTE,
            ErrorKind::UnmatchedBracket => codes::UNMATCHED_BRACKET,
            ErrorKind::InvalidCommand => codes::INVALID_COMMAND,
            ErrorKind::NoEntry => codes::NO_ENTRY,
            ErrorKind::TooManyDims => codes::TOO_MANY_DIMS,
        }
    }

    /// Look up the kind with diagnostic id `id`.
    pub fn from_id(id: &str) -> Option<ErrorKind> {
        ErrorKind::all().find(|kind| kind.id() == id)
    }
}

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally. Use [`LineIndex::line_col`]
/// to get a `(line, col)` pair and add 1 when displaying to users.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// Offsets past the end land on the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        (line, offset.saturating_sub(self.line_starts[line]))
    }

    /// Byte offset of the start of the given 0-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The input is invalid.
    Error,
    /// The input may not behave as intended.
    Warn,
    /// Informational note.
    Info,
}

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Shift both ends by `offset` bytes.
    pub fn offset(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Number of bytes covered.
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Whether the span is zero-width.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A diagnostic message produced by the parser or the table checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic id (e.g., `"SCPI070"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Byte span in the source input this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Error diagnostic for a parser failure, tagged with its numeric code.
    pub fn from_error(kind: ErrorKind, span: Option<Span>) -> Self {
        Self::error(kind.id(), kind.to_string(), span).with_context(BTreeMap::from([(
            "code".to_string(),
            kind.code().to_string(),
        )]))
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's id, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic id, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    Some(match id {
        codes::TOO_MANY_NUMERIC_SUFFIXES => {
            "The command pattern contains more numeric-suffix placeholders (#) than a \
             parsed command can hold. This is a problem in the command table, not the input."
        }
        codes::NO_COMMAND => {
            "The input held no command text: it was empty or only separators and whitespace."
        }
        codes::NUMERIC_SUFFIX_INVALID => {
            "A numeric suffix embedded in a keyword (e.g., the 2 in OUTPut2) overflowed or \
             fell outside the configured minimum and maximum."
        }
        codes::INVALID_VALUE => {
            "A value inside a numeric list or channel list was fractional where only whole \
             numbers are allowed, negative where only positive values are allowed, or outside \
             the declared range."
        }
        codes::INVALID_DIMS => {
            "A channel-list entry used a number of dimensions (values joined by !) outside the \
             range the parameter accepts, or the two halves of a range disagree."
        }
        codes::PARAM_OVERFLOW => {
            "A numeric value is too large to represent: its decimal exponent exceeds 43 after \
             units are applied, or a radix literal (#b, #q, #h) does not fit in 64 bits."
        }
        codes::PARAM_UNITS => {
            "The units after a numeric value are unknown, or are not the default or an \
             alternate unit of the parameter."
        }
        codes::PARAM_TYPE => {
            "A parameter could not be decoded as the kind the command expects (for example, \
             text where a number is required)."
        }
        codes::PARAM_COUNT => {
            "The command keywords matched, but the number of comma-separated parameters is \
             outside what the command accepts."
        }
        codes::UNMATCHED_QUOTE => "A single or double quotation mark was opened but never closed.",
        codes::UNMATCHED_BRACKET => {
            "Parentheses were not balanced: a bracket was opened but never closed, or closed \
             without being opened."
        }
        codes::INVALID_COMMAND => {
            "The command keywords matched no command in the table, taking the current command \
             tree into account. A leading colon resets the tree."
        }
        codes::NO_ENTRY => "A list entry was requested past the end of the list.",
        codes::TOO_MANY_DIMS => {
            "A channel-list entry has more dimensions than the buffers supplied to receive it."
        }
        codes::TABLE_VERSION_MISMATCH => {
            "The command table was written for a different table format version; some fields \
             may be ignored or misread."
        }
        codes::TABLE_EMPTY_KEYWORDS => "A command spec has an empty keyword pattern.",
        codes::TABLE_UNBALANCED_OPTIONAL => {
            "A keyword pattern has unbalanced or nested optional brackets ([ and ])."
        }
        codes::TABLE_TOO_MANY_SUFFIXES => {
            "A keyword pattern has more # placeholders than a parsed command can hold; \
             matching it always fails."
        }
        codes::TABLE_TOO_MANY_PARAMS => {
            "A command spec declares more parameters than a parsed command can hold."
        }
        codes::TABLE_UNREACHABLE_PARAM => {
            "A required parameter follows an optional parameter that has no default, so the \
             optional parameter can never be omitted."
        }
        codes::TABLE_BAD_DEFAULT_ITEM => {
            "A character-data parameter names a default item index outside its sequence."
        }
        codes::TABLE_BAD_ALTERNATE => {
            "A character-data parameter declares a fallback kind that cannot be used as a \
             fallback (none or character data)."
        }
        codes::TABLE_BAD_DIMENSIONS => {
            "A channel-list parameter has a dimension minimum of zero or greater than its maximum."
        }
        _ => return None,
    })
}
