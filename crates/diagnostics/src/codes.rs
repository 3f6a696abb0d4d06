//! Diagnostic ID constants.
//!
//! Parser ids embed the numeric error code reported to instrument firmware
//! (`SCPI070` is code 70). Table-check ids live in the `SCPI9xx` range.
//! Use these instead of string literals to get compile-time typo detection.

// ─── Parser error kinds ─────────────────────────────────────────────────────

/// More numeric-suffix placeholders than the suffix capacity.
pub const TOO_MANY_NUMERIC_SUFFIXES: &str = "SCPI005";
/// No command text to parse.
pub const NO_COMMAND: &str = "SCPI010";
/// Numeric suffix overflowed or fell outside the configured bounds.
pub const NUMERIC_SUFFIX_INVALID: &str = "SCPI014";
/// A numeric-list or channel-list value violated its attributes.
pub const INVALID_VALUE: &str = "SCPI016";
/// A channel-list entry had an invalid number of dimensions.
pub const INVALID_DIMS: &str = "SCPI017";
/// A numeric value overflowed its storage.
pub const PARAM_OVERFLOW: &str = "SCPI020";
/// Units were unknown or not allowed for the parameter.
pub const PARAM_UNITS: &str = "SCPI030";
/// A parameter had the wrong type.
pub const PARAM_TYPE: &str = "SCPI040";
/// Wrong number of parameters.
pub const PARAM_COUNT: &str = "SCPI050";
/// Unmatched single or double quote.
pub const UNMATCHED_QUOTE: &str = "SCPI060";
/// Unmatched bracket.
pub const UNMATCHED_BRACKET: &str = "SCPI065";
/// Command keywords were not recognized.
pub const INVALID_COMMAND: &str = "SCPI070";
/// List entry index past the end of the list.
pub const NO_ENTRY: &str = "SCPI200";
/// Channel-list entry has more dimensions than the caller can receive.
pub const TOO_MANY_DIMS: &str = "SCPI210";

// ─── Command table checks ───────────────────────────────────────────────────

/// The table declares a format version other than the supported one.
pub const TABLE_VERSION_MISMATCH: &str = "SCPI900";
/// A command spec has an empty keyword pattern.
pub const TABLE_EMPTY_KEYWORDS: &str = "SCPI901";
/// A keyword pattern has unbalanced or nested optional brackets.
pub const TABLE_UNBALANCED_OPTIONAL: &str = "SCPI902";
/// A keyword pattern has more `#` placeholders than the suffix capacity.
pub const TABLE_TOO_MANY_SUFFIXES: &str = "SCPI903";
/// A command spec declares more parameters than the parameter capacity.
pub const TABLE_TOO_MANY_PARAMS: &str = "SCPI904";
/// A required parameter follows an optional parameter without a default.
pub const TABLE_UNREACHABLE_PARAM: &str = "SCPI905";
/// A character-data default item index is outside its sequence.
pub const TABLE_BAD_DEFAULT_ITEM: &str = "SCPI906";
/// A character-data alternate kind cannot be used as a fallback.
pub const TABLE_BAD_ALTERNATE: &str = "SCPI907";
/// A channel-list dimension range is empty or inverted.
pub const TABLE_BAD_DIMENSIONS: &str = "SCPI908";
