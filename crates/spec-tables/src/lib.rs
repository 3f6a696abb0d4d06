//! SCPI command specification tables.
//!
//! Defines the read-only data the parser matches input against: command
//! specs (a keyword pattern plus parameter specs), per-kind parameter
//! attributes, and the units table consulted for numeric values. Tables are
//! usually deserialized from JSON, but every type can also be built in code.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Current format version for the command table JSON schema.
pub const TABLE_FORMAT_VERSION: &str = "1.0.0";

/// Maximum number of parameters a command spec may declare.
pub const MAX_PARAMS: usize = 8;

/// Maximum number of numeric suffixes (`#`) one command may carry.
pub const MAX_NUM_SUFFIX: usize = 4;

// ─── Units ──────────────────────────────────────────────────────────────────

/// Base unit a numeric value is expressed in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Unit {
    /// Dimensionless.
    #[default]
    None,
    /// Volts.
    Volt,
    /// Amperes.
    Ampere,
    /// Ohms.
    Ohm,
    /// Watts.
    Watt,
    /// Decibel-watts (dBW / dBm).
    DecibelWatt,
    /// Joules.
    Joule,
    /// Farads.
    Farad,
    /// Henries.
    Henry,
    /// Hertz.
    Hertz,
    /// Seconds.
    Second,
    /// Kelvin.
    Kelvin,
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Percent.
    Percent,
    /// Decibels.
    Decibel,
    /// Radians.
    Radian,
    /// Degrees of angle.
    Degree,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Unit::None => "none",
            Unit::Volt => "volt",
            Unit::Ampere => "ampere",
            Unit::Ohm => "ohm",
            Unit::Watt => "watt",
            Unit::DecibelWatt => "decibelWatt",
            Unit::Joule => "joule",
            Unit::Farad => "farad",
            Unit::Henry => "henry",
            Unit::Hertz => "hertz",
            Unit::Second => "second",
            Unit::Kelvin => "kelvin",
            Unit::Celsius => "celsius",
            Unit::Fahrenheit => "fahrenheit",
            Unit::Percent => "percent",
            Unit::Decibel => "decibel",
            Unit::Radian => "radian",
            Unit::Degree => "degree",
        };
        f.write_str(s)
    }
}

/// One entry of the units table: the text accepted after a number, the base
/// unit it denotes, and the decimal exponent it applies (`-3` for `MV`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpec {
    /// Units text, matched case-insensitively (e.g., `"MV"`).
    pub text: Cow<'static, str>,
    /// Base unit.
    pub unit: Unit,
    /// Decimal exponent applied to the value.
    #[serde(default)]
    pub exponent: i8,
}

impl UnitSpec {
    /// Build a units-table entry.
    pub const fn new(text: &'static str, unit: Unit, exponent: i8) -> Self {
        Self {
            text: Cow::Borrowed(text),
            unit,
            exponent,
        }
    }
}

/// Units table used when a command table does not supply its own.
///
/// `M` is milli except in `MHZ` and `MOHM`, which are mega, following
/// IEEE 488.2 suffix conventions.
pub const BUILTIN_UNITS: &[UnitSpec] = &[
    UnitSpec::new("UV", Unit::Volt, -6),
    UnitSpec::new("MV", Unit::Volt, -3),
    UnitSpec::new("V", Unit::Volt, 0),
    UnitSpec::new("KV", Unit::Volt, 3),
    UnitSpec::new("UA", Unit::Ampere, -6),
    UnitSpec::new("MA", Unit::Ampere, -3),
    UnitSpec::new("A", Unit::Ampere, 0),
    UnitSpec::new("KA", Unit::Ampere, 3),
    UnitSpec::new("OHM", Unit::Ohm, 0),
    UnitSpec::new("KOHM", Unit::Ohm, 3),
    UnitSpec::new("MOHM", Unit::Ohm, 6),
    UnitSpec::new("UW", Unit::Watt, -6),
    UnitSpec::new("MW", Unit::Watt, -3),
    UnitSpec::new("W", Unit::Watt, 0),
    UnitSpec::new("KW", Unit::Watt, 3),
    UnitSpec::new("DBW", Unit::DecibelWatt, 0),
    UnitSpec::new("DBM", Unit::DecibelWatt, -3),
    UnitSpec::new("J", Unit::Joule, 0),
    UnitSpec::new("PF", Unit::Farad, -12),
    UnitSpec::new("NF", Unit::Farad, -9),
    UnitSpec::new("UF", Unit::Farad, -6),
    UnitSpec::new("F", Unit::Farad, 0),
    UnitSpec::new("UH", Unit::Henry, -6),
    UnitSpec::new("MH", Unit::Henry, -3),
    UnitSpec::new("H", Unit::Henry, 0),
    UnitSpec::new("HZ", Unit::Hertz, 0),
    UnitSpec::new("KHZ", Unit::Hertz, 3),
    UnitSpec::new("MHZ", Unit::Hertz, 6),
    UnitSpec::new("GHZ", Unit::Hertz, 9),
    UnitSpec::new("NS", Unit::Second, -9),
    UnitSpec::new("US", Unit::Second, -6),
    UnitSpec::new("MS", Unit::Second, -3),
    UnitSpec::new("S", Unit::Second, 0),
    UnitSpec::new("K", Unit::Kelvin, 0),
    UnitSpec::new("CEL", Unit::Celsius, 0),
    UnitSpec::new("FAR", Unit::Fahrenheit, 0),
    UnitSpec::new("PCT", Unit::Percent, 0),
    UnitSpec::new("DB", Unit::Decibel, 0),
    UnitSpec::new("RAD", Unit::Radian, 0),
    UnitSpec::new("DEG", Unit::Degree, 0),
];

fn default_units() -> Vec<UnitSpec> {
    BUILTIN_UNITS.to_vec()
}

// ─── Parameter specs ────────────────────────────────────────────────────────

/// Attributes of a numeric parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NumericAttrs {
    /// Units assumed when the input carries none.
    #[serde(default)]
    pub units: Unit,
    /// Exponent assumed when the input carries no units.
    #[serde(default)]
    pub exponent: i8,
    /// Other units the input may use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_units: Vec<Unit>,
}

/// Attributes of a boolean parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BooleanAttrs {
    /// Value used when the parameter is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

/// Attributes of a character-data (enumerated keyword) parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CharDataAttrs {
    /// `|`-separated keyword patterns, e.g. `"BUS|IMMediate|EXTernal"`.
    pub sequence: String,
    /// Item index used when the parameter is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_item: Option<usize>,
    /// Kind tried when the input matches no item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<Box<ParamKind>>,
}

impl CharDataAttrs {
    /// Items of the sequence, in order. Empty items keep their position.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.sequence.split('|')
    }

    /// Item at `index`, if any.
    pub fn item(&self, index: usize) -> Option<&str> {
        self.items().nth(index)
    }
}

/// Inclusive value bounds for list entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueRange {
    /// Smallest allowed value.
    pub min: i64,
    /// Largest allowed value.
    pub max: i64,
}

impl ValueRange {
    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Attributes of a numeric-list parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NumericListAttrs {
    /// Non-integer values are allowed.
    #[serde(default)]
    pub real: bool,
    /// Negative values are allowed.
    #[serde(default)]
    pub negative: bool,
    /// Bounds every value must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_check: Option<ValueRange>,
}

fn default_dims() -> u8 {
    1
}

/// Attributes of a channel-list parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListAttrs {
    /// Non-integer values are allowed.
    #[serde(default)]
    pub real: bool,
    /// Negative values are allowed.
    #[serde(default)]
    pub negative: bool,
    /// Bounds every value must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_check: Option<ValueRange>,
    /// Fewest dimensions an entry may have.
    #[serde(default = "default_dims")]
    pub dim_min: u8,
    /// Most dimensions an entry may have.
    #[serde(default = "default_dims")]
    pub dim_max: u8,
}

impl Default for ChannelListAttrs {
    fn default() -> Self {
        Self {
            real: false,
            negative: false,
            range_check: None,
            dim_min: 1,
            dim_max: 1,
        }
    }
}

/// Kind of a declared parameter, with its kind-specific attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParamKind {
    /// No parameter.
    None,
    /// Decimal or radix number with optional units.
    Numeric(NumericAttrs),
    /// `ON`, `OFF`, or a number.
    Boolean(BooleanAttrs),
    /// One keyword out of a fixed sequence.
    CharacterData(CharDataAttrs),
    /// Single- or double-quoted text.
    String,
    /// Raw text up to the next parameter separator.
    UnquotedString,
    /// IEEE 488.2 definite-length block (`#<n><len><bytes>`).
    ArbitraryBlock,
    /// Bracketed expression.
    Expression,
    /// Bracketed list of numbers and ranges.
    NumericList(NumericListAttrs),
    /// `(@...)` list of channels, module channels, and paths.
    ChannelList(ChannelListAttrs),
}

impl ParamKind {
    /// Short name used in messages and JSON.
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::None => "none",
            ParamKind::Numeric(_) => "numeric",
            ParamKind::Boolean(_) => "boolean",
            ParamKind::CharacterData(_) => "characterData",
            ParamKind::String => "string",
            ParamKind::UnquotedString => "unquotedString",
            ParamKind::ArbitraryBlock => "arbitraryBlock",
            ParamKind::Expression => "expression",
            ParamKind::NumericList(_) => "numericList",
            ParamKind::ChannelList(_) => "channelList",
        }
    }

    /// Whether an empty input decodes to a default value.
    pub fn has_default(&self) -> bool {
        match self {
            ParamKind::Boolean(attrs) => attrs.default.is_some(),
            ParamKind::CharacterData(attrs) => attrs.default_item.is_some(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared parameter of a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    /// Whether the parameter may be omitted.
    #[serde(default)]
    pub optional: bool,
    /// Kind and attributes.
    #[serde(flatten)]
    pub kind: ParamKind,
}

impl ParamSpec {
    /// A required parameter of the given kind.
    pub fn required(kind: ParamKind) -> Self {
        Self {
            optional: false,
            kind,
        }
    }

    /// An optional parameter of the given kind.
    pub fn optional(kind: ParamKind) -> Self {
        Self {
            optional: true,
            kind,
        }
    }
}

// ─── Commands ───────────────────────────────────────────────────────────────

/// One accepted command shape.
///
/// Keyword pattern notation: `:` separates keywords, uppercase letters form
/// the short form, lowercase letters are needed only for the long form,
/// `[...]` marks an optional keyword, `#` marks a numeric suffix, and a
/// leading `*` marks a common command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Keyword pattern, e.g. `"[SOURce#:]VOLTage[:LEVel]"`.
    pub keywords: String,
    /// Declared parameters, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Human-readable name shown by tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CommandSpec {
    /// A command spec with the given keyword pattern and parameters.
    pub fn new(keywords: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        Self {
            keywords: keywords.into(),
            params,
            name: None,
        }
    }

    /// Whether this is a common command (`*IDN?`).
    pub fn is_common(&self) -> bool {
        self.keywords.starts_with('*')
    }
}

/// Top-level container for a command table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandTable {
    /// Schema version of the table contents (free-form, author supplied).
    #[serde(default)]
    pub schema_version: String,
    /// Table format version for compatibility checks.
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// Command specs, tried in order. An empty keyword pattern ends the table.
    pub commands: Vec<CommandSpec>,
    /// Units table.
    #[serde(default = "default_units")]
    pub units: Vec<UnitSpec>,
}

fn default_format_version() -> String {
    TABLE_FORMAT_VERSION.to_string()
}

impl CommandTable {
    /// A table of the given commands using [`BUILTIN_UNITS`].
    pub fn new(commands: Vec<CommandSpec>) -> Self {
        Self {
            schema_version: String::new(),
            format_version: default_format_version(),
            commands,
            units: default_units(),
        }
    }

    /// Deserialize a table from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Command specs up to (not including) the first empty keyword pattern.
    pub fn live_commands(&self) -> &[CommandSpec] {
        let end = self
            .commands
            .iter()
            .position(|c| c.keywords.is_empty())
            .unwrap_or(self.commands.len());
        &self.commands[..end]
    }

    /// Run the table sanity checks.
    ///
    /// The parser accepts any table; these checks find specs that can never
    /// match or never behave as their author intended.
    pub fn check(&self) -> Vec<TableIssue> {
        let mut issues = Vec::new();
        if self.format_version != TABLE_FORMAT_VERSION {
            issues.push(TableIssue {
                command: None,
                param: None,
                kind: TableIssueKind::FormatVersion {
                    found: self.format_version.clone(),
                },
            });
        }
        for (ci, cmd) in self.commands.iter().enumerate() {
            check_command(ci, cmd, &mut issues);
        }
        issues
    }
}

fn check_command(ci: usize, cmd: &CommandSpec, issues: &mut Vec<TableIssue>) {
    let mut push = |param: Option<usize>, kind: TableIssueKind| {
        issues.push(TableIssue {
            command: Some(ci),
            param,
            kind,
        })
    };

    if cmd.keywords.is_empty() {
        push(None, TableIssueKind::EmptyKeywords);
    }

    let mut open = false;
    let mut balanced = true;
    for b in cmd.keywords.bytes() {
        match b {
            b'[' if open => balanced = false,
            b'[' => open = true,
            b']' if !open => balanced = false,
            b']' => open = false,
            _ => {}
        }
    }
    if open || !balanced {
        push(None, TableIssueKind::UnbalancedOptional);
    }

    let suffixes = cmd.keywords.bytes().filter(|&b| b == b'#').count();
    if suffixes > MAX_NUM_SUFFIX {
        push(None, TableIssueKind::TooManySuffixes { count: suffixes });
    }
    if cmd.params.len() > MAX_PARAMS {
        push(
            None,
            TableIssueKind::TooManyParams {
                count: cmd.params.len(),
            },
        );
    }

    let mut gap: Option<usize> = None;
    for (pi, param) in cmd.params.iter().enumerate() {
        if param.optional {
            if gap.is_none() && !param.kind.has_default() {
                gap = Some(pi);
            }
        } else if let Some(optional) = gap {
            push(Some(pi), TableIssueKind::UnreachableParam { optional });
        }
        check_kind(&param.kind, pi, &mut push);
    }
}

fn check_kind(kind: &ParamKind, pi: usize, push: &mut impl FnMut(Option<usize>, TableIssueKind)) {
    match kind {
        ParamKind::CharacterData(attrs) => {
            let len = attrs.items().count();
            if let Some(item) = attrs.default_item
                && item >= len
            {
                push(Some(pi), TableIssueKind::BadDefaultItem { item, len });
            }
            if let Some(alt) = &attrs.alternate {
                match alt.as_ref() {
                    ParamKind::None | ParamKind::CharacterData(_) => push(
                        Some(pi),
                        TableIssueKind::BadAlternate {
                            kind: alt.name().to_string(),
                        },
                    ),
                    other => check_kind(other, pi, push),
                }
            }
        }
        ParamKind::ChannelList(attrs) if attrs.dim_min == 0 || attrs.dim_min > attrs.dim_max => {
            push(
                Some(pi),
                TableIssueKind::BadDimensions {
                    min: attrs.dim_min,
                    max: attrs.dim_max,
                },
            );
        }
        _ => {}
    }
}

// ─── Table issues ───────────────────────────────────────────────────────────

/// A problem found by [`CommandTable::check`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableIssue {
    /// Index of the offending command spec, if the issue is per command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<usize>,
    /// Index of the offending parameter spec, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<usize>,
    /// What is wrong.
    pub kind: TableIssueKind,
}

/// Classification of a [`TableIssue`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum TableIssueKind {
    /// The table was written for a different format version.
    FormatVersion {
        /// Version found in the table.
        found: String,
    },
    /// Empty keyword pattern (terminates the table early).
    EmptyKeywords,
    /// `[`/`]` are unbalanced or nested.
    UnbalancedOptional,
    /// More `#` placeholders than [`MAX_NUM_SUFFIX`].
    TooManySuffixes {
        /// Number of placeholders found.
        count: usize,
    },
    /// More parameters than [`MAX_PARAMS`].
    TooManyParams {
        /// Number of parameters declared.
        count: usize,
    },
    /// Required parameter after an optional parameter with no default.
    UnreachableParam {
        /// Index of the optional parameter without a default.
        optional: usize,
    },
    /// Character-data default item outside the sequence.
    BadDefaultItem {
        /// Declared default item.
        item: usize,
        /// Number of items in the sequence.
        len: usize,
    },
    /// Character-data alternate kind that cannot serve as a fallback.
    BadAlternate {
        /// Name of the alternate kind.
        kind: String,
    },
    /// Channel-list dimension bounds are empty or inverted.
    BadDimensions {
        /// Declared minimum.
        min: u8,
        /// Declared maximum.
        max: u8,
    },
}

impl TableIssueKind {
    /// Whether the issue makes a spec unusable (as opposed to suspicious).
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            TableIssueKind::FormatVersion { .. } | TableIssueKind::UnreachableParam { .. }
        )
    }
}

impl std::fmt::Display for TableIssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableIssueKind::FormatVersion { found } => write!(
                f,
                "table format version {found} differs from supported {TABLE_FORMAT_VERSION}"
            ),
            TableIssueKind::EmptyKeywords => write!(f, "empty keyword pattern ends the table"),
            TableIssueKind::UnbalancedOptional => {
                write!(f, "unbalanced or nested optional brackets")
            }
            TableIssueKind::TooManySuffixes { count } => write!(
                f,
                "{count} numeric suffixes exceed the limit of {MAX_NUM_SUFFIX}"
            ),
            TableIssueKind::TooManyParams { count } => {
                write!(f, "{count} parameters exceed the limit of {MAX_PARAMS}")
            }
            TableIssueKind::UnreachableParam { optional } => write!(
                f,
                "required parameter follows optional parameter {optional}, which has no default"
            ),
            TableIssueKind::BadDefaultItem { item, len } => write!(
                f,
                "default item {item} is outside a sequence of {len} items"
            ),
            TableIssueKind::BadAlternate { kind } => {
                write!(f, "alternate kind {kind} cannot be used as a fallback")
            }
            TableIssueKind::BadDimensions { min, max } => {
                write!(f, "dimension bounds {min}..={max} are invalid")
            }
        }
    }
}
