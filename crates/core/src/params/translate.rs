//! Per-kind parameter translators.
//!
//! Each translator takes the trimmed text of one parameter and produces a
//! [`ParsedParam`] or the error that rejected it.

use tracing::trace;

use super::{ParsedParam, QuotedString, chanlist, numlist};
use crate::grammar::chars::{digit_value, is_whitespace};
use crate::grammar::diag::ErrorKind;
use crate::grammar::keyword::{CharDataInput, SuffixRules, SuffixSet, match_keywords};
use crate::grammar::tables::{
    BUILTIN_UNITS, BooleanAttrs, CharDataAttrs, NumericAttrs, ParamKind, Unit, UnitSpec,
};
use crate::number::{self, NumericValue};

/// Settings shared by every translator call for one command.
#[derive(Debug, Clone, Copy)]
pub struct TranslateContext<'t> {
    /// Units table for numeric suffixes.
    pub units: &'t [UnitSpec],
    /// Numeric-suffix rules applied to character-data items.
    pub rules: SuffixRules,
    /// Accept module channels and path names in channel lists.
    pub advanced_channel_lists: bool,
}

impl Default for TranslateContext<'static> {
    fn default() -> Self {
        Self {
            units: BUILTIN_UNITS,
            rules: SuffixRules::default(),
            advanced_channel_lists: true,
        }
    }
}

/// Translate `text` as a parameter of `kind`.
///
/// `suffixes` holds the command's numeric suffixes. Character-data items
/// with `#` append to it.
///
/// # Errors
///
/// The kind-specific error; see the individual translators.
pub fn translate<'a>(
    kind: &ParamKind,
    text: &'a str,
    ctx: &TranslateContext<'_>,
    suffixes: &mut SuffixSet,
) -> Result<ParsedParam<'a>, ErrorKind> {
    let result = match kind {
        ParamKind::None => Ok(ParsedParam::None),
        ParamKind::Numeric(attrs) => numeric(text, attrs, ctx.units).map(ParsedParam::Numeric),
        ParamKind::Boolean(attrs) => boolean(text, attrs).map(ParsedParam::Boolean),
        ParamKind::CharacterData(attrs) => char_data(text, attrs, ctx, suffixes),
        ParamKind::String => string(text).map(ParsedParam::String),
        ParamKind::UnquotedString => Ok(ParsedParam::UnquotedString(text)),
        ParamKind::ArbitraryBlock => block(text).map(ParsedParam::ArbitraryBlock),
        ParamKind::Expression => expression(text).map(ParsedParam::Expression),
        ParamKind::NumericList(attrs) => numlist::parse(text, attrs).map(ParsedParam::NumericList),
        ParamKind::ChannelList(attrs) => chanlist::parse(text, attrs, ctx.advanced_channel_lists)
            .map(ParsedParam::ChannelList),
    };
    if let Err(kind_err) = result {
        trace!(kind = kind.name(), text, error = %kind_err, "parameter rejected");
    }
    result
}

// ─── Numeric ────────────────────────────────────────────────────────────────

/// Find the units entry spelled by `text`, ignoring case and whitespace
/// in the input.
pub fn match_units<'u>(text: &[u8], units: &'u [UnitSpec]) -> Option<&'u UnitSpec> {
    units.iter().find(|spec| {
        let mut input = text.iter().filter(|&&b| !is_whitespace(b));
        let mut want = spec.text.bytes();
        loop {
            match (input.next(), want.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
                _ => return false,
            }
        }
    })
}

/// Translate a number with optional units.
///
/// Without units the value takes the parameter's default units and
/// exponent.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when no number is present,
/// [`ErrorKind::ParamUnits`] for unknown or disallowed units, and
/// [`ErrorKind::ParamOverflow`] when the value leaves the exponent window.
pub fn numeric(
    text: &str,
    attrs: &NumericAttrs,
    units: &[UnitSpec],
) -> Result<NumericValue, ErrorKind> {
    let bytes = text.as_bytes();
    let (value, next) = number::scan(bytes)?;
    if next >= bytes.len() {
        return value.with_units(attrs.units, attrs.exponent);
    }
    let spec = match_units(&bytes[next..], units).ok_or(ErrorKind::ParamUnits)?;
    if spec.unit != attrs.units && !attrs.alternate_units.contains(&spec.unit) {
        return Err(ErrorKind::ParamUnits);
    }
    value.with_units(spec.unit, spec.exponent)
}

// ─── Boolean ────────────────────────────────────────────────────────────────

/// Translate `ON`, `OFF`, or a number rounded to zero or non-zero.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] for anything else, or an empty parameter with
/// no default. [`ErrorKind::ParamOverflow`] passes through.
pub fn boolean(text: &str, attrs: &BooleanAttrs) -> Result<bool, ErrorKind> {
    if text.is_empty() {
        return attrs.default.ok_or(ErrorKind::ParamType);
    }
    if text.eq_ignore_ascii_case("ON") {
        return Ok(true);
    }
    if text.eq_ignore_ascii_case("OFF") {
        return Ok(false);
    }
    match numeric(text, &NumericAttrs::default(), BUILTIN_UNITS) {
        Ok(value) => Ok(number::round_half_away_from_zero(value.to_f64()) != 0),
        Err(ErrorKind::ParamOverflow) => Err(ErrorKind::ParamOverflow),
        Err(_) => Err(ErrorKind::ParamType),
    }
}

// ─── Character data ─────────────────────────────────────────────────────────

/// Match `text` against the `|`-separated items of a character-data
/// sequence. Items are keyword patterns and may carry `#` suffixes.
///
/// An empty parameter takes the default item. When no item applies the
/// alternate kind is tried.
///
/// # Errors
///
/// The most specific error across the item matches and the alternate:
/// [`ErrorKind::InvalidCommand`] for an empty parameter with nothing to
/// fall back on, otherwise at least [`ErrorKind::ParamType`].
pub fn char_data<'a>(
    text: &'a str,
    attrs: &CharDataAttrs,
    ctx: &TranslateContext<'_>,
    suffixes: &mut SuffixSet,
) -> Result<ParsedParam<'a>, ErrorKind> {
    let best = if text.is_empty() {
        if let Some(item) = attrs.default_item {
            return Ok(ParsedParam::CharacterData { item });
        }
        ErrorKind::InvalidCommand
    } else {
        let input = CharDataInput(text.as_bytes());
        let mut best = ErrorKind::ParamType;
        for (item, pattern) in attrs.items().enumerate() {
            if pattern.is_empty() {
                continue;
            }
            match match_keywords(pattern.as_bytes(), &input, suffixes, &ctx.rules) {
                Ok(_) => return Ok(ParsedParam::CharacterData { item }),
                Err(ErrorKind::InvalidCommand) => {}
                Err(e) => best = ErrorKind::most_specific(best, e),
            }
        }
        best
    };
    match &attrs.alternate {
        Some(alternate) => translate(alternate, text, ctx, suffixes)
            .map_err(|e| ErrorKind::most_specific(best, e)),
        None => Err(best),
    }
}

// ─── Strings and expressions ────────────────────────────────────────────────

/// Translate a `'`- or `"`-quoted string. Inside, the delimiter is escaped
/// by doubling it.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when the text is not one quoted string and
/// [`ErrorKind::UnmatchedQuote`] when the closing quote is missing.
pub fn string(text: &str) -> Result<QuotedString<'_>, ErrorKind> {
    let delimiter = match text.as_bytes().first() {
        Some(&q @ (b'\'' | b'"')) => q,
        _ => return Err(ErrorKind::ParamType),
    };
    let mut inside = false;
    for &b in text.as_bytes() {
        if b == delimiter {
            inside = !inside;
        } else if !inside {
            return Err(ErrorKind::ParamType);
        }
    }
    if inside || text.len() < 2 {
        return Err(ErrorKind::UnmatchedQuote);
    }
    Ok(QuotedString {
        text: &text[1..text.len() - 1],
        delimiter: char::from(delimiter),
    })
}

/// Translate a bracketed expression such as `(1+(2*3))`. The whole text
/// must be one balanced bracket group.
///
/// # Errors
///
/// [`ErrorKind::UnmatchedBracket`] for unbalanced brackets and
/// [`ErrorKind::ParamType`] for text outside the group.
pub fn expression(text: &str) -> Result<&str, ErrorKind> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(ErrorKind::ParamType);
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1).ok_or(ErrorKind::UnmatchedBracket)?;
                if depth == 0 && i + 1 < bytes.len() {
                    return Err(ErrorKind::ParamType);
                }
            }
            _ if depth == 0 => return Err(ErrorKind::ParamType),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ErrorKind::UnmatchedBracket);
    }
    Ok(text)
}

// ─── Arbitrary blocks ───────────────────────────────────────────────────────

/// Translate a definite-length block `#<n><length><bytes>`, where `<n>` is
/// the count of length digits.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when the header is malformed or the payload
/// length differs from the declared length.
pub fn block(text: &str) -> Result<&[u8], ErrorKind> {
    let bytes = text.as_bytes();
    let [b'#', n, rest @ ..] = bytes else {
        return Err(ErrorKind::ParamType);
    };
    let digits = digit_value(*n, 10)
        .filter(|&d| d > 0)
        .ok_or(ErrorKind::ParamType)? as usize;
    let (header, payload) = rest.split_at_checked(digits).ok_or(ErrorKind::ParamType)?;
    let mut length = 0usize;
    for &b in header {
        let d = digit_value(b, 10).ok_or(ErrorKind::ParamType)?;
        length = length
            .checked_mul(10)
            .and_then(|l| l.checked_add(d as usize))
            .ok_or(ErrorKind::ParamType)?;
    }
    if payload.len() != length {
        return Err(ErrorKind::ParamType);
    }
    Ok(payload)
}

/// Units of the first table entry spelled by `text`, if any.
pub fn units_of(text: &str, units: &[UnitSpec]) -> Option<Unit> {
    match_units(text.as_bytes(), units).map(|spec| spec.unit)
}
