//! Decoded parameters and their accessors.
//!
//! Text-like parameters borrow from the command line they were parsed
//! from, so a [`ParsedParam`] cannot outlive its input.

/// Channel-list sub-grammar and entry accessors.
pub mod chanlist;
/// Numeric-list grammar and entry accessors.
pub mod numlist;
/// Per-kind parameter translators.
pub mod translate;

use std::borrow::Cow;

use serde::Serialize;

use crate::grammar::diag::ErrorKind;
use crate::grammar::tables::Unit;
use crate::number::{NumericSubtype, NumericValue};

pub use chanlist::ChannelList;
pub use numlist::NumericList;

/// Quoted string parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedString<'a> {
    /// Text between the quotes, with doubled quotes left in place.
    pub text: &'a str,
    /// Quote character that delimited the string (`'` or `"`).
    pub delimiter: char,
}

impl<'a> QuotedString<'a> {
    /// Text with each doubled delimiter collapsed to one.
    pub fn unescaped(&self) -> Cow<'a, str> {
        let single = self.delimiter.to_string();
        let doubled = single.repeat(2);
        if self.text.contains(&doubled) {
            Cow::Owned(self.text.replace(&doubled, &single))
        } else {
            Cow::Borrowed(self.text)
        }
    }
}

/// Kind of a decoded parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParsedKind {
    /// No value (parameter omitted or not declared).
    None,
    /// Numeric value.
    Numeric,
    /// Boolean value.
    Boolean,
    /// Character-data item.
    CharacterData,
    /// Quoted string.
    String,
    /// Unquoted string.
    UnquotedString,
    /// Arbitrary block.
    ArbitraryBlock,
    /// Expression.
    Expression,
    /// Numeric list.
    NumericList,
    /// Channel list.
    ChannelList,
}

/// A decoded parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ParsedParam<'a> {
    /// Omitted or undeclared.
    #[default]
    None,
    /// Number with units.
    Numeric(NumericValue),
    /// `ON`/`OFF` or a number rounded to a truth value.
    Boolean(bool),
    /// Index of the matched item in the character-data sequence.
    CharacterData {
        /// Zero-based item index.
        item: usize,
    },
    /// Quoted string.
    String(QuotedString<'a>),
    /// Raw text.
    UnquotedString(&'a str),
    /// Payload bytes of a definite-length block.
    ArbitraryBlock(&'a [u8]),
    /// Bracketed expression, brackets included.
    Expression(&'a str),
    /// Numeric list.
    NumericList(NumericList<'a>),
    /// Channel list.
    ChannelList(ChannelList<'a>),
}

impl<'a> ParsedParam<'a> {
    /// Kind of the decoded value.
    pub fn kind(&self) -> ParsedKind {
        match self {
            ParsedParam::None => ParsedKind::None,
            ParsedParam::Numeric(_) => ParsedKind::Numeric,
            ParsedParam::Boolean(_) => ParsedKind::Boolean,
            ParsedParam::CharacterData { .. } => ParsedKind::CharacterData,
            ParsedParam::String(_) => ParsedKind::String,
            ParsedParam::UnquotedString(_) => ParsedKind::UnquotedString,
            ParsedParam::ArbitraryBlock(_) => ParsedKind::ArbitraryBlock,
            ParsedParam::Expression(_) => ParsedKind::Expression,
            ParsedParam::NumericList(_) => ParsedKind::NumericList,
            ParsedParam::ChannelList(_) => ParsedKind::ChannelList,
        }
    }

    /// Whether the slot holds no value.
    pub fn is_none(&self) -> bool {
        matches!(self, ParsedParam::None)
    }

    fn numeric(&self) -> Result<&NumericValue, ErrorKind> {
        match self {
            ParsedParam::Numeric(v) => Ok(v),
            _ => Err(ErrorKind::ParamType),
        }
    }

    /// Sign and fractional flags of a numeric value.
    pub fn numeric_subtype(&self) -> Result<NumericSubtype, ErrorKind> {
        self.numeric().map(NumericValue::subtype)
    }

    /// Units of a numeric value.
    pub fn units(&self) -> Result<Unit, ErrorKind> {
        self.numeric().map(|v| v.units)
    }

    /// Item index of a character-data value.
    pub fn to_char_data_item(&self) -> Result<usize, ErrorKind> {
        match self {
            ParsedParam::CharacterData { item } => Ok(*item),
            _ => Err(ErrorKind::ParamType),
        }
    }

    /// Boolean value.
    pub fn to_bool(&self) -> Result<bool, ErrorKind> {
        match self {
            ParsedParam::Boolean(b) => Ok(*b),
            _ => Err(ErrorKind::ParamType),
        }
    }

    /// Numeric value as `u32`; see [`NumericValue::to_u32`].
    pub fn to_u32(&self) -> Result<u32, ErrorKind> {
        self.numeric()?.to_u32()
    }

    /// Numeric value as `i32`; see [`NumericValue::to_i32`].
    pub fn to_i32(&self) -> Result<i32, ErrorKind> {
        self.numeric()?.to_i32()
    }

    /// Numeric value as `u64`; see [`NumericValue::to_u64`].
    pub fn to_u64(&self) -> Result<u64, ErrorKind> {
        self.numeric()?.to_u64()
    }

    /// Numeric value as `i64`; see [`NumericValue::to_i64`].
    pub fn to_i64(&self) -> Result<i64, ErrorKind> {
        self.numeric()?.to_i64()
    }

    /// Numeric value as `f64`.
    pub fn to_f64(&self) -> Result<f64, ErrorKind> {
        self.numeric().map(NumericValue::to_f64)
    }

    /// Text of a string-like parameter and its quote character, if any.
    ///
    /// Lists yield the text between their outer brackets.
    pub fn to_str(&self) -> Result<(&'a str, Option<char>), ErrorKind> {
        match *self {
            ParsedParam::String(s) => Ok((s.text, Some(s.delimiter))),
            ParsedParam::UnquotedString(text) | ParsedParam::Expression(text) => Ok((text, None)),
            ParsedParam::NumericList(list) => Ok((list.text(), None)),
            ParsedParam::ChannelList(list) => Ok((list.text(), None)),
            _ => Err(ErrorKind::ParamType),
        }
    }

    /// Payload of an arbitrary block.
    pub fn to_block(&self) -> Result<&'a [u8], ErrorKind> {
        match *self {
            ParsedParam::ArbitraryBlock(bytes) => Ok(bytes),
            _ => Err(ErrorKind::ParamType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_check_kind() {
        let n = ParsedParam::Numeric(NumericValue::canonical(25, -1, true).expect("fits"));
        assert_eq!(n.kind(), ParsedKind::Numeric);
        assert_eq!(n.to_i32(), Ok(-2));
        assert_eq!(n.to_u32(), Ok(2));
        assert_eq!(n.units(), Ok(Unit::None));
        assert_eq!(
            n.numeric_subtype(),
            Ok(NumericSubtype::NEG | NumericSubtype::REAL)
        );
        assert_eq!(n.to_bool(), Err(ErrorKind::ParamType));
        assert_eq!(n.to_str(), Err(ErrorKind::ParamType));

        let b = ParsedParam::Boolean(true);
        assert_eq!(b.to_bool(), Ok(true));
        assert_eq!(b.to_f64(), Err(ErrorKind::ParamType));

        let c = ParsedParam::CharacterData { item: 2 };
        assert_eq!(c.to_char_data_item(), Ok(2));
        assert_eq!(ParsedParam::None.to_char_data_item(), Err(ErrorKind::ParamType));
        assert!(ParsedParam::None.is_none());
    }

    #[test]
    fn text_accessors() {
        let s = ParsedParam::String(QuotedString {
            text: "abc",
            delimiter: '"',
        });
        assert_eq!(s.to_str(), Ok(("abc", Some('"'))));
        assert_eq!(ParsedParam::UnquotedString("x y").to_str(), Ok(("x y", None)));
        assert_eq!(ParsedParam::Expression("(1+2)").to_str(), Ok(("(1+2)", None)));
        assert_eq!(ParsedParam::ArbitraryBlock(b"\x01\x02").to_block(), Ok(&b"\x01\x02"[..]));
        assert_eq!(s.to_block(), Err(ErrorKind::ParamType));
    }

    #[test]
    fn unescaped_collapses_doubled_delimiters() {
        let q = QuotedString {
            text: "it''s",
            delimiter: '\'',
        };
        assert_eq!(q.unescaped(), "it's");
        let q = QuotedString {
            text: "say \"\"hi\"\" it''s",
            delimiter: '"',
        };
        assert_eq!(q.unescaped(), "say \"hi\" it''s");
        let q = QuotedString {
            text: "plain",
            delimiter: '"',
        };
        assert!(matches!(q.unescaped(), Cow::Borrowed("plain")));
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(ParsedParam::Boolean(false)).expect("json");
        assert_eq!(json, serde_json::json!({"type": "boolean", "value": false}));
        let json = serde_json::to_value(ParsedParam::CharacterData { item: 1 }).expect("json");
        assert_eq!(json, serde_json::json!({"type": "characterData", "value": {"item": 1}}));
    }
}
