//! Numeric lists: `(1,3:5,-2.5)`.
//!
//! Entries are numbers or `first:last` ranges separated by commas.

use serde::{Serialize, Serializer};

use crate::grammar::diag::ErrorKind;
use crate::grammar::tables::{NumericListAttrs, ValueRange};
use crate::number::{self, NumericValue};

/// Check one list value against list attributes.
pub(crate) fn check_value(
    value: &NumericValue,
    real: bool,
    negative: bool,
    range: Option<&ValueRange>,
) -> Result<(), ErrorKind> {
    if !real && value.negative_exponent {
        return Err(ErrorKind::InvalidValue);
    }
    if !negative && value.negative {
        return Err(ErrorKind::InvalidValue);
    }
    if let Some(range) = range {
        let v = value.to_i64().map_err(|_| ErrorKind::InvalidValue)?;
        if !range.contains(v) {
            return Err(ErrorKind::InvalidValue);
        }
    }
    Ok(())
}

/// Validate a bracketed numeric list and return it.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] for structural problems anywhere in the list,
/// otherwise [`ErrorKind::InvalidValue`] for values the attributes reject.
pub fn parse<'a>(text: &'a str, attrs: &NumericListAttrs) -> Result<NumericList<'a>, ErrorKind> {
    let b = text.as_bytes();
    let len = b.len();
    if len <= 2 || b[0] != b'(' || b[len - 1] != b')' {
        return Err(ErrorKind::ParamType);
    }
    let last = len - 1;
    let mut pos = 1;
    let mut range = false;
    let mut rejected = Ok(());
    while pos < last {
        let (value, next) = number::scan(&b[pos..]).map_err(|_| ErrorKind::ParamType)?;
        if rejected.is_ok() {
            rejected = check_value(&value, attrs.real, attrs.negative, attrs.range_check.as_ref());
        }
        pos += next;
        if pos < last {
            match b[pos] {
                b':' if range => return Err(ErrorKind::ParamType),
                b':' => range = true,
                b',' => range = false,
                _ => return Err(ErrorKind::ParamType),
            }
            pos += 1;
            if pos == last {
                return Err(ErrorKind::ParamType);
            }
        }
    }
    rejected?;
    Ok(NumericList {
        text: &text[1..last],
    })
}

/// One numeric-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumericListEntry {
    /// Single value, or the first value of a range.
    pub first: NumericValue,
    /// Last value of a range.
    pub last: Option<NumericValue>,
}

/// A validated numeric list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericList<'a> {
    text: &'a str,
}

impl<'a> NumericList<'a> {
    /// Text between the brackets.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.bytes().filter(|&b| b == b',').count() + 1
        }
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the entry at `index`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoEntry`] past the end of the list.
    pub fn entry(&self, index: usize) -> Result<NumericListEntry, ErrorKind> {
        let text = self
            .text
            .split(',')
            .nth(index)
            .ok_or(ErrorKind::NoEntry)?
            .as_bytes();
        let (first, next) = number::scan(text).map_err(|_| ErrorKind::ParamType)?;
        let last = match text.get(next) {
            Some(b':') => Some(
                number::scan(&text[next + 1..])
                    .map_err(|_| ErrorKind::ParamType)?
                    .0,
            ),
            _ => None,
        };
        Ok(NumericListEntry { first, last })
    }

    /// Decode every entry in order.
    pub fn entries(&self) -> impl Iterator<Item = Result<NumericListEntry, ErrorKind>> + '_ {
        (0..self.len()).map(|i| self.entry(i))
    }
}

impl Serialize for NumericList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text)
    }
}
