//! Channel lists: `(@1!2,3:5,slot2(1:4),DMM)`.
//!
//! Each comma-separated entry is one of:
//!
//! - a channel range: dimensions joined by `!`, optionally `first:last`
//! - a module channel: a module number or name, then a bracketed range
//! - a path name: character program data such as `DMM` or `out_1`
//!
//! The parsers below each take the whole list text, a cursor, and an end
//! bound, so every alternative can be tried and tested on its own.

use std::ops::Range;

use serde::{Serialize, Serializer};

use super::numlist::check_value;
use crate::grammar::chars::{is_whitespace, trim};
use crate::grammar::diag::ErrorKind;
use crate::grammar::tables::ChannelListAttrs;
use crate::number::{self, NumericValue};

// ─── Entry grammars ─────────────────────────────────────────────────────────

fn check_dims(first: u32, last: u32, range: bool, attrs: &ChannelListAttrs) -> Result<(), ErrorKind> {
    // One-dimensional range halves are broadcast to the minimum dimension count.
    if range && first == 1 && last == 1 {
        return Ok(());
    }
    let allowed = u32::from(attrs.dim_min)..=u32::from(attrs.dim_max);
    if !allowed.contains(&first) || (range && first != last) {
        return Err(ErrorKind::InvalidDims);
    }
    Ok(())
}

/// Parse a channel range starting at `*pos` and ending at or before the
/// inclusive index `last`.
///
/// A trailing `,` is consumed. With `check`, values and dimension counts
/// are validated.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] for malformed text, [`ErrorKind::InvalidValue`]
/// and [`ErrorKind::InvalidDims`] for values and shapes `check` rejects.
pub fn parse_channel_range(
    text: &[u8],
    pos: &mut usize,
    last: usize,
    check: Option<&ChannelListAttrs>,
) -> Result<(), ErrorKind> {
    if *pos > last || last >= text.len() {
        return Err(ErrorKind::ParamType);
    }
    let mut dims_first = 1u32;
    let mut dims_last = 1u32;
    let mut range = false;
    loop {
        let (value, next) =
            number::scan(&text[*pos..=last]).map_err(|_| ErrorKind::ParamType)?;
        if let Some(attrs) = check {
            check_value(&value, attrs.real, attrs.negative, attrs.range_check.as_ref())?;
        }
        *pos += next;
        if *pos > last {
            break;
        }
        match text[*pos] {
            b'!' if range => dims_last += 1,
            b'!' => dims_first += 1,
            b':' if range => return Err(ErrorKind::ParamType),
            b':' => range = true,
            b',' => {
                *pos += 1;
                if *pos > last {
                    return Err(ErrorKind::ParamType);
                }
                break;
            }
            _ => return Err(ErrorKind::ParamType),
        }
        *pos += 1;
        if *pos > last {
            return Err(ErrorKind::ParamType);
        }
    }
    if let Some(attrs) = check {
        check_dims(dims_first, dims_last, range, attrs)?;
    }
    Ok(())
}

/// Parse a module channel such as `slot2(1:4)` starting at `*pos`, with
/// brackets searched for before the exclusive index `end`.
///
/// Whitespace and one `,` after the closing bracket are consumed.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when the entry is not a module channel, or the
/// channel range's error.
pub fn parse_module_channel(
    text: &[u8],
    pos: &mut usize,
    end: usize,
    check: Option<&ChannelListAttrs>,
) -> Result<(), ErrorKind> {
    let (open, close) = module_brackets(text, *pos, end)?;
    parse_module_specifier(&text[*pos..open])?;
    let mut p = open + 1;
    while p < close {
        parse_channel_range(text, &mut p, close - 1, check)?;
        while p < close && is_whitespace(text[p]) {
            p += 1;
        }
    }
    p = close + 1;
    while p < end && is_whitespace(text[p]) {
        p += 1;
    }
    if p < end {
        if text[p] != b',' {
            return Err(ErrorKind::ParamType);
        }
        p += 1;
    }
    *pos = p;
    Ok(())
}

/// Positions of the module channel's brackets, which must enclose at least
/// one byte.
fn module_brackets(text: &[u8], start: usize, end: usize) -> Result<(usize, usize), ErrorKind> {
    let end = end.min(text.len());
    let open = (start..end)
        .find(|&i| text[i] == b'(')
        .ok_or(ErrorKind::ParamType)?;
    let close = (open + 1..end)
        .find(|&i| text[i] == b')')
        .ok_or(ErrorKind::ParamType)?;
    if close == open + 1 {
        return Err(ErrorKind::ParamType);
    }
    Ok((open, close))
}

fn trim_str(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii() && is_whitespace(c as u8))
}

/// A module specifier: a number taking the whole text, else a name.
fn parse_module_specifier(text: &[u8]) -> Result<ModuleSpecifier<'_>, ErrorKind> {
    if let Ok((value, next)) = number::scan(text)
        && next == text.len()
    {
        return Ok(ModuleSpecifier::Number(value));
    }
    parse_char_program_data(text)?;
    let name = std::str::from_utf8(trim(text)).map_err(|_| ErrorKind::ParamType)?;
    Ok(ModuleSpecifier::Name(name))
}

/// Parse a path name starting at `*pos`, ending at the next `,` or after
/// the inclusive index `last`. The `,` is consumed.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when the text is not character program data.
pub fn parse_path_name(text: &[u8], pos: &mut usize, last: usize) -> Result<(), ErrorKind> {
    if *pos > last || last >= text.len() {
        return Err(ErrorKind::ParamType);
    }
    let stop = (*pos..=last)
        .find(|&i| text[i] == b',')
        .unwrap_or(last + 1);
    parse_char_program_data(&text[*pos..stop])?;
    *pos = stop + 1;
    Ok(())
}

/// Check character program data: after trimming whitespace, a letter
/// followed by letters, digits, or `_`.
///
/// # Errors
///
/// [`ErrorKind::ParamType`] otherwise.
pub fn parse_char_program_data(text: &[u8]) -> Result<(), ErrorKind> {
    match trim(text).split_first() {
        Some((first, rest))
            if first.is_ascii_alphabetic()
                && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_') =>
        {
            Ok(())
        }
        _ => Err(ErrorKind::ParamType),
    }
}

/// Byte range of entry `index` of a channel-list body.
///
/// Commas inside brackets do not separate entries.
///
/// # Errors
///
/// [`ErrorKind::NoEntry`] past the end, and [`ErrorKind::ParamType`] when
/// the entry is left inside an open bracket.
pub fn locate_entry(text: &[u8], index: usize) -> Result<Range<usize>, ErrorKind> {
    let mut remaining = index;
    let mut start = 0;
    let mut bracketed = false;
    for (i, &b) in text.iter().enumerate() {
        match b {
            b',' if !bracketed => {
                if remaining == 0 {
                    return Ok(start..i);
                }
                remaining -= 1;
                start = i + 1;
            }
            b'(' => bracketed = true,
            b')' => bracketed = false,
            _ => {}
        }
    }
    match (remaining, bracketed) {
        (0, false) => Ok(start..text.len()),
        (0, true) => Err(ErrorKind::ParamType),
        _ => Err(ErrorKind::NoEntry),
    }
}

/// Validate a whole `(@...)` channel list and return it.
///
/// Entries are tried as a channel range, then (when `advanced`) as a module
/// channel and a path name. If all fail, the channel range's error is
/// returned.
///
/// # Errors
///
/// [`ErrorKind::ParamType`], [`ErrorKind::InvalidValue`], or
/// [`ErrorKind::InvalidDims`].
pub fn parse<'a>(
    text: &'a str,
    attrs: &ChannelListAttrs,
    advanced: bool,
) -> Result<ChannelList<'a>, ErrorKind> {
    let b = text.as_bytes();
    let len = b.len();
    if len <= 3 || !b.starts_with(b"(@") || b[len - 1] != b')' {
        return Err(ErrorKind::ParamType);
    }
    let last = len - 2;
    let mut pos = 2;
    while pos <= last {
        let start = pos;
        let Err(range_err) = parse_channel_range(b, &mut pos, last, Some(attrs)) else {
            continue;
        };
        if advanced {
            pos = start;
            if parse_module_channel(b, &mut pos, len - 1, Some(attrs)).is_ok() {
                continue;
            }
            pos = start;
            if parse_path_name(b, &mut pos, last).is_ok() {
                continue;
            }
        }
        return Err(range_err);
    }
    Ok(ChannelList {
        text: &text[2..len - 1],
        broadcast: attrs.dim_min,
    })
}

// ─── Validated list ─────────────────────────────────────────────────────────

/// Which grammar an entry follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// Channel range (`1!2`, `3:5`).
    ChannelRange,
    /// Module channel (`slot2(1:4)`).
    ModuleChannel,
    /// Path name (`DMM`).
    PathName,
}

/// Shape of a decoded channel-range entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelEntry {
    /// Number of dimensions filled in each buffer.
    pub dims: usize,
    /// Whether the entry is a `first:last` range.
    pub range: bool,
}

/// Module part of a module-channel entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleSpecifier<'a> {
    /// Numbered module.
    Number(NumericValue),
    /// Named module.
    Name(&'a str),
}

/// A decoded module-channel entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleEntry<'a> {
    /// Module number or name.
    pub module: ModuleSpecifier<'a>,
    /// Channels inside the brackets.
    pub channels: ChannelList<'a>,
}

/// One classified entry, as yielded by [`ChannelList::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelListItem<'a> {
    /// Grammar the entry follows.
    pub kind: EntryKind,
    /// Entry text.
    pub text: &'a str,
}

/// A validated channel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelList<'a> {
    text: &'a str,
    broadcast: u8,
}

impl<'a> ChannelList<'a> {
    /// Text between `(@` and `)`.
    pub fn text(&self) -> &'a str {
        self.text
    }

    fn entry_bytes(&self, index: usize) -> Result<&'a [u8], ErrorKind> {
        let bytes = self.text.as_bytes();
        let range = locate_entry(bytes, index)?;
        Ok(&bytes[range])
    }

    fn entry_str(&self, index: usize) -> Result<&'a str, ErrorKind> {
        let range = locate_entry(self.text.as_bytes(), index)?;
        self.text.get(range).ok_or(ErrorKind::ParamType)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        (0..)
            .take_while(|&i| !matches!(locate_entry(self.text.as_bytes(), i), Err(ErrorKind::NoEntry)))
            .count()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Classify entry `index`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoEntry`] past the end, [`ErrorKind::ParamType`] when
    /// no grammar fits.
    pub fn entry_kind(&self, index: usize) -> Result<EntryKind, ErrorKind> {
        let entry = self.entry_bytes(index)?;
        let last = entry.len().checked_sub(1).ok_or(ErrorKind::ParamType)?;
        if parse_channel_range(entry, &mut 0, last, None).is_ok() {
            Ok(EntryKind::ChannelRange)
        } else if parse_module_channel(entry, &mut 0, entry.len(), None).is_ok() {
            Ok(EntryKind::ModuleChannel)
        } else if parse_path_name(entry, &mut 0, last).is_ok() {
            Ok(EntryKind::PathName)
        } else {
            Err(ErrorKind::ParamType)
        }
    }

    /// Decode channel-range entry `index` into `first` (and `last` for a
    /// range), one value per dimension.
    ///
    /// A range whose halves have one dimension each is broadcast to the
    /// list's minimum dimension count: `3:5` in a two-dimensional list
    /// decodes as `(3,3)` to `(5,5)`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoEntry`] past the end, [`ErrorKind::TooManyDims`] when
    /// a buffer is too small, [`ErrorKind::ParamType`] when the entry is not
    /// a channel range.
    pub fn entry(
        &self,
        index: usize,
        first: &mut [NumericValue],
        last: &mut [NumericValue],
    ) -> Result<ChannelEntry, ErrorKind> {
        let entry = self.entry_bytes(index)?;
        let mut pos = 0;
        let mut dim = 0;
        let mut range = false;
        let mut first_dims = 0;
        while pos < entry.len() {
            let buf: &mut [NumericValue] = if range { &mut *last } else { &mut *first };
            let slot = buf.get_mut(dim).ok_or(ErrorKind::TooManyDims)?;
            let (value, next) = number::scan(&entry[pos..]).map_err(|_| ErrorKind::ParamType)?;
            *slot = value;
            pos += next;
            match entry.get(pos) {
                None => break,
                Some(b'!') => dim += 1,
                Some(b':') if !range => {
                    range = true;
                    first_dims = dim + 1;
                    dim = 0;
                }
                Some(_) => return Err(ErrorKind::ParamType),
            }
            pos += 1;
        }
        let dims = dim + 1;
        if !range {
            return Ok(ChannelEntry { dims, range });
        }
        if dims != first_dims {
            return Err(ErrorKind::InvalidDims);
        }
        let broadcast = usize::from(self.broadcast);
        if dims == 1 && broadcast > 1 {
            if first.len() < broadcast || last.len() < broadcast {
                return Err(ErrorKind::TooManyDims);
            }
            let (f, l) = (first[0], last[0]);
            first[..broadcast].fill(f);
            last[..broadcast].fill(l);
            return Ok(ChannelEntry {
                dims: broadcast,
                range,
            });
        }
        Ok(ChannelEntry { dims, range })
    }

    /// Decode module-channel entry `index`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoEntry`] past the end, [`ErrorKind::ParamType`] when
    /// the entry is not a module channel.
    pub fn module_entry(&self, index: usize) -> Result<ModuleEntry<'a>, ErrorKind> {
        let text = self.entry_str(index)?;
        let entry = text.as_bytes();
        parse_module_channel(entry, &mut 0, entry.len(), None).map_err(|_| ErrorKind::ParamType)?;
        let (open, close) = module_brackets(entry, 0, entry.len())?;
        let module = parse_module_specifier(&entry[..open])?;
        let channels = ChannelList {
            text: text.get(open + 1..close).ok_or(ErrorKind::ParamType)?,
            broadcast: self.broadcast,
        };
        Ok(ModuleEntry { module, channels })
    }

    /// Decode path-name entry `index`, trimmed of whitespace.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoEntry`] past the end, [`ErrorKind::ParamType`] when
    /// the entry is not a path name.
    pub fn path_entry(&self, index: usize) -> Result<&'a str, ErrorKind> {
        let text = self.entry_str(index)?;
        let entry = text.as_bytes();
        let last = entry.len().checked_sub(1).ok_or(ErrorKind::ParamType)?;
        parse_path_name(entry, &mut 0, last)?;
        Ok(trim_str(text))
    }

    /// Classify every entry in order.
    pub fn entries(&self) -> impl Iterator<Item = Result<ChannelListItem<'a>, ErrorKind>> + '_ {
        (0..self.len()).map(|i| {
            Ok(ChannelListItem {
                kind: self.entry_kind(i)?,
                text: trim_str(self.entry_str(i)?),
            })
        })
    }
}

impl Serialize for ChannelList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text)
    }
}
