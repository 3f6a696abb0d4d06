//! Keyword pattern matcher.
//!
//! Matches a keyword pattern such as `[SOURce#:]VOLTage[:LEVel]` against
//! input keywords, either the keyword run of a command (read through the
//! current command tree) or the text of a character-data parameter.
//!
//! Pattern notation:
//!
//! - uppercase letters are required in both short and long forms
//! - lowercase letters are required only once the long form is in use
//! - `[...]` is an optional segment, skipped whole if it does not match
//! - `#` is a numeric suffix, an unsigned integer embedded in the keyword
//!
//! Comparison is ASCII case-insensitive and the input must be consumed
//! exactly.

use serde::{Serialize, Serializer};

use super::chars::{append_digit_u32, digit_value};
use super::diag::ErrorKind;
use super::tables::MAX_NUM_SUFFIX;

// ─── Numeric suffixes ───────────────────────────────────────────────────────

/// Fixed-capacity list of numeric suffixes extracted from one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SuffixSet {
    values: [u32; MAX_NUM_SUFFIX],
    len: usize,
}

impl SuffixSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a slice.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TooManyNumericSuffixes`] when `values` exceeds the capacity.
    pub fn from_slice(values: &[u32]) -> Result<Self, ErrorKind> {
        let mut set = Self::new();
        for &v in values {
            set.push(v)?;
        }
        Ok(set)
    }

    /// Number of suffixes held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no suffix is held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Suffix at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.as_slice().get(index).copied()
    }

    /// Held suffixes, in pattern order.
    pub fn as_slice(&self) -> &[u32] {
        &self.values[..self.len]
    }

    /// Append a suffix.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TooManyNumericSuffixes`] when the set is full.
    pub fn push(&mut self, value: u32) -> Result<(), ErrorKind> {
        let slot = self
            .values
            .get_mut(self.len)
            .ok_or(ErrorKind::TooManyNumericSuffixes)?;
        *slot = value;
        self.len += 1;
        Ok(())
    }

    /// Drop suffixes past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }
}

impl Serialize for SuffixSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

/// Bounds and default applied to numeric suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixRules {
    /// Smallest accepted suffix.
    pub min: u32,
    /// Largest accepted suffix.
    pub max: u32,
    /// Value used when a `#` position carries no digits.
    pub default: u32,
}

impl Default for SuffixRules {
    fn default() -> Self {
        Self {
            min: 1,
            max: u32::MAX,
            default: 1,
        }
    }
}

// ─── Input views ────────────────────────────────────────────────────────────

/// Input side of a keyword match.
pub trait KeywordInput {
    /// Byte at `pos`, or `None` past the end.
    fn at(&self, pos: usize) -> Option<u8>;

    /// Position matching starts from.
    fn start(&self) -> usize {
        0
    }

    /// Whether the matcher should record the command-tree size.
    fn tracks_tree(&self) -> bool {
        false
    }
}

/// Keyword run of a command, read as the current tree prefix followed by
/// the command's own keywords.
#[derive(Debug, Clone, Copy)]
pub struct FullCommand<'a> {
    tree: &'a [u8],
    keywords: &'a [u8],
}

impl<'a> FullCommand<'a> {
    /// View `keywords` through the tree prefix `tree`.
    pub fn new(tree: &'a [u8], keywords: &'a [u8]) -> Self {
        Self { tree, keywords }
    }

    /// Whether the command is a common command (`*IDN?`).
    pub fn is_common(&self) -> bool {
        self.keywords.first() == Some(&b'*')
    }

    /// Length of the virtual tree-plus-keywords sequence.
    pub fn len(&self) -> usize {
        self.tree.len() + self.keywords.len()
    }

    /// Whether both the tree and the keywords are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeywordInput for FullCommand<'_> {
    fn at(&self, pos: usize) -> Option<u8> {
        match pos.checked_sub(self.tree.len()) {
            None => self.tree.get(pos).copied(),
            Some(i) => self.keywords.get(i).copied(),
        }
    }

    // Common commands ignore the tree.
    fn start(&self) -> usize {
        if self.is_common() { self.tree.len() } else { 0 }
    }

    fn tracks_tree(&self) -> bool {
        true
    }
}

/// Text of a character-data parameter.
#[derive(Debug, Clone, Copy)]
pub struct CharDataInput<'a>(pub &'a [u8]);

impl KeywordInput for CharDataInput<'_> {
    fn at(&self, pos: usize) -> Option<u8> {
        self.0.get(pos).copied()
    }
}

// ─── Optional segments ──────────────────────────────────────────────────────

/// State saved on entry to an optional segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMark {
    /// Input cursor at the `[`.
    pub input: usize,
    /// Pattern cursor just after the `[`.
    pub pattern: usize,
    /// Suffix count at the `[`.
    pub suffixes: usize,
    /// Long-form flag at the `[`.
    pub long_form: bool,
}

/// Try-or-skip combinator for one `[...]` segment.
///
/// Entering snapshots the cursors; abandoning rolls the input back, moves
/// the pattern to the closing `]`, and gives every `#` in the segment the
/// default suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalSegment {
    mark: Option<SegmentMark>,
}

impl OptionalSegment {
    /// Start a segment.
    pub fn enter(&mut self, mark: SegmentMark) {
        self.mark = Some(mark);
    }

    /// The segment matched; forget the snapshot.
    pub fn leave(&mut self) {
        self.mark = None;
    }

    /// Whether a segment is being attempted.
    pub fn is_open(&self) -> bool {
        self.mark.is_some()
    }

    /// Give up on the segment.
    ///
    /// Returns the mark to restore, with `pattern` moved onto the closing
    /// `]` (or the pattern end when unbalanced).
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TooManyNumericSuffixes`] when the defaults do not fit.
    /// [`ErrorKind::InvalidCommand`] when no segment is open.
    pub fn abandon(
        &mut self,
        pattern: &[u8],
        suffixes: &mut SuffixSet,
        default: u32,
    ) -> Result<SegmentMark, ErrorKind> {
        let mut mark = self.mark.take().ok_or(ErrorKind::InvalidCommand)?;
        suffixes.truncate(mark.suffixes);
        let mut pos = mark.pattern;
        while let Some(&c) = pattern.get(pos) {
            match c {
                b']' => break,
                b'#' => suffixes.push(default)?,
                _ => {}
            }
            pos += 1;
        }
        mark.pattern = pos;
        Ok(mark)
    }
}

// ─── Matcher ────────────────────────────────────────────────────────────────

/// Successful keyword match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordMatch {
    /// Pattern offset where the matched command's tree ends (0 for none).
    pub tree_size: usize,
}

/// Digits collected for the `#` being matched.
#[derive(Debug, Default)]
struct PendingSuffix {
    value: Option<u32>,
    overflow: bool,
}

impl PendingSuffix {
    fn push_digit(&mut self, digit: u32) {
        match append_digit_u32(self.value.unwrap_or(0), digit) {
            Some(v) => self.value = Some(v),
            None => {
                self.value.get_or_insert(0);
                self.overflow = true;
            }
        }
    }

    /// Finished value, and whether it is acceptable.
    fn finish(&mut self, rules: &SuffixRules) -> (u32, bool) {
        let pending = std::mem::take(self);
        match pending.value {
            None => (rules.default, true),
            Some(v) => (
                v,
                !pending.overflow && (rules.min..=rules.max).contains(&v),
            ),
        }
    }
}

/// Match `pattern` against `input`.
///
/// Numeric suffixes are appended to `suffixes`, which is left untouched
/// unless the match succeeds.
///
/// # Errors
///
/// - [`ErrorKind::InvalidCommand`] when the keywords do not match.
/// - [`ErrorKind::TooManyNumericSuffixes`] when the pattern holds more `#`
///   than fit in `suffixes`.
/// - [`ErrorKind::NumericSuffixInvalid`] when the keywords match but a
///   suffix overflowed or fell outside `rules`.
pub fn match_keywords<I: KeywordInput + ?Sized>(
    pattern: &[u8],
    input: &I,
    suffixes: &mut SuffixSet,
    rules: &SuffixRules,
) -> Result<KeywordMatch, ErrorKind> {
    let mut work = *suffixes;
    let mut pos_pat = 0;
    let mut pos_inp = input.start();
    let mut long_form = false;
    let mut segment = OptionalSegment::default();
    let mut pending = PendingSuffix::default();
    let mut suffix_invalid = false;
    let mut tree_size = 0;
    let mut tree_mark = 0;

    while let Some(&pc) = pattern.get(pos_pat) {
        let ic = input.at(pos_inp);

        if input.tracks_tree()
            && ic == Some(b':')
            && matches!(pc, b':' | b'[')
            && pos_inp != tree_mark
        {
            tree_size = pos_pat;
            tree_mark = pos_inp;
        }

        match pc {
            b'[' => {
                pos_pat += 1;
                segment.enter(SegmentMark {
                    input: pos_inp,
                    pattern: pos_pat,
                    suffixes: work.len(),
                    long_form,
                });
                continue;
            }
            b']' => {
                segment.leave();
                pos_pat += 1;
                continue;
            }
            b'#' => {
                if work.len() >= MAX_NUM_SUFFIX {
                    return Err(ErrorKind::TooManyNumericSuffixes);
                }
                match ic.and_then(|c| digit_value(c, 10)) {
                    Some(d) => {
                        pending.push_digit(d);
                        pos_inp += 1;
                    }
                    None => {
                        let (value, ok) = pending.finish(rules);
                        suffix_invalid |= !ok;
                        work.push(value)?;
                        pos_pat += 1;
                    }
                }
                continue;
            }
            b':' => long_form = false,
            _ => {}
        }

        if ic.is_some_and(|c| c.eq_ignore_ascii_case(&pc)) {
            long_form |= pc.is_ascii_lowercase();
            pos_pat += 1;
            pos_inp += 1;
        } else if pc.is_ascii_lowercase() && !long_form {
            while pattern.get(pos_pat).is_some_and(u8::is_ascii_lowercase) {
                pos_pat += 1;
            }
        } else if segment.is_open() {
            let mark = segment.abandon(pattern, &mut work, rules.default)?;
            pending = PendingSuffix::default();
            pos_inp = mark.input;
            pos_pat = mark.pattern;
            long_form = mark.long_form;
        } else {
            return Err(ErrorKind::InvalidCommand);
        }
    }

    if input.at(pos_inp).is_some() {
        return Err(ErrorKind::InvalidCommand);
    }
    if suffix_invalid {
        return Err(ErrorKind::NumericSuffixInvalid);
    }
    *suffixes = work;
    Ok(KeywordMatch { tree_size })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(pattern: &str, input: &str) -> Result<Vec<u32>, ErrorKind> {
        command_in_tree(pattern, "", input).map(|(s, _)| s)
    }

    fn command_in_tree(
        pattern: &str,
        tree: &str,
        input: &str,
    ) -> Result<(Vec<u32>, usize), ErrorKind> {
        let mut suffixes = SuffixSet::new();
        let m = match_keywords(
            pattern.as_bytes(),
            &FullCommand::new(tree.as_bytes(), input.as_bytes()),
            &mut suffixes,
            &SuffixRules::default(),
        )?;
        Ok((suffixes.as_slice().to_vec(), m.tree_size))
    }

    #[test]
    fn short_and_long_forms() {
        for input in ["VOLT", "volt", "VOLTAGE", "VoLtAgE"] {
            assert_eq!(command("VOLTage", input), Ok(vec![]), "{input}");
        }
        for input in ["VOL", "VOLTA", "VOLTAGES", "VOLTAG"] {
            assert_eq!(command("VOLTage", input), Err(ErrorKind::InvalidCommand), "{input}");
        }
    }

    #[test]
    fn optional_segments() {
        let p = "SYSTem:ERRor[:NEXT]?";
        assert!(command(p, "SYST:ERR?").is_ok());
        assert!(command(p, "SYSTEM:ERROR:NEXT?").is_ok());
        assert!(command(p, "syst:err:next?").is_ok());
        assert_eq!(command(p, "SYST:ERR:NEX?"), Err(ErrorKind::InvalidCommand));
        assert_eq!(command(p, "SYST:ERR"), Err(ErrorKind::InvalidCommand));
    }

    #[test]
    fn numeric_suffixes_default_and_parse() {
        let p = "[SOURce#:]VOLTage[:LEVel]";
        assert_eq!(command(p, "VOLT"), Ok(vec![1]));
        assert_eq!(command(p, "SOUR:VOLT"), Ok(vec![1]));
        assert_eq!(command(p, "SOUR3:VOLT:LEV"), Ok(vec![3]));
        assert_eq!(command(p, "SOURCE12:VOLTAGE"), Ok(vec![12]));
        assert_eq!(command("OUTPut#", "OUTP"), Ok(vec![1]));
        assert_eq!(command("CHANnel#:INPut#", "CHAN2:INP7"), Ok(vec![2, 7]));
    }

    #[test]
    fn suffix_bounds() {
        assert_eq!(command("OUTPut#", "OUTP0"), Err(ErrorKind::NumericSuffixInvalid));
        assert_eq!(
            command("OUTPut#", "OUTP99999999999"),
            Err(ErrorKind::NumericSuffixInvalid)
        );
        // A mismatch elsewhere outranks an invalid suffix.
        assert_eq!(command("OUTPut#:STATe", "OUTP0:X"), Err(ErrorKind::InvalidCommand));
        let rules = SuffixRules {
            min: 1,
            max: 4,
            default: 2,
        };
        let mut s = SuffixSet::new();
        let input = FullCommand::new(b"", b"OUTP5");
        assert_eq!(
            match_keywords(b"OUTPut#", &input, &mut s, &rules),
            Err(ErrorKind::NumericSuffixInvalid)
        );
        let input = FullCommand::new(b"", b"OUTP");
        assert!(match_keywords(b"OUTPut#", &input, &mut s, &rules).is_ok());
        assert_eq!(s.as_slice(), &[2]);
    }

    #[test]
    fn too_many_suffixes() {
        assert_eq!(
            command("A#:B#:C#:D#:E#", "A:B:C:D:E"),
            Err(ErrorKind::TooManyNumericSuffixes)
        );
        assert_eq!(
            command("A#:B#:C#:D#:E#", "A:B:C:D:E:F"),
            Err(ErrorKind::TooManyNumericSuffixes)
        );
    }

    #[test]
    fn abandoned_segment_rolls_back_suffixes() {
        // The digits consumed inside the failed segment are discarded.
        assert_eq!(command("[SOURce#:LIST]:VOLT", "SOUR5:VOLT"), Err(ErrorKind::InvalidCommand));
        assert_eq!(command("A[:B#:C]:D", "A:D"), Ok(vec![1]));
        assert_eq!(command("A[:B#:C]:D", "A:B4:C:D"), Ok(vec![4]));
    }

    #[test]
    fn segment_abandon_restores_cursor() {
        let mut seg = OptionalSegment::default();
        let mut suffixes = SuffixSet::from_slice(&[9]).expect("fits");
        seg.enter(SegmentMark {
            input: 3,
            pattern: 1,
            suffixes: 0,
            long_form: true,
        });
        assert!(seg.is_open());
        let mark = seg.abandon(b"[A#B#]C", &mut suffixes, 7).expect("fits");
        assert_eq!(mark.input, 3);
        assert_eq!(mark.pattern, 5);
        assert!(mark.long_form);
        assert_eq!(suffixes.as_slice(), &[7, 7]);
        assert!(!seg.is_open());
        assert_eq!(
            seg.abandon(b"[A]", &mut suffixes, 1),
            Err(ErrorKind::InvalidCommand)
        );
    }

    #[test]
    fn common_commands_skip_tree() {
        assert!(command_in_tree("*IDN?", "SOURce:", "*IDN?").is_ok());
        assert_eq!(
            command_in_tree("*IDN?", "SOURce:", "IDN?"),
            Err(ErrorKind::InvalidCommand)
        );
    }

    #[test]
    fn tree_prefix_is_read_first() {
        assert!(command_in_tree("ROOT:SUBb", "ROOT:", "SUBb").is_ok());
        assert!(command_in_tree("SOURce#:VOLTage", "SOURce2:", "VOLT").is_ok());
        assert_eq!(
            command_in_tree("SOURce#:VOLTage", "SOURce2:", "VOLT").map(|(s, _)| s),
            Ok(vec![2])
        );
        assert_eq!(command_in_tree("SUBb", "ROOT:", "SUBb"), Err(ErrorKind::InvalidCommand));
    }

    #[test]
    fn tree_size_tracks_last_keyword() {
        assert_eq!(command_in_tree("ROOT:SUBa", "", "ROOT:SUBA").map(|(_, t)| t), Ok(4));
        assert_eq!(command_in_tree("A:B:C", "", "A:B:C").map(|(_, t)| t), Ok(3));
        assert_eq!(command_in_tree("LEAF", "", "LEAF").map(|(_, t)| t), Ok(0));
        assert_eq!(
            command_in_tree("ROOT[:SUB]:LEAF", "", "ROOT:LEAF").map(|(_, t)| t),
            Ok(4)
        );
        assert_eq!(
            command_in_tree("ROOT[:SUB]:LEAF", "", "ROOT:SUB:LEAF").map(|(_, t)| t),
            Ok(10)
        );
    }

    #[test]
    fn char_data_mode() {
        let mut s = SuffixSet::new();
        let rules = SuffixRules::default();
        for (text, ok) in [("IMM", true), ("immediate", true), ("IM", false), ("BUS", false)] {
            let r = match_keywords(b"IMMediate", &CharDataInput(text.as_bytes()), &mut s, &rules);
            assert_eq!(r.is_ok(), ok, "{text}");
        }
        let r = match_keywords(b"CH#", &CharDataInput(b"CH3"), &mut s, &rules);
        assert!(r.is_ok());
        assert_eq!(s.as_slice(), &[3]);
    }

    #[test]
    fn failed_match_leaves_suffixes_untouched() {
        let mut s = SuffixSet::from_slice(&[5]).expect("fits");
        let r = match_keywords(
            b"CH#:X",
            &CharDataInput(b"CH3:Y"),
            &mut s,
            &SuffixRules::default(),
        );
        assert_eq!(r, Err(ErrorKind::InvalidCommand));
        assert_eq!(s.as_slice(), &[5]);
    }

    #[test]
    fn suffix_set_capacity() {
        let mut s = SuffixSet::new();
        for i in 0..MAX_NUM_SUFFIX as u32 {
            s.push(i).expect("within capacity");
        }
        assert_eq!(s.push(9), Err(ErrorKind::TooManyNumericSuffixes));
        s.truncate(1);
        assert_eq!(s.as_slice(), &[0]);
        assert_eq!(serde_json::to_string(&s).expect("json"), "[0]");
    }
}
