//! Command tree: the keyword scope carried between commands of one line.
//!
//! After `SOURce:VOLTage 5` the tree is `SOURce:`, so a following
//! `CURRent 1` is read as `SOURce:CURRent 1`. The tree is stored as the
//! literal text to prepend, with numeric suffixes already expanded.

use super::keyword::SuffixSet;

/// Scope prefix for the next command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTree {
    text: String,
}

impl CommandTree {
    /// An empty tree (root scope).
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree text, e.g. `"SOURce2:"`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Tree text as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Whether the tree is at the root.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Return to the root.
    pub fn reset(&mut self) {
        self.text.clear();
    }

    /// Replace the tree with an explicit prefix.
    pub fn set(&mut self, prefix: &str) {
        self.text.clear();
        self.text.push_str(prefix);
    }

    /// Set the tree from the pattern prefix recorded by the matcher.
    ///
    /// `tree_size` is the pattern offset of the `:` or `[` that starts the
    /// final keyword. A size of zero leaves the tree at the root.
    pub fn set_tracked(&mut self, pattern: &str, tree_size: usize, suffixes: &SuffixSet) {
        self.text.clear();
        if tree_size == 0 {
            return;
        }
        let bytes = pattern.as_bytes();
        let mut size = tree_size;
        if bytes.get(size) == Some(&b':') {
            size += 1;
        }
        let colon_needed = bytes.get(size - 1) != Some(&b':');
        self.expand(pattern.get(..size).unwrap_or_default(), suffixes);
        if colon_needed {
            self.text.push(':');
        }
    }

    /// Set the tree to the pattern up to and including its last `:`.
    pub fn set_legacy(&mut self, pattern: &str, suffixes: &SuffixSet) {
        self.text.clear();
        if let Some(last) = pattern.rfind(':') {
            self.expand(&pattern[..=last], suffixes);
        }
    }

    /// Append `pattern` without brackets, with each `#` replaced by its
    /// suffix.
    fn expand(&mut self, pattern: &str, suffixes: &SuffixSet) {
        let mut index = 0;
        for c in pattern.chars() {
            match c {
                '[' | ']' => {}
                '#' => {
                    if let Some(value) = suffixes.get(index) {
                        self.text.push_str(&value.to_string());
                    }
                    index += 1;
                }
                _ => self.text.push(c),
            }
        }
    }
}
