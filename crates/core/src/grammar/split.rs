//! Command and parameter splitting.
//!
//! A line holds `;`-separated commands. A command is a keyword run, then
//! whitespace, then `,`-separated parameters. Quotes and brackets protect
//! separators inside them.

use std::ops::Range;

use super::chars::{is_whitespace, trim_end};
use super::diag::ErrorKind;

/// Byte range of the first command in `line`.
///
/// Leading `;` and whitespace are skipped. The command ends at the first
/// `;` outside quotes, or at the end of the line. Returns `None` when no
/// command text remains.
pub fn split_command(line: &[u8]) -> Option<Range<usize>> {
    let start = line
        .iter()
        .position(|&b| b != b';' && !is_whitespace(b))?;
    let mut single = false;
    let mut double = false;
    let mut end = start;
    while let Some(&b) = line.get(end) {
        match b {
            b'"' if !single => double = !double,
            b'\'' if !double => single = !single,
            b';' if !single && !double => break,
            _ => {}
        }
        end += 1;
    }
    Some(start..end)
}

/// Length of the keyword run at the start of `command`.
pub fn keyword_len(command: &[u8]) -> usize {
    command
        .iter()
        .position(|&b| is_whitespace(b))
        .unwrap_or(command.len())
}

/// Number of parameters in `params`: zero when it is blank, otherwise one
/// plus the commas outside quotes and brackets.
pub fn param_count(params: &[u8]) -> usize {
    if params.iter().all(|&b| is_whitespace(b)) {
        return 0;
    }
    let mut count = 1;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for &b in params {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => depth = depth.saturating_sub(1),
            (None, b',') if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Leading,
    Single,
    Double,
    Unquoted,
    Open,
    Close,
    Bracketed,
}

/// Range of the next parameter of `params`, starting at `*pos`.
///
/// Leading whitespace is skipped and trailing whitespace trimmed. On return
/// `*pos` is just past the separating comma, or at the end of `params`.
/// A blank parameter yields an empty range.
///
/// # Errors
///
/// [`ErrorKind::UnmatchedQuote`] for an unterminated quote and
/// [`ErrorKind::UnmatchedBracket`] for an unterminated or stray bracket.
pub fn next_param(params: &[u8], pos: &mut usize) -> Result<Range<usize>, ErrorKind> {
    use SplitState::*;

    let mut state = Leading;
    let mut start = *pos;
    let mut depth = 0usize;

    loop {
        let Some(&b) = params.get(*pos) else {
            match state {
                Leading => return Ok(*pos..*pos),
                Unquoted => break,
                Single | Double => return Err(ErrorKind::UnmatchedQuote),
                Open | Close | Bracketed => return Err(ErrorKind::UnmatchedBracket),
            }
        };
        match state {
            Leading => {
                start = *pos;
                match b {
                    b',' => {
                        *pos += 1;
                        return Ok(start..start);
                    }
                    b'\'' => state = Single,
                    b'"' => state = Double,
                    b'(' => state = Open,
                    b')' => return Err(ErrorKind::UnmatchedBracket),
                    _ if is_whitespace(b) => *pos += 1,
                    _ => state = Unquoted,
                }
            }
            Single | Double => {
                *pos += 1;
                let close = if state == Single { b'\'' } else { b'"' };
                if params.get(*pos) == Some(&close) {
                    state = Unquoted;
                }
            }
            Unquoted => {
                *pos += 1;
                match params.get(*pos) {
                    Some(b',') => {
                        let end = *pos;
                        *pos += 1;
                        return Ok(trimmed(params, start, end));
                    }
                    Some(b'\'') => state = Single,
                    Some(b'"') => state = Double,
                    Some(b'(') => state = Open,
                    Some(b')') => return Err(ErrorKind::UnmatchedBracket),
                    _ => {}
                }
            }
            Open => {
                depth += 1;
                *pos += 1;
                match params.get(*pos) {
                    Some(b'(') => {}
                    Some(b')') => state = Close,
                    _ => state = Bracketed,
                }
            }
            Close => {
                depth -= 1;
                state = if depth == 0 { Unquoted } else { Bracketed };
            }
            Bracketed => {
                *pos += 1;
                match params.get(*pos) {
                    Some(b'(') => state = Open,
                    Some(b')') => state = Close,
                    _ => {}
                }
            }
        }
    }

    Ok(trimmed(params, start, *pos))
}

fn trimmed(params: &[u8], start: usize, end: usize) -> Range<usize> {
    start..start + trim_end(&params[start..end]).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(text: &str) -> Result<Vec<&str>, ErrorKind> {
        let mut pos = 0;
        let mut out = Vec::new();
        for _ in 0..param_count(text.as_bytes()) {
            let r = next_param(text.as_bytes(), &mut pos)?;
            out.push(&text[r]);
        }
        Ok(out)
    }

    #[test]
    fn commands_split_outside_quotes() {
        let line = b";; CMD 'a;b',2;CMD2 1";
        let first = split_command(line).expect("command");
        assert_eq!(&line[first.clone()], b"CMD 'a;b',2");
        let rest = &line[first.end..];
        let second = split_command(rest).expect("command");
        assert_eq!(&rest[second], b"CMD2 1");
        assert_eq!(split_command(b" ; ;  "), None);
        assert_eq!(split_command(b""), None);
    }

    #[test]
    fn quotes_of_the_other_kind_do_not_close() {
        let line = br#"A "it's;fine";B"#;
        let r = split_command(line).expect("command");
        assert_eq!(&line[r], br#"A "it's;fine""#);
    }

    #[test]
    fn keyword_run_ends_at_whitespace() {
        assert_eq!(keyword_len(b"VOLT 5"), 4);
        assert_eq!(keyword_len(b"*RST"), 4);
        assert_eq!(keyword_len(b"VOLT\t5"), 4);
    }

    #[test]
    fn counting() {
        assert_eq!(param_count(b""), 0);
        assert_eq!(param_count(b"   "), 0);
        assert_eq!(param_count(b" 1"), 1);
        assert_eq!(param_count(b" 1,2, 3"), 3);
        assert_eq!(param_count(b" 'a,b',2"), 2);
        assert_eq!(param_count(b" (1,2),(3)"), 2);
        assert_eq!(param_count(b" '(',2"), 2);
        assert_eq!(param_count(b" ,"), 2);
    }

    #[test]
    fn parameters_are_trimmed() {
        assert_eq!(params(" 1 , two words ,'x' "), Ok(vec!["1", "two words", "'x'"]));
        assert_eq!(params(" (@1,2:3),5"), Ok(vec!["(@1,2:3)", "5"]));
        assert_eq!(params(" ((1)(2)),3"), Ok(vec!["((1)(2))", "3"]));
        assert_eq!(params(" 'it''s'"), Ok(vec!["'it''s'"]));
        assert_eq!(params(" ,5"), Ok(vec!["", "5"]));
    }

    #[test]
    fn unbalanced_input() {
        assert_eq!(params(" 'abc"), Err(ErrorKind::UnmatchedQuote));
        assert_eq!(params(" x\"abc"), Err(ErrorKind::UnmatchedQuote));
        assert_eq!(params(" (1,2"), Err(ErrorKind::UnmatchedBracket));
        assert_eq!(params(" )"), Err(ErrorKind::UnmatchedBracket));
        assert_eq!(params(" a)"), Err(ErrorKind::UnmatchedBracket));
        assert_eq!(params(" (()"), Err(ErrorKind::UnmatchedBracket));
    }

    #[test]
    fn blank_parameter_at_end() {
        let mut pos = 0;
        assert_eq!(next_param(b"   ", &mut pos), Ok(3..3));
        assert_eq!(pos, 3);
    }
}
