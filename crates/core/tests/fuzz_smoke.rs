//! Fuzz smoke tests for the splitter, matcher, and translators.
//!
//! These tests feed random and adversarial lines to a session over the
//! demonstration table and check that nothing panics and every reported
//! span lies inside its line.
//!
//! A simple deterministic PRNG provides reproducible randomness.

mod common;

use scpi_toolchain_core::{ParserSession, Span};

// ─── Simple deterministic PRNG (LCG) ────────────────────────────────────────

struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range(&mut self, max: usize) -> usize {
        (self.next() as usize) % max
    }

    fn gen_bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next() as u8).collect()
    }

    fn gen_from(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| alphabet[self.gen_range(alphabet.len())] as char)
            .collect()
    }
}

// ─── Invariant checking ─────────────────────────────────────────────────────

fn assert_span(span: Span, line: &str) {
    assert!(
        span.start <= span.end && span.end <= line.len(),
        "span {span:?} outside line of {} bytes: {:?}",
        line.len(),
        truncate(line, 120),
    );
    assert!(line.is_char_boundary(span.start) && line.is_char_boundary(span.end));
}

/// Truncate a string for error messages (safe for multi-byte UTF-8).
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let safe_end = (0..=max)
            .rev()
            .find(|&i| s.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}…({} bytes total)", &s[..safe_end], s.len())
    }
}

/// Parse a line every way the session offers and check invariants.
fn fuzz_parse(line: &str) {
    let mut session = ParserSession::new(&common::TABLE);
    for result in session.commands(line) {
        match result {
            Ok(command) => {
                assert_span(command.span, line);
                assert!(command.param_count <= 64);
                for param in &command.params {
                    let _ = param.to_str();
                    let _ = param.to_f64();
                }
            }
            Err(err) => assert_span(err.span, line),
        }
    }

    let mut cursor = line;
    for _ in 0..=line.len() {
        let before = cursor.len();
        let _ = session.parse_next(&mut cursor, false);
        if cursor.is_empty() {
            break;
        }
        assert!(cursor.len() < before || cursor.starts_with(';'));
        cursor = cursor.strip_prefix(';').unwrap_or(cursor);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Random input
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn no_panic_random_bytes() {
    let mut rng = SimpleRng::new(0xDEAD_BEEF);
    for len in [0, 1, 2, 5, 10, 50, 100, 500, 1000] {
        for _ in 0..20 {
            let bytes = rng.gen_bytes(len);
            let line = String::from_utf8_lossy(&bytes);
            fuzz_parse(&line);
        }
    }
}

#[test]
fn no_panic_random_ascii() {
    let mut rng = SimpleRng::new(0x1234_5678);
    let ascii: Vec<u8> = (0x20..=0x7E).collect();
    for len in [0, 1, 5, 20, 100, 500] {
        for _ in 0..20 {
            fuzz_parse(&rng.gen_from(&ascii, len));
        }
    }
}

#[test]
fn no_panic_random_scpi_like() {
    let mut rng = SimpleRng::new(0xBAAD_F00D);
    let alphabet: &[u8] = b"SOURVOLTCURRFREQROUTCLOS:;,*?#@!()'\" 0123456789.E-+hqb";
    for len in [1, 5, 20, 100, 300] {
        for _ in 0..40 {
            fuzz_parse(&rng.gen_from(alphabet, len));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Adversarial input
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn no_panic_adversarial_lines() {
    let cases = [
        "",
        ";",
        ":",
        "::",
        "*",
        "#",
        "'",
        "\"",
        "(",
        ")",
        "VOLT '",
        "VOLT (",
        "VOLT )",
        "VOLT ,,,,,,,,,,,,",
        "ROUT:CLOS (@",
        "ROUT:CLOS (@)",
        "ROUT:CLOS (@,)",
        "ROUT:CLOS (@1:)",
        "ROUT:CLOS (@1!)",
        "ROUT:CLOS (@a(",
        "ROUT:CLOS (@a())",
        "ROUT:CLOS (@a(1)b)",
        "ROUT:MATR:CLOS (@1!2!3!4!5!6!7!8!9)",
        "LIST:VOLT (",
        "LIST:VOLT (1:2:3)",
        "MEM:DATA1 1,#",
        "MEM:DATA1 1,#9",
        "MEM:DATA1 1,#999999999999999999999",
        "SOUR99999999999999999999:VOLT 1",
        "SOUR1:SOUR2:VOLT 1",
        "VOLT 1E-99999999999999999999",
        "VOLT #h",
        "VOLT #hFFFFFFFFFFFFFFFFFFFFFFFFF",
        "VOLT 9999999999999999999999999999",
        "VOLT .",
        "VOLT -",
        "VOLT 1 VOLTS",
        "TRIG:SOUR EXT99999999999",
        "CALC:MATH ((((((((((",
        "CALC:MATH ))))",
        "DISP:TEXT 'a''b''",
        "\u{0}\u{1}\u{1f}",
        "VOLT\u{0}5",
        "ÄÖÜ:VOLT 1",
        "VOLT 1;;;;;;;;;;;;CURR 2",
    ];
    for line in cases {
        fuzz_parse(line);
    }
}

#[test]
fn no_panic_long_lines() {
    fuzz_parse(&"VOLT 1;".repeat(2000));
    fuzz_parse(&format!("VOLT {}", "9".repeat(10_000)));
    fuzz_parse(&format!("ROUT:CLOS (@{})", "1,".repeat(5000)));
    fuzz_parse(&format!("CALC:MATH {}{}", "(".repeat(5000), ")".repeat(5000)));
}
