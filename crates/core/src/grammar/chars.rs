//! Byte-level character classes and overflow-checked digit accumulation.
//!
//! Every scanner in the parser works on raw bytes. Case folding is ASCII
//! only, and "whitespace" is any control or space byte (`1..=32`), which is
//! what instruments receive over their transports.

/// Whether `b` counts as whitespace (any byte in `1..=32`).
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    (1..=32).contains(&b)
}

/// Value of `b` as a digit in `radix`, if it is one.
#[inline]
pub fn digit_value(b: u8, radix: u32) -> Option<u32> {
    char::from(b).to_digit(radix)
}

/// Append one digit to an unsigned 64-bit accumulator.
///
/// Returns `None` instead of wrapping when the result does not fit.
#[inline]
pub fn append_digit_u64(acc: u64, digit: u32, radix: u32) -> Option<u64> {
    acc.checked_mul(u64::from(radix))?
        .checked_add(u64::from(digit))
}

/// Append one decimal digit to an unsigned 32-bit accumulator.
#[inline]
pub fn append_digit_u32(acc: u32, digit: u32) -> Option<u32> {
    acc.checked_mul(10)?.checked_add(digit)
}

/// Append one decimal digit to a signed 32-bit accumulator (magnitude only).
#[inline]
pub fn append_digit_i32(acc: i32, digit: u32) -> Option<i32> {
    acc.checked_mul(10)?.checked_add(i32::try_from(digit).ok()?)
}

/// `bytes` without trailing whitespace.
pub fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| !is_whitespace(b))
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// `bytes` without leading or trailing whitespace.
pub fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_whitespace(b))
        .unwrap_or(bytes.len());
    trim_end(&bytes[start..])
}
