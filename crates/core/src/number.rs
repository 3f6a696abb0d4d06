//! Numeric value codec.
//!
//! Decodes SCPI decimal numbers (`-1.5E3`, `.25`, `7 e-2`) and IEEE 488.2
//! radix literals (`#b101`, `#q17`, `#hFF`) into a canonical
//! significand/exponent pair. Canonical values have no trailing zeros in the
//! significand and an exponent magnitude of at most [`MAX_EXPONENT`].

use serde::Serialize;

use crate::grammar::chars::{
    append_digit_i32, append_digit_u64, digit_value, is_whitespace,
};
use crate::grammar::diag::ErrorKind;
use crate::grammar::tables::Unit;

/// Largest exponent magnitude a canonical value may carry.
pub const MAX_EXPONENT: i64 = 43;

// ─── Value ──────────────────────────────────────────────────────────────────

/// A decoded number: `(-1)^negative * significand * 10^(±exponent)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericValue {
    /// Unsigned significand with trailing zeros stripped.
    pub significand: u64,
    /// Exponent magnitude (`0..=43`).
    pub exponent: u8,
    /// Sign of the value.
    pub negative: bool,
    /// Sign of the exponent.
    pub negative_exponent: bool,
    /// Units the value is expressed in.
    pub units: Unit,
}

/// Sign and fractional flags of a numeric value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NumericSubtype(u8);

impl NumericSubtype {
    /// The value is negative.
    pub const NEG: NumericSubtype = NumericSubtype(1);
    /// The value has a fractional part.
    pub const REAL: NumericSubtype = NumericSubtype(2);

    /// Whether every flag of `other` is set.
    pub fn contains(self, other: NumericSubtype) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for NumericSubtype {
    type Output = NumericSubtype;

    fn bitor(self, rhs: NumericSubtype) -> NumericSubtype {
        NumericSubtype(self.0 | rhs.0)
    }
}

impl NumericValue {
    /// Build a canonical value from a raw significand and signed exponent.
    ///
    /// Exponents above [`MAX_EXPONENT`] overflow, zero included. Otherwise
    /// zero canonicalizes to `0E0` and exponents below `-MAX_EXPONENT`
    /// collapse to exact zero.
    pub fn canonical(significand: u64, exponent: i64, negative: bool) -> Result<Self, ErrorKind> {
        if significand == 0 {
            return Self::from_parts(0, exponent, negative, Unit::None);
        }
        let (mut significand, mut exponent) = (significand, exponent);
        while significand % 10 == 0 {
            significand /= 10;
            exponent += 1;
        }
        Self::from_parts(significand, exponent, negative, Unit::None)
    }

    fn from_parts(
        significand: u64,
        exponent: i64,
        negative: bool,
        units: Unit,
    ) -> Result<Self, ErrorKind> {
        if exponent > MAX_EXPONENT {
            return Err(ErrorKind::ParamOverflow);
        }
        if significand == 0 || exponent < -MAX_EXPONENT {
            return Ok(Self {
                units,
                ..Self::default()
            });
        }
        let magnitude = u8::try_from(exponent.unsigned_abs()).map_err(|_| ErrorKind::ParamOverflow)?;
        Ok(Self {
            significand,
            exponent: magnitude,
            negative,
            negative_exponent: exponent < 0,
            units,
        })
    }

    /// Exponent with its sign applied.
    pub fn signed_exponent(&self) -> i64 {
        let e = i64::from(self.exponent);
        if self.negative_exponent { -e } else { e }
    }

    /// Add `delta` to the exponent and re-check the exponent window.
    pub fn fold_exponent(self, delta: i8) -> Result<Self, ErrorKind> {
        Self::from_parts(
            self.significand,
            self.signed_exponent() + i64::from(delta),
            self.negative,
            self.units,
        )
    }

    /// Attach `units`, folding the unit's decimal exponent into the value.
    pub fn with_units(self, units: Unit, exponent: i8) -> Result<Self, ErrorKind> {
        Self { units, ..self }.fold_exponent(exponent)
    }

    /// Sign and fractional flags.
    pub fn subtype(&self) -> NumericSubtype {
        let mut flags = NumericSubtype::default();
        if self.negative {
            flags = flags | NumericSubtype::NEG;
        }
        if self.negative_exponent {
            flags = flags | NumericSubtype::REAL;
        }
        flags
    }

    /// Magnitude as `u64`, truncating any fraction. The sign is ignored.
    pub fn to_u64(&self) -> Result<u64, ErrorKind> {
        if self.significand == 0 {
            return Ok(0);
        }
        match 10u64.checked_pow(u32::from(self.exponent)) {
            Some(scale) if self.negative_exponent => Ok(self.significand / scale),
            Some(scale) => self
                .significand
                .checked_mul(scale)
                .ok_or(ErrorKind::ParamOverflow),
            None if self.negative_exponent => Ok(0),
            None => Err(ErrorKind::ParamOverflow),
        }
    }

    /// Value as `i64`, truncating toward zero.
    pub fn to_i64(&self) -> Result<i64, ErrorKind> {
        let magnitude = i64::try_from(self.to_u64()?).map_err(|_| ErrorKind::ParamOverflow)?;
        Ok(if self.negative { -magnitude } else { magnitude })
    }

    /// Magnitude as `u32`, truncating any fraction. The sign is ignored.
    pub fn to_u32(&self) -> Result<u32, ErrorKind> {
        u32::try_from(self.to_u64()?).map_err(|_| ErrorKind::ParamOverflow)
    }

    /// Value as `i32` within `-i32::MAX..=i32::MAX`, truncating toward zero.
    pub fn to_i32(&self) -> Result<i32, ErrorKind> {
        let v = self.to_i64()?;
        if v.unsigned_abs() > i32::MAX.unsigned_abs().into() {
            return Err(ErrorKind::ParamOverflow);
        }
        i32::try_from(v).map_err(|_| ErrorKind::ParamOverflow)
    }

    /// Value as `f64`.
    pub fn to_f64(&self) -> f64 {
        let scale = 10f64.powi(i32::from(self.exponent));
        let magnitude = self.significand as f64;
        let v = if self.negative_exponent {
            magnitude / scale
        } else {
            magnitude * scale
        };
        if self.negative { -v } else { v }
    }
}

impl std::fmt::Display for NumericValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.significand)?;
        if self.exponent != 0 {
            write!(f, "E{}", self.signed_exponent())?;
        }
        Ok(())
    }
}

/// Round half away from zero (`2.5` -> `3`, `-2.5` -> `-3`).
pub fn round_half_away_from_zero(x: f64) -> i64 {
    x.round() as i64
}

// ─── Scanner ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Start,
    Sign,
    Integer,
    Point,
    Fraction,
    ExponentStart,
    ExponentSign,
    ExponentDigits,
    Done,
    TrailingSpace,
    RadixMarker,
    Binary,
    Octal,
    Hex,
}

impl ScanState {
    fn is_accepting(self) -> bool {
        matches!(
            self,
            ScanState::Integer
                | ScanState::Point
                | ScanState::Fraction
                | ScanState::ExponentDigits
                | ScanState::Done
                | ScanState::TrailingSpace
                | ScanState::Binary
                | ScanState::Octal
                | ScanState::Hex
        )
    }

    fn radix(self) -> Option<u32> {
        match self {
            ScanState::Binary => Some(2),
            ScanState::Octal => Some(8),
            ScanState::Hex => Some(16),
            _ => None,
        }
    }
}

/// Significand accumulator.
///
/// Integer digits that no longer fit raise the exponent instead; fractional
/// digits after a loss are dropped.
#[derive(Debug, Default)]
struct Significand {
    value: u64,
    lost: bool,
    decimal_places: i64,
}

impl Significand {
    fn push_integer(&mut self, digit: u32) {
        match append_digit_u64(self.value, digit, 10) {
            Some(v) => self.value = v,
            None => {
                self.lost = true;
                self.decimal_places -= 1;
            }
        }
    }

    fn push_fraction(&mut self, digit: u32) {
        if self.lost {
            return;
        }
        match append_digit_u64(self.value, digit, 10) {
            Some(v) => {
                self.value = v;
                self.decimal_places += 1;
            }
            None => self.lost = true,
        }
    }
}

/// Decode the number at the start of `text`.
///
/// Leading whitespace is skipped and whitespace after the number is
/// consumed. Returns the canonical value and the offset of the first byte
/// not consumed (the start of any units text).
///
/// # Errors
///
/// [`ErrorKind::ParamType`] when `text` does not start with a number or the
/// number is incomplete (`"1E"`, `"-"`), and [`ErrorKind::ParamOverflow`]
/// when the exponent or a radix literal does not fit.
pub fn scan(text: &[u8]) -> Result<(NumericValue, usize), ErrorKind> {
    use ScanState::*;

    let mut state = Start;
    let mut sig = Significand::default();
    let mut negative = false;
    let mut exponent: i32 = 0;
    let mut negative_exponent = false;
    let mut found = false;
    let mut error = None;
    let mut pos = 0;

    while pos < text.len() && state != Done {
        let ch = text[pos].to_ascii_lowercase();
        let digit = digit_value(ch, 10);
        let mut advance = true;
        match state {
            Start => match (ch, digit) {
                (_, Some(d)) => {
                    sig.value = u64::from(d);
                    found = true;
                    state = Integer;
                }
                (b'.', None) => state = Point,
                (b'+', None) => state = Sign,
                (b'-', None) => {
                    negative = true;
                    state = Sign;
                }
                (b'#', None) => state = RadixMarker,
                _ if is_whitespace(ch) => {}
                _ => {
                    error = Some(ErrorKind::ParamType);
                    break;
                }
            },
            Sign => match (ch, digit) {
                (_, Some(d)) => {
                    sig.push_integer(d);
                    found = true;
                    state = Integer;
                }
                (b'.', None) => state = Point,
                _ => {
                    error = Some(ErrorKind::ParamType);
                    break;
                }
            },
            Integer => match (ch, digit) {
                (_, Some(d)) => sig.push_integer(d),
                (b'.', None) => state = Point,
                (b'e', None) => state = ExponentStart,
                _ if is_whitespace(ch) => state = TrailingSpace,
                _ => {
                    advance = false;
                    state = Done;
                }
            },
            Point | Fraction => match (ch, digit) {
                (_, Some(d)) => {
                    sig.push_fraction(d);
                    found = true;
                    state = Fraction;
                }
                (b'e', None) => state = ExponentStart,
                _ if state == Fraction && is_whitespace(ch) => state = TrailingSpace,
                _ => {
                    advance = false;
                    state = Done;
                }
            },
            ExponentStart => match (ch, digit) {
                (_, Some(d)) => {
                    exponent = d as i32;
                    state = ExponentDigits;
                }
                (b'+', None) => state = ExponentSign,
                (b'-', None) => {
                    negative_exponent = true;
                    state = ExponentSign;
                }
                _ if is_whitespace(ch) => {}
                _ => {
                    error = Some(ErrorKind::ParamType);
                    break;
                }
            },
            ExponentSign => match digit {
                Some(d) => {
                    exponent = d as i32;
                    state = ExponentDigits;
                }
                None => {
                    error = Some(ErrorKind::ParamType);
                    break;
                }
            },
            ExponentDigits => match digit {
                Some(d) => match append_digit_i32(exponent, d) {
                    Some(e) => exponent = e,
                    None => {
                        error = Some(ErrorKind::ParamOverflow);
                        break;
                    }
                },
                None => {
                    advance = false;
                    state = Done;
                }
            },
            TrailingSpace => match ch {
                b'e' => state = ExponentStart,
                _ if is_whitespace(ch) => {}
                _ => {
                    advance = false;
                    state = Done;
                }
            },
            RadixMarker => match ch {
                b'b' => state = Binary,
                b'q' => state = Octal,
                b'h' => state = Hex,
                _ => {
                    error = Some(ErrorKind::ParamType);
                    break;
                }
            },
            Binary | Octal | Hex => {
                let radix = state.radix().unwrap_or(10);
                match digit_value(ch, radix) {
                    Some(d) => {
                        found = true;
                        match append_digit_u64(sig.value, d, radix) {
                            Some(v) => sig.value = v,
                            None => {
                                error = Some(ErrorKind::ParamOverflow);
                                break;
                            }
                        }
                    }
                    None => {
                        advance = false;
                        state = Done;
                    }
                }
            }
            Done => {}
        }
        if advance {
            pos += 1;
        }
    }

    while pos < text.len() && is_whitespace(text[pos]) {
        pos += 1;
    }

    if !found || !state.is_accepting() {
        return Err(ErrorKind::ParamType);
    }
    if let Some(kind) = error {
        return Err(kind);
    }

    let exponent = i64::from(if negative_exponent { -exponent } else { exponent });
    let value = NumericValue::canonical(sig.value, exponent - sig.decimal_places, negative)?;
    Ok((value, pos))
}
