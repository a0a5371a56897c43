//! Fixed-point decimal host type.
//!
//! Values are a 128-bit scaled integer plus a scale (number of fractional
//! digits). Parsing is locale-invariant: `.` is the only decimal separator
//! and group separators are rejected.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Maximum number of fractional digits.
pub const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("invalid decimal literal '{0}'")]
    Invalid(String),

    #[error("decimal scale {0} outside supported range")]
    ScaleOutOfRange(u32),

    #[error("decimal value overflows 128 bits")]
    Overflow,

    #[error("decimal {0} has a fractional part")]
    Fractional(Decimal),
}

/// Equality, hashing and ordering are numeric: `1.50 == 1.5`.
#[derive(Clone, Copy, Debug)]
pub struct Decimal {
    value: i128,
    scale: u32,
}

impl Decimal {
    pub fn new(value: i128, scale: u32) -> Result<Self, DecimalError> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(DecimalError::ScaleOutOfRange(scale));
        }
        Ok(Self { value, scale })
    }

    #[inline]
    pub fn raw_value(self) -> i128 {
        self.value
    }

    #[inline]
    pub fn scale(self) -> u32 {
        self.scale
    }

    /// Parse text that may carry an exponent (`1.5e3`), as produced by
    /// JSON number serializers.
    pub fn from_scientific(s: &str) -> Result<Self, DecimalError> {
        let s = s.trim();
        let Some(pos) = s.find(|c: char| c == 'e' || c == 'E') else {
            return s.parse();
        };
        let mantissa: Decimal = s[..pos].parse()?;
        let exponent: i32 = s[pos + 1..]
            .parse()
            .map_err(|_| DecimalError::Invalid(s.to_string()))?;

        let scale = mantissa.scale as i64 - exponent as i64;
        if scale >= 0 {
            let scale = u32::try_from(scale).map_err(|_| DecimalError::ScaleOutOfRange(u32::MAX))?;
            Decimal::new(mantissa.value, scale)
        } else {
            let factor = pow10(u32::try_from(-scale).map_err(|_| DecimalError::Overflow)?)?;
            let value = mantissa
                .value
                .checked_mul(factor)
                .ok_or(DecimalError::Overflow)?;
            Decimal::new(value, 0)
        }
    }

    /// Exact integral value, failing if a fractional part remains.
    pub fn to_i128(self) -> Result<i128, DecimalError> {
        let factor = pow10(self.scale)?;
        if self.value % factor != 0 {
            return Err(DecimalError::Fractional(self));
        }
        Ok(self.value / factor)
    }

    /// Convert into an `f64` (lossy for high precision inputs).
    pub fn to_f64(self) -> f64 {
        if self.value == 0 {
            return 0.0;
        }
        (self.value as f64) / 10_f64.powi(self.scale as i32)
    }

    /// Build from a finite `f64` via its shortest round-trip text.
    pub fn from_f64(value: f64) -> Result<Self, DecimalError> {
        if !value.is_finite() {
            return Err(DecimalError::Invalid(value.to_string()));
        }
        format!("{value}").parse()
    }

    /// Scaled value with trailing fractional zeros stripped
    fn normalized(self) -> (i128, u32) {
        let (mut value, mut scale) = (self.value, self.scale);
        while scale > 0 && value % 10 == 0 {
            value /= 10;
            scale -= 1;
        }
        (value, scale)
    }

    fn rescaled(self, scale: u32) -> Option<i128> {
        let diff = scale.checked_sub(self.scale)?;
        self.value.checked_mul(pow10(diff).ok()?)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            value: value as i128,
            scale: 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            value: value as i128,
            scale: 0,
        }
    }
}

fn pow10(exp: u32) -> Result<i128, DecimalError> {
    10_i128.checked_pow(exp).ok_or(DecimalError::Overflow)
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.value);
        }
        let digits = self.value.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if self.value < 0 {
            f.write_str("-")?;
        }
        if digits.len() <= scale {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        } else {
            let split = digits.len() - scale;
            write!(f, "{}.{}", &digits[..split], &digits[split..])
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || DecimalError::Invalid(s.to_string());

        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let scale = frac_part.len() as u32;
        if scale > MAX_DECIMAL_SCALE {
            return Err(DecimalError::ScaleOutOfRange(scale));
        }

        let mut value: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i128))
                .ok_or(DecimalError::Overflow)?;
        }
        if negative {
            value = -value;
        }
        Decimal::new(value, scale)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.value.cmp(&other.value);
        }
        let scale = self.scale.max(other.scale);
        // Only the lower-scale side can overflow, and then its magnitude
        // exceeds anything the other side holds
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(l), Some(r)) => l.cmp(&r),
            (None, _) => self.value.cmp(&0),
            (_, None) => 0.cmp(&other.value),
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
