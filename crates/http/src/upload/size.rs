use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const UNITS: [(&str, i32); 6] = [("pb", 5), ("tb", 4), ("gb", 3), ("mb", 2), ("kb", 1), ("b", 0)];

/// A byte count, parsed from strings like `"100kb"`, `"1.5mb"` or `"512"`.
///
/// Units are 1024 based and case insensitive; a bare number is a byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid byte size: {0:?}")]
pub struct InvalidByteSize(String);

impl ByteSize {
    pub const fn b(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn kb(kb: u64) -> Self {
        Self(kb * 1024)
    }

    pub const fn mb(mb: u64) -> Self {
        Self(mb * 1024 * 1024)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl FromStr for ByteSize {
    type Err = InvalidByteSize;

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the value is checked to be a finite non negative integer within u64"
    )]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidByteSize(s.to_string());
        let lower = s.trim().to_ascii_lowercase();

        let (number, exponent) = UNITS
            .iter()
            .find_map(|(unit, exponent)| lower.strip_suffix(unit).map(|number| (number.trim_end(), *exponent)))
            .unwrap_or((lower.as_str(), 0));

        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Err(invalid());
        }

        let value: f64 = number.parse().map_err(|_| invalid())?;
        let bytes = (value * 1024f64.powi(exponent)).floor();
        if !bytes.is_finite() || bytes > u64::MAX as f64 {
            return Err(invalid());
        }

        Ok(Self(bytes as u64))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!("100kb".parse(), Ok(ByteSize::kb(100)));
        assert_eq!("10MB".parse(), Ok(ByteSize::mb(10)));
        assert_eq!("1.5 kb".parse(), Ok(ByteSize::b(1536)));
        assert_eq!("512".parse(), Ok(ByteSize::b(512)));
        assert_eq!("512b".parse(), Ok(ByteSize::b(512)));
        assert_eq!("1gb".parse(), Ok(ByteSize::b(1024 * 1024 * 1024)));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<ByteSize>().is_err());
        assert!("kb".parse::<ByteSize>().is_err());
        assert!("-1kb".parse::<ByteSize>().is_err());
        assert!("ten mb".parse::<ByteSize>().is_err());
    }
}
