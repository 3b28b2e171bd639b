//! Timestamp - logical time used for commit and read points
//!
//! Timestamps travel as hexadecimal strings with no `0x` prefix.
//! Input accepts any digit count (odd lengths included); output is
//! lowercase, minimal, and padded to an even number of digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::TimestampError;

/// Maximum number of hex digits a timestamp can carry (64 bits).
const MAX_HEX_DIGITS: usize = 16;

/// A logical timestamp ordered by its integer value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero timestamp. Reported for roles that were never set.
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Parses a hexadecimal timestamp string.
    pub fn parse_hex(input: &str) -> Result<Self, TimestampError> {
        if input.is_empty() || input.len() > MAX_HEX_DIGITS {
            return Err(TimestampError::malformed(input));
        }
        if !input.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TimestampError::malformed(input));
        }
        u64::from_str_radix(input, 16)
            .map(Self)
            .map_err(|_| TimestampError::malformed(input))
    }

    /// Formats as lowercase hex padded to an even digit count.
    pub fn to_hex(&self) -> String {
        let digits = format!("{:x}", self.0);
        if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
