use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::IsbnError;

const ISBN13_LEN: usize = 13;
const BOOKLAND_PREFIXES: [&str; 2] = ["978", "979"];

/// Strips everything but ASCII digits from a decoder read.
pub fn clean_barcode(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A 13 digit EAN in the Bookland range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Isbn(String);

impl Isbn {
    /// Accepts a raw scanner read. Separators and stray characters are dropped
    /// before validation, so `978-0-306-40615-7` is accepted.
    pub fn from_scan(raw: &str) -> Result<Self, IsbnError> {
        let digits = clean_barcode(raw);

        if digits.len() != ISBN13_LEN {
            return Err(IsbnError::WrongLength(digits.len()));
        }

        if !BOOKLAND_PREFIXES.iter().any(|p| digits.starts_with(p)) {
            return Err(IsbnError::NotBookland(digits[..3].to_string()));
        }

        Ok(Isbn(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EAN-13 check digit. Not enforced on accept.
    pub fn has_valid_checksum(&self) -> bool {
        let sum: u32 = self
            .0
            .bytes()
            .take(ISBN13_LEN - 1)
            .enumerate()
            .map(|(i, b)| {
                let d = (b - b'0') as u32;
                if i % 2 == 0 { d } else { d * 3 }
            })
            .sum();
        let check = (10 - sum % 10) % 10;
        self.0.as_bytes()[ISBN13_LEN - 1] - b'0' == check as u8
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Isbn::from_scan(s)
    }
}

impl Serialize for Isbn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Isbn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Isbn::from_scan(&raw).map_err(serde::de::Error::custom)
    }
}
