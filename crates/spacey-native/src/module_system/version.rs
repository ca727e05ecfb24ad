// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module version triples (`MAJOR[.MINOR[.PATCH]]`)

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a version string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// A control character or space appeared in the string
    #[error("version contains whitespace")]
    Whitespace,

    /// More than two dots
    #[error("version has more than three components")]
    TooManyComponents,

    /// A component between dots (or at either end) is empty
    #[error("version component {0} is empty")]
    EmptyComponent(usize),

    /// A component contains something other than ASCII digits
    #[error("version component {0} is not a decimal number")]
    NotANumber(usize),

    /// A component is larger than 65535
    #[error("version component {0} exceeds 65535")]
    Overflow(usize),
}

/// A module version; ordering is major, then minor, then patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component
    pub major: u16,
    /// Minor component
    pub minor: u16,
    /// Patch component
    pub patch: u16,
}

impl Version {
    /// Creates a version from its components.
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `MAJOR[.MINOR[.PATCH]]`; omitted components are 0.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        if s.bytes().any(|b| b <= b' ') {
            return Err(VersionError::Whitespace);
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::TooManyComponents);
        }

        let mut components = [0u16; 3];
        for (index, part) in parts.iter().enumerate() {
            components[index] = parse_component(part, index)?;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

/// Parses one component as a bounded run of decimal digits.
fn parse_component(part: &str, index: usize) -> Result<u16, VersionError> {
    if part.is_empty() {
        return Err(VersionError::EmptyComponent(index));
    }

    let mut value: u32 = 0;
    for b in part.bytes() {
        if !b.is_ascii_digit() {
            return Err(VersionError::NotANumber(index));
        }
        value = value * 10 + u32::from(b - b'0');
        if value > u32::from(u16::MAX) {
            return Err(VersionError::Overflow(index));
        }
    }

    // Bounded by the overflow check above
    Ok(value as u16)
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(u16, u16, u16)> for Version {
    fn from((major, minor, patch): (u16, u16, u16)) -> Self {
        Self::new(major, minor, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_and_partial() {
        assert_eq!(Version::parse("1.2.3"), Ok(Version::new(1, 2, 3)));
        assert_eq!(Version::parse("1.2"), Ok(Version::new(1, 2, 0)));
        assert_eq!(Version::parse("4"), Ok(Version::new(4, 0, 0)));
        assert_eq!(Version::parse("007"), Ok(Version::new(7, 0, 0)));
        assert_eq!(Version::parse("65535.0.65535"), Ok(Version::new(65535, 0, 65535)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Version::parse("1.2.3.4"), Err(VersionError::TooManyComponents));
        assert_eq!(Version::parse("99999"), Err(VersionError::Overflow(0)));
        assert_eq!(Version::parse("1.65536"), Err(VersionError::Overflow(1)));
        assert_eq!(Version::parse("1."), Err(VersionError::EmptyComponent(1)));
        assert_eq!(Version::parse(".1"), Err(VersionError::EmptyComponent(0)));
        assert_eq!(Version::parse(""), Err(VersionError::EmptyComponent(0)));
        assert_eq!(Version::parse("1..2"), Err(VersionError::EmptyComponent(1)));
        assert_eq!(Version::parse("1.x"), Err(VersionError::NotANumber(1)));
        assert_eq!(Version::parse("+1"), Err(VersionError::NotANumber(0)));
        assert_eq!(Version::parse("1. 2"), Err(VersionError::Whitespace));
        assert_eq!(Version::parse("1.2\t"), Err(VersionError::Whitespace));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 99));
        assert!(Version::new(2, 0, 0) > Version::new(1, 65535, 65535));
        assert!(Version::new(1, 0, 1) > Version::new(1, 0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(1, 2, 0).to_string(), "1.2.0");
    }
}
