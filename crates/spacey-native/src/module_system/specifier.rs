// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module specifiers: `BASE[@[OP]VERSION]`
//!
//! - `net` - latest registered version of `net`
//! - `net@1.2` - exactly 1.2.0
//! - `net@>=1.2`, `net@>1`, `net@<2.0.0`, `net@<=1.4` - highest version in range

use super::version::{Version, VersionError};
use std::fmt;
use thiserror::Error;

/// Longest accepted base name in a constrained specifier, exclusive.
pub const MAX_BASE_LEN: usize = 256;

/// Why a specifier was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    /// A control character or space appeared anywhere in the specifier
    #[error("specifier contains whitespace")]
    Whitespace,

    /// Nothing before the `@` (or an empty specifier)
    #[error("specifier has an empty module name")]
    EmptyBase,

    /// The base name is too long
    #[error("module name is {0} bytes long (limit 256)")]
    BaseTooLong(usize),

    /// Nothing after the `@`
    #[error("specifier has an empty version constraint")]
    EmptyConstraint,

    /// The version after the operator did not parse
    #[error("invalid version: {0}")]
    Version(#[from] VersionError),
}

/// Comparison applied between a registered version and the requested one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    /// Exactly equal
    Eq,
    /// Strictly greater
    Gt,
    /// Greater or equal
    Ge,
    /// Strictly less
    Lt,
    /// Less or equal
    Le,
}

impl VersionOp {
    /// Returns true if `candidate OP target` holds.
    pub fn matches(self, candidate: Version, target: Version) -> bool {
        match self {
            VersionOp::Eq => candidate == target,
            VersionOp::Gt => candidate > target,
            VersionOp::Ge => candidate >= target,
            VersionOp::Lt => candidate < target,
            VersionOp::Le => candidate <= target,
        }
    }

    /// The operator as written in a specifier (empty for `Eq`).
    pub fn as_str(self) -> &'static str {
        match self {
            VersionOp::Eq => "",
            VersionOp::Gt => ">",
            VersionOp::Ge => ">=",
            VersionOp::Lt => "<",
            VersionOp::Le => "<=",
        }
    }
}

/// Version constraint of a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// No `@` suffix: pick the highest registered version
    Latest,
    /// `@[OP]VERSION`
    Version {
        /// Comparison operator
        op: VersionOp,
        /// Requested version
        version: Version,
    },
}

impl Constraint {
    /// Returns true if a registered version satisfies the constraint.
    pub fn accepts(&self, candidate: Version) -> bool {
        match *self {
            Constraint::Latest => true,
            Constraint::Version { op, version } => op.matches(candidate, version),
        }
    }
}

/// A parsed module specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// Module base name
    pub base: String,
    /// Version constraint
    pub constraint: Constraint,
}

impl Specifier {
    /// An unconstrained specifier for `base`.
    pub fn latest(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            constraint: Constraint::Latest,
        }
    }

    /// Parses a raw specifier.
    pub fn parse(raw: &str) -> Result<Self, SpecifierError> {
        if raw.bytes().any(|b| b <= b' ') {
            return Err(SpecifierError::Whitespace);
        }

        let Some((base, tail)) = raw.split_once('@') else {
            if raw.is_empty() {
                return Err(SpecifierError::EmptyBase);
            }
            return Ok(Self::latest(raw));
        };

        if base.is_empty() {
            return Err(SpecifierError::EmptyBase);
        }
        if base.len() >= MAX_BASE_LEN {
            return Err(SpecifierError::BaseTooLong(base.len()));
        }
        if tail.is_empty() {
            return Err(SpecifierError::EmptyConstraint);
        }

        let (op, version) = split_operator(tail);
        let version = Version::parse(version)?;

        Ok(Self {
            base: base.to_string(),
            constraint: Constraint::Version { op, version },
        })
    }
}

/// Two-character operators are tried before their one-character prefixes.
fn split_operator(tail: &str) -> (VersionOp, &str) {
    if let Some(rest) = tail.strip_prefix(">=") {
        (VersionOp::Ge, rest)
    } else if let Some(rest) = tail.strip_prefix("<=") {
        (VersionOp::Le, rest)
    } else if let Some(rest) = tail.strip_prefix('>') {
        (VersionOp::Gt, rest)
    } else if let Some(rest) = tail.strip_prefix('<') {
        (VersionOp::Lt, rest)
    } else {
        (VersionOp::Eq, tail)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constraint {
            Constraint::Latest => write!(f, "{}", self.base),
            Constraint::Version { op, version } => {
                write!(f, "{}@{}{}", self.base, op.as_str(), version)
            }
        }
    }
}
