//! SQLite dialect versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// A SQLite version, used to pick renderings that older engines understand.
///
/// Versions compare component-wise, so `3.8.2 < 3.8.10 < 3.30.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionCode {
    major: u16,
    minor: u16,
    micro: u16,
    nano: u16,
}

impl VersionCode {
    /// Newer than any released version; enables every rendering
    pub const LATEST: Self = Self::new(u16::MAX, u16::MAX, u16::MAX, u16::MAX);

    /// First version accepting multi-row `VALUES` lists in `INSERT`
    pub const V3_7_11: Self = Self::new(3, 7, 11, 0);

    /// First version supporting `NULLS FIRST` / `NULLS LAST` in `ORDER BY`
    pub const V3_30_0: Self = Self::new(3, 30, 0, 0);

    pub const fn new(major: u16, minor: u16, micro: u16, nano: u16) -> Self {
        Self {
            major,
            minor,
            micro,
            nano,
        }
    }

    /// Parse a dotted version such as `"3.8.2"` or `"3.7.11.1"`
    pub fn parse(version: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidVersion(version.to_string());
        let mut parts = [0u16; 4];
        let mut count = 0;
        for part in version.trim().split('.') {
            if count == parts.len() {
                return Err(invalid());
            }
            parts[count] = part.parse().map_err(|_| invalid())?;
            count += 1;
        }
        if count < 2 {
            return Err(invalid());
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }

    pub fn is_at_least(&self, other: VersionCode) -> bool {
        *self >= other
    }

    pub const fn major(&self) -> u16 {
        self.major
    }

    pub const fn minor(&self) -> u16 {
        self.minor
    }

    pub const fn micro(&self) -> u16 {
        self.micro
    }

    pub const fn nano(&self) -> u16 {
        self.nano
    }
}

impl Default for VersionCode {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if self.nano > 0 {
            write!(f, ".{}", self.nano)?;
        }
        Ok(())
    }
}

impl FromStr for VersionCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionCode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionCode> for String {
    fn from(version: VersionCode) -> Self {
        version.to_string()
    }
}
