//! Caller identity and asset visibility.

use std::collections::HashSet;
use std::fmt;

/// Who is asking, as far as asset visibility is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// A designated consumer; may read assets of packs it has not whitelisted.
    Privileged(String),
    /// This application itself.
    Owner,
    External(String),
    Anonymous,
}

impl Caller {
    /// May read assets regardless of whitelisting.
    pub const fn bypasses_whitelist(&self) -> bool {
        matches!(self, Self::Privileged(_) | Self::Owner)
    }

    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Privileged(_))
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Privileged(p) => write!(f, "privileged:{p}"),
            Self::Owner => f.write_str("owner"),
            Self::External(p) => write!(f, "external:{p}"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Maps a calling package name to a [`Caller`].
#[derive(Debug, Clone)]
pub struct CallerPolicy {
    owner_package: String,
    privileged: HashSet<String>,
}

impl CallerPolicy {
    pub fn new(owner_package: impl Into<String>, privileged: impl IntoIterator<Item = String>) -> Self {
        Self {
            owner_package: owner_package.into(),
            privileged: privileged.into_iter().collect(),
        }
    }

    pub fn classify(&self, package: Option<&str>) -> Caller {
        match package.map(str::trim).filter(|p| !p.is_empty()) {
            None => Caller::Anonymous,
            Some(p) if p == self.owner_package => Caller::Owner,
            Some(p) if self.privileged.contains(p) => Caller::Privileged(p.to_string()),
            Some(p) => Caller::External(p.to_string()),
        }
    }
}

/// Answers whether the external consumer has already accepted a pack.
pub trait WhitelistOracle: Send + Sync {
    fn is_whitelisted(&self, identifier: &str) -> bool;
}

/// Nothing is whitelisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWhitelist;

impl WhitelistOracle for NoWhitelist {
    fn is_whitelisted(&self, _identifier: &str) -> bool {
        false
    }
}

/// A fixed set of whitelisted pack identifiers.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist {
    packs: HashSet<String>,
}

impl StaticWhitelist {
    pub fn new(packs: impl IntoIterator<Item = String>) -> Self {
        Self {
            packs: packs.into_iter().collect(),
        }
    }
}

impl WhitelistOracle for StaticWhitelist {
    fn is_whitelisted(&self, identifier: &str) -> bool {
        self.packs.contains(identifier)
    }
}
