//! Voter identity.
//!
//! Identities are opaque, upper-case tokens supplied by the roster. The
//! reserved token `DEVELOPER` denotes the aggregate developer identity and is
//! resolved to its own variant once, at the boundary, so nothing downstream
//! compares strings to find it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BallotError;

/// A voter identity: either a regular roster token or the developer aggregate.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Identity {
    /// A roster member, stored upper-cased.
    Regular(String),
    /// The aggregate `DEVELOPER` identity.
    Developer,
}

impl Identity {
    /// The reserved token for the developer aggregate.
    pub const DEVELOPER_TOKEN: &'static str = "DEVELOPER";

    /// Parse a raw token: trims surrounding whitespace and upper-cases it.
    ///
    /// `"developer"` in any case maps to [`Identity::Developer`]. Empty tokens
    /// and tokens containing control characters are rejected.
    pub fn parse(raw: &str) -> Result<Self, BallotError> {
        let token = raw.trim().to_uppercase();
        if token.is_empty() || token.chars().any(char::is_control) {
            return Err(BallotError::MalformedIdentity(raw.to_string()));
        }
        if token == Self::DEVELOPER_TOKEN {
            Ok(Self::Developer)
        } else {
            Ok(Self::Regular(token))
        }
    }

    /// The canonical upper-case token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regular(token) => token,
            Self::Developer => Self::DEVELOPER_TOKEN,
        }
    }

    pub fn is_developer(&self) -> bool {
        matches!(self, Self::Developer)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.as_str())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Regular(token) => token,
            Identity::Developer => Identity::DEVELOPER_TOKEN.to_string(),
        }
    }
}

impl TryFrom<String> for Identity {
    type Error = BallotError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl std::str::FromStr for Identity {
    type Err = BallotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uppercases_and_trims() {
        let id = Identity::parse("  erf12a ").unwrap();
        assert_eq!(id, Identity::Regular("ERF12A".to_string()));
        assert_eq!(id.as_str(), "ERF12A");
    }

    #[test]
    fn developer_token_is_case_insensitive() {
        assert_eq!(Identity::parse("developer").unwrap(), Identity::Developer);
        assert_eq!(Identity::parse("DEVELOPER").unwrap(), Identity::Developer);
        assert!(Identity::Developer.is_developer());
    }

    #[test]
    fn empty_token_rejected() {
        assert!(matches!(
            Identity::parse("   "),
            Err(BallotError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn serde_uses_plain_string() {
        let json = serde_json::to_string(&Identity::Developer).unwrap();
        assert_eq!(json, "\"DEVELOPER\"");
        let back: Identity = serde_json::from_str("\"b7\"").unwrap();
        assert_eq!(back, Identity::Regular("B7".into()));
    }
}
