//! Ingestion policy knobs.

use std::fmt;
use std::str::FromStr;

/// What to do with a request that carries none of the GitLab headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonConformingPolicy {
    /// Answer 400 and write nothing.
    #[default]
    Reject,
    /// Store a degraded row with every header field empty.
    ///
    /// This turns off provenance checking for such requests: a request
    /// without any GitLab header carries no token, so anyone who can reach
    /// the listener can write rows. Requests that carry any GitLab header
    /// still need the configured token.
    Persist,
}

impl fmt::Display for NonConformingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

impl FromStr for NonConformingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "persist" => Ok(Self::Persist),
            other => Err(format!(
                "unknown non-conforming policy '{other}', expected 'reject' or 'persist'"
            )),
        }
    }
}

/// Policy applied to every delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Handling of requests without GitLab headers.
    pub non_conforming: NonConformingPolicy,
    /// Whether JSON payloads of an unrecognized kind still get a raw row.
    pub capture_unrecognized: bool,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            non_conforming: NonConformingPolicy::Reject,
            capture_unrecognized: true,
        }
    }
}
