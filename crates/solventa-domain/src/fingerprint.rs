//! Content fingerprints - the primary duplicate key
//!
//! A fingerprint is the SHA-256 of the observation and proposal plain text
//! joined by a `||` separator, rendered as lowercase hex. It is computed
//! over stored (display) text, never the normalized keyword form, so that
//! two proposals differing only in accents or casing are distinct.
//!
//! Uniqueness is enforced per (entity, funding source) scope by the store,
//! not globally: two entities may legitimately file textually identical
//! proposals.

use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic content hash over an (observation, proposal) text pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for an observation/proposal pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use solventa_domain::Fingerprint;
    ///
    /// let a = Fingerprint::compute("obs", "prop");
    /// let b = Fingerprint::compute("obs", "prop");
    /// assert_eq!(a, b);
    /// assert_ne!(a, Fingerprint::compute("obs", "other"));
    /// ```
    pub fn compute(observation: &str, proposal: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(observation.as_bytes());
        hasher.update(b"||");
        hasher.update(proposal.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Wrap an already-computed hex digest (storage layer deserialization).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
