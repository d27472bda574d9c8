//! Fingerprints of rendered configuration text.
//!
//! A fingerprint identifies exactly which configuration a step applied, and
//! lets a provisioning layer recognise an identical re-apply.

use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of a rendered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    /// Computes the fingerprint of configuration text.
    #[must_use]
    pub fn of(config_text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(config_text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Full hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for display.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
