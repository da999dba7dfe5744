//! Service configuration.
//!
//! Everything has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "keysDir": "keys",
//!   "fallback": { "mode": "strict" },
//!   "prover": { "verifyAfterProve": true },
//!   "verifier": { "maxClockSkewMs": 0, "maxAgeMs": null },
//!   "referenceYear": null
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocProofError, Result};
use crate::extract::FallbackPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Root of the `<circuit-id>/{proving,verification}_key.bin` tree
    pub keys_dir: PathBuf,
    pub fallback: FallbackPolicy,
    pub prover: ProverConfig,
    pub verifier: VerifyPolicy,
    /// Pin "this year" instead of reading the clock
    pub reference_year: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("keys"),
            fallback: FallbackPolicy::default(),
            prover: ProverConfig::default(),
            verifier: VerifyPolicy::default(),
            reference_year: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DocProofError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocProofError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProverConfig {
    /// Verify each fresh proof with the verification key before sealing it
    pub verify_after_prove: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            verify_after_prove: true,
        }
    }
}

/// Envelope-level acceptance rules applied before the pairing check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyPolicy {
    /// How far in the future a timestamp may be; 0 rejects any future timestamp
    pub max_clock_skew_ms: u64,
    /// Reject envelopes older than this, if set
    pub max_age_ms: Option<u64>,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            max_clock_skew_ms: 0,
            max_age_ms: None,
        }
    }
}
