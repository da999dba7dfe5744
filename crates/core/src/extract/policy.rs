//! What extraction does when a document field is missing or unusable.

use serde::{Deserialize, Serialize};

/// Extraction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Missing or malformed inputs are errors
    #[default]
    Strict,
    /// Missing or malformed inputs degrade to the policy constants
    Substitute,
}

/// Fallback policy handed to an [`Extractor`](super::Extractor).
///
/// The constants are only consulted in [`FallbackMode::Substitute`].
/// Public parameters (age threshold, passing percentage, income bounds,
/// year gap) have their own defaults and never count as fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FallbackPolicy {
    pub mode: FallbackMode,
    pub birth_year: u64,
    pub annual_income: u64,
    pub percentage: u64,
    pub amount_paid: u64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            mode: FallbackMode::Strict,
            birth_year: 2000,
            annual_income: 1_000_000,
            percentage: 60,
            amount_paid: 10_000,
        }
    }
}

impl FallbackPolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    /// Never fail on a known family; substitute the documented constants.
    pub fn substitute() -> Self {
        Self {
            mode: FallbackMode::Substitute,
            ..Self::default()
        }
    }

    pub fn is_substitute(&self) -> bool {
        self.mode == FallbackMode::Substitute
    }
}
