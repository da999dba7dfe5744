//! Proof verification for docproof circuits
//!
//! An invalid proof is `Ok(false)`, never an error. Errors are reserved
//! for things the caller has to fix: an envelope that cannot be read, a
//! signal vector of the wrong length, or missing keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use ark_snark::SNARK;
use serde::Serialize;

use crate::circuit::config::{Fr, Groth16Proof, PreparedVerifyingKey, ProofSystem};
use crate::config::VerifyPolicy;
use crate::envelope::encoding::field_to_decimal;
use crate::envelope::ProofEnvelope;
use crate::error::{DocProofError, Result};
use crate::keys::KeyStore;
use crate::predicate::PredicateFamily;

/// Outcome of checking an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Proof verified and the envelope passed every policy check
    pub valid: bool,
    pub circuit_id: String,
    /// Why `valid` is false
    pub reason: Option<String>,
    /// Public signals by name, as decimal strings
    pub public_signals: BTreeMap<String, String>,
    /// The proven predicate outcome; only present when `valid`
    pub outcome: Option<bool>,
    pub timestamp: i64,
}

impl Verdict {
    fn rejected(envelope: &ProofEnvelope, signals: BTreeMap<String, String>, reason: String) -> Self {
        log::warn!("✗ Envelope rejected: {}", reason);
        Self {
            valid: false,
            circuit_id: envelope.circuit_id.clone(),
            reason: Some(reason),
            public_signals: signals,
            outcome: None,
            timestamp: envelope.timestamp,
        }
    }
}

/// Groth16 verifier backed by a shared key store.
#[derive(Clone)]
pub struct Verifier {
    keys: Arc<KeyStore>,
    policy: VerifyPolicy,
}

impl Verifier {
    pub fn new(keys: Arc<KeyStore>, policy: VerifyPolicy) -> Self {
        Self { keys, policy }
    }

    pub fn policy(&self) -> &VerifyPolicy {
        &self.policy
    }

    /// Verify a proof against the family's verification key.
    pub fn verify(&self, family: PredicateFamily, public_signals: &[Fr], proof: &Groth16Proof) -> Result<bool> {
        let pvk = self.keys.verifying_key(family)?;
        verify_proof(family, public_signals, proof, &pvk)
    }

    /// Open an envelope, apply the policy, and verify it as `family`.
    ///
    /// # Returns
    /// A [`Verdict`]. `MalformedEnvelope` when the envelope fails its
    /// integrity checks, `MissingKeyMaterial` when no key is available.
    pub fn verify_envelope(&self, envelope: &ProofEnvelope, family: PredicateFamily) -> Result<Verdict> {
        self.verify_envelope_at(envelope, family, chrono::Utc::now().timestamp_millis())
    }

    /// [`verify_envelope`](Self::verify_envelope) with an explicit "now".
    pub fn verify_envelope_at(
        &self,
        envelope: &ProofEnvelope,
        family: PredicateFamily,
        now_ms: i64,
    ) -> Result<Verdict> {
        log::info!("Verifying {} envelope as {}", envelope.circuit_id, family.circuit_id());

        let (sealed_family, proof, signals) = envelope.open()?;
        let named = name_signals(sealed_family, &signals);

        if sealed_family != family {
            return Ok(Verdict::rejected(
                envelope,
                named,
                format!("envelope is for {}, expected {}", sealed_family.circuit_id(), family.circuit_id()),
            ));
        }

        let skew = i64::try_from(self.policy.max_clock_skew_ms).unwrap_or(i64::MAX);
        if envelope.timestamp > now_ms.saturating_add(skew) {
            return Ok(Verdict::rejected(envelope, named, "timestamp is in the future".to_string()));
        }
        if let Some(max_age) = self.policy.max_age_ms {
            let max_age = i64::try_from(max_age).unwrap_or(i64::MAX);
            if now_ms.saturating_sub(envelope.timestamp) > max_age {
                return Ok(Verdict::rejected(envelope, named, "envelope has expired".to_string()));
            }
        }

        let start = std::time::Instant::now();
        if !self.verify(family, &signals, &proof)? {
            return Ok(Verdict::rejected(envelope, named, "proof does not verify".to_string()));
        }
        log::info!("✓ Proof VALID (verified in {:.2?})", start.elapsed());

        let outcome = signals.first().map(|valid| *valid == Fr::from(1u64));
        Ok(Verdict {
            valid: true,
            circuit_id: envelope.circuit_id.clone(),
            reason: None,
            public_signals: named,
            outcome,
            timestamp: envelope.timestamp,
        })
    }
}

/// Structural checks plus the pairing check.
pub fn verify_proof(
    family: PredicateFamily,
    public_signals: &[Fr],
    proof: &Groth16Proof,
    pvk: &PreparedVerifyingKey,
) -> Result<bool> {
    if public_signals.len() != family.public_arity() {
        return Err(DocProofError::MalformedEnvelope(format!(
            "{} expects {} public signals, got {}",
            family.circuit_id(),
            family.public_arity(),
            public_signals.len()
        )));
    }
    if pvk.vk.gamma_abc_g1.len() != family.public_arity() + 1 {
        return Err(DocProofError::MissingKeyMaterial {
            circuit: family.circuit_id().to_string(),
            reason: "verification key belongs to a different circuit".to_string(),
        });
    }

    let points_ok = proof.a.is_on_curve()
        && proof.a.is_in_correct_subgroup_assuming_on_curve()
        && proof.b.is_on_curve()
        && proof.b.is_in_correct_subgroup_assuming_on_curve()
        && proof.c.is_on_curve()
        && proof.c.is_in_correct_subgroup_assuming_on_curve();
    if !points_ok {
        log::warn!("✗ Proof point off curve or outside the prime subgroup");
        return Ok(false);
    }

    let valid = ProofSystem::verify_with_processed_vk(pvk, public_signals, proof)?;
    if !valid {
        log::warn!("✗ Proof INVALID for {}", family.circuit_id());
    }
    Ok(valid)
}

fn name_signals(family: PredicateFamily, signals: &[Fr]) -> BTreeMap<String, String> {
    family
        .public_signal_names()
        .into_iter()
        .zip(signals)
        .map(|(name, value)| (name.to_string(), field_to_decimal(value)))
        .collect()
}
