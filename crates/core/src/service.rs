//! End-to-end proof flow.
//!
//! Generation: extract the witness from document fields, prove, verify the
//! fresh proof locally, seal it into an envelope. Verification: open the
//! envelope, apply the verify policy, run the pairing check.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use docproof_core::config::ServiceConfig;
//! use docproof_core::service::ProofService;
//! use docproof_core::PredicateFamily;
//!
//! let service = ProofService::from_config(&ServiceConfig::default());
//!
//! let mut fields = HashMap::new();
//! fields.insert("dob".to_string(), "1990-05-04".to_string());
//!
//! let envelope = service.generate(PredicateFamily::AgeAbove, &fields, None)?;
//! let verdict = service.verify(&envelope, PredicateFamily::AgeAbove)?;
//! assert_eq!(verdict.outcome, Some(true));
//! # Ok::<(), docproof_core::DocProofError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::circuit::config::Fr;
use crate::circuit::prover::{CancelToken, ProofStage, Prover};
use crate::circuit::verifier::{Verdict, Verifier};
use crate::config::{ProverConfig, ServiceConfig};
use crate::envelope::ProofEnvelope;
use crate::error::{DocProofError, Result};
use crate::extract::Extractor;
use crate::keys::{DirectoryKeySource, KeyStore};
use crate::predicate::PredicateFamily;
use crate::witness::Witness;

/// Extractor, prover and verifier sharing one key store.
#[derive(Clone)]
pub struct ProofService {
    extractor: Extractor,
    prover: Prover,
    verifier: Verifier,
    config: ProverConfig,
}

impl ProofService {
    pub fn new(config: &ServiceConfig, keys: Arc<KeyStore>) -> Self {
        let mut extractor = Extractor::new(config.fallback.clone());
        if let Some(year) = config.reference_year {
            extractor = extractor.with_reference_year(year);
        }

        Self {
            extractor,
            prover: Prover::new(keys.clone()),
            verifier: Verifier::new(keys, config.verifier.clone()),
            config: config.prover.clone(),
        }
    }

    /// Service reading keys from `config.keys_dir`. Keys load lazily, so a
    /// missing directory only surfaces on first use.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let keys = Arc::new(KeyStore::new(DirectoryKeySource::new(&config.keys_dir)));
        Self::new(config, keys)
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Extract, prove and seal with `OsRng` and no cancellation.
    pub fn generate(
        &self,
        family: PredicateFamily,
        raw_fields: &HashMap<String, String>,
        threshold: Option<u64>,
    ) -> Result<ProofEnvelope> {
        self.generate_with(family, raw_fields, threshold, &mut OsRng, &CancelToken::new(), &mut |_| {})
    }

    /// Full-control variant of [`generate`](Self::generate).
    ///
    /// # Arguments
    /// * `rng` - Blinding randomness
    /// * `cancel` - Checked between phases; a cancelled request leaves nothing behind
    /// * `on_stage` - Called as each [`ProofStage`] begins
    pub fn generate_with<R: RngCore + CryptoRng>(
        &self,
        family: PredicateFamily,
        raw_fields: &HashMap<String, String>,
        threshold: Option<u64>,
        rng: &mut R,
        cancel: &CancelToken,
        on_stage: &mut dyn FnMut(ProofStage),
    ) -> Result<ProofEnvelope> {
        on_stage(ProofStage::PreparingWitness);
        let witness = self.extractor.extract(family, raw_fields, threshold)?;
        self.prove_witness(&witness, rng, cancel, on_stage)
    }

    /// Prove an already-built witness and seal it.
    pub fn prove_witness<R: RngCore + CryptoRng>(
        &self,
        witness: &Witness,
        rng: &mut R,
        cancel: &CancelToken,
        on_stage: &mut dyn FnMut(ProofStage),
    ) -> Result<ProofEnvelope> {
        let start = std::time::Instant::now();
        let family = witness.family;

        let proof = self.prover.prove_observed(witness, rng, cancel, on_stage)?;
        let signals: Vec<Fr> = witness.public_signals()?.into_iter().map(Fr::from).collect();

        if self.config.verify_after_prove {
            on_stage(ProofStage::SelfVerifying);
            cancel.check()?;
            if !self.verifier.verify(family, &signals, &proof)? {
                // the witness satisfied the circuit, so the keys disagree
                return Err(DocProofError::MissingKeyMaterial {
                    circuit: family.circuit_id().to_string(),
                    reason: "fresh proof does not verify; proving and verification keys do not match"
                        .to_string(),
                });
            }
            log::info!("✓ Self-verification passed");
        }

        on_stage(ProofStage::Sealing);
        let envelope = ProofEnvelope::seal(&proof, &signals, family);
        on_stage(ProofStage::Done);

        log::info!(
            "✓ {} envelope {} ready in {:.2?}",
            family.circuit_id(),
            envelope.proof_hash,
            start.elapsed()
        );
        Ok(envelope)
    }

    pub fn verify(&self, envelope: &ProofEnvelope, family: PredicateFamily) -> Result<Verdict> {
        self.verifier.verify_envelope(envelope, family)
    }
}
