//! Proof generation for docproof circuits

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ark_ff::UniformRand;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use rand::{CryptoRng, RngCore};

use crate::circuit::config::{Fr, Groth16Proof, ProofSystem, ProvingKey};
use crate::circuit::PredicateCircuit;
use crate::error::{DocProofError, Result};
use crate::keys::KeyStore;
use crate::witness::Witness;

/// Phases of a proof request, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProofStage {
    PreparingWitness,
    Synthesizing,
    Proving,
    SelfVerifying,
    Sealing,
    Done,
}

impl ProofStage {
    /// Rough completion percentage, for progress bars.
    pub fn percent(&self) -> u8 {
        match self {
            ProofStage::PreparingWitness => 10,
            ProofStage::Synthesizing => 30,
            ProofStage::Proving => 50,
            ProofStage::SelfVerifying => 75,
            ProofStage::Sealing => 90,
            ProofStage::Done => 100,
        }
    }
}

/// Cooperative cancellation for in-flight proofs.
///
/// Clones share the flag. Proving checks it between synthesis, blinding
/// and the MSMs; a cancelled request returns [`DocProofError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(DocProofError::Cancelled);
        }
        Ok(())
    }
}

/// Groth16 prover backed by a shared key store.
#[derive(Clone)]
pub struct Prover {
    keys: Arc<KeyStore>,
}

impl Prover {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Prove `witness` with the proving key of its family.
    ///
    /// # Arguments
    /// * `witness` - Inputs and claimed outcome
    /// * `rng` - Source of the blinding scalars; use `OsRng` unless you
    ///   need reproducible proofs
    /// * `cancel` - Checked between phases
    ///
    /// # Returns
    /// The Groth16 proof. Fails with `UnsatisfiedConstraint` when the claim
    /// does not hold for the inputs, and never emits a proof in that case.
    ///
    /// # Example
    /// ```no_run
    /// use std::sync::Arc;
    /// use docproof_core::circuit::{CancelToken, Prover};
    /// use docproof_core::keys::{DirectoryKeySource, KeyStore};
    /// use docproof_core::Witness;
    ///
    /// let keys = Arc::new(KeyStore::new(DirectoryKeySource::new("keys")));
    /// let prover = Prover::new(keys);
    /// let witness = Witness::age_above(1990, 2024, 18);
    /// let proof = prover.prove(&witness, &mut rand::rngs::OsRng, &CancelToken::new())?;
    /// # Ok::<(), docproof_core::DocProofError>(())
    /// ```
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        witness: &Witness,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Groth16Proof> {
        self.prove_observed(witness, rng, cancel, &mut |_| {})
    }

    /// [`prove`](Self::prove), reporting `Synthesizing` and `Proving` as they start.
    pub fn prove_observed<R: RngCore + CryptoRng>(
        &self,
        witness: &Witness,
        rng: &mut R,
        cancel: &CancelToken,
        on_stage: &mut dyn FnMut(ProofStage),
    ) -> Result<Groth16Proof> {
        cancel.check()?;
        let pk = self.keys.proving_key(witness.family)?;
        create_proof(witness, &pk, rng, cancel, on_stage)
    }
}

/// Synthesize, check, blind and prove in one pass.
pub fn create_proof<R: RngCore + CryptoRng>(
    witness: &Witness,
    pk: &ProvingKey,
    rng: &mut R,
    cancel: &CancelToken,
    on_stage: &mut dyn FnMut(ProofStage),
) -> Result<Groth16Proof> {
    let family = witness.family;
    let circuit_id = family.circuit_id();
    log::info!("Generating {} proof", circuit_id);
    log::debug!("Witness: {:?}", witness);

    // Step 1: Synthesize with full assignment
    on_stage(ProofStage::Synthesizing);
    let start = std::time::Instant::now();

    let circuit = PredicateCircuit::<Fr>::from_witness(witness)?;
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Prove {
        construct_matrices: true,
    });
    circuit.generate_constraints(cs.clone())?;

    // Step 2: Fail closed before any proof material exists
    if !cs.is_satisfied()? {
        log::warn!("✗ Witness does not satisfy {} (claim = {})", circuit_id, witness.claim);
        return Err(DocProofError::UnsatisfiedConstraint {
            circuit: circuit_id.to_string(),
            reason: format!("claimed outcome {} does not hold for the inputs", witness.claim),
        });
    }
    cancel.check()?;

    cs.finalize();
    let matrices = cs
        .to_matrices()
        .ok_or_else(|| DocProofError::Synthesis("constraint matrices were not constructed".to_string()))?;
    let (num_inputs, num_constraints, full_assignment) = {
        let inner = cs
            .borrow()
            .ok_or_else(|| DocProofError::Synthesis("constraint system is not available".to_string()))?;
        let full: Vec<Fr> = [inner.instance_assignment.as_slice(), inner.witness_assignment.as_slice()].concat();
        (inner.num_instance_variables, inner.num_constraints, full)
    };

    log::info!("✓ Synthesized {} constraints in {:.2?}", num_constraints, start.elapsed());

    if pk.vk.gamma_abc_g1.len() != num_inputs || pk.a_query.len() != full_assignment.len() {
        return Err(DocProofError::MissingKeyMaterial {
            circuit: circuit_id.to_string(),
            reason: "proving key was generated for a different circuit".to_string(),
        });
    }

    // Step 3: Blinding
    on_stage(ProofStage::Proving);
    let r = Fr::rand(rng);
    let s = Fr::rand(rng);
    cancel.check()?;

    // Step 4: MSMs
    log::info!("Generating proof (this may take a moment)...");
    let start = std::time::Instant::now();

    let proof = ProofSystem::create_proof_with_reduction_and_matrices(
        pk,
        r,
        s,
        &matrices,
        num_inputs,
        num_constraints,
        &full_assignment,
    )?;

    log::info!("✓ Proof generated in {:.2?}", start.elapsed());
    Ok(proof)
}
