//! Zero-knowledge circuits for document attribute proofs
//!
//! This module implements Groth16/BN254 circuits (arkworks R1CS) for proving
//! claims about document fields without revealing the fields themselves.
//!
//! # Available Circuits
//!
//! ## 1. Age Above
//! Proves age derived from a birth year is at least a threshold:
//! - [`age_proof::AgeAboveCircuit`]
//!
//! ## 2. Income In Range
//! Proves an income lies within public bounds:
//! - [`range_proof::IncomeInRangeCircuit`]
//!
//! ## 3. Score Above
//! Proves a score reaches a passing percentage:
//! - [`score_proof::ScoreAboveCircuit`]
//!
//! ## 4. Filing Recency
//! Proves taxes were filed recently with a positive amount paid:
//! - [`filing_proof::FilingRecencyCircuit`]
//!
//! Each circuit exposes its boolean outcome as the first public input and
//! enforces it equal to the predicate, so a proof of `valid = 0` is as sound
//! as one of `valid = 1`. Proving and verification live in [`prover`] and
//! [`verifier`].

pub mod config;
pub mod gadgets;
pub mod prover;
pub mod verifier;
pub mod age_proof;
pub mod range_proof;
pub mod score_proof;
pub mod filing_proof;

#[cfg(test)]
mod proptests;

use ark_ff::PrimeField;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError};

use crate::error::Result;
use crate::predicate::PredicateFamily;
use crate::witness::Witness;

pub use age_proof::AgeAboveCircuit;
pub use config::Fr;
pub use filing_proof::FilingRecencyCircuit;
pub use prover::{CancelToken, ProofStage, Prover};
pub use range_proof::IncomeInRangeCircuit;
pub use score_proof::ScoreAboveCircuit;
pub use verifier::Verifier;

/// One circuit per predicate family, dispatched at synthesis time.
#[derive(Clone, Debug)]
pub enum PredicateCircuit<F: PrimeField> {
    AgeAbove(AgeAboveCircuit<F>),
    IncomeInRange(IncomeInRangeCircuit<F>),
    ScoreAbove(ScoreAboveCircuit<F>),
    FilingRecency(FilingRecencyCircuit<F>),
}

impl<F: PrimeField> PredicateCircuit<F> {
    /// Unassigned circuit, for key generation.
    pub fn blank(family: PredicateFamily) -> Self {
        match family {
            PredicateFamily::AgeAbove => Self::AgeAbove(AgeAboveCircuit::default()),
            PredicateFamily::IncomeInRange => Self::IncomeInRange(IncomeInRangeCircuit::default()),
            PredicateFamily::ScoreAbove => Self::ScoreAbove(ScoreAboveCircuit::default()),
            PredicateFamily::FilingRecency => Self::FilingRecency(FilingRecencyCircuit::default()),
        }
    }

    /// Fully assigned circuit for a witness.
    pub fn from_witness(witness: &Witness) -> Result<Self> {
        witness.validate()?;
        let p = witness.public_values()?;
        let s = witness.private_values()?;
        let claim = witness.claim;

        let circuit = match witness.family {
            PredicateFamily::AgeAbove => Self::AgeAbove(AgeAboveCircuit::new(s[0], p[0], p[1], claim)),
            PredicateFamily::IncomeInRange => {
                Self::IncomeInRange(IncomeInRangeCircuit::new(s[0], p[0], p[1], claim))
            }
            PredicateFamily::ScoreAbove => {
                Self::ScoreAbove(ScoreAboveCircuit::new(s[0], s[1], p[0], claim))
            }
            PredicateFamily::FilingRecency => {
                Self::FilingRecency(FilingRecencyCircuit::new(s[0], s[1], p[0], p[1], claim))
            }
        };
        Ok(circuit)
    }

    pub fn family(&self) -> PredicateFamily {
        match self {
            Self::AgeAbove(_) => PredicateFamily::AgeAbove,
            Self::IncomeInRange(_) => PredicateFamily::IncomeInRange,
            Self::ScoreAbove(_) => PredicateFamily::ScoreAbove,
            Self::FilingRecency(_) => PredicateFamily::FilingRecency,
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for PredicateCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> std::result::Result<(), SynthesisError> {
        match self {
            Self::AgeAbove(c) => c.generate_constraints(cs),
            Self::IncomeInRange(c) => c.generate_constraints(cs),
            Self::ScoreAbove(c) => c.generate_constraints(cs),
            Self::FilingRecency(c) => c.generate_constraints(cs),
        }
    }
}

/// Check a witness against its circuit without proving.
pub fn is_satisfied(witness: &Witness) -> Result<bool> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    PredicateCircuit::<Fr>::from_witness(witness)?.generate_constraints(cs.clone())?;
    Ok(cs.is_satisfied()?)
}
