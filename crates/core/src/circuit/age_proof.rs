//! Age threshold circuit - prove you're old enough without revealing your birth year.
//!
//! Proves "currentYear - birthYear >= ageThreshold" while the birth year stays
//! a private witness. The verifier only learns the current year, the
//! threshold and the boolean outcome.
//!
//! ## Constraints
//!
//! - `age = currentYear - birthYear` is decomposed into 32 bits. A birth year
//!   after the current year wraps to ~2^254 and has no decomposition, so no
//!   outcome at all can be proven for it.
//! - `ageThreshold` is decomposed into 32 bits.
//! - `valid == (age >= ageThreshold)`, using the carry-bit comparison.
//!
//! Public signals: `[valid, currentYear, ageThreshold]`.

use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::circuit::config::YEAR_BITS;
use crate::circuit::gadgets::{is_geq, range_check};

/// R1CS for the AgeAbove family.
///
/// Fields hold raw field elements so the circuit can also be driven with
/// values no honest extractor would produce.
#[derive(Clone, Debug, Default)]
pub struct AgeAboveCircuit<F: PrimeField> {
    pub valid: Option<bool>,
    pub current_year: Option<F>,
    pub age_threshold: Option<F>,
    pub birth_year: Option<F>,
}

impl<F: PrimeField> AgeAboveCircuit<F> {
    pub fn new(birth_year: u64, current_year: u64, age_threshold: u64, valid: bool) -> Self {
        Self {
            valid: Some(valid),
            current_year: Some(F::from(current_year)),
            age_threshold: Some(F::from(age_threshold)),
            birth_year: Some(F::from(birth_year)),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for AgeAboveCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let valid = Boolean::new_input(cs.clone(), || {
            self.valid.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let current_year = FpVar::new_input(cs.clone(), || {
            self.current_year.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let age_threshold = FpVar::new_input(cs.clone(), || {
            self.age_threshold.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let birth_year = FpVar::new_witness(cs.clone(), || {
            self.birth_year.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let age = &current_year - &birth_year;
        range_check(&age, YEAR_BITS)?;
        range_check(&age_threshold, YEAR_BITS)?;

        let old_enough = is_geq(&age, &age_threshold, YEAR_BITS)?;
        old_enough.enforce_equal(&valid)?;

        Ok(())
    }
}
