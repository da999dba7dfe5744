//! Income range circuit - prove your income is within bounds without the exact figure.
//!
//! Proves "minIncome <= actualIncome <= maxIncome". Suits lenders and
//! landlords who need an income band, not a salary slip.
//!
//! All three amounts are decomposed into 64 bits before the two
//! comparisons, so neither bound can be dodged through field wraparound.
//!
//! Public signals: `[valid, minIncome, maxIncome]`.

use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::circuit::config::AMOUNT_BITS;
use crate::circuit::gadgets::{is_geq, range_check};

/// R1CS for the IncomeInRange family.
#[derive(Clone, Debug, Default)]
pub struct IncomeInRangeCircuit<F: PrimeField> {
    pub valid: Option<bool>,
    pub min_income: Option<F>,
    pub max_income: Option<F>,
    pub actual_income: Option<F>,
}

impl<F: PrimeField> IncomeInRangeCircuit<F> {
    pub fn new(actual_income: u64, min_income: u64, max_income: u64, valid: bool) -> Self {
        Self {
            valid: Some(valid),
            min_income: Some(F::from(min_income)),
            max_income: Some(F::from(max_income)),
            actual_income: Some(F::from(actual_income)),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for IncomeInRangeCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let valid = Boolean::new_input(cs.clone(), || {
            self.valid.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let min_income = FpVar::new_input(cs.clone(), || {
            self.min_income.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let max_income = FpVar::new_input(cs.clone(), || {
            self.max_income.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let actual_income = FpVar::new_witness(cs.clone(), || {
            self.actual_income.ok_or(SynthesisError::AssignmentMissing)
        })?;

        for amount in [&actual_income, &min_income, &max_income] {
            range_check(amount, AMOUNT_BITS)?;
        }

        let above_min = is_geq(&actual_income, &min_income, AMOUNT_BITS)?;
        let below_max = is_geq(&max_income, &actual_income, AMOUNT_BITS)?;
        above_min.and(&below_max)?.enforce_equal(&valid)?;

        Ok(())
    }
}
