//! Tax filing recency circuit.
//!
//! Proves "currentYear - filingYear <= maxYearGap AND amountPaid > 0"
//! with the filing year and amount kept private. Like the age circuit, the
//! year gap is decomposed into 32 bits, so a filing year in the future is
//! unsatisfiable rather than "very recent".
//!
//! Public signals: `[valid, currentYear, maxYearGap]`.

use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::circuit::config::{AMOUNT_BITS, YEAR_BITS};
use crate::circuit::gadgets::{is_geq, range_check};

/// R1CS for the FilingRecency family.
#[derive(Clone, Debug, Default)]
pub struct FilingRecencyCircuit<F: PrimeField> {
    pub valid: Option<bool>,
    pub current_year: Option<F>,
    pub max_year_gap: Option<F>,
    pub filing_year: Option<F>,
    pub amount_paid: Option<F>,
}

impl<F: PrimeField> FilingRecencyCircuit<F> {
    pub fn new(
        filing_year: u64,
        amount_paid: u64,
        current_year: u64,
        max_year_gap: u64,
        valid: bool,
    ) -> Self {
        Self {
            valid: Some(valid),
            current_year: Some(F::from(current_year)),
            max_year_gap: Some(F::from(max_year_gap)),
            filing_year: Some(F::from(filing_year)),
            amount_paid: Some(F::from(amount_paid)),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for FilingRecencyCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let valid = Boolean::new_input(cs.clone(), || {
            self.valid.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let current_year = FpVar::new_input(cs.clone(), || {
            self.current_year.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let max_year_gap = FpVar::new_input(cs.clone(), || {
            self.max_year_gap.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let filing_year = FpVar::new_witness(cs.clone(), || {
            self.filing_year.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let amount_paid = FpVar::new_witness(cs.clone(), || {
            self.amount_paid.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let gap = &current_year - &filing_year;
        range_check(&gap, YEAR_BITS)?;
        range_check(&max_year_gap, YEAR_BITS)?;
        range_check(&amount_paid, AMOUNT_BITS)?;

        let recent = is_geq(&max_year_gap, &gap, YEAR_BITS)?;
        let paid = is_geq(&amount_paid, &FpVar::Constant(F::one()), AMOUNT_BITS)?;
        recent.and(&paid)?.enforce_equal(&valid)?;

        Ok(())
    }
}
