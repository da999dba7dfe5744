//! Passing score circuit.
//!
//! Proves `totalMarks * 100 >= minPassingPercentage * maxMarks` without
//! revealing either mark. Marks and the passing percentage are 32-bit, so
//! both products stay below 2^64 and compare with a 64-bit carry.
//!
//! Two hard constraints hold whatever the claim: `totalMarks <= maxMarks`
//! and `maxMarks >= 1`. Without them `maxMarks = 0` would pass any score.
//!
//! Public signals: `[valid, minPassingPercentage]`.

use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::circuit::config::{MAX_COMPARISON_BITS, SCORE_BITS};
use crate::circuit::gadgets::{is_geq, range_check};

/// R1CS for the ScoreAbove family.
#[derive(Clone, Debug, Default)]
pub struct ScoreAboveCircuit<F: PrimeField> {
    pub valid: Option<bool>,
    pub min_passing_percentage: Option<F>,
    pub total_marks: Option<F>,
    pub max_marks: Option<F>,
}

impl<F: PrimeField> ScoreAboveCircuit<F> {
    pub fn new(total_marks: u64, max_marks: u64, min_passing_percentage: u64, valid: bool) -> Self {
        Self {
            valid: Some(valid),
            min_passing_percentage: Some(F::from(min_passing_percentage)),
            total_marks: Some(F::from(total_marks)),
            max_marks: Some(F::from(max_marks)),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for ScoreAboveCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let valid = Boolean::new_input(cs.clone(), || {
            self.valid.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let min_pct = FpVar::new_input(cs.clone(), || {
            self.min_passing_percentage.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let total = FpVar::new_witness(cs.clone(), || {
            self.total_marks.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let max = FpVar::new_witness(cs.clone(), || {
            self.max_marks.ok_or(SynthesisError::AssignmentMissing)
        })?;

        for v in [&total, &max, &min_pct] {
            range_check(v, SCORE_BITS)?;
        }

        is_geq(&max, &total, SCORE_BITS)?.enforce_equal(&Boolean::TRUE)?;
        is_geq(&max, &FpVar::Constant(F::one()), SCORE_BITS)?.enforce_equal(&Boolean::TRUE)?;

        // < 2^39 and < 2^64 respectively
        let scaled_total = &total * F::from(100u64);
        let required = &min_pct * &max;

        let passed = is_geq(&scaled_total, &required, MAX_COMPARISON_BITS)?;
        passed.enforce_equal(&valid)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn satisfied(circuit: ScoreAboveCircuit<Fr>) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_passing_score() {
        env_logger::try_init().ok();

        assert!(satisfied(ScoreAboveCircuit::new(72, 100, 40, true)));
        assert!(!satisfied(ScoreAboveCircuit::new(72, 100, 40, false)));
        println!("✓ 72% passes a 40% bar");
    }

    #[test]
    fn test_failing_score() {
        assert!(satisfied(ScoreAboveCircuit::new(39, 100, 40, false)));
        assert!(!satisfied(ScoreAboveCircuit::new(39, 100, 40, true)));
    }

    #[test]
    fn test_raw_marks_scale() {
        // 412 / 500 = 82.4%
        assert!(satisfied(ScoreAboveCircuit::new(412, 500, 82, true)));
        assert!(satisfied(ScoreAboveCircuit::new(412, 500, 83, false)));
        // exactly 40%
        assert!(satisfied(ScoreAboveCircuit::new(200, 500, 40, true)));
    }

    #[test]
    fn test_marks_above_max_unsatisfiable() {
        assert!(!satisfied(ScoreAboveCircuit::new(101, 100, 40, true)));
        assert!(!satisfied(ScoreAboveCircuit::new(101, 100, 40, false)));
    }

    #[test]
    fn test_zero_max_marks_unsatisfiable() {
        assert!(!satisfied(ScoreAboveCircuit::new(0, 0, 40, true)));
        assert!(!satisfied(ScoreAboveCircuit::new(0, 0, 40, false)));
        println!("✓ maxMarks = 0 cannot be used to pass");
    }

    #[test]
    fn test_wrapped_total_unsatisfiable() {
        let circuit = ScoreAboveCircuit {
            valid: Some(true),
            min_passing_percentage: Some(Fr::from(40u64)),
            total_marks: Some(-Fr::from(1u64)),
            max_marks: Some(Fr::from(100u64)),
        };
        assert!(!satisfied(circuit));
    }
}
