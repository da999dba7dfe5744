//! Range checks and comparisons over the BN254 scalar field.
//!
//! The field is ~2^254, so "x >= y" has no native meaning: `x - y` for
//! `x < y` silently wraps to a huge element. Every operand is therefore
//! pinned to n bits by decomposition before it is compared, and the
//! comparison itself reads a carry bit instead of trusting subtraction.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::SynthesisError;

use crate::circuit::config::MAX_COMPARISON_BITS;

/// Constrain `var` to `[0, 2^n)` and return its little-endian bits.
///
/// Allocates n boolean witnesses (each costs one `b·(1-b) = 0` constraint)
/// and one constraint tying `Σ b_i·2^i` back to `var`. A value that does not
/// fit, such as `p - 1` from a wrapped subtraction, has no satisfying
/// decomposition.
pub fn range_check<F: PrimeField>(
    var: &FpVar<F>,
    n: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    if let FpVar::Constant(c) = var {
        let bits = c.into_bigint();
        if bits.num_bits() as usize > n {
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok((0..n).map(|i| Boolean::constant(bits.get_bit(i))).collect());
    }

    let cs = var.cs();
    // Missing during key generation; the closures below only run when proving.
    let value = var.value().ok().map(|v| v.into_bigint());

    let bits = (0..n)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value
                    .as_ref()
                    .map(|v| v.get_bit(i))
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(var)?;
    Ok(bits)
}

/// `a >= b` for operands already known to lie in `[0, 2^n)`.
///
/// `a + 2^n - b` is then in `[1, 2^(n+1))` and its bit n is set exactly
/// when `a >= b`. The caller is responsible for the precondition, either by
/// range-checking the operands or because they are bounded by construction.
pub fn is_geq<F: PrimeField>(
    a: &FpVar<F>,
    b: &FpVar<F>,
    n: usize,
) -> Result<Boolean<F>, SynthesisError> {
    if n > MAX_COMPARISON_BITS {
        return Err(SynthesisError::Unsatisfiable);
    }

    let shifted = a + F::from(1u128 << n) - b;
    let bits = range_check(&shifted, n + 1)?;
    Ok(bits[n].clone())
}
