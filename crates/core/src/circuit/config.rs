//! Proof system configuration for docproof circuits
//!
//! This module pins the cryptographic choices every circuit shares:
//! - Curve: BN254 (called `bn128` on the wire, as snarkjs does)
//! - Proof system: Groth16 with a circuit-specific setup
//! - Operand widths for the bit-decomposition comparisons

use ark_bn254::Bn254;
use ark_groth16::Groth16;

/// Pairing engine
pub type Curve = Bn254;

/// Scalar field of BN254; every circuit value lives here
pub type Fr = ark_bn254::Fr;

/// Groth16 over BN254
pub type ProofSystem = Groth16<Curve>;

pub type ProvingKey = ark_groth16::ProvingKey<Curve>;
pub type VerifyingKey = ark_groth16::VerifyingKey<Curve>;
pub type PreparedVerifyingKey = ark_groth16::PreparedVerifyingKey<Curve>;
pub type Groth16Proof = ark_groth16::Proof<Curve>;

/// Protocol tag carried in every envelope
pub const PROTOCOL: &str = "groth16";

/// Curve tag carried in every envelope
pub const CURVE: &str = "bn128";

/// Width of years, ages, year gaps and percentages.
/// Generous for the values involved, small enough to keep circuits cheap.
pub const YEAR_BITS: usize = 32;

/// Width of scores and mark totals
pub const SCORE_BITS: usize = 32;

/// Width of monetary amounts (income, tax paid)
pub const AMOUNT_BITS: usize = 64;

/// Comparison operands must stay well below the field modulus (~2^254),
/// otherwise `x + 2^n - y` could itself wrap.
pub const MAX_COMPARISON_BITS: usize = 64;
