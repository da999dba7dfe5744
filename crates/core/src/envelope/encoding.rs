//! Decimal field elements and snarkjs-style point encoding.
//!
//! Points are written the way snarkjs does for `bn128`: projective triples
//! with `z = 1`, and the canonical identity triple for the point at
//! infinity. Decoding checks shape and canonicity only; curve and subgroup
//! membership are the verifier's job.

use std::str::FromStr;

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::PrimeField;
use num_bigint::BigUint;

use crate::error::{DocProofError, Result};

/// Canonical decimal form of a field element.
pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    let n: BigUint = value.into_bigint().into();
    n.to_string()
}

/// Parse a canonical decimal: ASCII digits only, no sign, no leading zeros,
/// strictly below the modulus.
pub fn decimal_to_field<F: PrimeField>(text: &str) -> Result<F> {
    let malformed = |why: &str| DocProofError::MalformedEnvelope(format!("{:?}: {}", text, why));

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("not a decimal integer"));
    }
    if text.len() > 1 && text.starts_with('0') {
        return Err(malformed("leading zero"));
    }

    let n = BigUint::from_str(text).map_err(|_| malformed("not a decimal integer"))?;
    let bigint = F::BigInt::try_from(n).map_err(|_| malformed("exceeds field size"))?;
    F::from_bigint(bigint).ok_or_else(|| malformed("not reduced modulo the field"))
}

pub fn encode_g1(point: &G1Affine) -> Vec<String> {
    match point.xy() {
        Some((x, y)) => vec![field_to_decimal(x), field_to_decimal(y), "1".to_string()],
        None => vec!["0".to_string(), "1".to_string(), "0".to_string()],
    }
}

pub fn encode_g2(point: &G2Affine) -> Vec<Vec<String>> {
    match point.xy() {
        Some((x, y)) => vec![
            vec![field_to_decimal(&x.c0), field_to_decimal(&x.c1)],
            vec![field_to_decimal(&y.c0), field_to_decimal(&y.c1)],
            vec!["1".to_string(), "0".to_string()],
        ],
        None => vec![
            vec!["0".to_string(), "0".to_string()],
            vec!["1".to_string(), "0".to_string()],
            vec!["0".to_string(), "0".to_string()],
        ],
    }
}

pub fn decode_g1(name: &str, coords: &[String]) -> Result<G1Affine> {
    let [x, y, z] = coords else {
        return Err(DocProofError::MalformedEnvelope(format!(
            "{} must have 3 coordinates, found {}",
            name,
            coords.len()
        )));
    };

    match z.as_str() {
        "1" => Ok(G1Affine::new_unchecked(decimal_to_field::<Fq>(x)?, decimal_to_field::<Fq>(y)?)),
        "0" if x == "0" && y == "1" => Ok(G1Affine::zero()),
        _ => Err(DocProofError::MalformedEnvelope(format!("{} is not in affine form", name))),
    }
}

pub fn decode_g2(name: &str, coords: &[Vec<String>]) -> Result<G2Affine> {
    let malformed = || DocProofError::MalformedEnvelope(format!("{} must be 3 pairs of coordinates", name));

    let [x, y, z] = coords else {
        return Err(malformed());
    };
    let pair = |c: &[String]| -> Result<Fq2> {
        match c {
            [c0, c1] => Ok(Fq2::new(decimal_to_field(c0)?, decimal_to_field(c1)?)),
            _ => Err(malformed()),
        }
    };
    let is = |c: &[String], a: &str, b: &str| c.len() == 2 && c[0] == a && c[1] == b;

    let (x, y, z) = (x.as_slice(), y.as_slice(), z.as_slice());
    if is(z, "1", "0") {
        Ok(G2Affine::new_unchecked(pair(x)?, pair(y)?))
    } else if is(z, "0", "0") && is(x, "0", "0") && is(y, "1", "0") {
        Ok(G2Affine::zero())
    } else {
        Err(DocProofError::MalformedEnvelope(format!("{} is not in affine form", name)))
    }
}
