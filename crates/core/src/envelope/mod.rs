//! Proof envelope: the wire format a proof travels and is stored in.
//!
//! An envelope carries the proof points, the public signals, the circuit
//! id, a timestamp and `proofHash`, a SHA-256 digest over the circuit id,
//! proof and signals. Sealing computes the digest; opening recomputes it and refuses
//! anything that does not match or does not have the expected shape.
//!
//! ```json
//! {
//!   "proof": {
//!     "pi_a": ["x", "y", "1"],
//!     "pi_b": [["x.c0", "x.c1"], ["y.c0", "y.c1"], ["1", "0"]],
//!     "pi_c": ["x", "y", "1"],
//!     "protocol": "groth16",
//!     "curve": "bn128"
//!   },
//!   "publicSignals": ["1", "2024", "18"],
//!   "proofHash": "0x…",
//!   "timestamp": 1718000000000,
//!   "circuitId": "age-above-v1"
//! }
//! ```

pub mod encoding;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::circuit::config::{Fr, Groth16Proof, CURVE, PROTOCOL};
use crate::error::{DocProofError, Result};
use crate::predicate::PredicateFamily;
use encoding::{decimal_to_field, decode_g1, decode_g2, encode_g1, encode_g2, field_to_decimal};

/// Domain tag mixed into every digest
const DIGEST_DOMAIN: &[u8] = b"docproof/envelope/v1";

/// Proof points in snarkjs layout.
///
/// Missing components deserialize as empty and are rejected by
/// [`ProofEnvelope::open`], never silently accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireProof {
    #[serde(default)]
    pub pi_a: Vec<String>,
    #[serde(default)]
    pub pi_b: Vec<Vec<String>>,
    #[serde(default)]
    pub pi_c: Vec<String>,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub curve: String,
}

impl WireProof {
    pub fn from_proof(proof: &Groth16Proof) -> Self {
        Self {
            pi_a: encode_g1(&proof.a),
            pi_b: encode_g2(&proof.b),
            pi_c: encode_g1(&proof.c),
            protocol: PROTOCOL.to_string(),
            curve: CURVE.to_string(),
        }
    }

    /// Decode the points. Curve membership is not checked here.
    pub fn to_proof(&self) -> Result<Groth16Proof> {
        if self.protocol != PROTOCOL {
            return Err(DocProofError::MalformedEnvelope(format!(
                "unsupported protocol {:?}",
                self.protocol
            )));
        }
        if self.curve != CURVE {
            return Err(DocProofError::MalformedEnvelope(format!("unsupported curve {:?}", self.curve)));
        }

        Ok(Groth16Proof {
            a: decode_g1("pi_a", &self.pi_a)?,
            b: decode_g2("pi_b", &self.pi_b)?,
            c: decode_g1("pi_c", &self.pi_c)?,
        })
    }
}

/// Sealed proof, ready for storage or transport. Immutable once sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEnvelope {
    #[serde(default)]
    pub proof: WireProof,
    #[serde(default)]
    pub public_signals: Vec<String>,
    #[serde(default)]
    pub proof_hash: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub circuit_id: String,
}

impl ProofEnvelope {
    /// Seal a proof with the current time.
    pub fn seal(proof: &Groth16Proof, public_signals: &[Fr], family: PredicateFamily) -> Self {
        Self::seal_at(proof, public_signals, family, chrono::Utc::now().timestamp_millis())
    }

    pub fn seal_at(
        proof: &Groth16Proof,
        public_signals: &[Fr],
        family: PredicateFamily,
        timestamp_ms: i64,
    ) -> Self {
        let proof = WireProof::from_proof(proof);
        let public_signals: Vec<String> = public_signals.iter().map(field_to_decimal).collect();
        let proof_hash = proof_hash(family.circuit_id(), &proof, &public_signals);

        log::debug!("Sealed {} envelope {}", family.circuit_id(), proof_hash);

        Self {
            proof,
            public_signals,
            proof_hash,
            timestamp: timestamp_ms,
            circuit_id: family.circuit_id().to_string(),
        }
    }

    /// Check shape and integrity, then decode.
    ///
    /// # Returns
    /// The family named by the envelope, the proof, and the public signals.
    /// Any shape, canonicity, arity or digest failure is `MalformedEnvelope`.
    pub fn open(&self) -> Result<(PredicateFamily, Groth16Proof, Vec<Fr>)> {
        let family = PredicateFamily::from_circuit_id(&self.circuit_id).map_err(|_| {
            DocProofError::MalformedEnvelope(format!("unknown circuit id {:?}", self.circuit_id))
        })?;

        if self.public_signals.len() != family.public_arity() {
            return Err(DocProofError::MalformedEnvelope(format!(
                "{} expects {} public signals, envelope has {}",
                family.circuit_id(),
                family.public_arity(),
                self.public_signals.len()
            )));
        }

        let proof = self.proof.to_proof()?;
        let signals = self
            .public_signals
            .iter()
            .map(|s| decimal_to_field::<Fr>(s))
            .collect::<Result<Vec<_>>>()?;

        let expected = proof_hash(&self.circuit_id, &self.proof, &self.public_signals);
        if expected != self.proof_hash {
            log::warn!("✗ Envelope digest mismatch for {}", family.circuit_id());
            return Err(DocProofError::MalformedEnvelope("proofHash does not match contents".to_string()));
        }

        Ok((family, proof, signals))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an envelope. Text that is not an envelope at all is malformed.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DocProofError::MalformedEnvelope(e.to_string()))
    }
}

/// `"0x" + hex(SHA-256(canonical(circuitId) || canonical(proof) || canonical(signals)))`.
pub fn proof_hash(circuit_id: &str, proof: &WireProof, public_signals: &[String]) -> String {
    let mut hasher = Sha256::new();
    write_str(&mut hasher, DIGEST_DOMAIN);
    write_str(&mut hasher, circuit_id.as_bytes());

    write_str(&mut hasher, proof.protocol.as_bytes());
    write_str(&mut hasher, proof.curve.as_bytes());
    write_strings(&mut hasher, &proof.pi_a);
    write_count(&mut hasher, proof.pi_b.len());
    for row in &proof.pi_b {
        write_strings(&mut hasher, row);
    }
    write_strings(&mut hasher, &proof.pi_c);

    write_strings(&mut hasher, public_signals);

    format!("0x{}", hex::encode(hasher.finalize()))
}

fn write_count(hasher: &mut Sha256, n: usize) {
    hasher.update((n as u32).to_be_bytes());
}

fn write_str(hasher: &mut Sha256, bytes: &[u8]) {
    write_count(hasher, bytes.len());
    hasher.update(bytes);
}

fn write_strings(hasher: &mut Sha256, items: &[String]) {
    write_count(hasher, items.len());
    for item in items {
        write_str(hasher, item.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::UniformRand;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn sample() -> (Groth16Proof, Vec<Fr>) {
        let mut rng = test_rng();
        let proof = Groth16Proof {
            a: ark_bn254::G1Projective::rand(&mut rng).into_affine(),
            b: ark_bn254::G2Projective::rand(&mut rng).into_affine(),
            c: ark_bn254::G1Projective::rand(&mut rng).into_affine(),
        };
        let signals = vec![Fr::from(1u64), Fr::from(2024u64), Fr::from(18u64)];
        (proof, signals)
    }

    #[test]
    fn test_seal_then_open() {
        env_logger::try_init().ok();
        let (proof, signals) = sample();

        let envelope = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 1_718_000_000_000);
        assert_eq!(envelope.circuit_id, "age-above-v1");
        assert_eq!(envelope.public_signals, vec!["1", "2024", "18"]);
        assert!(envelope.proof_hash.starts_with("0x"));
        assert_eq!(envelope.proof_hash.len(), 66);

        let (family, opened_proof, opened_signals) = envelope.open().unwrap();
        assert_eq!(family, PredicateFamily::AgeAbove);
        assert_eq!(opened_proof, proof);
        assert_eq!(opened_signals, signals);
        println!("✓ Envelope sealed and opened: {}", envelope.proof_hash);
    }

    #[test]
    fn test_hash_is_deterministic_and_ignores_metadata() {
        let (proof, signals) = sample();
        let a = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 1);
        let b = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 2);
        assert_eq!(a.proof_hash, b.proof_hash);
    }

    #[test]
    fn test_json_wire_format() {
        let (proof, signals) = sample();
        let envelope = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 42);

        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value["proof"]["protocol"], "groth16");
        assert_eq!(value["proof"]["curve"], "bn128");
        assert_eq!(value["proof"]["pi_a"][2], "1");
        assert_eq!(value["proof"]["pi_b"][2][0], "1");
        assert_eq!(value["circuitId"], "age-above-v1");
        assert_eq!(value["timestamp"], 42);
        assert!(value["proofHash"].is_string());
        assert_eq!(value["publicSignals"][1], "2024");

        let parsed = ProofEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_any_digit_change_is_detected() {
        let (proof, signals) = sample();
        let envelope = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 0);

        let mut tampered = envelope.clone();
        tampered.public_signals[2] = "21".to_string();
        assert!(matches!(tampered.open(), Err(DocProofError::MalformedEnvelope(_))));

        let mut tampered = envelope.clone();
        let last = tampered.proof.pi_c[0].pop().unwrap();
        let flipped = if last == '1' { '2' } else { '1' };
        tampered.proof.pi_c[0].push(flipped);
        assert!(matches!(tampered.open(), Err(DocProofError::MalformedEnvelope(_))));

        let mut tampered = envelope.clone();
        tampered.proof_hash.replace_range(2..3, if envelope.proof_hash[2..3] == *"a" { "b" } else { "a" });
        assert!(matches!(tampered.open(), Err(DocProofError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_relabelled_circuit_id_breaks_digest() {
        let (proof, signals) = sample();
        let envelope = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 0);

        // same arity as AgeAbove, so only the digest can catch these
        for other in ["income-in-range-v1", "filing-recency-v1"] {
            let mut relabelled = envelope.clone();
            relabelled.circuit_id = other.to_string();
            let err = relabelled.open().unwrap_err();
            assert!(matches!(err, DocProofError::MalformedEnvelope(ref m) if m.contains("proofHash")), "{}", other);
        }

        let resealed = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::IncomeInRange, 0);
        assert_ne!(resealed.proof_hash, envelope.proof_hash);
    }

    #[test]
    fn test_structural_rejections() {
        let (proof, signals) = sample();
        let envelope = ProofEnvelope::seal_at(&proof, &signals, PredicateFamily::AgeAbove, 0);

        let mut unknown = envelope.clone();
        unknown.circuit_id = "passport-v1".to_string();
        assert!(matches!(unknown.open(), Err(DocProofError::MalformedEnvelope(_))));

        // wrong arity for the claimed circuit
        let mut relabelled = envelope.clone();
        relabelled.circuit_id = "score-above-v1".to_string();
        assert!(matches!(relabelled.open(), Err(DocProofError::MalformedEnvelope(_))));

        let mut wrong_protocol = envelope.clone();
        wrong_protocol.proof.protocol = "plonk".to_string();
        wrong_protocol.proof_hash = proof_hash(&wrong_protocol.circuit_id, &wrong_protocol.proof, &wrong_protocol.public_signals);
        assert!(matches!(wrong_protocol.open(), Err(DocProofError::MalformedEnvelope(_))));

        let mut non_canonical = envelope.clone();
        non_canonical.public_signals[1] = "02024".to_string();
        non_canonical.proof_hash = proof_hash(&non_canonical.circuit_id, &non_canonical.proof, &non_canonical.public_signals);
        assert!(matches!(non_canonical.open(), Err(DocProofError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_missing_components_are_malformed() {
        let json = r#"{"publicSignals": ["1", "2024", "18"], "proofHash": "0x00", "timestamp": 0, "circuitId": "age-above-v1"}"#;
        let envelope = ProofEnvelope::from_json(json).unwrap();
        assert!(matches!(envelope.open(), Err(DocProofError::MalformedEnvelope(_))));

        assert!(matches!(ProofEnvelope::from_json("[1, 2, 3]"), Err(DocProofError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_identity_points_survive_the_wire() {
        let proof = Groth16Proof {
            a: ark_bn254::G1Affine::zero(),
            b: ark_bn254::G2Affine::zero(),
            c: ark_bn254::G1Affine::zero(),
        };
        let envelope = ProofEnvelope::seal_at(&proof, &[Fr::from(1u64), Fr::from(40u64)], PredicateFamily::ScoreAbove, 0);
        let (_, opened, _) = envelope.open().unwrap();
        assert_eq!(opened, proof);
    }
}
