//! Error types for the docproof core library

use thiserror::Error;

/// Result type alias for docproof operations
pub type Result<T> = std::result::Result<T, DocProofError>;

/// Error types that can occur while extracting, proving or verifying.
///
/// A proof that simply does not verify is *not* an error: verification
/// returns `Ok(false)` for that case so callers can tell "the claim is false"
/// apart from "the system is misconfigured".
#[derive(Error, Debug)]
pub enum DocProofError {
    /// Requested predicate family or circuit id is not implemented
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// Strict extraction found no usable value for a required input
    #[error("Missing field for {family}: {field}")]
    MissingField { family: String, field: String },

    /// Strict extraction found a value it cannot use
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// Witness does not match the signal layout of its circuit
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    /// Witness does not satisfy the circuit; no proof was produced
    #[error("Unsatisfied constraint in {circuit}: {reason}")]
    UnsatisfiedConstraint { circuit: String, reason: String },

    /// Proving or verification key could not be loaded
    #[error("Missing key material for {circuit}: {reason}")]
    MissingKeyMaterial { circuit: String, reason: String },

    /// Envelope failed its integrity or shape checks
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Caller cancelled an in-flight proof
    #[error("Proof generation cancelled")]
    Cancelled,

    /// Constraint synthesis failed for a reason other than unsatisfiability
    #[error("Constraint synthesis failed: {0}")]
    Synthesis(String),

    /// Key or JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DocProofError {
    /// True for errors caused by the deployment rather than the request:
    /// absent keys, unreadable config, filesystem failures.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DocProofError::MissingKeyMaterial { .. }
                | DocProofError::Config(_)
                | DocProofError::IoError(_)
        )
    }
}

impl From<ark_relations::r1cs::SynthesisError> for DocProofError {
    fn from(err: ark_relations::r1cs::SynthesisError) -> Self {
        DocProofError::Synthesis(err.to_string())
    }
}

impl From<ark_serialize::SerializationError> for DocProofError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        DocProofError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DocProofError {
    fn from(err: serde_json::Error) -> Self {
        DocProofError::Serialization(err.to_string())
    }
}
