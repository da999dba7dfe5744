//! docproof Core Library
//!
//! This library turns loosely structured fields from personal documents
//! (identity cards, salary slips, marksheets, tax records) into Groth16
//! zero-knowledge proofs of derived attributes: age above a threshold,
//! income in a range, a passing score, recent tax filing. A relying party
//! verifies the proof and learns the attribute, never the fields.

pub mod circuit;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod keys;
pub mod predicate;
pub mod service;
pub mod witness;

pub use circuit::verifier::Verdict;
pub use envelope::ProofEnvelope;
pub use error::{DocProofError, Result};
pub use predicate::PredicateFamily;
pub use witness::Witness;
