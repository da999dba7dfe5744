//! Example: Prove "age above threshold" from a date of birth
//!
//! Usage:
//!   cargo run --example prove_age -- <date_of_birth> [threshold]
//!
//! Keys are generated in memory, so the proof only verifies inside this run.

use std::collections::HashMap;
use std::sync::Arc;

use docproof_core::config::ServiceConfig;
use docproof_core::keys::{InMemoryKeySource, KeyStore};
use docproof_core::service::ProofService;
use docproof_core::{DocProofError, PredicateFamily};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <date_of_birth> [threshold]", args[0]);
        eprintln!("Example: {} 1990-05-04 21", args[0]);
        std::process::exit(1);
    }

    let dob = &args[1];
    let threshold = match args.get(2).map(|t| t.parse::<u64>()) {
        Some(Ok(t)) => Some(t),
        Some(Err(e)) => {
            eprintln!("❌ Invalid threshold: {}", e);
            std::process::exit(1);
        }
        None => None,
    };

    println!("🔑 Running development setup...");
    let source = match InMemoryKeySource::dev(&mut rand::rngs::OsRng) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ Setup failed: {}", e);
            std::process::exit(1);
        }
    };
    let service = ProofService::new(&ServiceConfig::default(), Arc::new(KeyStore::new(source)));

    let mut fields = HashMap::new();
    fields.insert("dob".to_string(), dob.clone());

    println!("🔍 Proving age from date of birth: {}", dob);
    println!();

    match service.generate(PredicateFamily::AgeAbove, &fields, threshold) {
        Ok(envelope) => {
            println!("✅ Proof generated!");
            println!("  Circuit: {}", envelope.circuit_id);
            println!("  Public signals: {:?}", envelope.public_signals);
            println!("  Proof hash: {}", envelope.proof_hash);

            match service.verify(&envelope, PredicateFamily::AgeAbove) {
                Ok(verdict) if verdict.valid => println!("  ✓ Verified, outcome: {:?}", verdict.outcome),
                Ok(verdict) => println!("  ✗ Rejected: {:?}", verdict.reason),
                Err(e) => println!("  ✗ Verification error: {}", e),
            }
        }
        Err(DocProofError::UnsatisfiedConstraint { .. }) => {
            println!("❌ The document does not satisfy the age requirement");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
