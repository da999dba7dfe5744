//! Integration tests for docproof core library

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use docproof_core::circuit::prover::{CancelToken, ProofStage};
use docproof_core::config::ServiceConfig;
use docproof_core::extract::FallbackPolicy;
use docproof_core::keys::{write_dev_keys, DirectoryKeySource, InMemoryKeySource, KeyStore};
use docproof_core::service::ProofService;
use docproof_core::{DocProofError, PredicateFamily, ProofEnvelope, Witness};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn test_rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// One development setup per family for the whole test binary
static DEV_KEYS: Lazy<InMemoryKeySource> =
    Lazy::new(|| InMemoryKeySource::dev(&mut test_rng()).expect("development setup failed"));

fn service() -> ProofService {
    service_with(ServiceConfig {
        reference_year: Some(2024),
        ..ServiceConfig::default()
    })
}

fn service_with(config: ServiceConfig) -> ProofService {
    ProofService::new(&config, Arc::new(KeyStore::new(DEV_KEYS.clone())))
}

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn generate(
    service: &ProofService,
    family: PredicateFamily,
    raw: &HashMap<String, String>,
    threshold: Option<u64>,
) -> docproof_core::Result<ProofEnvelope> {
    service.generate_with(family, raw, threshold, &mut test_rng(), &CancelToken::new(), &mut |_| {})
}

#[test]
fn test_adult_proves_age_above_18() {
    env_logger::try_init().ok();
    let service = service();

    let envelope = generate(&service, PredicateFamily::AgeAbove, &fields(&[("dob", "1990-05-04")]), Some(18)).unwrap();
    assert_eq!(envelope.public_signals, vec!["1", "2024", "18"]);
    assert_eq!(envelope.circuit_id, "age-above-v1");

    let verdict = service.verify(&envelope, PredicateFamily::AgeAbove).unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.outcome, Some(true));

    println!("✓ Age proof generated and verified");
    println!("  Proof hash: {}", envelope.proof_hash);
}

#[test]
fn test_minor_cannot_prove_age_above_18() {
    env_logger::try_init().ok();
    let service = service();

    let err = generate(&service, PredicateFamily::AgeAbove, &fields(&[("dob", "2010-05-04")]), Some(18)).unwrap_err();
    assert!(matches!(err, DocProofError::UnsatisfiedConstraint { .. }));

    // The honest negative claim is provable and verifies as "false"
    let witness = service
        .extractor()
        .extract(PredicateFamily::AgeAbove, &fields(&[("dob", "2010-05-04")]), Some(18))
        .unwrap()
        .with_claim(false);
    let envelope = service
        .prove_witness(&witness, &mut test_rng(), &CancelToken::new(), &mut |_| {})
        .unwrap();

    let verdict = service.verify(&envelope, PredicateFamily::AgeAbove).unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.outcome, Some(false));
    println!("✓ Minor rejected; negated claim verified with outcome false");
}

#[test]
fn test_low_income_outside_range() {
    env_logger::try_init().ok();
    let service = service();
    let raw = fields(&[("grossSalary", "45000")]);

    let err = generate(&service, PredicateFamily::IncomeInRange, &raw, None).unwrap_err();
    assert!(matches!(
        err,
        DocProofError::UnsatisfiedConstraint { ref circuit, .. } if circuit == "income-in-range-v1"
    ));

    let witness = service
        .extractor()
        .extract(PredicateFamily::IncomeInRange, &raw, None)
        .unwrap()
        .with_claim(false);
    let envelope = service
        .prove_witness(&witness, &mut test_rng(), &CancelToken::new(), &mut |_| {})
        .unwrap();
    assert_eq!(envelope.public_signals, vec!["0", "500000", "10000000"]);

    let verdict = service.verify(&envelope, PredicateFamily::IncomeInRange).unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.outcome, Some(false));
}

#[test]
fn test_every_family_round_trips() {
    env_logger::try_init().ok();
    let service = service();

    let cases = [
        (PredicateFamily::AgeAbove, fields(&[("dateOfBirth", "04/05/1990")]), None),
        (PredicateFamily::IncomeInRange, fields(&[("netSalary", "₹ 12,00,000")]), Some(800_000)),
        (PredicateFamily::ScoreAbove, fields(&[("cgpa", "8.2")]), Some(60)),
        (PredicateFamily::FilingRecency, fields(&[("assessmentYear", "2023-24"), ("taxPaid", "15000")]), None),
    ];

    for (family, raw, threshold) in cases {
        let envelope = generate(&service, family, &raw, threshold).unwrap();
        let json = envelope.to_json().unwrap();
        let parsed = ProofEnvelope::from_json(&json).unwrap();

        let verdict = service.verify(&parsed, family).unwrap();
        assert!(verdict.valid, "{} failed: {:?}", family, verdict.reason);
        assert_eq!(verdict.outcome, Some(true));
        println!("✓ {} proof round-tripped through JSON ({} bytes)", family, json.len());
    }
}

#[test]
fn test_tampered_json_is_malformed() {
    env_logger::try_init().ok();
    let service = service();

    let envelope = generate(&service, PredicateFamily::AgeAbove, &fields(&[("dob", "1990-05-04")]), None).unwrap();
    let json = envelope.to_json().unwrap();

    // raise the threshold without re-sealing
    let tampered = json.replace("\"18\"", "\"21\"");
    assert_ne!(tampered, json);
    let parsed = ProofEnvelope::from_json(&tampered).unwrap();
    let err = service.verify(&parsed, PredicateFamily::AgeAbove).unwrap_err();
    assert!(matches!(err, DocProofError::MalformedEnvelope(_)));

    // drop a proof component entirely
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["proof"].as_object_mut().unwrap().remove("pi_b");
    let parsed = ProofEnvelope::from_json(&value.to_string()).unwrap();
    assert!(matches!(
        service.verify(&parsed, PredicateFamily::AgeAbove),
        Err(DocProofError::MalformedEnvelope(_))
    ));
    println!("✓ Tampered envelopes rejected before verification");
}

#[test]
fn test_resealed_forgery_fails_verification() {
    env_logger::try_init().ok();
    let service = service();

    let envelope = generate(&service, PredicateFamily::AgeAbove, &fields(&[("dob", "1990-05-04")]), None).unwrap();
    let (family, proof, mut signals) = envelope.open().unwrap();

    // a forger can recompute the digest, but not the pairing
    signals[2] = docproof_core::circuit::Fr::from(40u64);
    let forged = ProofEnvelope::seal_at(&proof, &signals, family, envelope.timestamp);

    let verdict = service.verify(&forged, PredicateFamily::AgeAbove).unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.outcome, None);
}

#[test]
fn test_strict_and_lenient_extraction() {
    env_logger::try_init().ok();

    let err = generate(&service(), PredicateFamily::AgeAbove, &HashMap::new(), None).unwrap_err();
    assert!(matches!(err, DocProofError::MissingField { .. }));

    let lenient = service_with(ServiceConfig {
        fallback: FallbackPolicy::substitute(),
        reference_year: Some(2024),
        ..ServiceConfig::default()
    });
    let first = lenient.extractor().extract(PredicateFamily::AgeAbove, &HashMap::new(), None).unwrap();
    let second = lenient.extractor().extract(PredicateFamily::AgeAbove, &HashMap::new(), None).unwrap();
    assert_eq!(first, second);

    let envelope = generate(&lenient, PredicateFamily::AgeAbove, &HashMap::new(), None).unwrap();
    assert!(lenient.verify(&envelope, PredicateFamily::AgeAbove).unwrap().valid);
}

#[test]
fn test_keys_load_once_across_threads() {
    env_logger::try_init().ok();
    let keys = Arc::new(KeyStore::new(DEV_KEYS.clone()));
    let service = ProofService::new(
        &ServiceConfig {
            reference_year: Some(2024),
            ..ServiceConfig::default()
        },
        keys.clone(),
    );

    thread::scope(|s| {
        for i in 0..4u64 {
            let service = &service;
            s.spawn(move || {
                let witness = Witness::score_above(50 + i, 100, 40);
                let envelope = service
                    .prove_witness(&witness, &mut rand::rngs::OsRng, &CancelToken::new(), &mut |_| {})
                    .unwrap();
                assert!(service.verify(&envelope, PredicateFamily::ScoreAbove).unwrap().valid);
            });
        }
    });

    // one proving key and one verification key
    assert_eq!(keys.load_count(), 2);
    println!("✓ 4 concurrent proofs shared a single key load");
}

#[test]
fn test_cancellation_leaves_no_envelope() {
    env_logger::try_init().ok();
    let service = service();
    let cancel = CancelToken::new();

    let result = service.generate_with(
        PredicateFamily::FilingRecency,
        &fields(&[("filingYear", "2023"), ("taxPaid", "100")]),
        None,
        &mut test_rng(),
        &cancel,
        &mut |stage| {
            if stage == ProofStage::Proving {
                cancel.cancel();
            }
        },
    );
    assert!(matches!(result, Err(DocProofError::Cancelled)));
}

#[test]
fn test_directory_keys_end_to_end() {
    env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    write_dev_keys(dir.path(), PredicateFamily::FilingRecency, &mut test_rng()).unwrap();

    let config = ServiceConfig {
        keys_dir: dir.path().to_path_buf(),
        reference_year: Some(2024),
        ..ServiceConfig::default()
    };
    let service = ProofService::from_config(&config);

    let envelope = generate(
        &service,
        PredicateFamily::FilingRecency,
        &fields(&[("filingYear", "2023"), ("taxPaid", "12000")]),
        None,
    )
    .unwrap();
    assert!(service.verify(&envelope, PredicateFamily::FilingRecency).unwrap().valid);

    // no keys were written for this family
    let err = generate(&service, PredicateFamily::AgeAbove, &fields(&[("dob", "1990-05-04")]), None).unwrap_err();
    assert!(matches!(err, DocProofError::MissingKeyMaterial { .. }));
    assert!(err.is_configuration_error());
}

#[test]
fn test_missing_keys_directory() {
    let keys = Arc::new(KeyStore::new(DirectoryKeySource::new("/nonexistent/docproof-keys")));
    let err = keys.verifying_key(PredicateFamily::ScoreAbove).unwrap_err();
    assert!(matches!(err, DocProofError::MissingKeyMaterial { .. }));
}
