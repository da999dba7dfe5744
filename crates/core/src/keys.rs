//! Proving and verification key material.
//!
//! Keys are versioned artifacts produced outside the request path. A
//! [`KeySource`] supplies their bytes; a [`KeyStore`] decodes each key the
//! first time a family needs it and shares it from then on.
//!
//! Layout used by [`DirectoryKeySource`] and [`write_dev_keys`]:
//!
//! ```text
//! <root>/<circuit-id>/proving_key.bin
//! <root>/<circuit-id>/verification_key.bin
//! ```
//!
//! Both files hold the arkworks compressed encoding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ark_groth16::prepare_verifying_key;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use once_cell::sync::OnceCell;
use rand::{CryptoRng, RngCore};

use crate::circuit::config::{Fr, PreparedVerifyingKey, ProofSystem, ProvingKey, VerifyingKey};
use crate::circuit::PredicateCircuit;
use crate::error::{DocProofError, Result};
use crate::predicate::PredicateFamily;

pub const PROVING_KEY_FILE: &str = "proving_key.bin";
pub const VERIFICATION_KEY_FILE: &str = "verification_key.bin";

/// Supplies raw key bytes by circuit id.
pub trait KeySource: Send + Sync {
    fn proving_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>>;
    fn verification_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>>;
}

/// Keys laid out on disk, one directory per circuit id.
#[derive(Debug, Clone)]
pub struct DirectoryKeySource {
    root: PathBuf,
}

impl DirectoryKeySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, circuit_id: &str, file: &str) -> Result<Vec<u8>> {
        let path = self.root.join(circuit_id).join(file);
        log::debug!("Reading {}", path.display());
        fs::read(&path).map_err(|e| DocProofError::MissingKeyMaterial {
            circuit: circuit_id.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

impl KeySource for DirectoryKeySource {
    fn proving_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>> {
        self.read(circuit_id, PROVING_KEY_FILE)
    }

    fn verification_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>> {
        self.read(circuit_id, VERIFICATION_KEY_FILE)
    }
}

/// Embedded or pre-fetched key bytes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeySource {
    proving: HashMap<String, Vec<u8>>,
    verification: HashMap<String, Vec<u8>>,
}

impl InMemoryKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, circuit_id: &str, proving_key: Vec<u8>, verification_key: Vec<u8>) {
        self.proving.insert(circuit_id.to_string(), proving_key);
        self.verification.insert(circuit_id.to_string(), verification_key);
    }

    /// Development keys for every family. See [`generate_dev_keys`].
    pub fn dev<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut source = Self::new();
        for family in PredicateFamily::ALL {
            let (pk, vk) = generate_dev_keys(family, rng)?;
            source.insert(family.circuit_id(), encode(&pk)?, encode(&vk)?);
        }
        Ok(source)
    }

    /// Only the verification key, as a relying party would hold it.
    pub fn insert_verification_key(&mut self, circuit_id: &str, verification_key: Vec<u8>) {
        self.verification.insert(circuit_id.to_string(), verification_key);
    }

    fn get(map: &HashMap<String, Vec<u8>>, circuit_id: &str, what: &str) -> Result<Vec<u8>> {
        map.get(circuit_id)
            .cloned()
            .ok_or_else(|| DocProofError::MissingKeyMaterial {
                circuit: circuit_id.to_string(),
                reason: format!("no {} registered", what),
            })
    }
}

impl KeySource for InMemoryKeySource {
    fn proving_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>> {
        Self::get(&self.proving, circuit_id, "proving key")
    }

    fn verification_key_bytes(&self, circuit_id: &str) -> Result<Vec<u8>> {
        Self::get(&self.verification, circuit_id, "verification key")
    }
}

/// Decoded keys, loaded at most once per family for the life of the store.
///
/// Concurrent first users of a family block on the same load. A failed load
/// is not cached, so fixing the key directory and retrying works.
pub struct KeyStore {
    source: Box<dyn KeySource>,
    proving: [OnceCell<Arc<ProvingKey>>; 4],
    verifying: [OnceCell<Arc<PreparedVerifyingKey>>; 4],
    loads: AtomicUsize,
}

impl KeyStore {
    pub fn new(source: impl KeySource + 'static) -> Self {
        Self {
            source: Box::new(source),
            proving: Default::default(),
            verifying: Default::default(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn proving_key(&self, family: PredicateFamily) -> Result<Arc<ProvingKey>> {
        self.proving[family.index()]
            .get_or_try_init(|| {
                let start = std::time::Instant::now();
                let bytes = self.source.proving_key_bytes(family.circuit_id())?;
                let pk: ProvingKey = decode(family, &bytes)?;
                check_shape(family, &pk.vk)?;
                self.loads.fetch_add(1, Ordering::SeqCst);
                log::info!(
                    "✓ Loaded {} proving key ({:.2} KB) in {:.2?}",
                    family.circuit_id(),
                    bytes.len() as f64 / 1024.0,
                    start.elapsed()
                );
                Ok(Arc::new(pk))
            })
            .cloned()
    }

    pub fn verifying_key(&self, family: PredicateFamily) -> Result<Arc<PreparedVerifyingKey>> {
        self.verifying[family.index()]
            .get_or_try_init(|| {
                let bytes = self.source.verification_key_bytes(family.circuit_id())?;
                let vk: VerifyingKey = decode(family, &bytes)?;
                check_shape(family, &vk)?;
                self.loads.fetch_add(1, Ordering::SeqCst);
                log::info!("✓ Loaded {} verification key", family.circuit_id());
                Ok(Arc::new(prepare_verifying_key(&vk)))
            })
            .cloned()
    }

    /// Number of keys decoded so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

fn decode<T: CanonicalDeserialize>(family: PredicateFamily, bytes: &[u8]) -> Result<T> {
    T::deserialize_compressed(bytes).map_err(|e| DocProofError::MissingKeyMaterial {
        circuit: family.circuit_id().to_string(),
        reason: format!("undecodable key: {}", e),
    })
}

fn check_shape(family: PredicateFamily, vk: &VerifyingKey) -> Result<()> {
    // gamma_abc has one entry per public input plus the constant
    if vk.gamma_abc_g1.len() != family.public_arity() + 1 {
        return Err(DocProofError::MissingKeyMaterial {
            circuit: family.circuit_id().to_string(),
            reason: format!(
                "key expects {} public signals, circuit has {}",
                vk.gamma_abc_g1.len().saturating_sub(1),
                family.public_arity()
            ),
        });
    }
    Ok(())
}

/// Compressed arkworks encoding of a key.
pub fn encode<T: CanonicalSerialize>(key: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(key.compressed_size());
    key.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

/// Single-party circuit-specific setup.
///
/// Whoever ran this knows the toxic waste and can forge proofs, so these
/// keys are for development and tests only. Production keys come from a
/// ceremony and are loaded through a [`KeySource`].
pub fn generate_dev_keys<R: RngCore + CryptoRng>(
    family: PredicateFamily,
    rng: &mut R,
) -> Result<(ProvingKey, VerifyingKey)> {
    log::info!("Running development setup for {}", family.circuit_id());
    let start = std::time::Instant::now();

    let pk = ProofSystem::generate_random_parameters_with_reduction(
        PredicateCircuit::<Fr>::blank(family),
        rng,
    )?;
    let vk = pk.vk.clone();

    log::info!("✓ Setup for {} done in {:.2?}", family.circuit_id(), start.elapsed());
    Ok((pk, vk))
}

/// Generate development keys for `family` and write them under `dir`.
///
/// # Returns
/// The directory the two key files were written to.
pub fn write_dev_keys<R: RngCore + CryptoRng>(
    dir: &Path,
    family: PredicateFamily,
    rng: &mut R,
) -> Result<PathBuf> {
    let (pk, vk) = generate_dev_keys(family, rng)?;
    let target = dir.join(family.circuit_id());
    fs::create_dir_all(&target)?;

    let pk_bytes = encode(&pk)?;
    let vk_bytes = encode(&vk)?;
    fs::write(target.join(PROVING_KEY_FILE), &pk_bytes)?;
    fs::write(target.join(VERIFICATION_KEY_FILE), &vk_bytes)?;

    log::info!(
        "✓ Wrote {} keys to {} (pk {:.2} KB, vk {} bytes)",
        family.circuit_id(),
        target.display(),
        pk_bytes.len() as f64 / 1024.0,
        vk_bytes.len()
    );
    Ok(target)
}
