//! CLI tool for docproof
//!
//! Development key setup, witness extraction, proof generation and
//! verification for zero-knowledge attribute proofs over document fields.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docproof_core::circuit::prover::{CancelToken, ProofStage};
use docproof_core::config::ServiceConfig;
use docproof_core::envelope::proof_hash;
use docproof_core::extract::FallbackMode;
use docproof_core::keys::write_dev_keys;
use docproof_core::predicate::OUTPUT_SIGNAL;
use docproof_core::service::ProofService;
use docproof_core::{DocProofError, PredicateFamily, ProofEnvelope};

/// Exit code for an envelope that parsed but did not verify
const EXIT_INVALID: i32 = 2;

#[derive(Parser)]
#[command(name = "docproof")]
#[command(about = "Zero-Knowledge attribute proofs over personal documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON service configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key directory (overrides the config file)
    #[arg(long, global = true)]
    keys_dir: Option<PathBuf>,

    /// Substitute defaults for missing or unusable fields instead of failing
    #[arg(long, global = true)]
    lenient: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate development keys (NOT for production use)
    Setup {
        /// Only this family (default: all)
        #[arg(short, long)]
        family: Option<PredicateFamily>,
    },

    /// List supported circuits
    Circuits,

    /// Extract and print the witness for a document
    Extract {
        /// Predicate family or circuit id (age, income, score, filing)
        #[arg(short, long)]
        family: PredicateFamily,

        /// Document fields as a flat JSON object
        #[arg(long)]
        fields: PathBuf,

        /// Override the family's main public parameter
        #[arg(short, long)]
        threshold: Option<u64>,
    },

    /// Generate a proof envelope
    Prove {
        /// Predicate family or circuit id (age, income, score, filing)
        #[arg(short, long)]
        family: PredicateFamily,

        /// Document fields as a flat JSON object
        #[arg(long)]
        fields: PathBuf,

        /// Override the family's main public parameter
        #[arg(short, long)]
        threshold: Option<u64>,

        /// Output file for the envelope
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Verify a proof envelope
    Verify {
        /// Path to envelope JSON
        #[arg(short, long)]
        envelope: PathBuf,

        /// Family the envelope must be for
        #[arg(short, long)]
        family: PredicateFamily,
    },

    /// Show envelope metadata without running the pairing check
    Inspect {
        /// Path to envelope JSON
        #[arg(short, long)]
        envelope: PathBuf,
    },

    /// Show example usage
    Examples,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Setup { family } => cmd_setup(&config, family),
        Commands::Circuits => cmd_circuits(),
        Commands::Extract { family, fields, threshold } => cmd_extract(&config, family, &fields, threshold),
        Commands::Prove { family, fields, threshold, output } => {
            cmd_prove(&config, family, &fields, threshold, &output)
        }
        Commands::Verify { envelope, family } => cmd_verify(&config, &envelope, family),
        Commands::Inspect { envelope } => cmd_inspect(&envelope),
        Commands::Examples => cmd_examples(),
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &cli.keys_dir {
        config.keys_dir = dir.clone();
    }
    if cli.lenient {
        config.fallback.mode = FallbackMode::Substitute;
    }
    Ok(config)
}

/// Read a flat JSON object; numbers and booleans are kept as their text.
fn read_fields(path: &Path) -> Result<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("{} must contain a JSON object", path.display()))?;

    let mut fields = HashMap::new();
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => continue,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                anyhow::bail!("field '{}' must be a string or number", key)
            }
            other => other.to_string(),
        };
        fields.insert(key.clone(), text);
    }
    Ok(fields)
}

fn read_envelope(path: &Path) -> Result<ProofEnvelope> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(ProofEnvelope::from_json(&text)?)
}

fn cmd_setup(config: &ServiceConfig, family: Option<PredicateFamily>) -> Result<()> {
    println!("🔑 Generating development keys in {}", config.keys_dir.display());
    println!("⚠️  Development setup only: whoever ran it can forge proofs");
    println!();

    let families = match family {
        Some(f) => vec![f],
        None => PredicateFamily::ALL.to_vec(),
    };

    let mut rng = rand::rngs::OsRng;
    for family in families {
        let dir = write_dev_keys(&config.keys_dir, family, &mut rng)?;
        println!("✅ {} -> {}", family.circuit_id(), dir.display());
    }

    Ok(())
}

fn cmd_circuits() -> Result<()> {
    println!("📚 Supported circuits");
    println!();

    for family in PredicateFamily::ALL {
        let d = family.descriptor();
        println!("{} ({})", d.circuit_id, d.title);
        println!("  {}", d.description);
        println!("  Public signals:  {}", family.public_signal_names().join(", "));
        println!("  Private inputs:  {}", d.private_inputs.join(", "));
        println!();
    }

    Ok(())
}

fn cmd_extract(
    config: &ServiceConfig,
    family: PredicateFamily,
    fields: &Path,
    threshold: Option<u64>,
) -> Result<()> {
    let raw = read_fields(fields)?;
    let service = ProofService::from_config(config);

    let witness = service.extractor().extract(family, &raw, threshold)?;
    println!("{}", serde_json::to_string_pretty(&witness)?);

    match witness.evaluate()? {
        Some(outcome) => eprintln!("Predicate outcome: {}", outcome),
        None => eprintln!("⚠️  Witness violates a hard constraint of {}", family.circuit_id()),
    }

    Ok(())
}

fn cmd_prove(
    config: &ServiceConfig,
    family: PredicateFamily,
    fields: &Path,
    threshold: Option<u64>,
    output: &Path,
) -> Result<()> {
    println!("🔐 Generating {} proof...", family.circuit_id());
    println!();

    let raw = read_fields(fields)?;
    let service = ProofService::from_config(config);

    let mut on_stage = |stage: ProofStage| log::debug!("[{:>3}%] {:?}", stage.percent(), stage);
    let envelope = match service.generate_with(
        family,
        &raw,
        threshold,
        &mut rand::rngs::OsRng,
        &CancelToken::new(),
        &mut on_stage,
    ) {
        Ok(envelope) => envelope,
        Err(DocProofError::UnsatisfiedConstraint { circuit, reason }) => {
            anyhow::bail!("document does not satisfy {}: {}", circuit, reason)
        }
        Err(e) if e.is_configuration_error() => {
            return Err(anyhow::Error::new(e).context("run `docproof setup` to create development keys"))
        }
        Err(e) => return Err(e.into()),
    };

    let json = envelope.to_json()?;
    std::fs::write(output, &json)?;

    println!("✅ Proof generated successfully!");
    println!("   Public signals: {:?}", envelope.public_signals);
    println!("   Proof hash: {}", envelope.proof_hash);
    println!("   Size: {} bytes ({:.2} KB)", json.len(), json.len() as f64 / 1024.0);
    println!("   Saved to: {}", output.display());
    println!();
    println!("To verify this proof, use:");
    println!("  docproof verify --envelope {} --family {}", output.display(), family.circuit_id());

    Ok(())
}

fn cmd_verify(config: &ServiceConfig, envelope: &Path, family: PredicateFamily) -> Result<()> {
    println!("🔍 Verifying {} proof...", family.circuit_id());
    println!();

    let parsed = read_envelope(envelope)?;
    let service = ProofService::from_config(config);

    let verdict = match service.verify(&parsed, family) {
        Ok(verdict) => verdict,
        Err(DocProofError::MalformedEnvelope(reason)) => {
            println!("❌ Envelope is MALFORMED: {}", reason);
            std::process::exit(EXIT_INVALID);
        }
        Err(e) => return Err(e.into()),
    };

    for (name, value) in &verdict.public_signals {
        println!("  {:<22} {}", name, value);
    }
    println!();

    if verdict.valid {
        println!("✅ Proof is VALID!");
        match verdict.outcome {
            Some(true) => println!("   The document satisfies {}", family.descriptor().title),
            _ => println!("   The document does NOT satisfy {}", family.descriptor().title),
        }
        println!("   (private inputs are hidden)");
        Ok(())
    } else {
        println!("❌ Proof is INVALID!");
        if let Some(reason) = &verdict.reason {
            println!("   {}", reason);
        }
        std::process::exit(EXIT_INVALID);
    }
}

fn cmd_inspect(envelope: &Path) -> Result<()> {
    let parsed = read_envelope(envelope)?;

    println!("📄 Envelope: {}", envelope.display());
    println!();
    println!("  Circuit:    {}", parsed.circuit_id);
    println!("  Protocol:   {} / {}", parsed.proof.protocol, parsed.proof.curve);
    println!("  Timestamp:  {}", parsed.timestamp);
    println!("  Proof hash: {}", parsed.proof_hash);

    match PredicateFamily::from_circuit_id(&parsed.circuit_id) {
        Ok(family) => {
            for (name, value) in family.public_signal_names().iter().zip(&parsed.public_signals) {
                println!("  {:<22} {}", name, value);
            }
        }
        Err(_) => println!("  ⚠️  Unknown circuit id"),
    }
    println!();

    let recomputed = proof_hash(&parsed.circuit_id, &parsed.proof, &parsed.public_signals);
    if recomputed == parsed.proof_hash {
        println!("✓ Digest matches");
    } else {
        println!("✗ Digest mismatch (recomputed {})", recomputed);
    }

    match parsed.open() {
        Ok(_) => println!("✓ Structure is well-formed"),
        Err(e) => println!("✗ {}", e),
    }

    if parsed.public_signals.first().map(String::as_str) == Some("1") {
        println!("  Claimed {}: true", OUTPUT_SIGNAL);
    } else {
        println!("  Claimed {}: false", OUTPUT_SIGNAL);
    }

    Ok(())
}

fn cmd_examples() -> Result<()> {
    println!("📚 Example Usage");
    println!();
    println!("1. Generate development keys for every circuit:");
    println!("   docproof setup --keys-dir keys");
    println!();
    println!("2. Write the document fields:");
    println!("   echo '{{\"dob\": \"1990-05-04\"}}' > aadhaar.json");
    println!();
    println!("3. Inspect the witness (stays local):");
    println!("   docproof extract -f age --fields aadhaar.json");
    println!();
    println!("4. Prove age >= 21:");
    println!("   docproof prove -f age --fields aadhaar.json -t 21 -o age_proof.json");
    println!();
    println!("5. Verify it:");
    println!("   docproof verify -e age_proof.json -f age-above-v1");
    println!();
    println!("6. Prove income within the default range from a salary slip:");
    println!("   echo '{{\"grossSalary\": \"12,00,000\"}}' > salary.json");
    println!("   docproof prove -f income --fields salary.json -o income_proof.json");
    println!();
    println!("💡 Tips:");
    println!("   - Use --verbose or -v for detailed logging");
    println!("   - Use --lenient to substitute defaults for missing fields");
    println!("   - Families: age, income, score, filing (or their circuit ids)");
    println!("   - Verification exits with code {} when a proof is invalid", EXIT_INVALID);
    println!();

    Ok(())
}
