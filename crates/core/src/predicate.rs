//! The four predicate families and their signal layouts.
//!
//! A family fixes everything about a proof except the values: which signals
//! are public, which stay with the prover, the order public signals appear
//! in, and the circuit id its keys are stored under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocProofError, Result};

/// Name of the circuit output signal, always the first public signal.
pub const OUTPUT_SIGNAL: &str = "valid";

/// Attribute-proof template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PredicateFamily {
    /// Age derived from date of birth is at least a threshold
    AgeAbove,
    /// Income lies within `[minIncome, maxIncome]`
    IncomeInRange,
    /// Score percentage is at least a passing mark
    ScoreAbove,
    /// Taxes were filed recently and something was paid
    FilingRecency,
}

/// Static description of a family, mirrored by `docproof circuits`.
#[derive(Debug, Clone, Copy)]
pub struct CircuitDescriptor {
    pub family: PredicateFamily,
    pub circuit_id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Public inputs in signal order (the output signal precedes them).
    pub public_inputs: &'static [&'static str],
    pub private_inputs: &'static [&'static str],
}

const DESCRIPTORS: [CircuitDescriptor; 4] = [
    CircuitDescriptor {
        family: PredicateFamily::AgeAbove,
        circuit_id: "age-above-v1",
        title: "AgeVerification",
        description: "Proves age is above threshold without revealing DOB",
        public_inputs: &["currentYear", "ageThreshold"],
        private_inputs: &["birthYear"],
    },
    CircuitDescriptor {
        family: PredicateFamily::IncomeInRange,
        circuit_id: "income-in-range-v1",
        title: "IncomeRange",
        description: "Proves income is within a range without revealing exact amount",
        public_inputs: &["minIncome", "maxIncome"],
        private_inputs: &["actualIncome"],
    },
    CircuitDescriptor {
        family: PredicateFamily::ScoreAbove,
        circuit_id: "score-above-v1",
        title: "DegreeVerification",
        description: "Proves a passing score without revealing grades",
        public_inputs: &["minPassingPercentage"],
        private_inputs: &["totalMarks", "maxMarks"],
    },
    CircuitDescriptor {
        family: PredicateFamily::FilingRecency,
        circuit_id: "filing-recency-v1",
        title: "TaxFilingVerification",
        description: "Proves recent tax compliance without revealing income details",
        public_inputs: &["currentYear", "maxYearGap"],
        private_inputs: &["filingYear", "amountPaid"],
    },
];

impl PredicateFamily {
    /// All families, in catalogue order.
    pub const ALL: [PredicateFamily; 4] = [
        PredicateFamily::AgeAbove,
        PredicateFamily::IncomeInRange,
        PredicateFamily::ScoreAbove,
        PredicateFamily::FilingRecency,
    ];

    pub fn descriptor(&self) -> &'static CircuitDescriptor {
        &DESCRIPTORS[self.index()]
    }

    /// Versioned identifier that keys and envelopes are addressed by.
    pub fn circuit_id(&self) -> &'static str {
        self.descriptor().circuit_id
    }

    pub fn public_inputs(&self) -> &'static [&'static str] {
        self.descriptor().public_inputs
    }

    pub fn private_inputs(&self) -> &'static [&'static str] {
        self.descriptor().private_inputs
    }

    /// Number of public signals a proof carries: the output plus the public inputs.
    pub fn public_arity(&self) -> usize {
        1 + self.public_inputs().len()
    }

    /// Names of all public signals in wire order.
    pub fn public_signal_names(&self) -> Vec<&'static str> {
        std::iter::once(OUTPUT_SIGNAL)
            .chain(self.public_inputs().iter().copied())
            .collect()
    }

    /// Stable slot used by per-family tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            PredicateFamily::AgeAbove => 0,
            PredicateFamily::IncomeInRange => 1,
            PredicateFamily::ScoreAbove => 2,
            PredicateFamily::FilingRecency => 3,
        }
    }

    /// Resolve a circuit id exactly as written in an envelope.
    pub fn from_circuit_id(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.circuit_id() == id)
            .ok_or_else(|| DocProofError::UnsupportedPredicate(id.to_string()))
    }
}

impl fmt::Display for PredicateFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PredicateFamily::AgeAbove => "AgeAbove",
            PredicateFamily::IncomeInRange => "IncomeInRange",
            PredicateFamily::ScoreAbove => "ScoreAbove",
            PredicateFamily::FilingRecency => "FilingRecency",
        };
        f.write_str(name)
    }
}

impl FromStr for PredicateFamily {
    type Err = DocProofError;

    /// Accepts circuit ids, family names, document types (`aadhaar`,
    /// `salary`, `marksheet`, `pan`) and the legacy circuit names.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        let family = match key.as_str() {
            "ageabovev1" | "ageabove" | "age" | "aadhaar" | "aadhar" | "ageverification" => {
                PredicateFamily::AgeAbove
            }
            "incomeinrangev1" | "incomeinrange" | "income" | "salary" | "salaryslip"
            | "incomerange" => PredicateFamily::IncomeInRange,
            "scoreabovev1" | "scoreabove" | "score" | "marksheet" | "degreeverification" => {
                PredicateFamily::ScoreAbove
            }
            "filingrecencyv1" | "filingrecency" | "filing" | "pan" | "panverification" => {
                PredicateFamily::FilingRecency
            }
            _ => return Err(DocProofError::UnsupportedPredicate(s.to_string())),
        };

        Ok(family)
    }
}
