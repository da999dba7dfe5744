//! Numeric circuit inputs for a single proof request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DocProofError, Result};
use crate::predicate::PredicateFamily;

/// Public and private circuit inputs for one family, plus the outcome the
/// prover claims.
///
/// Values are plain `u64`s and are lifted into the BN254 scalar field inside
/// the circuit. A witness is built per request and never reused; only the
/// public half and the claim ever leave the prover.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Witness {
    pub family: PredicateFamily,
    pub public: BTreeMap<String, u64>,
    pub private: BTreeMap<String, u64>,
    #[serde(default = "default_claim")]
    pub claim: bool,
}

fn default_claim() -> bool {
    true
}

impl Witness {
    pub fn age_above(birth_year: u64, current_year: u64, age_threshold: u64) -> Self {
        Self::from_parts(
            PredicateFamily::AgeAbove,
            &[("currentYear", current_year), ("ageThreshold", age_threshold)],
            &[("birthYear", birth_year)],
        )
    }

    pub fn income_in_range(actual_income: u64, min_income: u64, max_income: u64) -> Self {
        Self::from_parts(
            PredicateFamily::IncomeInRange,
            &[("minIncome", min_income), ("maxIncome", max_income)],
            &[("actualIncome", actual_income)],
        )
    }

    pub fn score_above(total_marks: u64, max_marks: u64, min_passing_percentage: u64) -> Self {
        Self::from_parts(
            PredicateFamily::ScoreAbove,
            &[("minPassingPercentage", min_passing_percentage)],
            &[("totalMarks", total_marks), ("maxMarks", max_marks)],
        )
    }

    pub fn filing_recency(
        filing_year: u64,
        amount_paid: u64,
        current_year: u64,
        max_year_gap: u64,
    ) -> Self {
        Self::from_parts(
            PredicateFamily::FilingRecency,
            &[("currentYear", current_year), ("maxYearGap", max_year_gap)],
            &[("filingYear", filing_year), ("amountPaid", amount_paid)],
        )
    }

    fn from_parts(
        family: PredicateFamily,
        public: &[(&str, u64)],
        private: &[(&str, u64)],
    ) -> Self {
        let collect = |pairs: &[(&str, u64)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            family,
            public: collect(public),
            private: collect(private),
            claim: true,
        }
    }

    /// Same inputs, different claimed outcome.
    pub fn with_claim(mut self, claim: bool) -> Self {
        self.claim = claim;
        self
    }

    /// Check that the named values are exactly the family's signal layout.
    pub fn validate(&self) -> Result<()> {
        check_names(self.family, "public", &self.public, self.family.public_inputs())?;
        check_names(self.family, "private", &self.private, self.family.private_inputs())?;
        Ok(())
    }

    /// Public inputs in signal order, without the output.
    pub fn public_values(&self) -> Result<Vec<u64>> {
        ordered(&self.public, self.family.public_inputs())
    }

    /// Private inputs in the family's declared order.
    pub fn private_values(&self) -> Result<Vec<u64>> {
        ordered(&self.private, self.family.private_inputs())
    }

    /// The full public signal vector: claimed outcome first, then the public inputs.
    pub fn public_signals(&self) -> Result<Vec<u64>> {
        let mut signals = Vec::with_capacity(self.family.public_arity());
        signals.push(u64::from(self.claim));
        signals.extend(self.public_values()?);
        Ok(signals)
    }

    /// Evaluate the predicate over plain integers.
    ///
    /// Returns `None` when the inputs violate one of the circuit's hard
    /// constraints (a birth or filing year after the current year, marks
    /// above the maximum, a zero maximum), in which case no claim can be
    /// proven at all.
    pub fn evaluate(&self) -> Result<Option<bool>> {
        self.validate()?;
        let p = self.public_values()?;
        let s = self.private_values()?;

        let outcome = match self.family {
            PredicateFamily::AgeAbove => {
                let (current, threshold, birth) = (p[0], p[1], s[0]);
                current.checked_sub(birth).map(|age| age >= threshold)
            }
            PredicateFamily::IncomeInRange => {
                let (min, max, actual) = (p[0], p[1], s[0]);
                Some(min <= actual && actual <= max)
            }
            PredicateFamily::ScoreAbove => {
                let (min_pct, total, max) = (p[0], s[0], s[1]);
                if max == 0 || total > max {
                    None
                } else {
                    Some(u128::from(total) * 100 >= u128::from(min_pct) * u128::from(max))
                }
            }
            PredicateFamily::FilingRecency => {
                let (current, max_gap, filing, paid) = (p[0], p[1], s[0], s[1]);
                current
                    .checked_sub(filing)
                    .map(|gap| gap <= max_gap && paid > 0)
            }
        };

        Ok(outcome)
    }
}

fn check_names(
    family: PredicateFamily,
    half: &str,
    values: &BTreeMap<String, u64>,
    expected: &[&str],
) -> Result<()> {
    let matches = values.len() == expected.len()
        && expected.iter().all(|name| values.contains_key(*name));

    if !matches {
        let got: Vec<&str> = values.keys().map(String::as_str).collect();
        return Err(DocProofError::InvalidWitness(format!(
            "{} expects {} inputs {:?}, got {:?}",
            family, half, expected, got
        )));
    }
    Ok(())
}

fn ordered(values: &BTreeMap<String, u64>, names: &[&str]) -> Result<Vec<u64>> {
    names
        .iter()
        .map(|name| {
            values
                .get(*name)
                .copied()
                .ok_or_else(|| DocProofError::InvalidWitness(format!("missing input {}", name)))
        })
        .collect()
}

// Private values stay out of Debug so witnesses can be logged freely.
impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("family", &self.family)
            .field("public", &self.public)
            .field("private", &format_args!("<{} redacted>", self.private.len()))
            .field("claim", &self.claim)
            .finish()
    }
}
