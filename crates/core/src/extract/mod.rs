//! Turn raw document fields into a circuit witness.
//!
//! Upstream OCR or form parsing hands us a flat map of strings. The
//! extractor picks the fields each predicate family needs, normalises them
//! into integers, and fills in the public parameters. What happens when a
//! field is missing is decided by the injected [`FallbackPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use docproof_core::extract::{Extractor, FallbackPolicy};
//! use docproof_core::PredicateFamily;
//!
//! let mut fields = HashMap::new();
//! fields.insert("dob".to_string(), "1990-05-04".to_string());
//!
//! let extractor = Extractor::new(FallbackPolicy::strict()).with_reference_year(2024);
//! let witness = extractor.extract(PredicateFamily::AgeAbove, &fields, None)?;
//! assert_eq!(witness.public_signals()?, vec![1, 2024, 18]);
//! # Ok::<(), docproof_core::DocProofError>(())
//! ```

mod fields;
mod policy;

use std::collections::HashMap;

use chrono::Datelike;

pub use policy::{FallbackMode, FallbackPolicy};

use crate::error::{DocProofError, Result};
use crate::predicate::PredicateFamily;
use crate::witness::Witness;
use fields::{parse_digits, parse_whole_amount, parse_year, Decimal, FieldLookup};

pub const DEFAULT_AGE_THRESHOLD: u64 = 18;
pub const DEFAULT_MIN_INCOME: u64 = 500_000;
pub const DEFAULT_MAX_INCOME: u64 = 10_000_000;
pub const DEFAULT_MIN_PASSING_PERCENTAGE: u64 = 40;
pub const DEFAULT_MAX_YEAR_GAP: u64 = 2;
/// Scores are normalised to a percentage, so `maxMarks` is always 100.
pub const PERCENTAGE_SCALE: u64 = 100;

const DOB_FIELDS: &[&str] = &["dob", "dateOfBirth", "birthDate"];
const INCOME_FIELDS: &[&str] = &["income", "annualIncome", "grossSalary", "netSalary", "salary"];
const PERCENTAGE_FIELDS: &[&str] = &["percentage", "percent"];
const CGPA_FIELDS: &[&str] = &["cgpa", "gpa"];
const MARKS_FIELDS: &[&str] = &["totalMarks", "marks"];
const MAX_MARKS_FIELDS: &[&str] = &["maxMarks"];
const FILING_YEAR_FIELDS: &[&str] = &["filingYear", "assessmentYear", "taxYear"];
const AMOUNT_FIELDS: &[&str] = &["taxPaid", "amountPaid"];

/// Where "this year" comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceYear {
    #[default]
    WallClock,
    Fixed(u64),
}

impl ReferenceYear {
    pub fn resolve(&self) -> u64 {
        match self {
            ReferenceYear::WallClock => chrono::Utc::now().year().max(0) as u64,
            ReferenceYear::Fixed(year) => *year,
        }
    }
}

/// Field extractor for all predicate families.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    policy: FallbackPolicy,
    reference_year: ReferenceYear,
}

impl Extractor {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            reference_year: ReferenceYear::WallClock,
        }
    }

    /// Pin the current year, for deterministic callers and tests.
    pub fn with_reference_year(mut self, year: u64) -> Self {
        self.reference_year = ReferenceYear::Fixed(year);
        self
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn current_year(&self) -> u64 {
        self.reference_year.resolve()
    }

    /// Build the witness for `family` from raw document fields.
    ///
    /// # Arguments
    /// * `family` - Predicate the witness is for
    /// * `raw_fields` - Field name to raw text, as produced by OCR or a form
    /// * `threshold` - Overrides the family's main public parameter
    ///   (age threshold, minimum income, passing percentage); ignored for
    ///   [`PredicateFamily::FilingRecency`]
    ///
    /// # Returns
    /// A witness claiming the predicate holds. In strict mode a missing or
    /// unusable field is `MissingField` / `InvalidField`; in substitute mode
    /// this never fails.
    pub fn extract(
        &self,
        family: PredicateFamily,
        raw_fields: &HashMap<String, String>,
        threshold: Option<u64>,
    ) -> Result<Witness> {
        let lookup = FieldLookup::new(raw_fields);
        let current_year = self.current_year();

        log::debug!(
            "Extracting {} witness from {} fields (year {})",
            family,
            raw_fields.len(),
            current_year
        );

        let witness = match family {
            PredicateFamily::AgeAbove => {
                let birth_year = self.birth_year(&lookup, current_year)?;
                Witness::age_above(
                    birth_year,
                    current_year,
                    threshold.unwrap_or(DEFAULT_AGE_THRESHOLD),
                )
            }
            PredicateFamily::IncomeInRange => {
                let income = self.income(&lookup)?;
                Witness::income_in_range(
                    income,
                    threshold.unwrap_or(DEFAULT_MIN_INCOME),
                    DEFAULT_MAX_INCOME,
                )
            }
            PredicateFamily::ScoreAbove => {
                let percentage = self.percentage(&lookup)?;
                Witness::score_above(
                    percentage,
                    PERCENTAGE_SCALE,
                    threshold.unwrap_or(DEFAULT_MIN_PASSING_PERCENTAGE),
                )
            }
            PredicateFamily::FilingRecency => {
                if let Some(t) = threshold {
                    log::warn!("Threshold {} ignored for {}", t, family);
                }
                let filing_year = self.filing_year(&lookup, current_year)?;
                let amount_paid = self.amount_paid(&lookup)?;
                Witness::filing_recency(filing_year, amount_paid, current_year, DEFAULT_MAX_YEAR_GAP)
            }
        };

        log::info!("✓ Extracted {} witness", family);
        Ok(witness)
    }

    fn birth_year(&self, lookup: &FieldLookup<'_>, current_year: u64) -> Result<u64> {
        let family = PredicateFamily::AgeAbove;
        let Some((field, raw)) = lookup.first(DOB_FIELDS) else {
            return self.substitute_missing(family, "dob", self.policy.birth_year);
        };

        match parse_year(raw) {
            Some(year) if year > 1900 && year < current_year => Ok(year),
            Some(year) => self.substitute_invalid(
                field,
                format!("birth year {} outside 1901..{}", year, current_year),
                self.policy.birth_year,
            ),
            None => self.substitute_invalid(field, "no year found".to_string(), self.policy.birth_year),
        }
    }

    fn income(&self, lookup: &FieldLookup<'_>) -> Result<u64> {
        let family = PredicateFamily::IncomeInRange;
        let Some((field, raw)) = lookup.first(INCOME_FIELDS) else {
            return self.substitute_missing(family, "income", self.policy.annual_income);
        };

        match self.parse_amount(raw) {
            Some(0) | None => self.substitute_invalid(
                field,
                "no positive amount found".to_string(),
                self.policy.annual_income,
            ),
            Some(amount) => Ok(amount),
        }
    }

    fn percentage(&self, lookup: &FieldLookup<'_>) -> Result<u64> {
        let fallback = self.policy.percentage;

        if let Some((field, raw)) = lookup.first(PERCENTAGE_FIELDS) {
            return match Decimal::parse(raw) {
                Some(d) if !d.exceeds(100) => d
                    .scaled(0)
                    .map_or_else(|| self.substitute_invalid(field, "overflow".to_string(), fallback), Ok),
                _ => self.substitute_invalid(field, "expected a percentage in 0..=100".to_string(), fallback),
            };
        }

        if let Some((field, raw)) = lookup.first(CGPA_FIELDS) {
            return match Decimal::parse(raw) {
                Some(d) if !d.exceeds(10) => d
                    .scaled(1)
                    .map_or_else(|| self.substitute_invalid(field, "overflow".to_string(), fallback), Ok),
                _ => self.substitute_invalid(field, "expected a grade point in 0..=10".to_string(), fallback),
            };
        }

        if let Some((field, raw)) = lookup.first(MARKS_FIELDS) {
            let max_marks = match lookup.first(MAX_MARKS_FIELDS) {
                Some((_, max_raw)) => parse_digits(max_raw),
                None => Some(PERCENTAGE_SCALE),
            };
            return match (parse_digits(raw), max_marks) {
                (Some(total), Some(max)) if max > 0 && total <= max => {
                    Ok((u128::from(total) * u128::from(PERCENTAGE_SCALE) / u128::from(max)) as u64)
                }
                _ => self.substitute_invalid(field, "marks must not exceed maxMarks".to_string(), fallback),
            };
        }

        self.substitute_missing(PredicateFamily::ScoreAbove, "percentage", fallback)
    }

    fn filing_year(&self, lookup: &FieldLookup<'_>, current_year: u64) -> Result<u64> {
        let fallback = current_year.saturating_sub(1);
        let Some((field, raw)) = lookup.first(FILING_YEAR_FIELDS) else {
            return self.substitute_missing(PredicateFamily::FilingRecency, "filingYear", fallback);
        };

        match parse_year(raw) {
            Some(year) if year > 1900 && year <= current_year => Ok(year),
            Some(year) => self.substitute_invalid(
                field,
                format!("filing year {} outside 1901..={}", year, current_year),
                fallback,
            ),
            None => self.substitute_invalid(field, "no year found".to_string(), fallback),
        }
    }

    fn amount_paid(&self, lookup: &FieldLookup<'_>) -> Result<u64> {
        let fallback = self.policy.amount_paid;
        let Some((field, raw)) = lookup.first(AMOUNT_FIELDS) else {
            return self.substitute_missing(PredicateFamily::FilingRecency, "taxPaid", fallback);
        };

        match self.parse_amount(raw) {
            Some(amount) => Ok(amount),
            None => self.substitute_invalid(field, "no amount found".to_string(), fallback),
        }
    }

    /// Strict reads whole rupees and drops paise; Substitute keeps every digit.
    fn parse_amount(&self, raw: &str) -> Option<u64> {
        if self.policy.is_substitute() {
            parse_digits(raw)
        } else {
            parse_whole_amount(raw)
        }
    }

    fn substitute_missing(&self, family: PredicateFamily, field: &str, value: u64) -> Result<u64> {
        if !self.policy.is_substitute() {
            return Err(DocProofError::MissingField {
                family: family.to_string(),
                field: field.to_string(),
            });
        }
        log::warn!("{} missing for {}, substituting {}", field, family, value);
        Ok(value)
    }

    fn substitute_invalid(&self, field: &str, reason: String, value: u64) -> Result<u64> {
        if !self.policy.is_substitute() {
            return Err(DocProofError::InvalidField {
                field: field.to_string(),
                reason,
            });
        }
        // the reason can quote the raw value
        log::debug!("{} rejected: {}", field, reason);
        log::warn!("{} unusable, substituting {}", field, value);
        Ok(value)
    }
}
