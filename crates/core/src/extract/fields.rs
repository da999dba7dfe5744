//! Lookup and parsing helpers for loosely structured document fields.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Normalise a field name: lowercase, with `_`, `-` and spaces removed.
pub(crate) fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and separator-insensitive view over a raw field map.
///
/// When two raw keys normalise to the same name the lexicographically
/// smaller raw key wins, so lookups do not depend on hash order.
pub(crate) struct FieldLookup<'a> {
    entries: Vec<(String, &'a str, &'a str)>,
}

impl<'a> FieldLookup<'a> {
    pub(crate) fn new(fields: &'a HashMap<String, String>) -> Self {
        let mut entries: Vec<(String, &str, &str)> = fields
            .iter()
            .map(|(k, v)| (normalize_key(k), k.as_str(), v.trim()))
            .filter(|(_, _, v)| !v.is_empty())
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1));
        Self { entries }
    }

    /// First non-empty value under any of `aliases`, tried in alias order.
    pub(crate) fn first(&self, aliases: &[&str]) -> Option<(&'a str, &'a str)> {
        aliases.iter().find_map(|alias| {
            let wanted = normalize_key(alias);
            self.entries
                .iter()
                .find(|(norm, _, _)| *norm == wanted)
                .map(|(_, raw, value)| (*raw, *value))
        })
    }
}

/// Year of a full date, or else the first standalone run of exactly four digits.
pub(crate) fn parse_year(text: &str) -> Option<u64> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return u64::try_from(date.year()).ok();
        }
    }

    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

/// Strip every non-digit and parse what is left. `None` when nothing
/// remains or the number does not fit in a `u64`.
pub(crate) fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Whole-currency amount: like [`parse_digits`], but anything after a
/// decimal point that follows the first digit is dropped, so `45,000.00`
/// is 45000 while the `.` in `Rs. 45,000` is ignored.
pub(crate) fn parse_whole_amount(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let end = text[start..].find('.').map_or(text.len(), |i| start + i);
    parse_digits(&text[..end])
}

/// Non-negative decimal such as `72.5`, `8.75` or `64%`, kept exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decimal {
    whole: u64,
    fraction: String,
}

impl Decimal {
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_end_matches('%').trim_end();
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        Some(Self {
            whole,
            fraction: fraction.to_string(),
        })
    }

    /// Value times `10^digits`, truncated toward zero.
    pub(crate) fn scaled(&self, digits: u32) -> Option<u64> {
        let mut value = self.whole.checked_mul(10u64.checked_pow(digits)?)?;
        for (i, c) in self.fraction.chars().take(digits as usize).enumerate() {
            let place = 10u64.pow(digits - 1 - i as u32);
            value = value.checked_add(u64::from(c.to_digit(10)?) * place)?;
        }
        Some(value)
    }

    /// True when the exact value is strictly greater than `limit`.
    pub(crate) fn exceeds(&self, limit: u64) -> bool {
        self.whole > limit || (self.whole == limit && self.fraction.chars().any(|c| c != '0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_lookup_ignores_case_and_separators() {
        let raw = fields(&[("Date_Of-Birth", "04/05/1990"), ("gross salary", "45,000")]);
        let lookup = FieldLookup::new(&raw);

        assert_eq!(lookup.first(&["dob", "dateOfBirth"]), Some(("Date_Of-Birth", "04/05/1990")));
        assert_eq!(lookup.first(&["grossSalary"]).map(|(_, v)| v), Some("45,000"));
        assert_eq!(lookup.first(&["netSalary"]), None);
    }

    #[test]
    fn test_lookup_skips_blank_values() {
        let raw = fields(&[("dob", "   "), ("birthDate", "1990")]);
        let lookup = FieldLookup::new(&raw);
        assert_eq!(lookup.first(&["dob", "birthDate"]).map(|(_, v)| v), Some("1990"));
    }

    #[test]
    fn test_lookup_collision_is_deterministic() {
        let raw = fields(&[("dob", "1991"), ("DOB", "1990")]);
        let lookup = FieldLookup::new(&raw);
        // "DOB" sorts before "dob"
        assert_eq!(lookup.first(&["dob"]).map(|(_, v)| v), Some("1990"));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1990-05-04"), Some(1990));
        assert_eq!(parse_year("04-05-1990"), Some(1990));
        assert_eq!(parse_year("04/05/1990"), Some(1990));
        assert_eq!(parse_year("1990/05/04"), Some(1990));
        assert_eq!(parse_year("DOB: 1990"), Some(1990));
        assert_eq!(parse_year("2023-24"), Some(2023));
        assert_eq!(parse_year("19900504"), None);
        assert_eq!(parse_year("unknown"), None);
    }

    #[test]
    fn test_parse_digits() {
        assert_eq!(parse_digits("₹ 12,50,000"), Some(1_250_000));
        assert_eq!(parse_digits("45000.00"), Some(4_500_000));
        assert_eq!(parse_digits("n/a"), None);
        assert_eq!(parse_digits("99999999999999999999999"), None);
    }

    #[test]
    fn test_parse_whole_amount() {
        assert_eq!(parse_whole_amount("45,000.00"), Some(45_000));
        assert_eq!(parse_whole_amount("Rs. 45,000"), Some(45_000));
        assert_eq!(parse_whole_amount("Rs. 12,50,000.75"), Some(1_250_000));
        assert_eq!(parse_whole_amount("₹ 12,50,000"), Some(1_250_000));
        assert_eq!(parse_whole_amount("n/a"), None);
    }

    #[test]
    fn test_decimal_truncates() {
        let d = Decimal::parse("72.9").unwrap();
        assert_eq!(d.scaled(0), Some(72));

        let cgpa = Decimal::parse("8.75").unwrap();
        assert_eq!(cgpa.scaled(1), Some(87));

        assert_eq!(Decimal::parse("64%").unwrap().scaled(0), Some(64));
        assert_eq!(Decimal::parse(".5").unwrap().scaled(1), Some(5));
        assert!(Decimal::parse("-3").is_none());
        assert!(Decimal::parse("abc").is_none());
        assert!(Decimal::parse("1.2.3").is_none());
    }

    #[test]
    fn test_decimal_exceeds() {
        assert!(!Decimal::parse("100").unwrap().exceeds(100));
        assert!(!Decimal::parse("100.00").unwrap().exceeds(100));
        assert!(Decimal::parse("100.01").unwrap().exceeds(100));
        assert!(Decimal::parse("10.5").unwrap().exceeds(10));
    }
}
