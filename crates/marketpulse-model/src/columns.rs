// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const COL_SYMBOL: &str = "Symbol";
pub const COL_SHORT_NAME: &str = "Shortname";
pub const COL_SECTOR: &str = "Sector";
pub const COL_INDUSTRY: &str = "Industry";
pub const COL_CURRENT_PRICE: &str = "Currentprice";
pub const COL_MARKET_CAP: &str = "Marketcap";
pub const COL_WEIGHT: &str = "Weight";
pub const COL_DATE: &str = "Date";

/// Company columns every snapshot must carry, in listing projection order.
pub const COMPANY_COLUMNS: [&str; 7] = [
    COL_SYMBOL,
    COL_SHORT_NAME,
    COL_SECTOR,
    COL_INDUSTRY,
    COL_CURRENT_PRICE,
    COL_MARKET_CAP,
    COL_WEIGHT,
];

pub const SECTOR_STATS_COLUMNS: [&str; 4] =
    [COL_SECTOR, "n_companies", "avg_marketcap", "total_weight"];

/// Store-safe column name: spaces become `_`, `&` becomes `and`.
#[must_use]
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim().replace(' ', "_").replace('&', "and")
}

#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Normalizes a snapshot header and folds the well-known columns onto their
/// canonical spelling, so `MarketCap` and `Marketcap` land on one name.
pub fn canonical_column_name(raw: &str) -> Result<String, ValidationError> {
    let normalized = normalize_column_name(raw);
    if !is_safe_identifier(&normalized) {
        return Err(ValidationError(format!(
            "column name `{raw}` is not a safe identifier after normalization (`{normalized}`)"
        )));
    }
    let known = COMPANY_COLUMNS
        .iter()
        .chain(std::iter::once(&COL_DATE))
        .find(|c| c.eq_ignore_ascii_case(&normalized));
    Ok(known.map_or(normalized, |c| (*c).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_replaces_spaces_and_ampersands() {
        assert_eq!(normalize_column_name("S&P500"), "SandP500");
        assert_eq!(normalize_column_name(" Full time employees "), "Full_time_employees");
        assert_eq!(normalize_column_name("R&D Spend"), "RandD_Spend");
    }

    #[test]
    fn known_columns_fold_to_canonical_case() {
        assert_eq!(canonical_column_name("MarketCap").expect("name"), "Marketcap");
        assert_eq!(canonical_column_name("SHORTNAME").expect("name"), "Shortname");
        assert_eq!(canonical_column_name("date").expect("name"), "Date");
        assert_eq!(canonical_column_name("Ebitda").expect("name"), "Ebitda");
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        assert!(canonical_column_name("").is_err());
        assert!(canonical_column_name("1st").is_err());
        assert!(canonical_column_name("price($)").is_err());
        assert!(canonical_column_name("a\"; DROP TABLE companies;--").is_err());
    }

    proptest::proptest! {
        #[test]
        fn canonical_names_are_always_safe_identifiers(raw in ".{0,24}") {
            if let Ok(name) = canonical_column_name(&raw) {
                proptest::prop_assert!(is_safe_identifier(&name));
            }
        }

        #[test]
        fn normalization_is_idempotent(raw in "[A-Za-z &_0-9]{1,24}") {
            let once = normalize_column_name(&raw);
            proptest::prop_assert_eq!(normalize_column_name(&once), once);
        }
    }
}
