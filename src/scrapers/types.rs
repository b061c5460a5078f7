use clap::Args;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Raw search filters, shared by the command line and the server query string
#[derive(Debug, Clone, Default, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    /// Search rentals
    #[arg(long)]
    #[serde(default, deserialize_with = "flag")]
    pub rent: bool,

    /// Search sales
    #[arg(long)]
    #[serde(default, deserialize_with = "flag")]
    pub buy: bool,

    /// Comma-separated area names or ids
    #[arg(long)]
    #[serde(default)]
    pub locations: Option<String>,

    /// Comma-separated unit type names or ids
    #[arg(long = "unitTypes", alias = "unit-types")]
    #[serde(default)]
    pub unit_types: Option<String>,

    /// Bedrooms: studio, 0-4, a range (1-3), a comparison (<2, >1) or a minimum (2+)
    #[arg(long)]
    #[serde(default)]
    pub beds: Option<String>,

    /// Minimum price, accepts k/m shorthand (2k, 1.5m)
    #[arg(long = "minPrice", alias = "min-price")]
    #[serde(default)]
    pub min_price: Option<String>,

    /// Maximum price, accepts k/m shorthand (2k, 1.5m)
    #[arg(long = "maxPrice", alias = "max-price")]
    #[serde(default)]
    pub max_price: Option<String>,

    /// Only listings without a broker fee
    #[arg(long = "noFee", alias = "no-fee")]
    #[serde(default, deserialize_with = "flag")]
    pub no_fee: bool,

    /// Sort order name or id
    #[arg(long = "sortBy", alias = "sort-by")]
    #[serde(default)]
    pub sort_by: Option<String>,

    /// Results page number
    #[arg(long)]
    #[serde(default)]
    pub page: Option<String>,
}

/// Query-string flags count as set when present, unless spelled as a negative.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        None => false,
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Rent,
    Buy,
}

impl TransactionKind {
    /// Path segment the site uses for this kind of search
    pub fn path_segment(self) -> &'static str {
        match self {
            TransactionKind::Rent => "for-rent",
            TransactionKind::Buy => "for-sale",
        }
    }
}

/// A price bound after shorthand expansion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(pub f64);

impl Price {
    /// `2k` -> 2000, `1.5m` -> 1500000, `2500` -> 2500.
    /// Shorthand values are truncated to whole units, plain values keep their fraction.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (number, multiplier) = if let Some(stripped) = raw.strip_suffix('k') {
            (stripped, Some(1_000.0))
        } else if let Some(stripped) = raw.strip_suffix('m') {
            (stripped, Some(1_000_000.0))
        } else {
            (raw, None)
        };

        let value: f64 = number.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }

        Some(match multiplier {
            Some(factor) => Price((value * factor).trunc()),
            None => Price(value),
        })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Validated search filters with every lookup already resolved to site ids
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub transaction: TransactionKind,
    pub locations: Vec<u64>,
    pub unit_types: Vec<u64>,
    pub beds: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub no_fee: bool,
    pub sort: Option<u64>,
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_shorthand_expands() {
        assert_eq!(Price::parse("2k"), Some(Price(2000.0)));
        assert_eq!(Price::parse("1.5m"), Some(Price(1_500_000.0)));
        assert_eq!(Price::parse("2500"), Some(Price(2500.0)));
        assert_eq!(Price::parse("abc"), None);
        assert_eq!(Price::parse("k"), None);
    }

    #[test]
    fn price_display_drops_whole_fraction() {
        assert_eq!(Price(2000.0).to_string(), "2000");
        assert_eq!(Price(2500.5).to_string(), "2500.5");
        assert_eq!(Price::parse("2.0005k").unwrap().to_string(), "2000");
    }

    #[test]
    fn large_prices_keep_every_digit() {
        assert_eq!(Price::parse("1e20").unwrap().to_string(), "100000000000000000000");
        assert_eq!(Price::parse("99999999999999999999").unwrap().to_string(), "100000000000000000000");
        assert_eq!(Price::parse("20000000m").unwrap().to_string(), "20000000000000");
    }

    #[test]
    fn transaction_kind_picks_path_segment() {
        assert_eq!(TransactionKind::Rent.path_segment(), "for-rent");
        assert_eq!(TransactionKind::Buy.path_segment(), "for-sale");
    }

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flag")]
        rent: bool,
    }

    #[test]
    fn query_flags_are_presence_based() {
        let parse = |v: serde_json::Value| serde_json::from_value::<Flags>(v).unwrap().rent;
        assert!(parse(serde_json::json!({"rent": ""})));
        assert!(parse(serde_json::json!({"rent": "true"})));
        assert!(!parse(serde_json::json!({"rent": "false"})));
        assert!(!parse(serde_json::json!({"rent": "0"})));
        assert!(!parse(serde_json::json!({})));
    }
}
