//! Catalog and checkout enums.
//!
//! These are stored as short lowercase strings (`TEXT` columns) and parsed
//! back with [`FromStr`](std::str::FromStr).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string did not match any known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Catalog item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Shirt,
    SportWear,
    Outwear,
}

impl Category {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shirt => "shirt",
            Self::SportWear => "sport_wear",
            Self::Outwear => "outwear",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shirt" | "S" => Ok(Self::Shirt),
            "sport_wear" | "SW" => Ok(Self::SportWear),
            "outwear" | "OW" => Ok(Self::Outwear),
            _ => Err(ParseEnumError::new("category", s)),
        }
    }
}

/// Badge colour shown next to a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Primary,
    Secondary,
    Danger,
}

impl Label {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" | "P" => Ok(Self::Primary),
            "secondary" | "S" => Ok(Self::Secondary),
            "danger" | "D" => Ok(Self::Danger),
            _ => Err(ParseEnumError::new("label", s)),
        }
    }
}

/// Payment path chosen at checkout.
///
/// `Stripe` is the card path, `PayPal` the external wallet path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    Stripe,
    PayPal,
}

impl PaymentOption {
    /// Path segment used in `/payment/{option}`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
        }
    }
}

impl fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentOption {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stripe" | "S" | "card" => Ok(Self::Stripe),
            "paypal" | "P" | "wallet" => Ok(Self::PayPal),
            other => Err(ParseEnumError::new("payment option", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_through_storage_string() {
        for category in [Category::Shirt, Category::SportWear, Category::Outwear] {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_label_accepts_short_codes() {
        assert_eq!("D".parse::<Label>(), Ok(Label::Danger));
        assert!("purple".parse::<Label>().is_err());
    }

    #[test]
    fn test_payment_option_spellings() {
        assert_eq!("S".parse::<PaymentOption>(), Ok(PaymentOption::Stripe));
        assert_eq!("card".parse::<PaymentOption>(), Ok(PaymentOption::Stripe));
        assert_eq!("P".parse::<PaymentOption>(), Ok(PaymentOption::PayPal));
        assert_eq!(" paypal ".parse::<PaymentOption>(), Ok(PaymentOption::PayPal));
    }

    #[test]
    fn test_payment_option_rejects_unknown() {
        let err = "bitcoin".parse::<PaymentOption>().unwrap_err();
        assert_eq!(err.to_string(), "invalid payment option: bitcoin");
    }
}
