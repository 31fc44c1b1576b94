//! Catalog enums shared between the storefront and the showroom API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vehicle category as classified by the showroom API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarType {
    Classic,
    Luxury,
    Electrical,
}

impl CarType {
    /// Wire value used in query strings and form payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Luxury => "luxury",
            Self::Electrical => "electrical",
        }
    }

    /// Heading shown on category listings.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Classic => "Future Classics",
            Self::Luxury => "Luxury Collection",
            Self::Electrical => "Electric Concepts",
        }
    }
}

impl std::fmt::Display for CarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`CarType`] from its wire value.
#[derive(Debug, Error)]
#[error("invalid car type: {0}")]
pub struct CarTypeParseError(String);

impl std::str::FromStr for CarType {
    type Err = CarTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Classic),
            "luxury" => Ok(Self::Luxury),
            "electrical" => Ok(Self::Electrical),
            other => Err(CarTypeParseError(other.to_string())),
        }
    }
}

/// Stock availability as reported by the showroom API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    InStock,
    OutOfStock,
}

impl Availability {
    /// Wire value used in form payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    /// Badge text shown on product cards.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }
}
