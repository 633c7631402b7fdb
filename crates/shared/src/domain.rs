use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DishId);
id_newtype!(RsvpId);

/// Registration tier. Fixes the guest count and selects the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    #[default]
    Individual,
    Couple,
}

impl PartyType {
    pub fn guests(self) -> u8 {
        match self {
            Self::Individual => 1,
            Self::Couple => 2,
        }
    }

    /// Individual pays per guest, a couple pays the flat couple price.
    pub fn amount(self, prices: &PriceTable) -> f64 {
        match self {
            Self::Individual => prices.individual * f64::from(self.guests()),
            Self::Couple => prices.couple,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Couple => "couple",
        }
    }
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PartyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "couple" => Ok(Self::Couple),
            other => Err(format!("unknown party type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub individual: f64,
    pub couple: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            individual: 60.0,
            couple: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl PaymentStatus {
    /// Rejected registrations no longer hold a dish slot.
    pub fn holds_slot(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}
