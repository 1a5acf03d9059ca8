//! # Booking Estimator
//!
//! Computes the cost of renting a listing for a number of days. Only an
//! estimate is produced; nothing is reserved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Day count for a rental, never less than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct RentalDays(u32);

impl RentalDays {
    pub const MIN: RentalDays = RentalDays(1);

    /// Clamps `days` up to the one-day minimum.
    pub fn new(days: i64) -> Self {
        let clamped = days.clamp(1, i64::from(u32::MAX));
        Self(u32::try_from(clamped).unwrap_or(u32::MAX))
    }

    /// Lenient parse of user input. Reads the leading whole number ("2.5"
    /// is 2, "3days" is 3); input without one counts as one day.
    pub fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim_start();
        let unsigned = raw.strip_prefix('+').unwrap_or(raw);
        let digits_end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());

        match &unsigned[..digits_end] {
            "" => Self::MIN,
            digits => digits
                .parse::<i64>()
                .map(Self::new)
                .unwrap_or(Self(u32::MAX)),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for RentalDays {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<i64> for RentalDays {
    fn from(days: i64) -> Self {
        Self::new(days)
    }
}

impl From<i32> for RentalDays {
    fn from(days: i32) -> Self {
        Self::new(i64::from(days))
    }
}

impl From<u32> for RentalDays {
    fn from(days: u32) -> Self {
        Self::new(i64::from(days))
    }
}

impl From<RentalDays> for u32 {
    fn from(days: RentalDays) -> Self {
        days.0
    }
}

impl FromStr for RentalDays {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(raw))
    }
}

impl fmt::Display for RentalDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Total cost of renting at `rent` per day for `days`.
pub fn estimate(rent: f64, days: impl Into<RentalDays>) -> f64 {
    rent * f64::from(days.into().get())
}

/// One row of the itemized quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub amount: f64,
    /// True for services bundled at no extra cost
    pub included: bool,
}

/// Itemized estimate shown by the rental calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalQuote {
    pub daily_rate: f64,
    pub days: u32,
    pub items: Vec<LineItem>,
    pub total: f64,
}

/// Itemized form of [`estimate`]: the rental line plus the bundled services.
pub fn quote(rent: f64, days: impl Into<RentalDays>) -> RentalQuote {
    let days = days.into();
    let rental = estimate(rent, days);

    let items = vec![
        LineItem {
            label: format!("Rental ({days} day{})", if days.get() == 1 { "" } else { "s" }),
            amount: rental,
            included: false,
        },
        LineItem {
            label: "Delivery".to_string(),
            amount: 0.0,
            included: true,
        },
        LineItem {
            label: "Insurance".to_string(),
            amount: 0.0,
            included: true,
        },
    ];

    RentalQuote {
        daily_rate: rent,
        days: days.get(),
        total: items.iter().map(|item| item.amount).sum(),
        items,
    }
}
