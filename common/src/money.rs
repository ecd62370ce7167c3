use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A non-negative amount held in cents so sums stay exact.
///
/// On the wire it is a plain decimal number of dollars (`25.5`), which is what
/// API clients have always sent and read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    cents: u64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub const fn from_dollars(dollars: u64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Convert a decimal dollar amount, rounding to the nearest cent.
    /// Returns `None` for negative, non-finite or absurdly large input.
    pub fn try_from_decimal(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() || dollars < 0.0 {
            return None;
        }
        let cents = (dollars * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self {
            cents: cents as u64,
        })
    }

    pub fn cents(self) -> u64 {
        self.cents
    }

    pub fn as_decimal(self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars: f64 = serde::Deserialize::deserialize(deserializer)?;
        Money::try_from_decimal(dollars).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected a non-negative amount, got {dollars}"
            ))
        })
    }
}
