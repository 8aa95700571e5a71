use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "INR";

const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------        Money        ---------------------------------------------------------
/// A currency amount, stored as an integer number of minor units (paise).
///
/// Amounts are written and read at the API boundary in major units with two decimal places, e.g. `"12.50"`, so that
/// clients never have to know about the storage representation.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

/// Saturates at the bounds of `i64`. Use [`Money::checked_mul`] where an overflow must be reported.
impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_mul(rhs))
    }
}

/// Saturates at the bounds of `i64`.
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, m| Self(acc.0.saturating_add(m.0)))
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(minor_units: i64) -> Self {
        Self(minor_units)
    }
}

impl Money {
    pub const fn from_minor_units(value: i64) -> Self {
        Self(value)
    }

    pub const fn from_major_units(value: i64) -> Self {
        Self(value * MINOR_UNITS_PER_MAJOR)
    }

    /// The raw value, in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The amount in major units. Only use this at the edge of the system, where a third-party API insists on a
    /// floating point value.
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
    }

    pub fn checked_mul(&self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(MoneyConversionError(s.to_string()));
        }
        let whole = whole.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}. {e}")))?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}. {e}")))? * 10,
            _ => frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}. {e}")))?,
        };
        let value = whole
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| MoneyConversionError(format!("{s} is out of range")))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> de::Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an amount in major units, as a decimal string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(MINOR_UNITS_PER_MAJOR).map(Money).ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                let v = i64::try_from(v).map_err(E::custom)?;
                self.visit_i64(v)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                if !v.is_finite() {
                    return Err(E::custom("amount must be finite"));
                }
                #[allow(clippy::cast_possible_truncation)]
                Ok(Money((v * MINOR_UNITS_PER_MAJOR as f64).round() as i64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
