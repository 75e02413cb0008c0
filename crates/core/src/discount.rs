//! Tiered bundle discounts.
//!
//! A widget's settings carry a list of `{ "<min selected count>": <percent> }`
//! entries. The discount for a selection is the highest percent among the
//! tiers whose threshold is at or below the number of selected items.
//!
//! Both the server-side `calculate-discount` endpoint and the Cart Transform
//! Function call [`final_discount`], so checkout always charges what the
//! storefront previewed.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors produced while reading discount tiers from settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    /// A tier entry was not an object with exactly one key.
    #[error("discount entry {index} must have exactly one threshold")]
    EntryShape { index: usize },
    /// The threshold key is not a non-negative integer.
    #[error("invalid discount threshold: {0:?}")]
    InvalidThreshold(String),
    /// The percent is not a number.
    #[error("invalid discount percent: {0}")]
    InvalidPercent(String),
    /// The percent is outside `0..=100`.
    #[error("discount percent {0} must be between 0 and 100")]
    PercentOutOfRange(Decimal),
    /// Two entries share a threshold.
    #[error("duplicate discount threshold: {0}")]
    DuplicateThreshold(u32),
}

/// One discount rule: selecting at least `threshold` items earns `percent` off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountTier {
    pub threshold: u32,
    pub percent: Decimal,
}

impl DiscountTier {
    #[must_use]
    pub const fn new(threshold: u32, percent: Decimal) -> Self {
        Self { threshold, percent }
    }
}

/// Resolve the discount percent for `count` selected items.
///
/// Returns the highest percent among tiers with `threshold <= count`, or zero
/// when no tier applies. Tiers need not be sorted.
///
/// ```
/// use bundlewise_core::{DiscountTier, final_discount};
/// use rust_decimal::Decimal;
///
/// let tiers = [
///     DiscountTier::new(1, Decimal::ZERO),
///     DiscountTier::new(2, Decimal::from(5)),
///     DiscountTier::new(4, Decimal::from(10)),
/// ];
/// assert_eq!(final_discount(3, &tiers), Decimal::from(5));
/// assert_eq!(final_discount(0, &tiers), Decimal::ZERO);
/// ```
#[must_use]
pub fn final_discount(count: u32, tiers: &[DiscountTier]) -> Decimal {
    tiers
        .iter()
        .filter(|tier| tier.threshold <= count)
        .map(|tier| tier.percent)
        .max()
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

/// Apply a percent discount to a unit price.
///
/// The percent is clamped to `0..=100` and the result is rounded to cents,
/// midpoint away from zero, always carrying two decimal places.
#[must_use]
pub fn apply_percent(price: Decimal, percent: Decimal) -> Decimal {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let discounted = price * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
    let mut cents = discounted
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO);
    cents.rescale(2);
    cents
}

/// A validated set of tiers, ordered by threshold.
///
/// Serializes to and from the persisted settings shape:
///
/// ```json
/// [{ "1": 0 }, { "2": 5 }, { "4": 10 }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawTier>", into = "Vec<RawTier>")]
pub struct DiscountTiers(Vec<DiscountTier>);

type RawTier = BTreeMap<String, Value>;

impl DiscountTiers {
    /// Validate and sort tiers.
    ///
    /// # Errors
    ///
    /// Returns [`TierError`] for out-of-range percents or duplicate thresholds.
    pub fn new(mut tiers: Vec<DiscountTier>) -> Result<Self, TierError> {
        tiers.sort_by_key(|tier| tier.threshold);
        for tier in &tiers {
            if tier.percent < Decimal::ZERO || tier.percent > Decimal::ONE_HUNDRED {
                return Err(TierError::PercentOutOfRange(tier.percent));
            }
        }
        let duplicate = tiers.windows(2).find_map(|pair| match pair {
            [a, b] if a.threshold == b.threshold => Some(a.threshold),
            _ => None,
        });
        if let Some(threshold) = duplicate {
            return Err(TierError::DuplicateThreshold(threshold));
        }
        Ok(Self(tiers))
    }

    /// Parse the settings JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`TierError`] if any entry is malformed.
    pub fn from_json(value: &Value) -> Result<Self, TierError> {
        let raw: Vec<RawTier> = serde_json::from_value(value.clone())
            .map_err(|_| TierError::EntryShape { index: 0 })?;
        Self::try_from(raw)
    }

    /// Discount percent for `count` selected items.
    #[must_use]
    pub fn resolve(&self, count: u32) -> Decimal {
        final_discount(count, &self.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DiscountTier] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscountTier> {
        self.0.iter()
    }
}

impl TryFrom<Vec<RawTier>> for DiscountTiers {
    type Error = TierError;

    fn try_from(raw: Vec<RawTier>) -> Result<Self, Self::Error> {
        let tiers = raw
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let mut entries = entry.into_iter();
                let (Some((key, value)), None) = (entries.next(), entries.next()) else {
                    return Err(TierError::EntryShape { index });
                };
                Ok(DiscountTier {
                    threshold: parse_threshold(&key)?,
                    percent: parse_percent(&value)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tiers)
    }
}

impl From<DiscountTiers> for Vec<RawTier> {
    fn from(tiers: DiscountTiers) -> Self {
        tiers
            .0
            .into_iter()
            .map(|tier| {
                let mut entry = BTreeMap::new();
                entry.insert(tier.threshold.to_string(), percent_to_json(tier.percent));
                entry
            })
            .collect()
    }
}

fn parse_threshold(key: &str) -> Result<u32, TierError> {
    key.trim()
        .parse::<u32>()
        .map_err(|_| TierError::InvalidThreshold(key.to_string()))
}

/// Percents arrive as JSON numbers, or as numeric strings from older widgets.
pub(crate) fn parse_percent(value: &Value) -> Result<Decimal, TierError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(TierError::InvalidPercent(other.to_string())),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(|d| d.normalize())
        .map_err(|_| TierError::InvalidPercent(text))
}

fn percent_to_json(percent: Decimal) -> Value {
    if percent.fract().is_zero()
        && let Some(whole) = percent.to_i64()
    {
        return Value::from(whole);
    }
    percent
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}
