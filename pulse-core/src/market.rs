//! Market quotes and the aggregated market snapshot

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept for absolute changes
const CHANGE_DP: u32 = 8;
/// Decimal places kept for percent changes
const PERCENT_DP: u32 = 2;

/// A normalized price quote (index, crypto asset, or currency pair)
///
/// Quotes are only built through [`MarketQuote::from_change`] or
/// [`MarketQuote::from_percent`], which derive one delta from the other so the
/// sign of `change_percent` always matches the sign of `change`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_localized: Option<String>,
    pub price: Decimal,
    /// Absolute 24h change
    pub change: Decimal,
    /// Relative 24h change in percent
    pub change_percent: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl MarketQuote {
    /// Build a quote from the current price and the absolute 24h change.
    /// `None` when the percent change does not fit in a `Decimal`.
    pub fn from_change(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        change: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Option<Self> {
        let previous = price.checked_sub(change)?;
        let (change, change_percent) = if previous > Decimal::ZERO && !change.is_zero() {
            let percent = change
                .checked_div(previous)?
                .checked_mul(Decimal::ONE_HUNDRED)?;
            (round_away(change, CHANGE_DP), round_away(percent, PERCENT_DP))
        } else {
            // No meaningful previous close; report an unchanged quote.
            (Decimal::ZERO, Decimal::ZERO)
        };

        Some(Self::assemble(symbol, name, price, change, change_percent, updated_at))
    }

    /// Build a quote from the current price and the relative 24h change.
    /// `None` when the absolute change does not fit in a `Decimal`.
    pub fn from_percent(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        change_percent: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Option<Self> {
        let factor = Decimal::ONE.checked_add(change_percent.checked_div(Decimal::ONE_HUNDRED)?)?;
        let change = if factor > Decimal::ZERO && !price.is_zero() {
            let previous = price.checked_div(factor)?;
            round_away(price.checked_sub(previous)?, CHANGE_DP)
        } else {
            Decimal::ZERO
        };

        Some(Self::assemble(
            symbol,
            name,
            price,
            change,
            round_away(change_percent, PERCENT_DP),
            updated_at,
        ))
    }

    fn assemble(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        change: Decimal,
        change_percent: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let change = if change.is_zero() { Decimal::ZERO } else { change };
        Self {
            symbol: symbol.into(),
            name: name.into(),
            name_localized: None,
            price,
            change,
            change_percent: percent_matching(change, change_percent),
            updated_at,
        }
    }

    /// Attach a localized display name
    pub fn with_localized_name(mut self, name: impl Into<String>) -> Self {
        self.name_localized = Some(name.into());
        self
    }

    /// Whether the percent change carries the same sign as the absolute change
    pub fn is_sign_consistent(&self) -> bool {
        self.change.is_sign_positive() == self.change_percent.is_sign_positive()
            && self.change.is_zero() == self.change_percent.is_zero()
    }
}

/// Percent carrying the sign of `change`. A non-zero change too small to
/// register after rounding reports the smallest representable percent.
fn percent_matching(change: Decimal, percent: Decimal) -> Decimal {
    if change.is_zero() {
        return Decimal::ZERO;
    }
    let magnitude = percent.abs().max(Decimal::new(1, PERCENT_DP));
    if change.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Round without ever collapsing a non-zero value to zero
fn round_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::AwayFromZero)
}

/// Crypto fear & greed index reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearGreedReading {
    /// Index value in 0..=100
    pub value: u8,
    /// Provider label (e.g. "Extreme Fear", "Greed")
    pub classification: String,
    pub updated_at: DateTime<Utc>,
}

impl FearGreedReading {
    pub fn new(value: u64, classification: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            value: value.min(100) as u8,
            classification: classification.into(),
            updated_at,
        }
    }
}

/// Aggregated market overview served by `/market`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub indices: Vec<MarketQuote>,
    pub crypto: Vec<MarketQuote>,
    pub forex: Vec<MarketQuote>,
    pub fear_greed: Option<FearGreedReading>,
    pub updated_at: DateTime<Utc>,
}
