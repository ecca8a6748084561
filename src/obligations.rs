//! Obligations
//!
//! Derives the two complementary money obligations of a priced booking: the commission the
//! operator owes the agent, and the balance the agent owes the operator.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::error;

/// Errors raised while computing obligations.
#[derive(Debug, Error, PartialEq)]
pub enum ObligationError {
    /// Total price or commission rate was missing when obligations were computed.
    #[error("booking snapshot has no {0}; obligations cannot be computed")]
    InconsistentSnapshot(&'static str),

    /// Commission rate outside `0..=100` percent.
    #[error("commission rate {0}% is outside 0-100%")]
    RateOutOfRange(Decimal),

    /// Commission rate could not be parsed.
    #[error("invalid commission rate: {0}")]
    InvalidRate(String),

    /// Commission could not be represented in minor units.
    #[error("commission calculation overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Commission rate in percent points, between 0 and 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CommissionRate(Decimal);

impl CommissionRate {
    /// Rate of direct and guest bookings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Rate given to new agents when none is set.
    pub const DEFAULT_AGENT: Self = Self(Decimal::TEN);

    /// Create a rate from percent points.
    ///
    /// # Errors
    ///
    /// Returns [`ObligationError::RateOutOfRange`] outside `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, ObligationError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ObligationError::RateOutOfRange(percent));
        }

        Ok(Self(percent.normalize()))
    }

    /// Rate in percent points.
    pub fn percent(self) -> Decimal {
        self.0
    }

    /// Whether no commission is earned.
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for CommissionRate {
    type Err = ObligationError;

    /// Parses `"10%"` or `"10"` as ten percent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let points = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

        let percent = points
            .parse::<Decimal>()
            .map_err(|_err| ObligationError::InvalidRate(s.to_string()))?;

        Self::new(percent)
    }
}

/// The frozen fields of a booking that obligations are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingSnapshot<'a> {
    /// Total price captured at booking time
    pub total_price: Option<Money<'a, Currency>>,

    /// Commission rate copied from the agent at booking time
    pub commission_rate: Option<CommissionRate>,
}

impl<'a> BookingSnapshot<'a> {
    /// Snapshot with both fields present.
    pub fn new(total_price: Money<'a, Currency>, commission_rate: CommissionRate) -> Self {
        Self {
            total_price: Some(total_price),
            commission_rate: Some(commission_rate),
        }
    }
}

/// Commission and agent-owed amounts of one booking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obligations<'a> {
    /// Owed by the operator to the agent
    pub commission: Money<'a, Currency>,

    /// Owed by the agent to the operator
    pub agent_owed: Money<'a, Currency>,
}

/// Compute both obligations from a single snapshot.
///
/// The commission is `total × rate / 100`, rounded once to minor units with halves away from
/// zero. The agent owes the rest, so the two always sum to the total.
///
/// # Errors
///
/// - [`ObligationError::InconsistentSnapshot`]: total or rate is missing.
/// - [`ObligationError::Overflow`]: the commission does not fit in minor units.
pub fn compute_obligations<'a>(
    snapshot: &BookingSnapshot<'a>,
) -> Result<Obligations<'a>, ObligationError> {
    let Some(total) = snapshot.total_price else {
        error!("obligations requested for a booking without a total price");
        return Err(ObligationError::InconsistentSnapshot("total price"));
    };

    let Some(rate) = snapshot.commission_rate else {
        error!(total = %total, "obligations requested for a booking without a commission rate");
        return Err(ObligationError::InconsistentSnapshot("commission rate"));
    };

    let commission_minor = commission_minor(total.to_minor_units(), rate)?;
    let commission = Money::from_minor(commission_minor, total.currency());
    let agent_owed = total.sub(commission)?;

    Ok(Obligations {
        commission,
        agent_owed,
    })
}

/// Commission in minor units for a total in minor units.
fn commission_minor(total_minor: i64, rate: CommissionRate) -> Result<i64, ObligationError> {
    let applied = Decimal::from(total_minor)
        .checked_mul(rate.percent())
        .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(ObligationError::Overflow)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(ObligationError::Overflow)
}
