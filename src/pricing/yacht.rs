//! Yacht charter pricing

use jiff::civil::Date;
use serde::Deserialize;

use crate::tiers::{YachtPricing, YachtRateMode};

use super::{PriceBasis, PriceResult, PricingError, times};

/// Request for a yacht charter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct YachtRequest {
    /// Embarkation date
    pub start: Date,

    /// Disembarkation date, after `start`
    pub end: Date,

    /// Day or week rates; day rates win when absent and both are sold
    #[serde(default)]
    pub mode: Option<YachtRateMode>,

    /// Guests on board, checked against the yacht's limit
    #[serde(default)]
    pub guests: Option<u32>,
}

impl YachtRequest {
    /// Charter days between embarkation and disembarkation.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidDateRange`] unless `end` is after `start`.
    pub fn days(&self) -> Result<u32, PricingError> {
        let span = self
            .start
            .until(self.end)
            .map_err(|_err| PricingError::InvalidDateRange)?;

        u32::try_from(span.get_days())
            .ok()
            .filter(|days| *days > 0)
            .ok_or(PricingError::InvalidDateRange)
    }
}

/// Price a yacht charter.
///
/// The season or band is picked from the month of the start date. Day rates multiply by
/// days, week rates by started weeks.
///
/// # Errors
///
/// - [`PricingError::InvalidDateRange`]: `end` is not after `start`.
/// - [`PricingError::BelowMinimumDuration`]: fewer days than the yacht's minimum.
/// - [`PricingError::InvalidPax`] / [`PricingError::CapacityExceeded`]: guest count.
/// - [`PricingError::UnsupportedCategory`]: the requested mode is not sold.
/// - [`PricingError::OutOfSeason`]: no season or band covers the start month.
pub fn resolve<'a>(
    pricing: &YachtPricing<'a>,
    request: &YachtRequest,
) -> Result<PriceResult<'a>, PricingError> {
    let days = request.days()?;

    if days < pricing.min_days() {
        return Err(PricingError::BelowMinimumDuration {
            days,
            min_days: pricing.min_days(),
        });
    }

    if let Some(guests) = request.guests {
        if guests == 0 {
            return Err(PricingError::InvalidPax {
                pax: guests,
                minimum: 1,
            });
        }

        if let Some(capacity) = pricing.max_guests().filter(|capacity| guests > *capacity) {
            return Err(PricingError::CapacityExceeded {
                pax: guests,
                capacity,
            });
        }
    }

    let mode = match request.mode {
        Some(mode) => mode,
        None if pricing.has_day_rates() => YachtRateMode::Daily,
        None => YachtRateMode::Weekly,
    };

    let month = request.start.month();

    match mode {
        YachtRateMode::Daily => {
            if !pricing.has_day_rates() {
                return Err(PricingError::UnsupportedCategory("day rates".to_string()));
            }

            let rate = pricing
                .season_for(month)
                .ok_or(PricingError::OutOfSeason(month))?;

            Ok(PriceResult {
                unit_price: rate.day_rate,
                total_price: times(rate.day_rate, days)?,
                basis: PriceBasis::DayRate {
                    season: rate.season,
                    days,
                },
            })
        }
        YachtRateMode::Weekly => {
            if !pricing.has_week_rates() {
                return Err(PricingError::UnsupportedCategory("week rates".to_string()));
            }

            let rate = pricing
                .band_for(month)
                .ok_or(PricingError::OutOfSeason(month))?;

            let weeks = days.div_ceil(7);

            Ok(PriceResult {
                unit_price: rate.week_rate,
                total_price: times(rate.week_rate, weeks)?,
                basis: PriceBasis::WeekRate {
                    band: rate.band,
                    weeks,
                },
            })
        }
    }
}
