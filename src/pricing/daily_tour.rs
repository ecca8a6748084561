//! Daily tour pricing

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::tiers::{DailyTourPricing, PRIVATE_BREAKPOINTS};

use super::{PriceBasis, PriceResult, PricingError, times};

/// Daily tour mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourType {
    /// Shared seat-in-coach tour, flat per-person rate
    Sic,

    /// Private tour, per-person rate by breakpoint
    Private,
}

impl fmt::Display for TourType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TourType::Sic => "SIC",
            TourType::Private => "private",
        })
    }
}

impl FromStr for TourType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sic" | "shared" => Ok(TourType::Sic),
            "private" => Ok(TourType::Private),
            other => Err(format!("unknown tour type: {other}")),
        }
    }
}

/// Request for a daily tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DailyTourRequest {
    /// SIC or private
    pub tour_type: TourType,

    /// Party size
    pub pax: u32,
}

/// Price a daily tour.
///
/// SIC is linear in the party size. Private tours take the per-person rate of the largest
/// breakpoint not above the party size.
///
/// # Errors
///
/// - [`PricingError::InvalidPax`]: zero pax, or fewer than the smallest private breakpoint.
/// - [`PricingError::UnsupportedCategory`]: the tour does not sell the requested type.
/// - [`PricingError::PriceOverflow`]: arithmetic failure.
pub fn resolve<'a>(
    pricing: &DailyTourPricing<'a>,
    request: &DailyTourRequest,
) -> Result<PriceResult<'a>, PricingError> {
    let pax = request.pax;

    match request.tour_type {
        TourType::Sic => {
            if pax == 0 {
                return Err(PricingError::InvalidPax { pax, minimum: 1 });
            }

            let unit_price = pricing
                .sic()
                .ok_or_else(|| PricingError::UnsupportedCategory(TourType::Sic.to_string()))?;

            Ok(PriceResult {
                unit_price,
                total_price: times(unit_price, pax)?,
                basis: PriceBasis::Sic,
            })
        }
        TourType::Private => {
            if !pricing.has_private() {
                return Err(PricingError::UnsupportedCategory(
                    TourType::Private.to_string(),
                ));
            }

            let minimum = PRIVATE_BREAKPOINTS.first().copied().unwrap_or(1);

            let (breakpoint, unit_price) = pricing
                .private_rate(pax)
                .ok_or(PricingError::InvalidPax { pax, minimum })?;

            Ok(PriceResult {
                unit_price,
                total_price: times(unit_price, pax)?,
                basis: PriceBasis::PrivateBreakpoint(breakpoint),
            })
        }
    }
}
