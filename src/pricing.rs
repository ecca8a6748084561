//! Pricing
//!
//! Resolves a unit and total price for a booking request against a product's tier table.
//! Resolution is a pure function of the table and the request.

use std::fmt;

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::tiers::{
    Family, HotelCategory, PriceChannel, PriceTierTable, Season, VehicleClass, WeekBand,
};

pub mod daily_tour;
pub mod package;
pub mod transfer;
pub mod yacht;

pub use daily_tour::{DailyTourRequest, TourType};
pub use package::PackageRequest;
pub use transfer::TransferRequest;
pub use yacht::YachtRequest;

/// Errors that can occur while resolving a price.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Party size is zero or below the family minimum.
    #[error("invalid party size {pax}; at least {minimum} required")]
    InvalidPax {
        /// Requested party size
        pax: u32,
        /// Smallest party the product sells to
        minimum: u32,
    },

    /// Adult count is zero or larger than the party.
    #[error("invalid adult count {adults} for a party of {pax}")]
    InvalidAdults {
        /// Requested adults
        adults: u32,
        /// Requested party size
        pax: u32,
    },

    /// The table has no entry for the requested category, tour type, vehicle, band or mode.
    #[error("unsupported category: {0}")]
    UnsupportedCategory(String),

    /// Charter shorter than the yacht's minimum.
    #[error("charter of {days} days is below the {min_days}-day minimum")]
    BelowMinimumDuration {
        /// Requested charter days
        days: u32,
        /// Minimum charter days
        min_days: u32,
    },

    /// Party does not fit the vehicle or yacht.
    #[error("{pax} passengers exceed the capacity of {capacity}")]
    CapacityExceeded {
        /// Requested party size
        pax: u32,
        /// Largest party that fits
        capacity: u32,
    },

    /// The request was made for a different booking family than the product.
    #[error("{request} request cannot price a {product} product")]
    FamilyMismatch {
        /// Family of the product
        product: Family,
        /// Family of the request
        request: Family,
    },

    /// No season or band covers the start month.
    #[error("month {0} is outside every charter season")]
    OutOfSeason(i8),

    /// The end date is not after the start date.
    #[error("charter end date must be after the start date")]
    InvalidDateRange,

    /// The total does not fit in minor units.
    #[error("price overflowed")]
    PriceOverflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A booking request, one variant per family.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingRequest {
    /// Multi-night package
    Package(PackageRequest),

    /// Daily tour
    DailyTour(DailyTourRequest),

    /// Point-to-point transfer
    Transfer(TransferRequest),

    /// Yacht charter
    Yacht(YachtRequest),
}

impl BookingRequest {
    /// Booking family of the request.
    pub fn family(&self) -> Family {
        match self {
            BookingRequest::Package(_) => Family::Package,
            BookingRequest::DailyTour(_) => Family::DailyTour,
            BookingRequest::Transfer(_) => Family::Transfer,
            BookingRequest::Yacht(_) => Family::Yacht,
        }
    }
}

/// The tier, rate or vehicle a price was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBasis {
    /// Package tier key and hotel category
    PackageTier {
        /// Selected tier key
        tier: u32,
        /// Hotel category, `None` for land-only packages
        category: Option<HotelCategory>,
    },

    /// Shared (seat-in-coach) tour
    Sic,

    /// Private tour breakpoint
    PrivateBreakpoint(u32),

    /// Transfer vehicle
    Vehicle(VehicleClass),

    /// Seasonal day rate
    DayRate {
        /// Season covering the start date
        season: Season,
        /// Charter days
        days: u32,
    },

    /// Weekly band rate
    WeekRate {
        /// Band covering the start date
        band: WeekBand,
        /// Started charter weeks
        weeks: u32,
    },
}

impl fmt::Display for PriceBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceBasis::PackageTier {
                tier,
                category: Some(category),
            } => write!(f, "{category}, tier {tier}"),
            PriceBasis::PackageTier {
                tier,
                category: None,
            } => write!(f, "land only, tier {tier}"),
            PriceBasis::Sic => f.write_str("SIC"),
            PriceBasis::PrivateBreakpoint(pax) => write!(f, "private, {pax} pax"),
            PriceBasis::Vehicle(vehicle) => write!(f, "{vehicle}"),
            PriceBasis::DayRate { season, days } => write!(f, "{season}, {days} days"),
            PriceBasis::WeekRate { band, weeks } => write!(f, "{band} band, {weeks} weeks"),
        }
    }
}

/// Resolved price for a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceResult<'a> {
    /// Per-person, per-vehicle, per-day or per-week price
    pub unit_price: Money<'a, Currency>,

    /// Price of the whole booking
    pub total_price: Money<'a, Currency>,

    /// Where the unit price came from
    pub basis: PriceBasis,
}

impl<'a> PriceResult<'a> {
    /// Currency of the result.
    pub fn currency(&self) -> &'a Currency {
        self.total_price.currency()
    }
}

/// Resolves the public price of `request` against `table`.
///
/// # Errors
///
/// - [`PricingError::FamilyMismatch`]: the request is for another booking family.
/// - Any family-specific [`PricingError`] raised by the resolver for that family.
pub fn resolve<'a>(
    table: &PriceTierTable<'a>,
    request: &BookingRequest,
) -> Result<PriceResult<'a>, PricingError> {
    resolve_for(table, request, PriceChannel::Public)
}

/// Resolves the price of `request` against `table` for a sales channel.
///
/// Only packages carry separate agent tiers; every other family prices both channels alike.
///
/// # Errors
///
/// See [`resolve`].
pub fn resolve_for<'a>(
    table: &PriceTierTable<'a>,
    request: &BookingRequest,
    channel: PriceChannel,
) -> Result<PriceResult<'a>, PricingError> {
    match (table, request) {
        (PriceTierTable::Package(pricing), BookingRequest::Package(request)) => {
            package::resolve_for(pricing, request, channel)
        }
        (PriceTierTable::DailyTour(pricing), BookingRequest::DailyTour(request)) => {
            daily_tour::resolve(pricing, request)
        }
        (PriceTierTable::Transfer(pricing), BookingRequest::Transfer(request)) => {
            transfer::resolve(pricing, request)
        }
        (PriceTierTable::Yacht(pricing), BookingRequest::Yacht(request)) => {
            yacht::resolve(pricing, request)
        }
        _ => Err(PricingError::FamilyMismatch {
            product: table.family(),
            request: request.family(),
        }),
    }
}

/// Multiplies a price by a count without leaving minor units.
pub(crate) fn times<'a>(
    price: Money<'a, Currency>,
    count: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    price
        .to_minor_units()
        .checked_mul(i64::from(count))
        .map(|minor| Money::from_minor(minor, price.currency()))
        .ok_or(PricingError::PriceOverflow)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use crate::tiers::{DailyTourPricing, TransferPricing, VehicleRate};

    use super::*;

    #[test]
    fn resolve_rejects_request_for_other_family() -> TestResult {
        let table = PriceTierTable::Transfer(TransferPricing::new([VehicleRate {
            vehicle: VehicleClass::Sedan,
            max_pax: 3,
            price: Money::from_minor(5_000, EUR),
        }])?);

        let request = BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 2,
        });

        assert_eq!(
            resolve(&table, &request),
            Err(PricingError::FamilyMismatch {
                product: Family::Transfer,
                request: Family::DailyTour,
            })
        );

        Ok(())
    }

    #[test]
    fn resolve_dispatches_by_family() -> TestResult {
        let table = PriceTierTable::DailyTour(DailyTourPricing::new(
            Some(Money::from_minor(4_500, EUR)),
            [],
        )?);

        let request = BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 3,
        });

        let result = resolve(&table, &request)?;

        assert_eq!(result.total_price, Money::from_minor(13_500, EUR));
        assert_eq!(result.currency(), EUR);

        Ok(())
    }

    #[test]
    fn times_reports_overflow() {
        let price = Money::from_minor(i64::MAX / 2, EUR);

        assert_eq!(times(price, 3), Err(PricingError::PriceOverflow));
    }

    #[test]
    fn basis_display_names_the_tier() {
        let basis = PriceBasis::PackageTier {
            tier: 6,
            category: Some(HotelCategory::ThreeStar),
        };

        assert_eq!(basis.to_string(), "3-star, tier 6");
        assert_eq!(PriceBasis::PrivateBreakpoint(4).to_string(), "private, 4 pax");
    }
}
