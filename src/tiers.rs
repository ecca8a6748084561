//! Price Tier Tables
//!
//! Immutable, per-product pricing data. Tables are validated once when they are built
//! (usually while a catalog fixture is decoded) so that resolution never has to guess.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

pub mod daily_tour;
pub mod package;
pub mod transfer;
pub mod yacht;

pub use daily_tour::{DailyTourPricing, PRIVATE_BREAKPOINTS};
pub use package::{
    ChildBand, HotelCategory, PackagePricing, PackageTiers, PriceChannel, TierLadder,
};
pub use transfer::{TransferPricing, VehicleClass, VehicleRate};
pub use yacht::{Season, SeasonRate, WeekBand, WeekBandRate, YachtPricing, YachtRateMode};

/// Errors raised while building a tier table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A tier ladder was defined without any tiers.
    #[error("tier ladder for {0} has no tiers")]
    EmptyTiers(String),

    /// A tier key of zero passengers was defined.
    #[error("tier key must be at least 1 passenger")]
    ZeroTierKey,

    /// The same tier key appears twice in one ladder.
    #[error("duplicate tier key {0}")]
    DuplicateTier(u32),

    /// A private daily tour rate is missing one of the fixed breakpoints.
    #[error("private rates are missing the {0}-pax breakpoint")]
    IncompleteTiers(u32),

    /// A private daily tour rate is defined at a breakpoint that does not exist.
    #[error("{0} is not a private tour breakpoint")]
    UnknownBreakpoint(u32),

    /// Per-person price rises with a larger breakpoint.
    #[error("per-person price at {higher} pax is above the price at {lower} pax")]
    NonMonotonicTiers {
        /// Smaller breakpoint
        lower: u32,
        /// Larger breakpoint with the higher price
        higher: u32,
    },

    /// A negative price was supplied.
    #[error("prices cannot be negative")]
    NegativePrice,

    /// Prices in one table use different currencies.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the first price in the table
        expected: &'static str,
        /// Conflicting currency
        found: &'static str,
    },

    /// A daily tour defines neither SIC nor private rates.
    #[error("daily tour has neither SIC nor private pricing")]
    NoTourPricing,

    /// A transfer defines no vehicles.
    #[error("transfer has no vehicles")]
    NoVehicles,

    /// The same vehicle class appears twice on one transfer.
    #[error("vehicle {0} is listed twice")]
    DuplicateVehicle(VehicleClass),

    /// A vehicle was defined with zero seats.
    #[error("vehicle {0} has no passenger capacity")]
    ZeroCapacity(VehicleClass),

    /// A yacht defines neither day rates nor week rates.
    #[error("yacht has neither day rates nor week rates")]
    NoYachtRates,

    /// Minimum charter length of zero days.
    #[error("minimum charter length must be at least one day")]
    ZeroMinimumDays,

    /// A month outside `1..=12`.
    #[error("{0} is not a calendar month")]
    InvalidMonth(i8),

    /// One month was claimed by two seasons or bands.
    #[error("month {0} belongs to more than one season")]
    OverlappingSeasons(i8),

    /// Agent tiers are land-only on a hotel package, or the other way round.
    #[error("agent tiers must have the same hotel shape as the public tiers")]
    MismatchedAgentTiers,
}

/// Booking family a product or request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Multi-night package
    Package,

    /// Daily tour
    DailyTour,

    /// Point-to-point transfer
    Transfer,

    /// Yacht charter
    Yacht,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Package => "package",
            Family::DailyTour => "daily tour",
            Family::Transfer => "transfer",
            Family::Yacht => "yacht",
        })
    }
}

/// Pricing data for one product, one variant per booking family.
#[derive(Debug, Clone)]
pub enum PriceTierTable<'a> {
    /// Pax-tier matrix per hotel category with child surcharges
    Package(PackagePricing<'a>),

    /// SIC and private per-person rates
    DailyTour(DailyTourPricing<'a>),

    /// Fixed price per vehicle on one route
    Transfer(TransferPricing<'a>),

    /// Seasonal day rates and/or weekly bands
    Yacht(YachtPricing<'a>),
}

impl<'a> PriceTierTable<'a> {
    /// Booking family of this table.
    pub fn family(&self) -> Family {
        match self {
            PriceTierTable::Package(_) => Family::Package,
            PriceTierTable::DailyTour(_) => Family::DailyTour,
            PriceTierTable::Transfer(_) => Family::Transfer,
            PriceTierTable::Yacht(_) => Family::Yacht,
        }
    }

    /// Currency every price in this table is quoted in.
    pub fn currency(&self) -> &'a Currency {
        match self {
            PriceTierTable::Package(pricing) => pricing.currency(),
            PriceTierTable::DailyTour(pricing) => pricing.currency(),
            PriceTierTable::Transfer(pricing) => pricing.currency(),
            PriceTierTable::Yacht(pricing) => pricing.currency(),
        }
    }
}

/// Tracks the currency of a table while it is being built and rejects negative prices.
#[derive(Debug, Default)]
pub(crate) struct CurrencyGuard<'a> {
    currency: Option<&'a Currency>,
}

impl<'a> CurrencyGuard<'a> {
    pub(crate) fn check(&mut self, price: &Money<'a, Currency>) -> Result<(), CatalogError> {
        if price.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice);
        }

        match self.currency {
            Some(expected) if expected != price.currency() => Err(CatalogError::CurrencyMismatch {
                expected: expected.iso_alpha_code,
                found: price.currency().iso_alpha_code,
            }),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(price.currency());

                Ok(())
            }
        }
    }

    pub(crate) fn currency(&self) -> Option<&'a Currency> {
        self.currency
    }
}
