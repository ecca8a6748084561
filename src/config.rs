//! Command line and environment configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    fixtures::DEFAULT_BASE_PATH,
    pricing::{
        BookingRequest, DailyTourRequest, PackageRequest, TourType, TransferRequest, YachtRequest,
    },
    tiers::{ChildBand, Family, HotelCategory, VehicleClass, YachtRateMode},
};

/// Errors raised while turning arguments into a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A flag required by the product's family was not given.
    #[error("--{flag} is required to quote a {family} product")]
    MissingArgument {
        /// Missing flag
        flag: &'static str,
        /// Product family
        family: Family,
    },
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Caravan configuration
#[derive(Debug, Parser)]
#[command(name = "caravan", about = "Tour pricing and agent reconciliation", long_about = None)]
pub struct Settings {
    /// Fixture directory
    #[arg(long, env = "CARAVAN_FIXTURES", default_value = DEFAULT_BASE_PATH, global = true)]
    pub fixtures: PathBuf,

    /// Payment tolerance in minor units
    #[arg(long, env = "CARAVAN_PAYMENT_TOLERANCE", default_value_t = 0, global = true)]
    pub payment_tolerance: i64,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Settings {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a request against one product
    Quote(QuoteArgs),

    /// Replay a booking history and reconcile agent obligations
    Report(ReportArgs),
}

/// Quote arguments
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Fixture set
    #[arg(long, default_value = "istanbul")]
    pub set: String,

    /// Product code
    pub product: String,

    /// Agent code; shows the commission split
    #[arg(long)]
    pub agent: Option<String>,

    /// Party size (package tier, tour pax, transfer pax)
    #[arg(long)]
    pub pax: Option<u32>,

    /// Adults paying the package price
    #[arg(long)]
    pub adults: Option<u32>,

    /// Hotel category (3, 4, 5)
    #[arg(long)]
    pub hotel: Option<HotelCategory>,

    /// Children aged 3-5
    #[arg(long, default_value_t = 0)]
    pub children_3_5: u32,

    /// Children aged 6-10
    #[arg(long, default_value_t = 0)]
    pub children_6_10: u32,

    /// Tour type (sic, private)
    #[arg(long)]
    pub tour_type: Option<TourType>,

    /// Vehicle class (sedan, minivan, minibus, coach)
    #[arg(long)]
    pub vehicle: Option<VehicleClass>,

    /// Charter start date
    #[arg(long)]
    pub start: Option<Date>,

    /// Charter end date
    #[arg(long)]
    pub end: Option<Date>,

    /// Charter rate mode (daily, weekly)
    #[arg(long)]
    pub mode: Option<YachtRateMode>,

    /// Guests on board
    #[arg(long)]
    pub guests: Option<u32>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl QuoteArgs {
    /// Build the request for a product of `family`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingArgument`] if a flag the family needs is absent.
    pub fn request(&self, family: Family) -> Result<BookingRequest, ConfigError> {
        let missing = |flag| ConfigError::MissingArgument { flag, family };

        let request = match family {
            Family::Package => {
                let mut children = FxHashMap::default();

                for (band, count) in [
                    (ChildBand::Age3To5, self.children_3_5),
                    (ChildBand::Age6To10, self.children_6_10),
                ] {
                    if count > 0 {
                        children.insert(band, count);
                    }
                }

                BookingRequest::Package(PackageRequest {
                    pax_count: self.pax.ok_or_else(|| missing("pax"))?,
                    adults: self.adults,
                    hotel_category: self.hotel,
                    children,
                })
            }
            Family::DailyTour => BookingRequest::DailyTour(DailyTourRequest {
                tour_type: self.tour_type.unwrap_or(TourType::Sic),
                pax: self.pax.ok_or_else(|| missing("pax"))?,
            }),
            Family::Transfer => BookingRequest::Transfer(TransferRequest {
                vehicle: self.vehicle,
                pax: self.pax.ok_or_else(|| missing("pax"))?,
            }),
            Family::Yacht => BookingRequest::Yacht(YachtRequest {
                start: self.start.ok_or_else(|| missing("start"))?,
                end: self.end.ok_or_else(|| missing("end"))?,
                mode: self.mode,
                guests: self.guests,
            }),
        };

        Ok(request)
    }
}

/// Report arguments
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Fixture set
    #[arg(long, default_value = "istanbul")]
    pub set: String,

    /// Only bookings by this agent code
    #[arg(long)]
    pub agent: Option<String>,

    /// First creation date included
    #[arg(long)]
    pub from: Option<Date>,

    /// Last creation date included
    #[arg(long)]
    pub to: Option<Date>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
