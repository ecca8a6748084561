//! Transfer tier tables

use std::{fmt, str::FromStr};

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use super::{CatalogError, CurrencyGuard};

/// Vehicle a transfer is operated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    /// Sedan car
    Sedan,

    /// Minivan (Transporter class)
    Minivan,

    /// Minibus (Sprinter class)
    Minibus,

    /// Full-size coach
    Coach,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleClass::Sedan => "sedan",
            VehicleClass::Minivan => "minivan",
            VehicleClass::Minibus => "minibus",
            VehicleClass::Coach => "coach",
        })
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedan" => Ok(VehicleClass::Sedan),
            "minivan" => Ok(VehicleClass::Minivan),
            "minibus" => Ok(VehicleClass::Minibus),
            "coach" => Ok(VehicleClass::Coach),
            other => Err(format!("unknown vehicle class: {other}")),
        }
    }
}

/// Fixed price of one vehicle on a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleRate<'a> {
    /// Vehicle class
    pub vehicle: VehicleClass,

    /// Most passengers the vehicle seats
    pub max_pax: u32,

    /// Price for the whole vehicle
    pub price: Money<'a, Currency>,
}

/// Pricing for a point-to-point transfer route.
#[derive(Debug, Clone)]
pub struct TransferPricing<'a> {
    vehicles: SmallVec<[VehicleRate<'a>; 4]>,
    currency: &'a Currency,
}

impl<'a> TransferPricing<'a> {
    /// Build transfer pricing from the vehicles offered on the route.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NoVehicles`]: no vehicle was given.
    /// - [`CatalogError::DuplicateVehicle`]: a vehicle class is listed twice.
    /// - [`CatalogError::ZeroCapacity`]: a vehicle seats nobody.
    /// - [`CatalogError::NegativePrice`] / [`CatalogError::CurrencyMismatch`]: bad prices.
    pub fn new(vehicles: impl IntoIterator<Item = VehicleRate<'a>>) -> Result<Self, CatalogError> {
        let mut vehicles: SmallVec<[VehicleRate<'a>; 4]> = vehicles.into_iter().collect();
        let mut guard = CurrencyGuard::default();

        vehicles.sort_by_key(|rate| (rate.max_pax, rate.vehicle));

        for (idx, rate) in vehicles.iter().enumerate() {
            if rate.max_pax == 0 {
                return Err(CatalogError::ZeroCapacity(rate.vehicle));
            }

            if vehicles
                .iter()
                .skip(idx + 1)
                .any(|other| other.vehicle == rate.vehicle)
            {
                return Err(CatalogError::DuplicateVehicle(rate.vehicle));
            }

            guard.check(&rate.price)?;
        }

        let currency = guard.currency().ok_or(CatalogError::NoVehicles)?;

        Ok(Self { vehicles, currency })
    }

    /// Rate for a specific vehicle class.
    pub fn vehicle(&self, vehicle: VehicleClass) -> Option<&VehicleRate<'a>> {
        self.vehicles.iter().find(|rate| rate.vehicle == vehicle)
    }

    /// Smallest vehicle that seats `pax` passengers.
    pub fn vehicle_for(&self, pax: u32) -> Option<&VehicleRate<'a>> {
        self.vehicles.iter().find(|rate| rate.max_pax >= pax)
    }

    /// Largest capacity on the route.
    pub fn max_capacity(&self) -> u32 {
        self.vehicles.iter().map(|rate| rate.max_pax).max().unwrap_or(0)
    }

    /// Vehicles, sorted by capacity.
    pub fn vehicles(&self) -> &[VehicleRate<'a>] {
        &self.vehicles
    }

    /// Table currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}
