//! Transfer pricing

use serde::Deserialize;

use crate::tiers::{TransferPricing, VehicleClass};

use super::{PriceBasis, PriceResult, PricingError};

/// Request for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransferRequest {
    /// Vehicle class; the smallest vehicle that fits is used when absent
    #[serde(default)]
    pub vehicle: Option<VehicleClass>,

    /// Passengers
    pub pax: u32,
}

/// Price a transfer. The vehicle price is the total; pax only checks capacity.
///
/// # Errors
///
/// - [`PricingError::InvalidPax`]: zero passengers.
/// - [`PricingError::UnsupportedCategory`]: the route has no such vehicle.
/// - [`PricingError::CapacityExceeded`]: the party does not fit the vehicle, or any vehicle.
pub fn resolve<'a>(
    pricing: &TransferPricing<'a>,
    request: &TransferRequest,
) -> Result<PriceResult<'a>, PricingError> {
    let pax = request.pax;

    if pax == 0 {
        return Err(PricingError::InvalidPax { pax, minimum: 1 });
    }

    let rate = match request.vehicle {
        Some(vehicle) => {
            let rate = pricing
                .vehicle(vehicle)
                .ok_or_else(|| PricingError::UnsupportedCategory(vehicle.to_string()))?;

            if pax > rate.max_pax {
                return Err(PricingError::CapacityExceeded {
                    pax,
                    capacity: rate.max_pax,
                });
            }

            rate
        }
        None => pricing
            .vehicle_for(pax)
            .ok_or(PricingError::CapacityExceeded {
                pax,
                capacity: pricing.max_capacity(),
            })?,
    };

    Ok(PriceResult {
        unit_price: rate.price,
        total_price: rate.price,
        basis: PriceBasis::Vehicle(rate.vehicle),
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;

    use crate::tiers::{CatalogError, VehicleRate};

    use super::*;

    fn airport_route() -> Result<TransferPricing<'static>, CatalogError> {
        TransferPricing::new([
            VehicleRate {
                vehicle: VehicleClass::Sedan,
                max_pax: 2,
                price: Money::from_minor(5_500, EUR),
            },
            VehicleRate {
                vehicle: VehicleClass::Minivan,
                max_pax: 5,
                price: Money::from_minor(7_000, EUR),
            },
            VehicleRate {
                vehicle: VehicleClass::Minibus,
                max_pax: 10,
                price: Money::from_minor(11_000, EUR),
            },
        ])
    }

    #[test]
    fn price_does_not_depend_on_pax() -> TestResult {
        let route = airport_route()?;

        for pax in 1..=5 {
            let result = resolve(
                &route,
                &TransferRequest {
                    vehicle: Some(VehicleClass::Minivan),
                    pax,
                },
            )?;

            assert_eq!(result.total_price, Money::from_minor(7_000, EUR));
        }

        Ok(())
    }

    #[test]
    fn over_capacity_is_rejected() -> TestResult {
        let result = resolve(
            &airport_route()?,
            &TransferRequest {
                vehicle: Some(VehicleClass::Sedan),
                pax: 3,
            },
        );

        assert_eq!(
            result,
            Err(PricingError::CapacityExceeded {
                pax: 3,
                capacity: 2
            })
        );

        Ok(())
    }

    #[test]
    fn vehicle_is_chosen_when_absent() -> TestResult {
        let route = airport_route()?;
        let result = resolve(&route, &TransferRequest { vehicle: None, pax: 6 })?;

        assert_eq!(result.basis, PriceBasis::Vehicle(VehicleClass::Minibus));
        assert_eq!(
            resolve(&route, &TransferRequest { vehicle: None, pax: 11 }),
            Err(PricingError::CapacityExceeded {
                pax: 11,
                capacity: 10
            })
        );

        Ok(())
    }

    #[test]
    fn unknown_vehicle_is_unsupported() -> TestResult {
        let result = resolve(
            &airport_route()?,
            &TransferRequest {
                vehicle: Some(VehicleClass::Coach),
                pax: 20,
            },
        );

        assert_eq!(
            result,
            Err(PricingError::UnsupportedCategory("coach".to_string()))
        );

        Ok(())
    }
}
