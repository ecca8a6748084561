//! Package pricing

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::tiers::{ChildBand, HotelCategory, PackagePricing, PriceChannel};

use super::{PriceBasis, PriceResult, PricingError, times};

/// Request for a multi-night package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRequest {
    /// Party size used to pick the tier
    pub pax_count: u32,

    /// Adults paying the per-person price, defaults to `pax_count`
    #[serde(default)]
    pub adults: Option<u32>,

    /// Hotel category, ignored by land-only packages
    #[serde(default)]
    pub hotel_category: Option<HotelCategory>,

    /// Children per age band
    #[serde(default)]
    pub children: FxHashMap<ChildBand, u32>,
}

impl PackageRequest {
    /// Request for `pax_count` adults at a hotel category, without children.
    pub fn new(pax_count: u32, hotel_category: Option<HotelCategory>) -> Self {
        Self {
            pax_count,
            adults: None,
            hotel_category,
            children: FxHashMap::default(),
        }
    }

    /// Set the number of adults.
    #[must_use]
    pub fn with_adults(mut self, adults: u32) -> Self {
        self.adults = Some(adults);
        self
    }

    /// Add children in an age band.
    #[must_use]
    pub fn with_children(mut self, band: ChildBand, count: u32) -> Self {
        *self.children.entry(band).or_default() += count;
        self
    }
}

/// Price a package from its public tiers.
///
/// # Errors
///
/// See [`resolve_for`].
pub fn resolve<'a>(
    pricing: &PackagePricing<'a>,
    request: &PackageRequest,
) -> Result<PriceResult<'a>, PricingError> {
    resolve_for(pricing, request, PriceChannel::Public)
}

/// Price a package on a sales channel: tier price per adult plus flat child surcharges.
///
/// Agents are priced from the package's agent tiers when it has them.
///
/// # Errors
///
/// - [`PricingError::InvalidPax`]: `pax_count` is zero.
/// - [`PricingError::InvalidAdults`]: adults is zero or above `pax_count`.
/// - [`PricingError::UnsupportedCategory`]: no ladder for the hotel category, or children
///   in a band the package does not sell.
/// - [`PricingError::PriceOverflow`] / [`PricingError::Money`]: arithmetic failure.
pub fn resolve_for<'a>(
    pricing: &PackagePricing<'a>,
    request: &PackageRequest,
    channel: PriceChannel,
) -> Result<PriceResult<'a>, PricingError> {
    let pax = request.pax_count;

    if pax == 0 {
        return Err(PricingError::InvalidPax { pax, minimum: 1 });
    }

    let adults = request.adults.unwrap_or(pax);

    if adults == 0 || adults > pax {
        return Err(PricingError::InvalidAdults { adults, pax });
    }

    let ladder = pricing.ladder_for(request.hotel_category, channel).ok_or_else(|| {
        PricingError::UnsupportedCategory(
            request
                .hotel_category
                .map_or_else(|| "missing hotel category".to_string(), |c| c.to_string()),
        )
    })?;

    let (tier, unit_price) = ladder
        .tier_for(pax)
        .ok_or_else(|| PricingError::UnsupportedCategory(format!("{pax} pax")))?;

    let mut total = times(unit_price, adults)?;

    let mut bands: Vec<(&ChildBand, &u32)> = request
        .children
        .iter()
        .filter(|(_, count)| **count > 0)
        .collect();

    bands.sort_by_key(|(band, _)| **band);

    for (band, count) in bands {
        let surcharge = pricing
            .child_surcharge(*band)
            .ok_or_else(|| PricingError::UnsupportedCategory(format!("children aged {band}")))?;

        total = total.add(times(surcharge, *count)?)?;
    }

    let category = if pricing.includes_hotel() {
        request.hotel_category
    } else {
        None
    };

    Ok(PriceResult {
        unit_price,
        total_price: total,
        basis: PriceBasis::PackageTier { tier, category },
    })
}
