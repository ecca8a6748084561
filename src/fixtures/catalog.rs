//! Catalog Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, TRY, USD},
};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    catalog::Product,
    obligations::CommissionRate,
    tiers::{
        ChildBand, DailyTourPricing, HotelCategory, PackagePricing, PackageTiers, PriceTierTable,
        Season, SeasonRate, TierLadder, TransferPricing, VehicleClass, VehicleRate, WeekBand,
        WeekBandRate, YachtPricing,
    },
};

use super::FixtureError;

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Map of product code -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Family-specific pricing
    pub pricing: PricingFixture,
}

/// Tier key, either a party size (`4`) or a range (`"3-4"`) stored by its upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum TierKey {
    /// Plain party size
    Pax(u32),

    /// Range written as text
    Range(String),
}

impl TierKey {
    /// Party size the tier is quoted for.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidTierKey`] if the text is not `N` or `A-B` with `A <= B`.
    pub fn upper_bound(&self) -> Result<u32, FixtureError> {
        let text = match self {
            TierKey::Pax(pax) => return Ok(*pax),
            TierKey::Range(text) => text.trim(),
        };

        let invalid = || FixtureError::InvalidTierKey(text.to_string());

        match text.split_once('-') {
            Some((low, high)) => {
                let low = low.trim().parse::<u32>().map_err(|_err| invalid())?;
                let high = high.trim().parse::<u32>().map_err(|_err| invalid())?;

                if low > high {
                    return Err(invalid());
                }

                Ok(high)
            }
            None => text.parse::<u32>().map_err(|_err| invalid()),
        }
    }
}

/// Tier ladder in YAML: tier key -> per-person price
pub type LadderFixture = FxHashMap<TierKey, String>;

/// Season day rate in YAML
#[derive(Debug, Deserialize)]
pub struct SeasonFixture {
    /// Calendar months in the season
    pub months: Vec<i8>,

    /// Price per day (e.g., "2400 EUR")
    pub rate: String,
}

/// Transfer vehicle in YAML
#[derive(Debug, Deserialize)]
pub struct VehicleFixture {
    /// Seats
    pub max_pax: u32,

    /// Price per transfer
    pub price: String,
}

/// Agent (B2B) package tiers in YAML
#[derive(Debug, Deserialize)]
pub struct AgentTiersFixture {
    /// Ladders per hotel category
    #[serde(default)]
    pub with_hotel: Option<FxHashMap<HotelCategory, LadderFixture>>,

    /// Single ladder for land-only packages
    #[serde(default)]
    pub land_only: Option<LadderFixture>,
}

/// Pricing fixture, tagged by booking family
#[derive(Debug, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PricingFixture {
    /// Multi-night package
    Package {
        /// Ladders per hotel category, for hotel-inclusive packages
        #[serde(default)]
        with_hotel: Option<FxHashMap<HotelCategory, LadderFixture>>,

        /// Single ladder, for land-only packages
        #[serde(default)]
        land_only: Option<LadderFixture>,

        /// Flat surcharge per child
        #[serde(default)]
        child_surcharges: FxHashMap<ChildBand, String>,

        /// Tiers charged to agents, in the same shape as the public tiers
        #[serde(default)]
        b2b_pricing: Option<AgentTiersFixture>,
    },

    /// Daily tour
    DailyTour {
        /// Per-person SIC price
        #[serde(default)]
        sic: Option<String>,

        /// Per-person private prices by breakpoint
        #[serde(default)]
        private: FxHashMap<u32, String>,
    },

    /// Point-to-point transfer
    Transfer {
        /// Vehicles offered on the route
        vehicles: FxHashMap<VehicleClass, VehicleFixture>,
    },

    /// Yacht charter
    Yacht {
        /// Shortest charter in days
        min_days: u32,

        /// Guest limit
        #[serde(default)]
        max_guests: Option<u32>,

        /// Day rates per season
        #[serde(default)]
        day_rates: FxHashMap<Season, SeasonFixture>,

        /// Week rates per band
        #[serde(default)]
        week_rates: FxHashMap<WeekBand, SeasonFixture>,
    },
}

impl ProductFixture {
    /// Decode into a product with the given code.
    ///
    /// # Errors
    ///
    /// Returns an error if a price, tier key or table is invalid.
    pub fn into_product<'a>(self, code: String) -> Result<Product<'a>, FixtureError> {
        let pricing = self.pricing.into_table(&code)?;

        Ok(Product {
            code,
            name: self.name,
            pricing,
        })
    }
}

impl PricingFixture {
    fn into_table<'a>(self, code: &str) -> Result<PriceTierTable<'a>, FixtureError> {
        let table = match self {
            PricingFixture::Package {
                with_hotel,
                land_only,
                child_surcharges,
                b2b_pricing,
            } => {
                let tiers = package_tiers(code, with_hotel, land_only)?;

                let surcharges = child_surcharges
                    .into_iter()
                    .map(|(band, price)| Ok((band, money(&price)?)))
                    .collect::<Result<_, FixtureError>>()?;

                let mut pricing = PackagePricing::new(tiers, surcharges)?;

                if let Some(b2b) = b2b_pricing {
                    let label = format!("{code} (b2b)");

                    pricing = pricing
                        .with_agent_tiers(package_tiers(&label, b2b.with_hotel, b2b.land_only)?)?;
                }

                PriceTierTable::Package(pricing)
            }
            PricingFixture::DailyTour { sic, private } => {
                let sic = sic.as_deref().map(money).transpose()?;
                let private = private
                    .into_iter()
                    .map(|(pax, price)| Ok((pax, money(&price)?)))
                    .collect::<Result<Vec<_>, FixtureError>>()?;

                PriceTierTable::DailyTour(DailyTourPricing::new(sic, private)?)
            }
            PricingFixture::Transfer { vehicles } => {
                let mut vehicles = vehicles
                    .into_iter()
                    .map(|(vehicle, fixture)| {
                        Ok(VehicleRate {
                            vehicle,
                            max_pax: fixture.max_pax,
                            price: money(&fixture.price)?,
                        })
                    })
                    .collect::<Result<Vec<_>, FixtureError>>()?;

                vehicles.sort_by_key(|rate| rate.vehicle);

                PriceTierTable::Transfer(TransferPricing::new(vehicles)?)
            }
            PricingFixture::Yacht {
                min_days,
                max_guests,
                day_rates,
                week_rates,
            } => {
                let day_rates = day_rates
                    .into_iter()
                    .map(|(season, fixture)| {
                        Ok(SeasonRate {
                            season,
                            months: fixture.months.iter().copied().collect::<SmallVec<_>>(),
                            day_rate: money(&fixture.rate)?,
                        })
                    })
                    .collect::<Result<Vec<_>, FixtureError>>()?;

                let week_rates = week_rates
                    .into_iter()
                    .map(|(band, fixture)| {
                        Ok(WeekBandRate {
                            band,
                            months: fixture.months.iter().copied().collect::<SmallVec<_>>(),
                            week_rate: money(&fixture.rate)?,
                        })
                    })
                    .collect::<Result<Vec<_>, FixtureError>>()?;

                PriceTierTable::Yacht(YachtPricing::new(
                    min_days, max_guests, day_rates, week_rates,
                )?)
            }
        };

        Ok(table)
    }
}

fn package_tiers<'a>(
    code: &str,
    with_hotel: Option<FxHashMap<HotelCategory, LadderFixture>>,
    land_only: Option<LadderFixture>,
) -> Result<PackageTiers<'a>, FixtureError> {
    match (with_hotel, land_only) {
        (Some(ladders), None) => Ok(PackageTiers::WithHotel(
            ladders
                .into_iter()
                .map(|(category, ladder)| {
                    Ok((category, ladder_from(&category.to_string(), ladder)?))
                })
                .collect::<Result<_, FixtureError>>()?,
        )),
        (None, Some(ladder)) => Ok(PackageTiers::LandOnly(ladder_from(code, ladder)?)),
        _ => Err(FixtureError::InvalidProduct(format!(
            "{code}: a package needs exactly one of with_hotel or land_only"
        ))),
    }
}

fn ladder_from<'a>(label: &str, ladder: LadderFixture) -> Result<TierLadder<'a>, FixtureError> {
    let tiers = ladder
        .into_iter()
        .map(|(key, price)| Ok((key.upper_bound()?, money(&price)?)))
        .collect::<Result<Vec<_>, FixtureError>>()?;

    Ok(TierLadder::new(label, tiers)?)
}

/// Parse a price string into money.
///
/// # Errors
///
/// See [`parse_price`].
pub fn money<'a>(s: &str) -> Result<Money<'a, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "1765 EUR" or "237.80 EUR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount
/// cannot be parsed as a decimal, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "EUR" => EUR,
        "USD" => USD,
        "GBP" => GBP,
        "TRY" => TRY,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Parse a commission rate string (e.g., "10%" or "12.5")
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPercentage`] if the rate is malformed or outside 0-100.
pub fn parse_rate(s: &str) -> Result<CommissionRate, FixtureError> {
    s.parse::<CommissionRate>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::tiers::{CatalogError, Family, PriceChannel};

    use super::*;

    fn package_pricing<'p, 'a>(product: &'p Product<'a>) -> Option<&'p PackagePricing<'a>> {
        match &product.pricing {
            PriceTierTable::Package(pricing) => Some(pricing),
            _ => None,
        }
    }

    #[test]
    fn parse_price_reads_major_units() -> TestResult {
        assert_eq!(parse_price("1765 EUR")?, (176_500, EUR));
        assert_eq!(parse_price("237.80 EUR")?, (23_780, EUR));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("1765EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("10 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_rate_rejects_out_of_range() {
        assert!(matches!(
            parse_rate("120%"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn tier_keys_accept_ranges() -> TestResult {
        assert_eq!(TierKey::Pax(4).upper_bound()?, 4);
        assert_eq!(TierKey::Range("5-6".to_string()).upper_bound()?, 6);
        assert_eq!(TierKey::Range("2".to_string()).upper_bound()?, 2);
        assert!(TierKey::Range("6-5".to_string()).upper_bound().is_err());
        assert!(TierKey::Range("a-b".to_string()).upper_bound().is_err());

        Ok(())
    }

    #[test]
    fn package_fixture_decodes_range_keys() -> TestResult {
        let yaml = r#"
name: Cappadocia Discovery
pricing:
  family: package
  with_hotel:
    four_star:
      "1-2": "1765 EUR"
      "3-4": "1245 EUR"
      "5-6": "1029 EUR"
  child_surcharges:
    age6_to10: "320 EUR"
"#;

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;
        let product = fixture.into_product("cappadocia".to_string())?;

        assert_eq!(product.family(), Family::Package);

        let pricing = package_pricing(&product).ok_or("expected package pricing")?;

        let ladder = pricing
            .ladder(Some(HotelCategory::FourStar))
            .ok_or("missing ladder")?;

        assert_eq!(ladder.tier_for(5), Some((6, Money::from_minor(102_900, EUR))));
        assert_eq!(
            pricing.child_surcharge(ChildBand::Age6To10),
            Some(Money::from_minor(32_000, EUR))
        );

        Ok(())
    }

    #[test]
    fn package_fixture_decodes_b2b_tiers() -> TestResult {
        let yaml = r#"
name: Istanbul Classics
pricing:
  family: package
  land_only:
    "1-2": "540 EUR"
    "3-4": "410 EUR"
  b2b_pricing:
    land_only:
      "1-2": "470 EUR"
      "3-4": "360 EUR"
"#;

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;
        let product = fixture.into_product("classics".to_string())?;
        let pricing = package_pricing(&product).ok_or("expected package pricing")?;

        let agent = pricing
            .ladder_for(None, PriceChannel::Agent)
            .and_then(|ladder| ladder.tier_for(3));
        let public = pricing
            .ladder_for(None, PriceChannel::Public)
            .and_then(|ladder| ladder.tier_for(3));

        assert!(pricing.has_agent_tiers());
        assert_eq!(agent, Some((4, Money::from_minor(36_000, EUR))));
        assert_eq!(public, Some((4, Money::from_minor(41_000, EUR))));

        Ok(())
    }

    #[test]
    fn b2b_tiers_must_match_package_shape() -> TestResult {
        let yaml = r#"
name: Istanbul Classics
pricing:
  family: package
  land_only:
    "1-2": "540 EUR"
  b2b_pricing:
    with_hotel:
      four_star:
        "1-2": "470 EUR"
"#;

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;

        assert!(matches!(
            fixture.into_product("classics".to_string()),
            Err(FixtureError::Catalog(CatalogError::MismatchedAgentTiers))
        ));

        Ok(())
    }

    #[test]
    fn package_needs_one_shape() -> TestResult {
        let yaml = r#"
name: Broken
pricing:
  family: package
"#;

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;

        assert!(matches!(
            fixture.into_product("broken".to_string()),
            Err(FixtureError::InvalidProduct(_))
        ));

        Ok(())
    }
}
