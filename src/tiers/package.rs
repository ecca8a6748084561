//! Package tier tables

use std::{fmt, str::FromStr};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use super::{CatalogError, CurrencyGuard};

/// Hotel standard a package is sold with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelCategory {
    /// 3★
    ThreeStar,

    /// 4★
    FourStar,

    /// 5★
    FiveStar,
}

impl fmt::Display for HotelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HotelCategory::ThreeStar => "3-star",
            HotelCategory::FourStar => "4-star",
            HotelCategory::FiveStar => "5-star",
        })
    }
}

impl FromStr for HotelCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3" | "3-star" | "three_star" | "threestar" => Ok(HotelCategory::ThreeStar),
            "4" | "4-star" | "four_star" | "fourstar" => Ok(HotelCategory::FourStar),
            "5" | "5-star" | "five_star" | "fivestar" => Ok(HotelCategory::FiveStar),
            other => Err(format!("unknown hotel category: {other}")),
        }
    }
}

/// Child age band with its own flat surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildBand {
    /// Children aged 3 to 5
    #[serde(rename = "age3_to5")]
    Age3To5,

    /// Children aged 6 to 10
    #[serde(rename = "age6_to10")]
    Age6To10,
}

impl fmt::Display for ChildBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChildBand::Age3To5 => "3-5",
            ChildBand::Age6To10 => "6-10",
        })
    }
}

impl FromStr for ChildBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3-5" | "age3_to5" => Ok(ChildBand::Age3To5),
            "6-10" | "age6_to10" => Ok(ChildBand::Age6To10),
            other => Err(format!("unknown child band: {other}")),
        }
    }
}

/// Per-person prices keyed by the largest party size each price is quoted for.
///
/// Tiers are kept sorted by key. A key of `9` reads as "per person, for 9 or fewer".
#[derive(Debug, Clone)]
pub struct TierLadder<'a> {
    tiers: SmallVec<[(u32, Money<'a, Currency>); 8]>,
}

impl<'a> TierLadder<'a> {
    /// Build a ladder from `(pax, per-person price)` pairs in any order.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::EmptyTiers`]: no tiers were given.
    /// - [`CatalogError::ZeroTierKey`]: a tier is keyed at zero passengers.
    /// - [`CatalogError::DuplicateTier`]: the same key appears twice.
    /// - [`CatalogError::NegativePrice`] / [`CatalogError::CurrencyMismatch`]: bad prices.
    pub fn new(
        label: &str,
        tiers: impl IntoIterator<Item = (u32, Money<'a, Currency>)>,
    ) -> Result<Self, CatalogError> {
        let mut tiers: SmallVec<[(u32, Money<'a, Currency>); 8]> = tiers.into_iter().collect();

        if tiers.is_empty() {
            return Err(CatalogError::EmptyTiers(label.to_string()));
        }

        tiers.sort_by_key(|(pax, _)| *pax);

        let mut guard = CurrencyGuard::default();
        let mut previous = None;

        for (pax, price) in &tiers {
            if *pax == 0 {
                return Err(CatalogError::ZeroTierKey);
            }

            if previous == Some(*pax) {
                return Err(CatalogError::DuplicateTier(*pax));
            }

            guard.check(price)?;
            previous = Some(*pax);
        }

        Ok(Self { tiers })
    }

    /// Tier applying to a party of `pax` people, as `(tier key, per-person price)`.
    ///
    /// Picks the exact key if present, otherwise the smallest key above `pax`. Parties
    /// larger than the biggest tier get the biggest tier's price.
    pub fn tier_for(&self, pax: u32) -> Option<(u32, Money<'a, Currency>)> {
        self.tiers
            .iter()
            .find(|(key, _)| *key >= pax)
            .or_else(|| self.tiers.last())
            .copied()
    }

    /// All tiers, sorted by key.
    pub fn tiers(&self) -> &[(u32, Money<'a, Currency>)] {
        &self.tiers
    }
}

/// Package tier shapes.
#[derive(Debug, Clone)]
pub enum PackageTiers<'a> {
    /// Hotel-inclusive package with one ladder per hotel category
    WithHotel(FxHashMap<HotelCategory, TierLadder<'a>>),

    /// Land services only, one ladder regardless of hotel
    LandOnly(TierLadder<'a>),
}

impl<'a> PackageTiers<'a> {
    fn ladder(&self, category: Option<HotelCategory>) -> Option<&TierLadder<'a>> {
        match self {
            PackageTiers::LandOnly(ladder) => Some(ladder),
            PackageTiers::WithHotel(ladders) => category.and_then(|c| ladders.get(&c)),
        }
    }

    fn check_currency(&self, guard: &mut CurrencyGuard<'a>) -> Result<(), CatalogError> {
        let ladders: Vec<&TierLadder<'a>> = match self {
            PackageTiers::WithHotel(ladders) => {
                if ladders.is_empty() {
                    return Err(CatalogError::EmptyTiers("hotel categories".to_string()));
                }

                ladders.values().collect()
            }
            PackageTiers::LandOnly(ladder) => vec![ladder],
        };

        for ladder in ladders {
            for (_, price) in ladder.tiers() {
                guard.check(price)?;
            }
        }

        Ok(())
    }
}

/// Which of a package's tier sets a price is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriceChannel {
    /// Public tiers, for direct bookings
    #[default]
    Public,

    /// Agent (B2B) tiers, falling back to the public tiers when the package has none
    Agent,
}

/// Pricing for a multi-night package.
#[derive(Debug, Clone)]
pub struct PackagePricing<'a> {
    tiers: PackageTiers<'a>,
    agent_tiers: Option<PackageTiers<'a>>,
    child_surcharges: FxHashMap<ChildBand, Money<'a, Currency>>,
    currency: &'a Currency,
}

impl<'a> PackagePricing<'a> {
    /// Build package pricing.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if no ladder exists or if prices mix currencies.
    pub fn new(
        tiers: PackageTiers<'a>,
        child_surcharges: FxHashMap<ChildBand, Money<'a, Currency>>,
    ) -> Result<Self, CatalogError> {
        let mut guard = CurrencyGuard::default();

        tiers.check_currency(&mut guard)?;

        for price in child_surcharges.values() {
            guard.check(price)?;
        }

        let currency = guard
            .currency()
            .ok_or_else(|| CatalogError::EmptyTiers("package".to_string()))?;

        Ok(Self {
            tiers,
            agent_tiers: None,
            child_surcharges,
            currency,
        })
    }

    /// Add the tiers agents are charged, in the public tiers' currency and hotel shape.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MismatchedAgentTiers`]: the shape differs from the public tiers.
    /// - [`CatalogError::CurrencyMismatch`] / [`CatalogError::NegativePrice`]: bad prices.
    pub fn with_agent_tiers(mut self, tiers: PackageTiers<'a>) -> Result<Self, CatalogError> {
        let land_only = matches!(self.tiers, PackageTiers::LandOnly(_));

        if matches!(tiers, PackageTiers::LandOnly(_)) != land_only {
            return Err(CatalogError::MismatchedAgentTiers);
        }

        let mut guard = CurrencyGuard {
            currency: Some(self.currency),
        };

        tiers.check_currency(&mut guard)?;
        self.agent_tiers = Some(tiers);

        Ok(self)
    }

    /// Public ladder for the requested hotel category.
    ///
    /// Land-only packages ignore the category. Returns `None` if a hotel package has no
    /// ladder for the category, or no category was given.
    pub fn ladder(&self, category: Option<HotelCategory>) -> Option<&TierLadder<'a>> {
        self.tiers.ladder(category)
    }

    /// Ladder for a category on a sales channel.
    ///
    /// Agents get the agent ladder for the category when there is one, and the public
    /// ladder otherwise.
    pub fn ladder_for(
        &self,
        category: Option<HotelCategory>,
        channel: PriceChannel,
    ) -> Option<&TierLadder<'a>> {
        match (channel, &self.agent_tiers) {
            (PriceChannel::Agent, Some(agent_tiers)) => agent_tiers
                .ladder(category)
                .or_else(|| self.tiers.ladder(category)),
            _ => self.tiers.ladder(category),
        }
    }

    /// Whether agents are charged from their own tiers.
    pub fn has_agent_tiers(&self) -> bool {
        self.agent_tiers.is_some()
    }

    /// Whether the package includes hotels.
    pub fn includes_hotel(&self) -> bool {
        matches!(self.tiers, PackageTiers::WithHotel(_))
    }

    /// Flat surcharge per child in the band, if the package sells that band.
    pub fn child_surcharge(&self, band: ChildBand) -> Option<Money<'a, Currency>> {
        self.child_surcharges.get(&band).copied()
    }

    /// Table currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}
