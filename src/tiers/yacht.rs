//! Yacht charter tier tables

use std::{fmt, str::FromStr};

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use super::{CatalogError, CurrencyGuard};

/// Named charter season with its own day rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// April and May
    AprilMay,

    /// June and September
    JuneSeptember,

    /// July and August
    JulyAugust,

    /// October
    October,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Season::AprilMay => "April-May",
            Season::JuneSeptember => "June & September",
            Season::JulyAugust => "July-August",
            Season::October => "October",
        })
    }
}

/// Weekly rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekBand {
    /// Low season
    Low,

    /// Mid season
    Mid,

    /// High season
    High,
}

impl fmt::Display for WeekBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekBand::Low => "low",
            WeekBand::Mid => "mid",
            WeekBand::High => "high",
        })
    }
}

/// Whether a charter is priced by the day or by the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YachtRateMode {
    /// Seasonal day rate times days
    Daily,

    /// Weekly band rate times started weeks
    Weekly,
}

impl FromStr for YachtRateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(YachtRateMode::Daily),
            "weekly" | "week" => Ok(YachtRateMode::Weekly),
            other => Err(format!("unknown rate mode: {other}")),
        }
    }
}

/// Day rate for a season and the calendar months it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRate<'a> {
    /// Season name
    pub season: Season,

    /// Calendar months (1-12) in the season
    pub months: SmallVec<[i8; 4]>,

    /// Price per charter day
    pub day_rate: Money<'a, Currency>,
}

/// Week rate for a band and the calendar months it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekBandRate<'a> {
    /// Band name
    pub band: WeekBand,

    /// Calendar months (1-12) in the band
    pub months: SmallVec<[i8; 6]>,

    /// Price per started charter week
    pub week_rate: Money<'a, Currency>,
}

/// Pricing for a yacht charter.
#[derive(Debug, Clone)]
pub struct YachtPricing<'a> {
    min_days: u32,
    max_guests: Option<u32>,
    day_rates: SmallVec<[SeasonRate<'a>; 4]>,
    week_rates: SmallVec<[WeekBandRate<'a>; 3]>,
    currency: &'a Currency,
}

impl<'a> YachtPricing<'a> {
    /// Build yacht pricing.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ZeroMinimumDays`]: `min_days` is zero.
    /// - [`CatalogError::NoYachtRates`]: neither table has any entry.
    /// - [`CatalogError::InvalidMonth`] / [`CatalogError::OverlappingSeasons`]: the month
    ///   calendar of either table is broken.
    /// - [`CatalogError::NegativePrice`] / [`CatalogError::CurrencyMismatch`]: bad prices.
    pub fn new(
        min_days: u32,
        max_guests: Option<u32>,
        day_rates: impl IntoIterator<Item = SeasonRate<'a>>,
        week_rates: impl IntoIterator<Item = WeekBandRate<'a>>,
    ) -> Result<Self, CatalogError> {
        if min_days == 0 {
            return Err(CatalogError::ZeroMinimumDays);
        }

        let day_rates: SmallVec<[SeasonRate<'a>; 4]> = day_rates.into_iter().collect();
        let week_rates: SmallVec<[WeekBandRate<'a>; 3]> = week_rates.into_iter().collect();

        if day_rates.is_empty() && week_rates.is_empty() {
            return Err(CatalogError::NoYachtRates);
        }

        let mut guard = CurrencyGuard::default();

        check_calendar(day_rates.iter().map(|rate| rate.months.as_slice()))?;
        check_calendar(week_rates.iter().map(|rate| rate.months.as_slice()))?;

        for rate in &day_rates {
            guard.check(&rate.day_rate)?;
        }

        for rate in &week_rates {
            guard.check(&rate.week_rate)?;
        }

        let currency = guard.currency().ok_or(CatalogError::NoYachtRates)?;

        Ok(Self {
            min_days,
            max_guests,
            day_rates,
            week_rates,
            currency,
        })
    }

    /// Shortest charter sold, in days.
    pub fn min_days(&self) -> u32 {
        self.min_days
    }

    /// Most guests the yacht takes, if limited.
    pub fn max_guests(&self) -> Option<u32> {
        self.max_guests
    }

    /// Whether seasonal day rates are sold.
    pub fn has_day_rates(&self) -> bool {
        !self.day_rates.is_empty()
    }

    /// Whether weekly band rates are sold.
    pub fn has_week_rates(&self) -> bool {
        !self.week_rates.is_empty()
    }

    /// Season covering a calendar month.
    pub fn season_for(&self, month: i8) -> Option<&SeasonRate<'a>> {
        self.day_rates.iter().find(|rate| rate.months.contains(&month))
    }

    /// Week band covering a calendar month.
    pub fn band_for(&self, month: i8) -> Option<&WeekBandRate<'a>> {
        self.week_rates.iter().find(|rate| rate.months.contains(&month))
    }

    /// Table currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}

fn check_calendar<'m>(calendars: impl Iterator<Item = &'m [i8]>) -> Result<(), CatalogError> {
    let mut seen = [false; 12];

    for months in calendars {
        for &month in months {
            let slot = usize::try_from(month - 1)
                .ok()
                .and_then(|idx| seen.get_mut(idx))
                .ok_or(CatalogError::InvalidMonth(month))?;

            if *slot {
                return Err(CatalogError::OverlappingSeasons(month));
            }

            *slot = true;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    fn seasons() -> Vec<SeasonRate<'static>> {
        vec![
            SeasonRate {
                season: Season::AprilMay,
                months: smallvec![4, 5],
                day_rate: Money::from_minor(350_000, EUR),
            },
            SeasonRate {
                season: Season::JulyAugust,
                months: smallvec![7, 8],
                day_rate: Money::from_minor(450_000, EUR),
            },
        ]
    }

    #[test]
    fn season_for_matches_catalog_months() -> TestResult {
        let pricing = YachtPricing::new(7, Some(22), seasons(), [])?;

        assert_eq!(pricing.season_for(8).map(|s| s.season), Some(Season::JulyAugust));
        assert!(pricing.season_for(1).is_none());
        assert!(pricing.has_day_rates());
        assert!(!pricing.has_week_rates());

        Ok(())
    }

    #[test]
    fn rejects_month_in_two_seasons() {
        let mut rates = seasons();
        rates.push(SeasonRate {
            season: Season::October,
            months: smallvec![5, 10],
            day_rate: Money::from_minor(300_000, EUR),
        });

        let result = YachtPricing::new(7, None, rates, []);

        assert_eq!(result.err(), Some(CatalogError::OverlappingSeasons(5)));
    }

    #[test]
    fn rejects_invalid_month() {
        let result = YachtPricing::new(
            7,
            None,
            [],
            [WeekBandRate {
                band: WeekBand::High,
                months: smallvec![13],
                week_rate: Money::from_minor(2_000_000, EUR),
            }],
        );

        assert_eq!(result.err(), Some(CatalogError::InvalidMonth(13)));
    }

    #[test]
    fn requires_some_rates_and_positive_minimum() {
        assert_eq!(
            YachtPricing::new(7, None, [], []).err(),
            Some(CatalogError::NoYachtRates)
        );
        assert_eq!(
            YachtPricing::new(0, None, seasons(), []).err(),
            Some(CatalogError::ZeroMinimumDays)
        );
    }

    #[test]
    fn seasons_and_bands_are_checked_independently() -> TestResult {
        let pricing = YachtPricing::new(
            3,
            None,
            seasons(),
            [WeekBandRate {
                band: WeekBand::High,
                months: smallvec![7, 8],
                week_rate: Money::from_minor(2_800_000, EUR),
            }],
        )?;

        assert_eq!(pricing.band_for(7).map(|b| b.band), Some(WeekBand::High));

        Ok(())
    }
}
