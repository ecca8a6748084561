//! Daily tour tier tables

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use super::{CatalogError, CurrencyGuard};

/// Party sizes at which private tour per-person rates are quoted.
pub const PRIVATE_BREAKPOINTS: [u32; 5] = [2, 4, 6, 8, 10];

/// Pricing for a daily tour: a shared (SIC) rate and/or private breakpoint rates.
#[derive(Debug, Clone)]
pub struct DailyTourPricing<'a> {
    sic: Option<Money<'a, Currency>>,
    private: SmallVec<[(u32, Money<'a, Currency>); 5]>,
    currency: &'a Currency,
}

impl<'a> DailyTourPricing<'a> {
    /// Build daily tour pricing.
    ///
    /// Private rates, when given, must cover every breakpoint in [`PRIVATE_BREAKPOINTS`] and
    /// must not rise as the breakpoint rises.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NoTourPricing`]: neither SIC nor private rates were given.
    /// - [`CatalogError::UnknownBreakpoint`] / [`CatalogError::IncompleteTiers`]: the
    ///   private rates do not match the breakpoints exactly.
    /// - [`CatalogError::NonMonotonicTiers`]: a larger party pays more per person.
    /// - [`CatalogError::NegativePrice`] / [`CatalogError::CurrencyMismatch`]: bad prices.
    pub fn new(
        sic: Option<Money<'a, Currency>>,
        private: impl IntoIterator<Item = (u32, Money<'a, Currency>)>,
    ) -> Result<Self, CatalogError> {
        let mut private: SmallVec<[(u32, Money<'a, Currency>); 5]> = private.into_iter().collect();
        let mut guard = CurrencyGuard::default();

        if let Some(price) = &sic {
            guard.check(price)?;
        }

        if !private.is_empty() {
            private.sort_by_key(|(pax, _)| *pax);

            for (pax, price) in &private {
                if !PRIVATE_BREAKPOINTS.contains(pax) {
                    return Err(CatalogError::UnknownBreakpoint(*pax));
                }

                guard.check(price)?;
            }

            for breakpoint in PRIVATE_BREAKPOINTS {
                if !private.iter().any(|(pax, _)| *pax == breakpoint) {
                    return Err(CatalogError::IncompleteTiers(breakpoint));
                }
            }

            if private.len() != PRIVATE_BREAKPOINTS.len() {
                let duplicate = private
                    .windows(2)
                    .find_map(|pair| match pair {
                        [(a, _), (b, _)] if a == b => Some(*a),
                        _ => None,
                    })
                    .unwrap_or_default();

                return Err(CatalogError::DuplicateTier(duplicate));
            }

            let rising = private.windows(2).find_map(|pair| match pair {
                [(lower, lower_price), (higher, higher_price)]
                    if higher_price.to_minor_units() > lower_price.to_minor_units() =>
                {
                    Some((*lower, *higher))
                }
                _ => None,
            });

            if let Some((lower, higher)) = rising {
                return Err(CatalogError::NonMonotonicTiers { lower, higher });
            }
        }

        let currency = guard.currency().ok_or(CatalogError::NoTourPricing)?;

        Ok(Self {
            sic,
            private,
            currency,
        })
    }

    /// Shared (seat-in-coach) per-person price.
    pub fn sic(&self) -> Option<Money<'a, Currency>> {
        self.sic
    }

    /// Whether private rates are sold.
    pub fn has_private(&self) -> bool {
        !self.private.is_empty()
    }

    /// Private per-person rate for a party of `pax`, as `(breakpoint, price)`.
    ///
    /// Uses the largest breakpoint not above `pax`. Parties below the smallest breakpoint
    /// have no rate.
    pub fn private_rate(&self, pax: u32) -> Option<(u32, Money<'a, Currency>)> {
        self.private
            .iter()
            .rev()
            .find(|(breakpoint, _)| *breakpoint <= pax)
            .copied()
    }

    /// Private rates, sorted by breakpoint.
    pub fn private_rates(&self) -> &[(u32, Money<'a, Currency>)] {
        &self.private
    }

    /// Table currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}
