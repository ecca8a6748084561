//! Reconciliation
//!
//! Totals and per-row views of commission and agent-balance obligations across every booking
//! family. Aggregation only sees [`Monetizable`] and never fails: rows it cannot use are
//! skipped and counted.

use std::cmp::Reverse;

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use rusty_money::{Money, iso::Currency};

use crate::{
    bookings::{AgentId, BookingStatus, Monetizable},
    ledger::PaymentStatus,
    tiers::Family,
};

pub mod json;
pub mod table;

/// Which bookings a report covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Only bookings made by this agent
    pub agent: Option<AgentId>,

    /// Only bookings created on or after this UTC date
    pub from: Option<Date>,

    /// Only bookings created on or before this UTC date
    pub to: Option<Date>,
}

impl ReportFilter {
    /// Filter for one agent.
    pub fn for_agent(agent: AgentId) -> Self {
        Self {
            agent: Some(agent),
            ..Self::default()
        }
    }

    /// Restrict to an inclusive range of creation dates.
    #[must_use]
    pub fn between(mut self, from: Option<Date>, to: Option<Date>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    fn matches<'a, B: Monetizable<'a> + ?Sized>(&self, booking: &B) -> bool {
        let core = booking.core();

        if let Some(agent) = self.agent
            && core.agent().map(|a| a.id) != Some(agent)
        {
            return false;
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let created = utc_date(core.created_at());

        self.from.is_none_or(|from| created >= from) && self.to.is_none_or(|to| created <= to)
    }
}

fn utc_date(timestamp: Timestamp) -> Date {
    timestamp.to_zoned(TimeZone::UTC).date()
}

/// Total, paid and pending amounts for one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionTotals<'a> {
    /// Sum of obligations
    pub total: Money<'a, Currency>,

    /// Sum of paid amounts
    pub paid: Money<'a, Currency>,

    /// Sum of unpaid remainders of unsettled obligations
    pub pending: Money<'a, Currency>,

    /// Number of settled obligations
    pub settled: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    total: i64,
    paid: i64,
    pending: i64,
    settled: usize,
}

impl Accumulator {
    fn add(&mut self, obligation: i64, paid: i64, settled: bool) {
        self.total = self.total.saturating_add(obligation);
        self.paid = self.paid.saturating_add(paid);

        if settled {
            self.settled += 1;
        } else {
            self.pending = self
                .pending
                .saturating_add(obligation.saturating_sub(paid).max(0));
        }
    }

    fn finish(self, currency: &Currency) -> DirectionTotals<'_> {
        DirectionTotals {
            total: Money::from_minor(self.total, currency),
            paid: Money::from_minor(self.paid, currency),
            pending: Money::from_minor(self.pending, currency),
            settled: self.settled,
        }
    }
}

/// One booking in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow<'a> {
    /// Booking reference
    pub reference: String,

    /// Booking family
    pub family: Family,

    /// Booked service
    pub service_name: String,

    /// Agent company
    pub agent: String,

    /// Lifecycle state
    pub status: BookingStatus,

    /// Creation time
    pub created_at: Timestamp,

    /// Total price
    pub total_price: Money<'a, Currency>,

    /// Commission owed to the agent
    pub commission: Money<'a, Currency>,

    /// Commission paid so far
    pub commission_paid: Money<'a, Currency>,

    /// Commission progress
    pub commission_status: PaymentStatus,

    /// Balance owed by the agent
    pub agent_owed: Money<'a, Currency>,

    /// Balance paid so far
    pub agent_paid: Money<'a, Currency>,

    /// Balance progress
    pub agent_status: PaymentStatus,
}

/// Report over a set of bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTotals<'a> {
    /// Report currency
    pub currency: &'a Currency,

    /// Commission owed to agents
    pub commissions: DirectionTotals<'a>,

    /// Balances owed by agents
    pub agent_balances: DirectionTotals<'a>,

    /// Bookings included
    pub booking_count: usize,

    /// Bookings left out because they are in another currency
    pub skipped_currency: usize,

    /// Included bookings, newest first
    pub rows: Vec<ReportRow<'a>>,
}

/// Aggregate bookings into report totals.
///
/// Cancelled bookings and direct (agent-less) bookings are left out, as are bookings outside
/// `filter`. Bookings in another currency than `currency` are counted in
/// [`ReportTotals::skipped_currency`]. Totals are plain sums and do not depend on order.
pub fn aggregate<'a, 'b, B>(
    bookings: impl IntoIterator<Item = &'b B>,
    currency: &'a Currency,
    filter: &ReportFilter,
) -> ReportTotals<'a>
where
    'a: 'b,
    B: Monetizable<'a> + ?Sized + 'b,
{
    let mut commissions = Accumulator::default();
    let mut balances = Accumulator::default();
    let mut skipped_currency = 0;
    let mut rows = Vec::new();

    for booking in bookings {
        if booking.status() == BookingStatus::Cancelled || !filter.matches(booking) {
            continue;
        }

        let Some(agent) = booking.core().agent() else {
            continue;
        };

        if booking.total_price().currency() != currency {
            skipped_currency += 1;
            continue;
        }

        let commission = booking.commission_amount();
        let commission_paid = booking.paid_amount();
        let commission_settled = booking.fully_paid_at().is_some();
        let agent_owed = booking.agent_owed_amount();
        let agent_paid = booking.agent_paid_amount();
        let agent_settled = booking.agent_fully_paid_at().is_some();

        commissions.add(
            commission.to_minor_units(),
            commission_paid.to_minor_units(),
            commission_settled,
        );
        balances.add(
            agent_owed.to_minor_units(),
            agent_paid.to_minor_units(),
            agent_settled,
        );

        rows.push(ReportRow {
            reference: booking.core().reference().to_string(),
            family: booking.family(),
            service_name: booking.service_name().to_string(),
            agent: agent.company_name.clone(),
            status: booking.status(),
            created_at: booking.core().created_at(),
            total_price: booking.total_price(),
            commission,
            commission_paid,
            commission_status: payment_status(commission_paid, commission_settled),
            agent_owed,
            agent_paid,
            agent_status: payment_status(agent_paid, agent_settled),
        });
    }

    rows.sort_by(|a, b| {
        Reverse(a.created_at)
            .cmp(&Reverse(b.created_at))
            .then_with(|| a.reference.cmp(&b.reference))
    });

    ReportTotals {
        currency,
        commissions: commissions.finish(currency),
        agent_balances: balances.finish(currency),
        booking_count: rows.len(),
        skipped_currency,
        rows,
    }
}

fn payment_status(paid: Money<'_, Currency>, settled: bool) -> PaymentStatus {
    if settled {
        PaymentStatus::FullyPaid
    } else if paid.to_minor_units() == 0 {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use crate::{
        bookings::{Agent, Booking, BookingCore},
        catalog::Product,
        ledger::{Direction, Payment},
        pricing::{BookingRequest, DailyTourRequest, TourType, resolve},
        tiers::{DailyTourPricing, PriceTierTable},
    };

    use super::*;

    fn at(seconds: i64) -> Result<Timestamp, jiff::Error> {
        Timestamp::from_second(1_750_000_000 + seconds)
    }

    fn tour_booking(
        price_minor: i64,
        currency: &'static Currency,
        agent: Option<&Agent>,
        created: i64,
    ) -> TestResult<Booking<'static>> {
        let product = Product {
            code: "tour".to_string(),
            name: "Old City Walk".to_string(),
            pricing: PriceTierTable::DailyTour(DailyTourPricing::new(
                Some(Money::from_minor(price_minor, currency)),
                [],
            )?),
        };
        let request = BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 1,
        });
        let price = resolve(&product.pricing, &request)?;
        let core = BookingCore::open(&product, price, agent, 0, at(created)?)?;

        Ok(Booking::from_request(core, &request, None))
    }

    #[test]
    fn totals_cover_both_directions() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let mut first = tour_booking(100_000, EUR, Some(&agent), 0)?;
        let second = tour_booking(50_000, EUR, Some(&agent), 10)?;

        first.core_mut().record_payment(
            Direction::Commission,
            Payment::new(Money::from_minor(10_000, EUR)),
            at(20)?,
        )?;
        first.core_mut().record_payment(
            Direction::AgentBalance,
            Payment::new(Money::from_minor(40_000, EUR)),
            at(20)?,
        )?;

        let report = aggregate([&first, &second], EUR, &ReportFilter::default());

        assert_eq!(report.commissions.total, Money::from_minor(15_000, EUR));
        assert_eq!(report.commissions.paid, Money::from_minor(10_000, EUR));
        assert_eq!(report.commissions.pending, Money::from_minor(5_000, EUR));
        assert_eq!(report.commissions.settled, 1);
        assert_eq!(report.agent_balances.total, Money::from_minor(135_000, EUR));
        assert_eq!(report.agent_balances.paid, Money::from_minor(40_000, EUR));
        assert_eq!(report.agent_balances.pending, Money::from_minor(95_000, EUR));
        assert_eq!(report.booking_count, 2);

        Ok(())
    }

    #[test]
    fn cancelled_direct_and_foreign_bookings_are_left_out() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let kept = tour_booking(10_000, EUR, Some(&agent), 0)?;
        let mut cancelled = tour_booking(20_000, EUR, Some(&agent), 0)?;
        let direct = tour_booking(30_000, EUR, None, 0)?;
        let dollars = tour_booking(40_000, USD, Some(&agent), 0)?;

        cancelled.core_mut().set_status(BookingStatus::Cancelled);

        let report = aggregate(
            [&kept, &cancelled, &direct, &dollars],
            EUR,
            &ReportFilter::default(),
        );

        assert_eq!(report.booking_count, 1);
        assert_eq!(report.skipped_currency, 1);
        assert_eq!(report.commissions.total, Money::from_minor(1_000, EUR));

        Ok(())
    }

    #[test]
    fn empty_report_is_zero() {
        let bookings: [Booking<'static>; 0] = [];
        let report = aggregate(&bookings, EUR, &ReportFilter::default());

        assert_eq!(report.commissions.total, Money::from_minor(0, EUR));
        assert_eq!(report.agent_balances.pending, Money::from_minor(0, EUR));
        assert!(report.rows.is_empty());
    }

    #[test]
    fn rows_are_newest_first() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let older = tour_booking(10_000, EUR, Some(&agent), 0)?;
        let newer = tour_booking(10_000, EUR, Some(&agent), 86_400)?;

        let report = aggregate([&older, &newer], EUR, &ReportFilter::default());
        let references: Vec<&str> = report.rows.iter().map(|r| r.reference.as_str()).collect();

        assert_eq!(
            references,
            vec![newer.core().reference(), older.core().reference()]
        );

        Ok(())
    }

    #[test]
    fn filter_by_agent_and_period() -> TestResult {
        let blue = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let red = Agent::new("red", "Red Sails", "12%".parse()?);
        let early = tour_booking(10_000, EUR, Some(&blue), 0)?;
        let late = tour_booking(10_000, EUR, Some(&blue), 10 * 86_400)?;
        let other = tour_booking(10_000, EUR, Some(&red), 0)?;

        let day_of = |seconds: i64| -> Result<Date, jiff::Error> { Ok(utc_date(at(seconds)?)) };

        let filter = ReportFilter::for_agent(blue.id).between(Some(day_of(0)?), Some(day_of(0)?));
        let report = aggregate([&early, &late, &other], EUR, &filter);

        assert_eq!(report.booking_count, 1);
        assert_eq!(
            report.rows.first().map(|r| r.reference.as_str()),
            Some(early.core().reference())
        );

        Ok(())
    }
}
