//! Bookings
//!
//! Four structurally different booking families that share one money shape, exposed through
//! [`Monetizable`]. Prices, rates and obligations are frozen when the booking is opened.

use std::fmt;

use jiff::{Timestamp, civil::Date};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    catalog::Product,
    ledger::{Direction, Payment, PaymentError, PaymentLedger, PaymentOutcome},
    obligations::{BookingSnapshot, CommissionRate, ObligationError, Obligations, compute_obligations},
    pricing::{BookingRequest, PriceBasis, PriceResult, TourType},
    tiers::{ChildBand, Family, HotelCategory, VehicleClass, YachtRateMode},
};

/// Booking identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Upper-case alphanumeric tail of the id, at most `len` characters.
    fn suffix(self, len: usize) -> String {
        let simple = self.0.simple().to_string().to_ascii_uppercase();
        let skip = simple.len().saturating_sub(len);

        simple.chars().skip(skip).collect()
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Awaiting approval
    Pending,

    /// Approved, may book
    #[default]
    Active,

    /// Temporarily blocked
    Suspended,

    /// Application declined
    Rejected,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Active => "active",
            AgentStatus::Suspended => "suspended",
            AgentStatus::Rejected => "rejected",
        })
    }
}

/// Travel agent reselling the catalog at a commission.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Agent id
    pub id: AgentId,

    /// Short code used by fixtures and the CLI
    pub code: String,

    /// Company name
    pub company_name: String,

    /// Current commission rate; copied onto each new booking
    pub commission_rate: CommissionRate,

    /// Account state
    pub status: AgentStatus,
}

impl Agent {
    /// Active agent with a fresh id.
    pub fn new(
        code: impl Into<String>,
        company_name: impl Into<String>,
        commission_rate: CommissionRate,
    ) -> Self {
        Self {
            id: AgentId::new(),
            code: code.into(),
            company_name: company_name.into(),
            commission_rate,
            status: AgentStatus::Active,
        }
    }

    /// Whether the agent may create bookings.
    pub fn can_book(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// The agent a booking was made by, as it was when the booking was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRef {
    /// Agent id
    pub id: AgentId,

    /// Agent code
    pub code: String,

    /// Company name
    pub company_name: String,
}

impl From<&Agent> for AgentRef {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            code: agent.code.clone(),
            company_name: agent.company_name.clone(),
        }
    }
}

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting confirmation
    #[default]
    Pending,

    /// Confirmed by the operator
    Confirmed,

    /// Service delivered
    Completed,

    /// Cancelled; excluded from reports and closed to payments
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        })
    }
}

/// Fields every booking family carries.
#[derive(Debug, Clone)]
pub struct BookingCore<'a> {
    id: BookingId,
    reference: String,
    agent: Option<AgentRef>,
    guest_name: Option<String>,
    product_code: String,
    product_name: String,
    price: PriceResult<'a>,
    commission_rate: CommissionRate,
    obligations: Obligations<'a>,
    commission: Option<PaymentLedger<'a>>,
    balance: Option<PaymentLedger<'a>>,
    status: BookingStatus,
    created_at: Timestamp,
}

impl<'a> BookingCore<'a> {
    /// Open a booking: freeze price and rate, compute obligations, open ledgers.
    ///
    /// Direct bookings carry a zero rate and no ledgers.
    ///
    /// # Errors
    ///
    /// Returns an [`ObligationError`] if the obligations cannot be computed.
    pub fn open(
        product: &Product<'_>,
        price: PriceResult<'a>,
        agent: Option<&Agent>,
        tolerance: i64,
        created_at: Timestamp,
    ) -> Result<Self, ObligationError> {
        let id = BookingId::new();
        let commission_rate = agent.map_or(CommissionRate::ZERO, |agent| agent.commission_rate);
        let obligations =
            compute_obligations(&BookingSnapshot::new(price.total_price, commission_rate))?;

        let (reference, commission, balance) = match agent {
            Some(_) => (
                format!("AG-{}-{}", created_at.as_millisecond(), id.suffix(9)),
                Some(PaymentLedger::open(
                    Direction::Commission,
                    obligations.commission,
                    tolerance,
                    created_at,
                )),
                Some(PaymentLedger::open(
                    Direction::AgentBalance,
                    obligations.agent_owed,
                    tolerance,
                    created_at,
                )),
            ),
            None => {
                let millis = created_at.as_millisecond().to_string();
                let tail: String = millis.chars().skip(millis.len().saturating_sub(8)).collect();

                (format!("FT{tail}{}", id.suffix(8)), None, None)
            }
        };

        Ok(Self {
            id,
            reference,
            agent: agent.map(AgentRef::from),
            guest_name: None,
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            price,
            commission_rate,
            obligations,
            commission,
            balance,
            status: BookingStatus::Pending,
            created_at,
        })
    }

    /// Set the lead guest name.
    #[must_use]
    pub fn with_guest_name(mut self, guest_name: Option<String>) -> Self {
        self.guest_name = guest_name;
        self
    }

    /// Booking id.
    pub fn id(&self) -> BookingId {
        self.id
    }

    /// Human booking reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Booking agent, `None` for direct bookings.
    pub fn agent(&self) -> Option<&AgentRef> {
        self.agent.as_ref()
    }

    /// Lead guest name.
    pub fn guest_name(&self) -> Option<&str> {
        self.guest_name.as_deref()
    }

    /// Product code at booking time.
    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    /// Product name at booking time.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Resolved price.
    pub fn price(&self) -> &PriceResult<'a> {
        &self.price
    }

    /// Booking currency.
    pub fn currency(&self) -> &'a Currency {
        self.price.currency()
    }

    /// Commission rate copied at booking time.
    pub fn commission_rate(&self) -> CommissionRate {
        self.commission_rate
    }

    /// Frozen obligations.
    pub fn obligations(&self) -> &Obligations<'a> {
        &self.obligations
    }

    /// Ledger for a direction, `None` for direct bookings.
    pub fn ledger(&self, direction: Direction) -> Option<&PaymentLedger<'a>> {
        match direction {
            Direction::Commission => self.commission.as_ref(),
            Direction::AgentBalance => self.balance.as_ref(),
        }
    }

    /// Lifecycle state.
    pub fn status(&self) -> BookingStatus {
        self.status
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Record a payment on one of the booking's obligations.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Voided`]: the booking is cancelled.
    /// - [`PaymentError::ObligationNotFound`]: direct booking, no ledger in this direction.
    /// - Any ledger error from [`PaymentLedger::record_payment`].
    pub fn record_payment(
        &mut self,
        direction: Direction,
        payment: Payment<'a>,
        at: Timestamp,
    ) -> Result<PaymentOutcome<'a>, PaymentError> {
        if self.status == BookingStatus::Cancelled {
            return Err(PaymentError::Voided(self.reference.clone()));
        }

        let ledger = match direction {
            Direction::Commission => self.commission.as_mut(),
            Direction::AgentBalance => self.balance.as_mut(),
        };

        ledger
            .ok_or_else(|| PaymentError::ObligationNotFound {
                booking: self.reference.clone(),
                direction,
            })?
            .record_payment(payment, at)
    }

    /// Move to another lifecycle state.
    pub fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
    }

    /// Replace a reference that is already taken with `{reference}-{attempt}`.
    pub(crate) fn reissue_reference(&mut self, base: &str, attempt: u32) {
        self.reference = format!("{base}-{attempt}");
    }

    /// Detach both ledgers, leaving the booking with none.
    pub(crate) fn take_ledgers(
        &mut self,
    ) -> (Option<PaymentLedger<'a>>, Option<PaymentLedger<'a>>) {
        (self.commission.take(), self.balance.take())
    }

    /// Reattach ledgers and status, e.g. from a store snapshot.
    pub(crate) fn restore(
        &mut self,
        status: BookingStatus,
        commission: Option<PaymentLedger<'a>>,
        balance: Option<PaymentLedger<'a>>,
    ) {
        self.status = status;
        self.commission = commission;
        self.balance = balance;
    }
}

/// Multi-night package booking.
#[derive(Debug, Clone)]
pub struct PackageBooking<'a> {
    /// Shared booking fields
    pub core: BookingCore<'a>,

    /// Hotel category, `None` for land-only packages
    pub hotel_category: Option<HotelCategory>,

    /// Party size the tier was picked for
    pub pax_count: u32,

    /// Adults
    pub adults: u32,

    /// Children per age band
    pub children: FxHashMap<ChildBand, u32>,

    /// Arrival date
    pub travel_date: Option<Date>,
}

/// Daily tour booking.
#[derive(Debug, Clone)]
pub struct DailyTourBooking<'a> {
    /// Shared booking fields
    pub core: BookingCore<'a>,

    /// SIC or private
    pub tour_type: TourType,

    /// Party size
    pub pax: u32,

    /// Tour date
    pub tour_date: Option<Date>,
}

/// Transfer booking.
#[derive(Debug, Clone)]
pub struct TransferBooking<'a> {
    /// Shared booking fields
    pub core: BookingCore<'a>,

    /// Vehicle the transfer is operated with
    pub vehicle: VehicleClass,

    /// Passengers
    pub pax: u32,

    /// Transfer date
    pub transfer_date: Option<Date>,
}

/// Yacht charter booking.
#[derive(Debug, Clone)]
pub struct YachtBooking<'a> {
    /// Shared booking fields
    pub core: BookingCore<'a>,

    /// Embarkation date
    pub start: Date,

    /// Disembarkation date
    pub end: Date,

    /// Rate table used
    pub mode: YachtRateMode,

    /// Guests on board
    pub guests: Option<u32>,
}

/// The money shape shared by every booking family.
pub trait Monetizable<'a> {
    /// Shared booking fields.
    fn core(&self) -> &BookingCore<'a>;

    /// Booking family.
    fn family(&self) -> Family;

    /// Name of the booked service.
    fn service_name(&self) -> &str;

    /// Total price.
    fn total_price(&self) -> Money<'a, Currency> {
        self.core().price().total_price
    }

    /// Commission owed to the agent.
    fn commission_amount(&self) -> Money<'a, Currency> {
        self.core().obligations().commission
    }

    /// Commission paid to the agent so far.
    fn paid_amount(&self) -> Money<'a, Currency> {
        paid_in(self.core(), Direction::Commission)
    }

    /// When the commission was settled.
    fn fully_paid_at(&self) -> Option<Timestamp> {
        self.core()
            .ledger(Direction::Commission)
            .and_then(PaymentLedger::fully_paid_at)
    }

    /// Balance owed by the agent.
    fn agent_owed_amount(&self) -> Money<'a, Currency> {
        self.core().obligations().agent_owed
    }

    /// Balance paid by the agent so far.
    fn agent_paid_amount(&self) -> Money<'a, Currency> {
        paid_in(self.core(), Direction::AgentBalance)
    }

    /// When the agent balance was settled.
    fn agent_fully_paid_at(&self) -> Option<Timestamp> {
        self.core()
            .ledger(Direction::AgentBalance)
            .and_then(PaymentLedger::fully_paid_at)
    }

    /// Lifecycle state.
    fn status(&self) -> BookingStatus {
        self.core().status()
    }
}

fn paid_in<'a>(core: &BookingCore<'a>, direction: Direction) -> Money<'a, Currency> {
    core.ledger(direction)
        .map_or_else(|| Money::from_minor(0, core.currency()), PaymentLedger::paid)
}

macro_rules! monetizable {
    ($booking:ident, $family:expr) => {
        impl<'a> Monetizable<'a> for $booking<'a> {
            fn core(&self) -> &BookingCore<'a> {
                &self.core
            }

            fn family(&self) -> Family {
                $family
            }

            fn service_name(&self) -> &str {
                self.core.product_name()
            }
        }
    };
}

monetizable!(PackageBooking, Family::Package);
monetizable!(DailyTourBooking, Family::DailyTour);
monetizable!(TransferBooking, Family::Transfer);
monetizable!(YachtBooking, Family::Yacht);

/// A booking of any family.
#[derive(Debug, Clone)]
pub enum Booking<'a> {
    /// Multi-night package
    Package(PackageBooking<'a>),

    /// Daily tour
    DailyTour(DailyTourBooking<'a>),

    /// Point-to-point transfer
    Transfer(TransferBooking<'a>),

    /// Yacht charter
    Yacht(YachtBooking<'a>),
}

impl<'a> Booking<'a> {
    /// Assemble a booking from its core and the request it was priced from.
    ///
    /// `travel_date` is used for package, tour and transfer bookings; charters carry their
    /// own dates.
    pub fn from_request(
        core: BookingCore<'a>,
        request: &BookingRequest,
        travel_date: Option<Date>,
    ) -> Self {
        match request {
            BookingRequest::Package(request) => Booking::Package(PackageBooking {
                hotel_category: match core.price().basis {
                    PriceBasis::PackageTier { category, .. } => category,
                    _ => request.hotel_category,
                },
                pax_count: request.pax_count,
                adults: request.adults.unwrap_or(request.pax_count),
                children: request.children.clone(),
                travel_date,
                core,
            }),
            BookingRequest::DailyTour(request) => Booking::DailyTour(DailyTourBooking {
                tour_type: request.tour_type,
                pax: request.pax,
                tour_date: travel_date,
                core,
            }),
            BookingRequest::Transfer(request) => {
                let vehicle = match core.price().basis {
                    PriceBasis::Vehicle(vehicle) => vehicle,
                    _ => request.vehicle.unwrap_or(VehicleClass::Sedan),
                };

                Booking::Transfer(TransferBooking {
                    vehicle,
                    pax: request.pax,
                    transfer_date: travel_date,
                    core,
                })
            }
            BookingRequest::Yacht(request) => {
                let mode = match core.price().basis {
                    PriceBasis::WeekRate { .. } => YachtRateMode::Weekly,
                    _ => YachtRateMode::Daily,
                };

                Booking::Yacht(YachtBooking {
                    start: request.start,
                    end: request.end,
                    mode,
                    guests: request.guests,
                    core,
                })
            }
        }
    }

    /// Mutable shared fields.
    pub fn core_mut(&mut self) -> &mut BookingCore<'a> {
        match self {
            Booking::Package(booking) => &mut booking.core,
            Booking::DailyTour(booking) => &mut booking.core,
            Booking::Transfer(booking) => &mut booking.core,
            Booking::Yacht(booking) => &mut booking.core,
        }
    }

    fn inner(&self) -> &dyn Monetizable<'a> {
        match self {
            Booking::Package(booking) => booking,
            Booking::DailyTour(booking) => booking,
            Booking::Transfer(booking) => booking,
            Booking::Yacht(booking) => booking,
        }
    }
}

impl<'a> Monetizable<'a> for Booking<'a> {
    fn core(&self) -> &BookingCore<'a> {
        self.inner().core()
    }

    fn family(&self) -> Family {
        self.inner().family()
    }

    fn service_name(&self) -> &str {
        match self {
            Booking::Package(booking) => booking.core.product_name(),
            Booking::DailyTour(booking) => booking.core.product_name(),
            Booking::Transfer(booking) => booking.core.product_name(),
            Booking::Yacht(booking) => booking.core.product_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use crate::{
        pricing::{DailyTourRequest, resolve},
        tiers::{DailyTourPricing, PriceTierTable},
    };

    use super::*;

    fn eur(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, EUR)
    }

    fn tour() -> Result<Product<'static>, crate::tiers::CatalogError> {
        Ok(Product {
            code: "bosphorus".to_string(),
            name: "Bosphorus Cruise".to_string(),
            pricing: PriceTierTable::DailyTour(DailyTourPricing::new(Some(eur(4_500)), [])?),
        })
    }

    fn request() -> BookingRequest {
        BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 4,
        })
    }

    fn booking(agent: Option<&Agent>) -> TestResult<Booking<'static>> {
        let product = tour()?;
        let request = request();
        let price = resolve(&product.pricing, &request)?;
        let core = BookingCore::open(&product, price, agent, 0, Timestamp::from_second(1_750_000_000)?)?;

        Ok(Booking::from_request(core, &request, None))
    }

    #[test]
    fn agent_booking_copies_rate_and_opens_ledgers() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let booking = booking(Some(&agent))?;

        assert_eq!(booking.family(), Family::DailyTour);
        assert_eq!(booking.total_price(), eur(18_000));
        assert_eq!(booking.commission_amount(), eur(1_800));
        assert_eq!(booking.agent_owed_amount(), eur(16_200));
        assert_eq!(booking.paid_amount(), eur(0));
        assert!(booking.core().reference().starts_with("AG-"));
        assert!(booking.core().ledger(Direction::Commission).is_some());
        assert_eq!(booking.service_name(), "Bosphorus Cruise");

        Ok(())
    }

    #[test]
    fn direct_booking_has_no_ledgers() -> TestResult {
        let mut booking = booking(None)?;

        assert_eq!(booking.commission_amount(), eur(0));
        assert_eq!(booking.agent_owed_amount(), eur(18_000));
        assert!(booking.core().reference().starts_with("FT"));

        let result = booking.core_mut().record_payment(
            Direction::Commission,
            Payment::new(eur(100)),
            Timestamp::from_second(1_750_000_100)?,
        );

        assert!(matches!(
            result,
            Err(PaymentError::ObligationNotFound { .. })
        ));

        Ok(())
    }

    #[test]
    fn cancelled_booking_rejects_payments() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let mut booking = booking(Some(&agent))?;

        booking.core_mut().set_status(BookingStatus::Cancelled);

        let result = booking.core_mut().record_payment(
            Direction::AgentBalance,
            Payment::new(eur(100)),
            Timestamp::from_second(1_750_000_100)?,
        );

        assert!(matches!(result, Err(PaymentError::Voided(_))));
        assert_eq!(booking.status(), BookingStatus::Cancelled);

        Ok(())
    }

    #[test]
    fn later_rate_change_does_not_touch_booking() -> TestResult {
        let mut agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let booking = booking(Some(&agent))?;

        agent.commission_rate = "20%".parse()?;

        assert_eq!(booking.core().commission_rate(), "10%".parse::<CommissionRate>()?);
        assert_eq!(booking.commission_amount(), eur(1_800));

        Ok(())
    }

    #[test]
    fn payments_show_through_monetizable() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let mut booking = booking(Some(&agent))?;
        let at = Timestamp::from_second(1_750_000_500)?;

        booking
            .core_mut()
            .record_payment(Direction::AgentBalance, Payment::new(eur(16_200)), at)?;

        assert_eq!(booking.agent_paid_amount(), eur(16_200));
        assert_eq!(booking.agent_fully_paid_at(), Some(at));
        assert_eq!(booking.fully_paid_at(), None);

        Ok(())
    }
}
