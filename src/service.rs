//! Booking Service
//!
//! The operations the storefront calls: quote a price, create a booking, record a payment,
//! cancel, and report. Holds the catalog, the agents and the concurrent booking store.

use jiff::{Timestamp, civil::Date};
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{Span, info, warn};

use crate::{
    bookings::{Agent, AgentStatus, Booking, BookingCore, BookingId, BookingStatus, Monetizable},
    catalog::{Catalog, CatalogLookupError},
    ledger::{Direction, Payment, PaymentError, PaymentOutcome},
    obligations::ObligationError,
    pricing::{BookingRequest, PriceResult, PricingError, resolve_for},
    reconciliation::{ReportFilter, ReportTotals, aggregate},
    store::BookingStore,
    tiers::PriceChannel,
};

/// Errors raised by the booking service.
#[derive(Debug, Error)]
pub enum BookingError {
    /// No agent with this code.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// An agent with this code is already registered.
    #[error("duplicate agent code: {0}")]
    DuplicateAgent(String),

    /// The agent's account does not allow new bookings.
    #[error("agent {agent} is {status} and cannot book")]
    AgentCannotBook {
        /// Agent code
        agent: String,
        /// Account state
        status: AgentStatus,
    },

    /// No booking with this id or reference.
    #[error("booking not found: {0}")]
    BookingNotFound(String),

    /// Wrapped catalog lookup error.
    #[error(transparent)]
    Catalog(#[from] CatalogLookupError),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped obligation error.
    #[error(transparent)]
    Obligation(#[from] ObligationError),

    /// Wrapped payment error.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// A booking to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    /// Product code
    pub product: String,

    /// Agent code, `None` for direct bookings
    pub agent: Option<String>,

    /// Family-specific request
    pub request: BookingRequest,

    /// Travel, tour or transfer date
    pub travel_date: Option<Date>,

    /// Lead guest name
    pub guest_name: Option<String>,
}

impl NewBooking {
    /// Direct booking of `product`.
    pub fn new(product: impl Into<String>, request: BookingRequest) -> Self {
        Self {
            product: product.into(),
            agent: None,
            request,
            travel_date: None,
            guest_name: None,
        }
    }

    /// Book through an agent.
    #[must_use]
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the travel date.
    #[must_use]
    pub fn on(mut self, date: Date) -> Self {
        self.travel_date = Some(date);
        self
    }
}

/// Booking service over a catalog, agents and a booking store.
#[derive(Debug)]
pub struct BookingService<'a> {
    catalog: Catalog<'a>,
    agents: FxHashMap<String, Agent>,
    store: BookingStore<'a>,
    tolerance: i64,
}

impl<'a> BookingService<'a> {
    /// Service over `catalog` with a payment tolerance in minor units.
    pub fn new(catalog: Catalog<'a>, tolerance: i64) -> Self {
        Self {
            catalog,
            agents: FxHashMap::default(),
            store: BookingStore::new(),
            tolerance,
        }
    }

    /// Register an agent.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DuplicateAgent`] if the code is taken.
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), BookingError> {
        if self.agents.contains_key(&agent.code) {
            return Err(BookingError::DuplicateAgent(agent.code));
        }

        self.agents.insert(agent.code.clone(), agent);

        Ok(())
    }

    /// Agent by code.
    pub fn agent(&self, code: &str) -> Option<&Agent> {
        self.agents.get(code)
    }

    /// Mutable agent by code. Rate changes only affect bookings created afterwards.
    pub fn agent_mut(&mut self, code: &str) -> Option<&mut Agent> {
        self.agents.get_mut(code)
    }

    /// The product catalog.
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// The booking store.
    pub fn store(&self) -> &BookingStore<'a> {
        &self.store
    }

    /// Resolve the public price of a request without booking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown or the request cannot be priced.
    pub fn quote(
        &self,
        product: &str,
        request: &BookingRequest,
    ) -> Result<PriceResult<'a>, BookingError> {
        self.quote_for(product, request, PriceChannel::Public)
    }

    /// Resolve the price of a request on a sales channel without booking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown or the request cannot be priced.
    #[tracing::instrument(
        name = "service.quote",
        skip(self, request),
        fields(product = %product, family = %request.family(), channel = ?channel),
        err
    )]
    pub fn quote_for(
        &self,
        product: &str,
        request: &BookingRequest,
        channel: PriceChannel,
    ) -> Result<PriceResult<'a>, BookingError> {
        let product = self.catalog.product(product)?;

        Ok(resolve_for(&product.pricing, request, channel)?)
    }

    /// Price and store a new booking, returning its id.
    ///
    /// # Errors
    ///
    /// - [`BookingError::UnknownAgent`] / [`BookingError::AgentCannotBook`]: agent checks.
    /// - [`BookingError::Catalog`]: unknown product.
    /// - [`BookingError::Pricing`]: the request cannot be priced.
    /// - [`BookingError::Obligation`]: obligations cannot be computed.
    #[tracing::instrument(
        name = "service.create_booking",
        skip(self, booking),
        fields(
            product = %booking.product,
            agent = booking.agent.as_deref().unwrap_or("direct"),
            reference = tracing::field::Empty
        ),
        err
    )]
    pub fn create_booking(
        &self,
        booking: NewBooking,
        at: Timestamp,
    ) -> Result<BookingId, BookingError> {
        let agent = match booking.agent.as_deref() {
            Some(code) => {
                let agent = self
                    .agents
                    .get(code)
                    .ok_or_else(|| BookingError::UnknownAgent(code.to_string()))?;

                if !agent.can_book() {
                    return Err(BookingError::AgentCannotBook {
                        agent: code.to_string(),
                        status: agent.status,
                    });
                }

                Some(agent)
            }
            None => None,
        };

        let product = self.catalog.product(&booking.product)?;
        let channel = if agent.is_some() {
            PriceChannel::Agent
        } else {
            PriceChannel::Public
        };
        let price = resolve_for(&product.pricing, &booking.request, channel)?;
        let core = BookingCore::open(product, price, agent, self.tolerance, at)?
            .with_guest_name(booking.guest_name);

        let created = Booking::from_request(core, &booking.request, booking.travel_date);

        Span::current().record("reference", created.core().reference());

        info!(
            reference = created.core().reference(),
            total = %created.total_price(),
            commission = %created.commission_amount(),
            "created booking"
        );

        Ok(self.store.insert(created))
    }

    /// Record a payment against one obligation of a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError::Payment`] if the payment is rejected; the ledger is unchanged.
    #[tracing::instrument(
        name = "service.record_payment",
        skip(self, payment),
        fields(booking = %id, direction = %direction, amount = %payment.amount),
        err(level = "warn")
    )]
    pub fn record_payment(
        &self,
        id: BookingId,
        direction: Direction,
        payment: Payment<'a>,
        at: Timestamp,
    ) -> Result<PaymentOutcome<'a>, BookingError> {
        let outcome = self.store.record_payment(id, direction, payment, at)?;

        info!(
            paid = %outcome.paid,
            remaining = %outcome.remaining,
            fully_paid = outcome.fully_paid,
            "recorded payment"
        );

        Ok(outcome)
    }

    /// Re-check whether an obligation is settled. Idempotent.
    pub fn settle_if_paid(
        &self,
        id: BookingId,
        direction: Direction,
        at: Timestamp,
    ) -> Option<Timestamp> {
        self.store.settle_if_paid(id, direction, at)
    }

    /// Cancel a booking. Its obligations are void from now on.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if no booking has the id.
    pub fn cancel_booking(&self, id: BookingId) -> Result<BookingStatus, BookingError> {
        self.set_status(id, BookingStatus::Cancelled)
    }

    /// Move a booking to another status, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if no booking has the id.
    #[tracing::instrument(name = "service.set_status", skip(self), fields(booking = %id), err)]
    pub fn set_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<BookingStatus, BookingError> {
        let previous = self
            .store
            .set_status(id, status)
            .ok_or_else(|| BookingError::BookingNotFound(id.to_string()))?;

        if previous != status {
            info!(%previous, %status, "booking status changed");
        }

        Ok(previous)
    }

    /// Booking by id.
    pub fn booking(&self, id: BookingId) -> Option<Booking<'a>> {
        self.store.get(id)
    }

    /// Booking id for a reference.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if no booking has the reference.
    pub fn find_reference(&self, reference: &str) -> Result<BookingId, BookingError> {
        self.store
            .find_reference(reference)
            .ok_or_else(|| BookingError::BookingNotFound(reference.to_string()))
    }

    /// Reconcile every stored booking in `currency`.
    pub fn report(&self, currency: &'a Currency, filter: &ReportFilter) -> ReportTotals<'a> {
        let bookings = self.store.snapshot();
        let report = aggregate(&bookings, currency, filter);

        if report.skipped_currency > 0 {
            warn!(
                skipped = report.skipped_currency,
                currency = currency.iso_alpha_code,
                "bookings in other currencies left out of report"
            );
        }

        report
    }
}
