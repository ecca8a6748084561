//! Booking Store
//!
//! Concurrent in-memory store of bookings. Every obligation has its own lock, so payments on
//! different bookings, or on the two directions of one booking, never wait on each other.
//! Status changes take a write lock that payments share for reading, so a payment cannot land
//! on a booking while it is being cancelled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use dashmap::{DashMap, mapref::entry::Entry};
use jiff::Timestamp;
use tracing::warn;

use crate::{
    bookings::{Booking, BookingId, BookingStatus, Monetizable},
    ledger::{Direction, Payment, PaymentError, PaymentLedger, PaymentOutcome},
};

#[derive(Debug)]
struct StoredBooking<'a> {
    booking: Booking<'a>,
    status: RwLock<BookingStatus>,
    commission: Option<Mutex<PaymentLedger<'a>>>,
    balance: Option<Mutex<PaymentLedger<'a>>>,
}

impl<'a> StoredBooking<'a> {
    fn new(mut booking: Booking<'a>) -> Self {
        let core = booking.core_mut();
        let status = core.status();
        let (commission, balance) = core.take_ledgers();

        Self {
            booking,
            status: RwLock::new(status),
            commission: commission.map(Mutex::new),
            balance: balance.map(Mutex::new),
        }
    }

    fn ledger(&self, direction: Direction) -> Option<&Mutex<PaymentLedger<'a>>> {
        match direction {
            Direction::Commission => self.commission.as_ref(),
            Direction::AgentBalance => self.balance.as_ref(),
        }
    }

    fn status(&self) -> BookingStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Booking<'a> {
        let status = self.status();
        let commission = self.commission.as_ref().map(|ledger| lock(ledger).clone());
        let balance = self.balance.as_ref().map(|ledger| lock(ledger).clone());

        let mut booking = self.booking.clone();
        booking.core_mut().restore(status, commission, balance);
        booking
    }
}

/// Ledgers are only ever replaced by whole successful updates, so a poisoned value is intact.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concurrent booking store.
#[derive(Debug, Default)]
pub struct BookingStore<'a> {
    bookings: DashMap<BookingId, Arc<StoredBooking<'a>>>,
    references: DashMap<String, BookingId>,
}

impl<'a> BookingStore<'a> {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a booking.
    ///
    /// References stay unique: if the booking's reference is already taken it is reissued
    /// with a numeric suffix before the booking is stored.
    pub fn insert(&self, mut booking: Booking<'a>) -> BookingId {
        let id = booking.core().id();
        let base = booking.core().reference().to_string();
        let mut attempt = 1;

        loop {
            match self.references.entry(booking.core().reference().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(id);
                    break;
                }
                Entry::Occupied(_) => {
                    attempt += 1;
                    booking.core_mut().reissue_reference(&base, attempt);
                }
            }
        }

        if attempt > 1 {
            warn!(%base, reference = %booking.core().reference(), "booking reference reissued");
        }

        self.bookings.insert(id, Arc::new(StoredBooking::new(booking)));

        id
    }

    /// Booking id for a human reference.
    pub fn find_reference(&self, reference: &str) -> Option<BookingId> {
        self.references.get(reference).map(|entry| *entry.value())
    }

    /// Record a payment against one obligation of a booking.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::ObligationNotFound`]: unknown booking, or no ledger in `direction`.
    /// - [`PaymentError::Voided`]: the booking is cancelled.
    /// - Any ledger error from [`PaymentLedger::record_payment`].
    pub fn record_payment(
        &self,
        id: BookingId,
        direction: Direction,
        payment: Payment<'a>,
        at: Timestamp,
    ) -> Result<PaymentOutcome<'a>, PaymentError> {
        let stored = self.stored(id).ok_or_else(|| PaymentError::ObligationNotFound {
            booking: id.to_string(),
            direction,
        })?;

        let status = stored.status.read().unwrap_or_else(PoisonError::into_inner);

        if *status == BookingStatus::Cancelled {
            return Err(PaymentError::Voided(
                stored.booking.core().reference().to_string(),
            ));
        }

        let ledger = stored
            .ledger(direction)
            .ok_or_else(|| PaymentError::ObligationNotFound {
                booking: stored.booking.core().reference().to_string(),
                direction,
            })?;

        let outcome = lock(ledger).record_payment(payment, at);

        drop(status);

        outcome
    }

    /// Re-check whether an obligation is settled, returning when it was.
    ///
    /// Returns `None` for unknown bookings, missing ledgers and unsettled obligations.
    pub fn settle_if_paid(
        &self,
        id: BookingId,
        direction: Direction,
        at: Timestamp,
    ) -> Option<Timestamp> {
        let stored = self.stored(id)?;
        let ledger = stored.ledger(direction)?;

        lock(ledger).settle_if_paid(at)
    }

    /// Move a booking to another status, returning the previous one.
    pub fn set_status(&self, id: BookingId, status: BookingStatus) -> Option<BookingStatus> {
        let stored = self.stored(id)?;
        let mut current = stored.status.write().unwrap_or_else(PoisonError::into_inner);

        Some(std::mem::replace(&mut *current, status))
    }

    /// Consistent copy of one booking.
    pub fn get(&self, id: BookingId) -> Option<Booking<'a>> {
        self.stored(id).map(|stored| stored.snapshot())
    }

    /// Copies of every booking.
    ///
    /// Rows are read one by one without a global lock; each row is internally consistent.
    pub fn snapshot(&self) -> Vec<Booking<'a>> {
        let stored: Vec<Arc<StoredBooking<'a>>> = self
            .bookings
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        stored.iter().map(|booking| booking.snapshot()).collect()
    }

    /// Number of bookings.
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn stored(&self, id: BookingId) -> Option<Arc<StoredBooking<'a>>> {
        self.bookings.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}
