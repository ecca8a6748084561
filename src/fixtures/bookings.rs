//! Booking Fixtures
//!
//! A booking fixture is a recorded history: bookings with their creation time, the payments
//! made against them, and an optional final status. Replaying it through a
//! [`BookingService`] rebuilds the ledgers exactly as they were recorded.

use jiff::{Timestamp, civil::Date};
use serde::Deserialize;

use crate::{
    bookings::{BookingId, BookingStatus},
    ledger::{Direction, Payment},
    pricing::{BookingRequest, DailyTourRequest, PackageRequest, TransferRequest, YachtRequest},
    service::{BookingError, BookingService, NewBooking},
    tiers::Family,
};

use super::{FixtureError, catalog::money};

/// Wrapper for bookings in YAML
#[derive(Debug, Deserialize)]
pub struct BookingsFixture {
    /// Bookings, replayed in order
    pub bookings: Vec<BookingFixture>,
}

/// Booking Fixture
#[derive(Debug, Deserialize)]
pub struct BookingFixture {
    /// Product code
    pub product: String,

    /// Agent code, absent for direct bookings
    #[serde(default)]
    pub agent: Option<String>,

    /// Lead guest name
    #[serde(default)]
    pub guest_name: Option<String>,

    /// Creation time
    pub created_at: Timestamp,

    /// Travel date
    #[serde(default)]
    pub travel_date: Option<Date>,

    /// Family-specific request, decoded against the product's family
    pub request: serde_norway::Value,

    /// Payments, in the order they were recorded
    #[serde(default)]
    pub payments: Vec<PaymentFixture>,

    /// Status after the payments were recorded
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

/// Payment Fixture
#[derive(Debug, Deserialize)]
pub struct PaymentFixture {
    /// Obligation the payment is made against
    pub direction: Direction,

    /// Amount (e.g., "200 EUR")
    pub amount: String,

    /// When the payment was recorded
    pub at: Timestamp,

    /// Payment method
    #[serde(default)]
    pub method: Option<String>,

    /// Transaction reference
    #[serde(default)]
    pub reference: Option<String>,

    /// Free-form note
    #[serde(default)]
    pub note: Option<String>,

    /// Who recorded the payment
    #[serde(default)]
    pub recorded_by: Option<String>,
}

impl PaymentFixture {
    fn into_payment<'a>(self) -> Result<Payment<'a>, FixtureError> {
        Ok(Payment {
            amount: money(&self.amount)?,
            method: self.method,
            reference: self.reference,
            note: self.note,
            recorded_by: self.recorded_by,
        })
    }
}

/// Decode a request for a product of `family`.
///
/// # Errors
///
/// Returns [`FixtureError::Yaml`] if the request does not match the family's shape.
pub fn decode_request(
    family: Family,
    request: serde_norway::Value,
) -> Result<BookingRequest, FixtureError> {
    let request = match family {
        Family::Package => BookingRequest::Package(serde_norway::from_value::<PackageRequest>(
            request,
        )?),
        Family::DailyTour => BookingRequest::DailyTour(serde_norway::from_value::<
            DailyTourRequest,
        >(request)?),
        Family::Transfer => BookingRequest::Transfer(serde_norway::from_value::<TransferRequest>(
            request,
        )?),
        Family::Yacht => {
            BookingRequest::Yacht(serde_norway::from_value::<YachtRequest>(request)?)
        }
    };

    Ok(request)
}

impl BookingsFixture {
    /// Replay every booking through `service`, returning the ids in fixture order.
    ///
    /// # Errors
    ///
    /// Returns an error if a request cannot be decoded, or the service rejects a booking,
    /// payment or status change.
    pub fn replay<'a>(self, service: &BookingService<'a>) -> Result<Vec<BookingId>, FixtureError> {
        let mut ids = Vec::with_capacity(self.bookings.len());

        for booking in self.bookings {
            let family = service
                .catalog()
                .product(&booking.product)
                .map_err(BookingError::from)?
                .family();

            let request = decode_request(family, booking.request)?;

            let id = service.create_booking(
                NewBooking {
                    product: booking.product,
                    agent: booking.agent,
                    request,
                    travel_date: booking.travel_date,
                    guest_name: booking.guest_name,
                },
                booking.created_at,
            )?;

            for payment in booking.payments {
                let direction = payment.direction;
                let at = payment.at;

                service.record_payment(id, direction, payment.into_payment()?, at)?;
            }

            if let Some(status) = booking.status {
                service.set_status(id, status)?;
            }

            ids.push(id);
        }

        Ok(ids)
    }
}
