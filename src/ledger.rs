//! Payment Ledger
//!
//! Append-only record of payments against one obligation. Every booking made by an agent has
//! two independent ledgers: commission paid to the agent, and balance paid by the agent.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised while recording a payment.
#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    /// The payment would take the paid amount above the obligation.
    #[error("payment of {amount} {currency} exceeds the remaining {remaining} {currency}")]
    Overpayment {
        /// Rejected payment amount
        amount: Decimal,
        /// Amount still owed
        remaining: Decimal,
        /// Obligation currency code
        currency: &'static str,
    },

    /// Zero or negative payment amount.
    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// The booking has no obligation in this direction.
    #[error("no {direction} obligation on booking {booking}")]
    ObligationNotFound {
        /// Booking reference or id
        booking: String,
        /// Requested direction
        direction: Direction,
    },

    /// The booking was cancelled, its obligations are void.
    #[error("booking {0} is cancelled")]
    Voided(String),

    /// Payment currency differs from the obligation currency.
    #[error("payment in {found} against an obligation in {expected}")]
    CurrencyMismatch {
        /// Obligation currency code
        expected: &'static str,
        /// Payment currency code
        found: &'static str,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Which way money flows for an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Commission owed by the operator to the agent
    Commission,

    /// Balance owed by the agent to the operator
    AgentBalance,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Commission => "commission",
            Direction::AgentBalance => "agent balance",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "commission" => Ok(Direction::Commission),
            "agent_balance" | "balance" => Ok(Direction::AgentBalance),
            other => Err(format!("unknown payment direction: {other}")),
        }
    }
}

/// Payment progress of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Nothing paid yet
    Unpaid,

    /// Some, but not all, paid
    Partial,

    /// Paid in full
    FullyPaid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::FullyPaid => "paid",
        })
    }
}

/// A payment to record against an obligation.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment<'a> {
    /// Amount paid
    pub amount: Money<'a, Currency>,

    /// Payment method (bank transfer, cash, ...)
    pub method: Option<String>,

    /// Transaction reference
    pub reference: Option<String>,

    /// Free-form note
    pub note: Option<String>,

    /// Who recorded the payment
    pub recorded_by: Option<String>,
}

impl<'a> Payment<'a> {
    /// Payment of `amount` with no further details.
    pub fn new(amount: Money<'a, Currency>) -> Self {
        Self {
            amount,
            method: None,
            reference: None,
            note: None,
            recorded_by: None,
        }
    }
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEntry<'a> {
    /// Payment as submitted
    pub payment: Payment<'a>,

    /// When the payment was recorded
    pub recorded_at: Timestamp,
}

/// State of an obligation after a payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentOutcome<'a> {
    /// Total paid so far
    pub paid: Money<'a, Currency>,

    /// Amount still owed, never negative
    pub remaining: Money<'a, Currency>,

    /// Whether the obligation is settled
    pub fully_paid: bool,

    /// When the obligation was first settled
    pub fully_paid_at: Option<Timestamp>,
}

/// Payments applied against one obligation.
#[derive(Debug, Clone)]
pub struct PaymentLedger<'a> {
    direction: Direction,
    obligation: Money<'a, Currency>,
    paid: Money<'a, Currency>,
    fully_paid_at: Option<Timestamp>,
    entries: SmallVec<[PaymentEntry<'a>; 4]>,
    tolerance: i64,
}

impl<'a> PaymentLedger<'a> {
    /// Open a ledger for an obligation.
    ///
    /// `tolerance` is the rounding allowance in minor units. A zero obligation is settled
    /// the moment it is opened.
    pub fn open(
        direction: Direction,
        obligation: Money<'a, Currency>,
        tolerance: i64,
        opened_at: Timestamp,
    ) -> Self {
        let mut ledger = Self {
            direction,
            obligation,
            paid: Money::from_minor(0, obligation.currency()),
            fully_paid_at: None,
            entries: SmallVec::new(),
            tolerance: tolerance.max(0),
        };

        ledger.settle_if_paid(opened_at);
        ledger
    }

    /// Record a payment.
    ///
    /// Rejected payments leave the ledger unchanged.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::NonPositiveAmount`]: amount is zero or negative.
    /// - [`PaymentError::CurrencyMismatch`]: payment and obligation currencies differ.
    /// - [`PaymentError::Overpayment`]: the payment exceeds the remaining balance.
    pub fn record_payment(
        &mut self,
        payment: Payment<'a>,
        at: Timestamp,
    ) -> Result<PaymentOutcome<'a>, PaymentError> {
        let amount = payment.amount;

        if amount.to_minor_units() <= 0 {
            return Err(PaymentError::NonPositiveAmount(*amount.amount()));
        }

        if amount.currency() != self.obligation.currency() {
            return Err(PaymentError::CurrencyMismatch {
                expected: self.obligation.currency().iso_alpha_code,
                found: amount.currency().iso_alpha_code,
            });
        }

        let paid = self.paid.add(amount)?;
        let ceiling = self
            .obligation
            .to_minor_units()
            .saturating_add(self.tolerance);

        if paid.to_minor_units() > ceiling {
            return Err(PaymentError::Overpayment {
                amount: *amount.amount(),
                remaining: *self.remaining().amount(),
                currency: self.obligation.currency().iso_alpha_code,
            });
        }

        self.paid = paid;
        self.entries.push(PaymentEntry {
            payment,
            recorded_at: at,
        });
        self.settle_if_paid(at);

        Ok(self.outcome())
    }

    /// Mark the obligation fully paid if the paid amount covers it.
    ///
    /// Only the first call that finds the obligation covered sets the timestamp; later calls
    /// return the original one.
    pub fn settle_if_paid(&mut self, at: Timestamp) -> Option<Timestamp> {
        if self.fully_paid_at.is_none() && self.covers_obligation() {
            self.fully_paid_at = Some(at);
        }

        self.fully_paid_at
    }

    /// Amount still owed, never negative.
    pub fn remaining(&self) -> Money<'a, Currency> {
        let remaining = self
            .obligation
            .to_minor_units()
            .saturating_sub(self.paid.to_minor_units())
            .max(0);

        Money::from_minor(remaining, self.obligation.currency())
    }

    /// Paid share of the obligation; a zero obligation counts as fully paid.
    pub fn percentage_paid(&self) -> Percentage {
        let obligation = self.obligation.to_minor_units();

        if obligation == 0 {
            return Percentage::from(1.0);
        }

        Percentage::from(Decimal::from(self.paid.to_minor_units()) / Decimal::from(obligation))
    }

    /// Payment progress.
    pub fn status(&self) -> PaymentStatus {
        if self.fully_paid_at.is_some() {
            PaymentStatus::FullyPaid
        } else if self.paid.to_minor_units() == 0 {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }

    /// Current paid, remaining and settled state.
    pub fn outcome(&self) -> PaymentOutcome<'a> {
        PaymentOutcome {
            paid: self.paid,
            remaining: self.remaining(),
            fully_paid: self.is_fully_paid(),
            fully_paid_at: self.fully_paid_at,
        }
    }

    /// Direction of the obligation.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Obligation total.
    pub fn obligation(&self) -> Money<'a, Currency> {
        self.obligation
    }

    /// Total paid so far.
    pub fn paid(&self) -> Money<'a, Currency> {
        self.paid
    }

    /// When the obligation was first settled.
    pub fn fully_paid_at(&self) -> Option<Timestamp> {
        self.fully_paid_at
    }

    /// Whether the obligation is settled.
    pub fn is_fully_paid(&self) -> bool {
        self.fully_paid_at.is_some()
    }

    /// Recorded payments, oldest first.
    pub fn entries(&self) -> &[PaymentEntry<'a>] {
        &self.entries
    }

    fn covers_obligation(&self) -> bool {
        self.paid.to_minor_units()
            >= self
                .obligation
                .to_minor_units()
                .saturating_sub(self.tolerance)
    }
}
