//! Caravan
//!
//! Caravan is a booking core for tour operators: tiered pricing for packages, daily tours,
//! transfers and yacht charters, agent commission obligations, partial-payment ledgers and
//! reconciliation reports across every booking family.

pub mod bookings;
pub mod catalog;
pub mod config;
pub mod fixtures;
pub mod ledger;
pub mod obligations;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod reconciliation;
pub mod service;
pub mod store;
pub mod tiers;
