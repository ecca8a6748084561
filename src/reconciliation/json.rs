//! JSON report documents

use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use super::{DirectionTotals, ReportRow, ReportTotals};

/// Serialisable report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    /// ISO currency code
    pub currency: &'static str,

    /// Commission owed to agents
    pub commissions: TotalsDocument,

    /// Balances owed by agents
    pub agent_balances: TotalsDocument,

    /// Bookings included
    pub booking_count: usize,

    /// Bookings left out for currency
    pub skipped_currency: usize,

    /// Included bookings, newest first
    pub rows: Vec<RowDocument>,
}

/// Serialisable direction totals. Amounts are decimal strings in major units.
#[derive(Debug, Clone, Serialize)]
pub struct TotalsDocument {
    /// Sum of obligations
    pub total: String,

    /// Sum of paid amounts
    pub paid: String,

    /// Sum of unpaid remainders
    pub pending: String,

    /// Settled obligations
    pub settled: usize,
}

/// Serialisable report row.
#[derive(Debug, Clone, Serialize)]
pub struct RowDocument {
    /// Booking reference
    pub reference: String,

    /// Booking family
    pub family: String,

    /// Booked service
    pub service_name: String,

    /// Agent company
    pub agent: String,

    /// Lifecycle state
    pub status: String,

    /// RFC 3339 creation time
    pub created_at: String,

    /// Total price
    pub total_price: String,

    /// Commission owed
    pub commission: String,

    /// Commission paid
    pub commission_paid: String,

    /// Commission progress
    pub commission_status: String,

    /// Balance owed by the agent
    pub agent_owed: String,

    /// Balance paid by the agent
    pub agent_paid: String,

    /// Balance progress
    pub agent_status: String,
}

fn amount(money: Money<'_, Currency>) -> String {
    money.amount().to_string()
}

impl From<&DirectionTotals<'_>> for TotalsDocument {
    fn from(totals: &DirectionTotals<'_>) -> Self {
        Self {
            total: amount(totals.total),
            paid: amount(totals.paid),
            pending: amount(totals.pending),
            settled: totals.settled,
        }
    }
}

impl From<&ReportRow<'_>> for RowDocument {
    fn from(row: &ReportRow<'_>) -> Self {
        Self {
            reference: row.reference.clone(),
            family: row.family.to_string(),
            service_name: row.service_name.clone(),
            agent: row.agent.clone(),
            status: row.status.to_string(),
            created_at: row.created_at.to_string(),
            total_price: amount(row.total_price),
            commission: amount(row.commission),
            commission_paid: amount(row.commission_paid),
            commission_status: row.commission_status.to_string(),
            agent_owed: amount(row.agent_owed),
            agent_paid: amount(row.agent_paid),
            agent_status: row.agent_status.to_string(),
        }
    }
}

impl From<&ReportTotals<'_>> for ReportDocument {
    fn from(report: &ReportTotals<'_>) -> Self {
        Self {
            currency: report.currency.iso_alpha_code,
            commissions: TotalsDocument::from(&report.commissions),
            agent_balances: TotalsDocument::from(&report.agent_balances),
            booking_count: report.booking_count,
            skipped_currency: report.skipped_currency,
            rows: report.rows.iter().map(RowDocument::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use serde_json::Value;
    use testresult::TestResult;

    use crate::{
        bookings::Booking,
        reconciliation::{ReportFilter, aggregate},
    };

    use super::*;

    #[test]
    fn empty_report_serialises_zero_totals() -> TestResult {
        let bookings: [Booking<'static>; 0] = [];
        let report = aggregate(&bookings, EUR, &ReportFilter::default());
        let json = serde_json::to_value(ReportDocument::from(&report))?;

        assert_eq!(json.get("currency").and_then(Value::as_str), Some("EUR"));
        assert_eq!(
            json.pointer("/commissions/settled").and_then(Value::as_u64),
            Some(0)
        );
        assert_eq!(json.get("rows").and_then(Value::as_array).map(Vec::len), Some(0));

        Ok(())
    }
}
