//! Terminal report tables

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

use crate::{ledger::PaymentStatus, tiers::Family};

use super::{DirectionTotals, ReportTotals};

impl ReportTotals<'_> {
    /// Write the report as a table followed by a summary block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut builder = Builder::default();

        builder.push_record([
            "Reference",
            "Type",
            "Service",
            "Agent",
            "Created",
            "Total",
            "Commission",
            "Paid",
            "Agent Owes",
            "Agent Paid",
        ]);

        for row in &self.rows {
            builder.push_record([
                row.reference.clone(),
                family_label(row.family).to_string(),
                row.service_name.clone(),
                row.agent.clone(),
                row.created_at.strftime("%Y-%m-%d").to_string(),
                format!("{}", row.total_price),
                format!("{}", row.commission),
                with_status(&format!("{}", row.commission_paid), row.commission_status),
                format!("{}", row.agent_owed),
                with_status(&format!("{}", row.agent_paid), row.agent_status),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(5..10), Alignment::right());

        writeln!(out, "\n{table}")?;

        write_summary(&mut out, "Commissions", &self.commissions)?;
        write_summary(&mut out, "Agent balances", &self.agent_balances)?;

        writeln!(
            out,
            " {} bookings ({} {}); {} skipped for currency\n",
            self.booking_count,
            self.currency.iso_alpha_code,
            self.currency.name,
            self.skipped_currency
        )
    }
}

fn write_summary(
    out: &mut impl io::Write,
    label: &str,
    totals: &DirectionTotals<'_>,
) -> io::Result<()> {
    writeln!(
        out,
        " \x1b[1m{label}:\x1b[0m total {}  paid {}  pending {}  ({} settled)",
        totals.total, totals.paid, totals.pending, totals.settled
    )
}

/// Row label for a booking family.
pub fn family_label(family: Family) -> &'static str {
    match family {
        Family::Package => "Package",
        Family::DailyTour => "Daily Tour",
        Family::Transfer => "Transfer",
        Family::Yacht => "Yacht",
    }
}

fn with_status(amount: &str, status: PaymentStatus) -> String {
    match status {
        PaymentStatus::FullyPaid => format!("{amount} ✓"),
        PaymentStatus::Partial => format!("{amount} …"),
        PaymentStatus::Unpaid => amount.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;

    use crate::{
        bookings::{Agent, Booking, BookingCore},
        catalog::Product,
        pricing::{BookingRequest, TransferRequest, resolve},
        reconciliation::{ReportFilter, aggregate},
        tiers::{PriceTierTable, TransferPricing, VehicleClass, VehicleRate},
    };

    #[test]
    fn table_lists_rows_and_totals() -> TestResult {
        let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
        let product = Product {
            code: "saw-airport".to_string(),
            name: "Sabiha Gokcen Transfer".to_string(),
            pricing: PriceTierTable::Transfer(TransferPricing::new([VehicleRate {
                vehicle: VehicleClass::Sedan,
                max_pax: 3,
                price: Money::from_minor(6_000, EUR),
            }])?),
        };
        let request = BookingRequest::Transfer(TransferRequest {
            vehicle: None,
            pax: 2,
        });
        let price = resolve(&product.pricing, &request)?;
        let core = BookingCore::open(
            &product,
            price,
            Some(&agent),
            0,
            Timestamp::from_second(1_750_000_000)?,
        )?;
        let booking = Booking::from_request(core, &request, None);

        let report = aggregate([&booking], EUR, &ReportFilter::default());
        let mut out = Vec::new();

        report.write_to(&mut out)?;

        let text = String::from_utf8(out)?;

        assert!(text.contains("Sabiha Gokcen Transfer"));
        assert!(text.contains("Blue Voyages"));
        assert!(text.contains("Transfer"));
        assert!(text.contains("Commissions:"));
        assert!(text.contains("1 bookings"));

        Ok(())
    }
}
