//! Caravan command line

use std::{
    io::{self, Write},
    process::ExitCode,
};

use serde_json::json;
use thiserror::Error;
use tracing::info;

use caravan::{
    config::{Command, ConfigError, QuoteArgs, ReportArgs, Settings},
    fixtures::{Fixture, FixtureError},
    obligations::{BookingSnapshot, CommissionRate, ObligationError, compute_obligations},
    observability::init_subscriber,
    reconciliation::{ReportFilter, json::ReportDocument},
    service::BookingError,
    tiers::PriceChannel,
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Obligation(#[from] ObligationError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            // clap renders help and usage errors itself
            _ = err.print();

            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = init_subscriber(&settings.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln"
        )]
        {
            eprintln!("{err}");
        }

        return ExitCode::FAILURE;
    }

    let result = match &settings.command {
        Command::Quote(args) => quote(&settings, args),
        Command::Report(args) => report(&settings, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            #[expect(clippy::print_stderr, reason = "command errors are shown to the user")]
            {
                eprintln!("error: {err}");
            }

            ExitCode::FAILURE
        }
    }
}

fn quote(settings: &Settings, args: &QuoteArgs) -> Result<(), CliError> {
    let mut fixture = Fixture::with_base_path(&settings.fixtures);

    fixture.load_catalog(&args.set)?;

    if args.agent.is_some() {
        fixture.load_agents(&args.set)?;
    }

    let service = fixture.into_service(settings.payment_tolerance)?;

    let product = service
        .catalog()
        .product(&args.product)
        .map_err(BookingError::from)?;

    let request = args.request(product.family())?;
    let channel = if args.agent.is_some() {
        PriceChannel::Agent
    } else {
        PriceChannel::Public
    };
    let price = service.quote_for(&args.product, &request, channel)?;

    let rate = match &args.agent {
        Some(code) => {
            service
                .agent(code)
                .ok_or_else(|| BookingError::UnknownAgent(code.clone()))?
                .commission_rate
        }
        None => CommissionRate::ZERO,
    };

    let obligations = compute_obligations(&BookingSnapshot::new(price.total_price, rate))?;

    info!(product = %product.code, total = %price.total_price, "quoted");

    let mut out = io::stdout().lock();

    if args.json {
        let document = json!({
            "product": product.code,
            "name": product.name,
            "family": product.family().to_string(),
            "basis": price.basis.to_string(),
            "currency": price.currency().iso_alpha_code,
            "unit_price": price.unit_price.amount().to_string(),
            "total_price": price.total_price.amount().to_string(),
            "commission_rate": rate.to_string(),
            "commission": obligations.commission.amount().to_string(),
            "agent_owed": obligations.agent_owed.amount().to_string(),
        });

        serde_json::to_writer_pretty(&mut out, &document)?;
        writeln!(out)?;

        return Ok(());
    }

    writeln!(out, "{} ({})", product.name, product.family())?;
    writeln!(out, "  basis:       {}", price.basis)?;
    writeln!(out, "  unit price:  {}", price.unit_price)?;
    writeln!(out, "  total:       {}", price.total_price)?;

    if !rate.is_zero() {
        writeln!(out, "  commission:  {} ({rate})", obligations.commission)?;
        writeln!(out, "  agent owes:  {}", obligations.agent_owed)?;
    }

    Ok(())
}

fn report(settings: &Settings, args: &ReportArgs) -> Result<(), CliError> {
    let mut fixture = Fixture::with_base_path(&settings.fixtures);

    fixture.load_set(&args.set)?;

    let currency = fixture.currency()?;

    let mut filter = match &args.agent {
        Some(code) => ReportFilter::for_agent(
            fixture
                .agent(code)
                .ok_or_else(|| BookingError::UnknownAgent(code.clone()))?
                .id,
        ),
        None => ReportFilter::default(),
    };

    filter = filter.between(args.from, args.to);

    let service = fixture.into_service(settings.payment_tolerance)?;
    let report = service.report(currency, &filter);

    let mut out = io::stdout().lock();

    if args.json {
        serde_json::to_writer_pretty(&mut out, &ReportDocument::from(&report))?;
        writeln!(out)?;
    } else {
        report.write_to(&mut out)?;
    }

    Ok(())
}
