//! Integration tests for reconciliation across booking families

use jiff::{Timestamp, civil::date};
use rusty_money::{
    Money,
    iso::{Currency, EUR, USD},
};
use testresult::TestResult;

use caravan::prelude::*;

fn eur(minor: i64) -> Money<'static, Currency> {
    Money::from_minor(minor, EUR)
}

fn at(seconds: i64) -> Result<Timestamp, jiff::Error> {
    Timestamp::from_second(1_746_000_000 + seconds)
}

fn open<'a>(
    product: &Product<'a>,
    request: &BookingRequest,
    agent: Option<&Agent>,
    created_at: Timestamp,
) -> TestResult<Booking<'a>> {
    let price = resolve(&product.pricing, request)?;
    let core = BookingCore::open(product, price, agent, 0, created_at)?;

    Ok(Booking::from_request(core, request, None))
}

fn into_package(booking: Booking<'static>) -> Option<PackageBooking<'static>> {
    match booking {
        Booking::Package(booking) => Some(booking),
        _ => None,
    }
}

fn into_tour(booking: Booking<'static>) -> Option<DailyTourBooking<'static>> {
    match booking {
        Booking::DailyTour(booking) => Some(booking),
        _ => None,
    }
}

fn into_transfer(booking: Booking<'static>) -> Option<TransferBooking<'static>> {
    match booking {
        Booking::Transfer(booking) => Some(booking),
        _ => None,
    }
}

fn into_yacht(booking: Booking<'static>) -> Option<YachtBooking<'static>> {
    match booking {
        Booking::Yacht(booking) => Some(booking),
        _ => None,
    }
}

struct Bookings {
    package: PackageBooking<'static>,
    tour: DailyTourBooking<'static>,
    transfer: TransferBooking<'static>,
    yacht: YachtBooking<'static>,
}

fn bookings(agent: &Agent) -> TestResult<Bookings> {
    let package = Product {
        code: "istanbul-2n".to_string(),
        name: "Istanbul Classics".to_string(),
        pricing: PriceTierTable::Package(PackagePricing::new(
            PackageTiers::LandOnly(TierLadder::new("land", [(2, eur(54_000)), (4, eur(41_000))])?),
            Default::default(),
        )?),
    };

    let tour = Product {
        code: "bosphorus".to_string(),
        name: "Bosphorus Cruise".to_string(),
        pricing: PriceTierTable::DailyTour(DailyTourPricing::new(Some(eur(4_500)), [])?),
    };

    let transfer = Product {
        code: "ist-airport".to_string(),
        name: "Airport Transfer".to_string(),
        pricing: PriceTierTable::Transfer(TransferPricing::new([VehicleRate {
            vehicle: VehicleClass::Minivan,
            max_pax: 7,
            price: eur(8_500),
        }])?),
    };

    let yacht = Product {
        code: "gulet".to_string(),
        name: "Gulet".to_string(),
        pricing: PriceTierTable::Yacht(YachtPricing::new(
            3,
            None,
            [SeasonRate {
                season: Season::October,
                months: [10].into_iter().collect(),
                day_rate: eur(165_000),
            }],
            [],
        )?),
    };

    let package = into_package(open(
        &package,
        &BookingRequest::Package(PackageRequest::new(3, None)),
        Some(agent),
        at(0)?,
    )?)
    .ok_or("expected package booking")?;

    let mut tour = into_tour(open(
        &tour,
        &BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 3,
        }),
        Some(agent),
        at(10)?,
    )?)
    .ok_or("expected tour booking")?;

    let transfer = into_transfer(open(
        &transfer,
        &BookingRequest::Transfer(TransferRequest {
            vehicle: None,
            pax: 5,
        }),
        Some(agent),
        at(20)?,
    )?)
    .ok_or("expected transfer booking")?;

    let yacht = into_yacht(open(
        &yacht,
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 10, 1),
            end: date(2025, 10, 4),
            mode: None,
            guests: None,
        }),
        Some(agent),
        at(30)?,
    )?)
    .ok_or("expected yacht booking")?;

    // Tour commission 10% of 135.00 = 13.50, paid in full
    tour.core
        .record_payment(Direction::Commission, Payment::new(eur(1_350)), at(40)?)?;

    Ok(Bookings {
        package,
        tour,
        transfer,
        yacht,
    })
}

#[test]
fn totals_do_not_depend_on_order() -> TestResult {
    let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
    let all = bookings(&agent)?;

    let forward: [&dyn Monetizable<'static>; 4] =
        [&all.package, &all.tour, &all.transfer, &all.yacht];
    let backward: [&dyn Monetizable<'static>; 4] =
        [&all.yacht, &all.transfer, &all.tour, &all.package];
    let shuffled: [&dyn Monetizable<'static>; 4] =
        [&all.tour, &all.yacht, &all.package, &all.transfer];

    let reference = aggregate(forward, EUR, &ReportFilter::default());

    for order in [backward, shuffled] {
        let report = aggregate(order, EUR, &ReportFilter::default());

        assert_eq!(report.commissions, reference.commissions);
        assert_eq!(report.agent_balances, reference.agent_balances);
        assert_eq!(report.rows, reference.rows);
    }

    // 1 230.00 + 135.00 + 85.00 + 4 950.00
    assert_eq!(reference.booking_count, 4);
    assert_eq!(
        reference
            .commissions
            .total
            .add(reference.agent_balances.total)?,
        eur(640_000)
    );
    assert_eq!(reference.commissions.paid, eur(1_350));
    assert_eq!(reference.commissions.settled, 1);
    assert_eq!(
        reference.commissions.pending,
        reference.commissions.total.sub(eur(1_350))?
    );

    Ok(())
}

#[test]
fn cancelled_and_direct_bookings_are_left_out() -> TestResult {
    let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
    let mut all = bookings(&agent)?;

    all.transfer.core.set_status(BookingStatus::Cancelled);

    let tour = Product {
        code: "bosphorus".to_string(),
        name: "Bosphorus Cruise".to_string(),
        pricing: PriceTierTable::DailyTour(DailyTourPricing::new(Some(eur(4_500)), [])?),
    };

    let direct = open(
        &tour,
        &BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 2,
        }),
        None,
        at(50)?,
    )?;

    let report = aggregate(
        [
            &all.package as &dyn Monetizable<'static>,
            &all.tour,
            &all.transfer,
            &all.yacht,
            &direct,
        ],
        EUR,
        &ReportFilter::default(),
    );

    assert_eq!(report.booking_count, 3);
    assert!(
        report
            .rows
            .iter()
            .all(|row| row.status != BookingStatus::Cancelled)
    );

    Ok(())
}

#[test]
fn rows_are_newest_first_and_filterable() -> TestResult {
    let blue = Agent::new("blue", "Blue Voyages", "10%".parse()?);
    let all = bookings(&blue)?;

    let bookings: [&dyn Monetizable<'static>; 4] =
        [&all.package, &all.tour, &all.transfer, &all.yacht];

    let report = aggregate(bookings, EUR, &ReportFilter::default());
    let families: Vec<Family> = report.rows.iter().map(|row| row.family).collect();

    assert_eq!(
        families,
        [
            Family::Yacht,
            Family::Transfer,
            Family::DailyTour,
            Family::Package
        ]
    );

    let other = Agent::new("red", "Red Sea Tours", "5%".parse()?);
    let none = aggregate(bookings, EUR, &ReportFilter::for_agent(other.id));

    assert_eq!(none.booking_count, 0);
    assert_eq!(none.commissions.total, eur(0));

    let created = at(0)?.to_zoned(jiff::tz::TimeZone::UTC).date();
    let same_day = aggregate(
        bookings,
        EUR,
        &ReportFilter::for_agent(blue.id).between(Some(created), Some(created)),
    );

    assert_eq!(same_day.booking_count, 4);

    let later = aggregate(
        bookings,
        EUR,
        &ReportFilter::default().between(created.tomorrow().ok(), None),
    );

    assert_eq!(later.booking_count, 0);

    Ok(())
}

#[test]
fn other_currencies_are_counted_not_summed() -> TestResult {
    let agent = Agent::new("blue", "Blue Voyages", "10%".parse()?);
    let all = bookings(&agent)?;

    let report = aggregate(
        [&all.package as &dyn Monetizable<'static>, &all.tour],
        USD,
        &ReportFilter::default(),
    );

    assert_eq!(report.booking_count, 0);
    assert_eq!(report.skipped_currency, 2);
    assert_eq!(report.commissions.total, Money::from_minor(0, USD));

    Ok(())
}
