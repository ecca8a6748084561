//! Integration tests for pricing, obligations and payments end to end

use jiff::{Timestamp, civil::date};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::EUR};
use testresult::TestResult;

use caravan::prelude::*;

fn eur(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, EUR)
}

fn at(seconds: i64) -> Result<Timestamp, jiff::Error> {
    Timestamp::from_second(1_746_000_000 + seconds)
}

fn cappadocia() -> TestResult<Product<'static>> {
    let ladder = TierLadder::new(
        "4-star",
        [(2, eur(176_500)), (4, eur(124_500)), (6, eur(102_900))],
    )?;

    let mut ladders = FxHashMap::default();
    ladders.insert(HotelCategory::FourStar, ladder);

    let mut surcharges = FxHashMap::default();
    surcharges.insert(ChildBand::Age6To10, eur(32_000));

    Ok(Product {
        code: "cappadocia-3n".to_string(),
        name: "Cappadocia Discovery 3 Nights".to_string(),
        pricing: PriceTierTable::Package(PackagePricing::new(
            PackageTiers::WithHotel(ladders),
            surcharges,
        )?),
    })
}

fn gulet() -> TestResult<Product<'static>> {
    Ok(Product {
        code: "gulet".to_string(),
        name: "Gulet Blue Cruise".to_string(),
        pricing: PriceTierTable::Yacht(YachtPricing::new(
            3,
            Some(12),
            [SeasonRate {
                season: Season::JulyAugust,
                months: [7, 8].into_iter().collect(),
                day_rate: eur(310_000),
            }],
            [WeekBandRate {
                band: WeekBand::High,
                months: [7, 8].into_iter().collect(),
                week_rate: eur(1_960_000),
            }],
        )?),
    })
}

fn service() -> TestResult<BookingService<'static>> {
    let mut catalog = Catalog::new();

    catalog.insert(cappadocia()?)?;
    catalog.insert(gulet()?)?;

    let mut service = BookingService::new(catalog, 0);

    service.add_agent(Agent::new("blue", "Blue Voyages", "10%".parse()?))?;

    Ok(service)
}

fn schmidt_family() -> BookingRequest {
    BookingRequest::Package(
        PackageRequest::new(5, Some(HotelCategory::FourStar))
            .with_adults(2)
            .with_children(ChildBand::Age6To10, 1),
    )
}

#[test]
fn package_tier_rounds_up_to_next_key() -> TestResult {
    let service = service()?;
    let price = service.quote("cappadocia-3n", &schmidt_family())?;

    assert_eq!(
        price.basis,
        PriceBasis::PackageTier {
            tier: 6,
            category: Some(HotelCategory::FourStar)
        }
    );
    assert_eq!(price.unit_price, eur(102_900));
    assert_eq!(price.total_price, eur(237_800));

    Ok(())
}

#[test]
fn agent_booking_splits_commission_and_balance() -> TestResult {
    let service = service()?;
    let id = service.create_booking(
        NewBooking::new("cappadocia-3n", schmidt_family())
            .with_agent("blue")
            .on(date(2025, 6, 14)),
        at(0)?,
    )?;

    let booking = service.booking(id).ok_or("booking missing")?;

    assert_eq!(booking.family(), Family::Package);
    assert_eq!(booking.commission_amount(), eur(23_780));
    assert_eq!(booking.agent_owed_amount(), eur(214_020));
    assert_eq!(
        booking.commission_amount().add(booking.agent_owed_amount())?,
        booking.total_price()
    );

    Ok(())
}

#[test]
fn overpayment_is_rejected_without_side_effects() -> TestResult {
    let service = service()?;
    let id = service.create_booking(
        NewBooking::new("cappadocia-3n", schmidt_family()).with_agent("blue"),
        at(0)?,
    )?;

    service.record_payment(id, Direction::Commission, Payment::new(eur(20_000)), at(10)?)?;

    let result =
        service.record_payment(id, Direction::Commission, Payment::new(eur(5_000)), at(20)?);

    assert!(matches!(
        result,
        Err(BookingError::Payment(PaymentError::Overpayment { .. }))
    ));

    let booking = service.booking(id).ok_or("booking missing")?;
    let ledger = booking
        .core()
        .ledger(Direction::Commission)
        .ok_or("ledger missing")?;

    assert_eq!(booking.paid_amount(), eur(20_000));
    assert_eq!(ledger.entries().len(), 1);
    assert_eq!(ledger.status(), PaymentStatus::Partial);
    assert_eq!(booking.fully_paid_at(), None);

    Ok(())
}

#[test]
fn final_payment_settles_once() -> TestResult {
    let service = service()?;
    let id = service.create_booking(
        NewBooking::new("cappadocia-3n", schmidt_family()).with_agent("blue"),
        at(0)?,
    )?;

    service.record_payment(id, Direction::AgentBalance, Payment::new(eur(100_000)), at(10)?)?;

    let outcome = service.record_payment(
        id,
        Direction::AgentBalance,
        Payment::new(eur(114_020)),
        at(20)?,
    )?;

    assert!(outcome.fully_paid);
    assert_eq!(outcome.fully_paid_at, Some(at(20)?));
    assert_eq!(outcome.remaining, eur(0));

    // Re-checking later does not move the settlement time
    assert_eq!(
        service.settle_if_paid(id, Direction::AgentBalance, at(99)?),
        Some(at(20)?)
    );

    let result =
        service.record_payment(id, Direction::AgentBalance, Payment::new(eur(1)), at(30)?);

    assert!(matches!(
        result,
        Err(BookingError::Payment(PaymentError::Overpayment { .. }))
    ));

    Ok(())
}

#[test]
fn non_positive_payments_are_rejected() -> TestResult {
    let service = service()?;
    let id = service.create_booking(
        NewBooking::new("cappadocia-3n", schmidt_family()).with_agent("blue"),
        at(0)?,
    )?;

    for amount in [0, -500] {
        let result =
            service.record_payment(id, Direction::Commission, Payment::new(eur(amount)), at(5)?);

        assert!(matches!(
            result,
            Err(BookingError::Payment(PaymentError::NonPositiveAmount(_)))
        ));
    }

    Ok(())
}

#[test]
fn yacht_charter_uses_started_weeks() -> TestResult {
    let service = service()?;

    let weekly = service.quote(
        "gulet",
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 7, 5),
            end: date(2025, 7, 15),
            mode: Some(YachtRateMode::Weekly),
            guests: Some(8),
        }),
    )?;

    assert_eq!(
        weekly.basis,
        PriceBasis::WeekRate {
            band: WeekBand::High,
            weeks: 2
        }
    );
    assert_eq!(weekly.total_price, eur(3_920_000));

    let daily = service.quote(
        "gulet",
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 7, 5),
            end: date(2025, 7, 9),
            mode: None,
            guests: None,
        }),
    )?;

    assert_eq!(daily.total_price, eur(1_240_000));

    Ok(())
}

#[test]
fn yacht_charter_limits_are_enforced() -> TestResult {
    let service = service()?;

    let short = service.quote(
        "gulet",
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 7, 5),
            end: date(2025, 7, 6),
            mode: None,
            guests: None,
        }),
    );

    assert!(matches!(
        short,
        Err(BookingError::Pricing(PricingError::BelowMinimumDuration {
            days: 1,
            min_days: 3
        }))
    ));

    let crowded = service.quote(
        "gulet",
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 7, 5),
            end: date(2025, 7, 12),
            mode: None,
            guests: Some(14),
        }),
    );

    assert!(matches!(
        crowded,
        Err(BookingError::Pricing(PricingError::CapacityExceeded {
            pax: 14,
            capacity: 12
        }))
    ));

    let winter = service.quote(
        "gulet",
        &BookingRequest::Yacht(YachtRequest {
            start: date(2025, 1, 5),
            end: date(2025, 1, 12),
            mode: None,
            guests: None,
        }),
    );

    assert!(matches!(
        winter,
        Err(BookingError::Pricing(PricingError::OutOfSeason(1)))
    ));

    Ok(())
}

#[test]
fn request_for_wrong_family_is_rejected() -> TestResult {
    let service = service()?;

    let result = service.quote(
        "gulet",
        &BookingRequest::DailyTour(DailyTourRequest {
            tour_type: TourType::Sic,
            pax: 2,
        }),
    );

    assert!(matches!(
        result,
        Err(BookingError::Pricing(PricingError::FamilyMismatch {
            product: Family::Yacht,
            request: Family::DailyTour
        }))
    ));

    Ok(())
}
