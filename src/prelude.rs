//! Caravan prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bookings::{
        Agent, AgentId, AgentStatus, Booking, BookingCore, BookingId, BookingStatus,
        DailyTourBooking, Monetizable, PackageBooking, TransferBooking, YachtBooking,
    },
    catalog::{Catalog, CatalogLookupError, Product, ProductKey},
    fixtures::{Fixture, FixtureError},
    ledger::{Direction, Payment, PaymentError, PaymentLedger, PaymentOutcome, PaymentStatus},
    obligations::{
        BookingSnapshot, CommissionRate, ObligationError, Obligations, compute_obligations,
    },
    pricing::{
        BookingRequest, DailyTourRequest, PackageRequest, PriceBasis, PriceResult, PricingError,
        TourType, TransferRequest, YachtRequest, resolve, resolve_for,
    },
    reconciliation::{DirectionTotals, ReportFilter, ReportRow, ReportTotals, aggregate},
    service::{BookingError, BookingService, NewBooking},
    store::BookingStore,
    tiers::{
        CatalogError, ChildBand, DailyTourPricing, Family, HotelCategory, PackagePricing,
        PackageTiers, PriceChannel, PriceTierTable, Season, SeasonRate, TierLadder, TransferPricing,
        VehicleClass, VehicleRate, WeekBand, WeekBandRate, YachtPricing, YachtRateMode,
    },
};
