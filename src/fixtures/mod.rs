//! Fixtures
//!
//! YAML fixture sets under `<base>/catalog`, `<base>/agents` and `<base>/bookings`, decoded
//! once into validated tier tables, agents and a replayable booking history.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    bookings::Agent,
    catalog::{Catalog, CatalogLookupError},
    service::{BookingError, BookingService},
    tiers::CatalogError,
};

pub mod agents;
pub mod bookings;
pub mod catalog;

pub use bookings::BookingsFixture;

/// Default fixture directory
pub const DEFAULT_BASE_PATH: &str = "./fixtures";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid tier key
    #[error("Invalid tier key: {0}")]
    InvalidTierKey(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product definition that cannot be decoded into a tier table
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Agent code used twice
    #[error("Duplicate agent: {0}")]
    DuplicateAgent(String),

    /// Tier table validation error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Catalog insert error
    #[error(transparent)]
    Lookup(#[from] CatalogLookupError),

    /// Booking replay error
    #[error(transparent)]
    Booking(#[from] BookingError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products decoded so far
    catalog: Catalog<'a>,

    /// Agents by code
    agents: FxHashMap<String, Agent>,

    /// Booking history to replay
    bookings: Option<BookingsFixture>,

    /// Currency for the fixture set
    currency: Option<&'a Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path(DEFAULT_BASE_PATH)
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: Catalog::new(),
            agents: FxHashMap::default(),
            bookings: None,
            currency: None,
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a table is invalid, a code is
    /// taken, or products use different currencies.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("catalog", name)?;
        let fixture: catalog::CatalogFixture = serde_norway::from_str(&contents)?;

        for (code, product_fixture) in fixture.products {
            let product = product_fixture.into_product(code)?;
            let currency = product.pricing.currency();

            // Validate currency consistency
            if let Some(existing_currency) = self.currency {
                if existing_currency != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        existing_currency.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
            } else {
                self.currency = Some(currency);
            }

            self.catalog.insert(product)?;
        }

        Ok(self)
    }

    /// Load agents from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a rate is invalid, or a code
    /// is taken.
    pub fn load_agents(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("agents", name)?;
        let fixture: agents::AgentsFixture = serde_norway::from_str(&contents)?;

        for (code, agent_fixture) in fixture.agents {
            if self.agents.contains_key(&code) {
                return Err(FixtureError::DuplicateAgent(code));
            }

            let agent = agent_fixture.into_agent(code.clone())?;

            self.agents.insert(code, agent);
        }

        Ok(self)
    }

    /// Load a booking history from a YAML fixture file
    ///
    /// The history is replayed by [`Fixture::into_service`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_bookings(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("bookings", name)?;
        let fixture: BookingsFixture = serde_norway::from_str(&contents)?;

        match &mut self.bookings {
            Some(existing) => existing.bookings.extend(fixture.bookings),
            None => self.bookings = Some(fixture),
        }

        Ok(self)
    }

    /// Load catalog, agents and bookings with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn load_set(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        self.load_catalog(name)?
            .load_agents(name)?
            .load_bookings(name)
    }

    /// Load a complete fixture set from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_set(name)?;

        Ok(fixture)
    }

    /// Get the catalog
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// Get an agent by code
    pub fn agent(&self, code: &str) -> Option<&Agent> {
        self.agents.get(code)
    }

    /// Get all agents
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'a Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Build a booking service from the fixture, replaying any loaded booking history
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be replayed.
    pub fn into_service(self, tolerance: i64) -> Result<BookingService<'a>, FixtureError> {
        let mut service = BookingService::new(self.catalog, tolerance);

        for agent in self.agents.into_values() {
            service.add_agent(agent)?;
        }

        if let Some(bookings) = self.bookings {
            bookings.replay(&service)?;
        }

        Ok(service)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
