//! Catalog

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::tiers::{Family, PriceTierTable};

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Errors raised by catalog lookups and inserts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogLookupError {
    /// No product with this code exists.
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// A product with this code was already added.
    #[error("duplicate product code: {0}")]
    DuplicateProduct(String),
}

/// A sellable product and its tier table.
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Stable product code (e.g. `"cappadocia-3n"`)
    pub code: String,

    /// Display name
    pub name: String,

    /// Pricing data
    pub pricing: PriceTierTable<'a>,
}

impl Product<'_> {
    /// Booking family of the product.
    pub fn family(&self) -> Family {
        self.pricing.family()
    }
}

/// Products, addressable by key or code.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
    codes: FxHashMap<String, ProductKey>,
}

impl<'a> Catalog<'a> {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogLookupError::DuplicateProduct`] if the code is taken.
    pub fn insert(&mut self, product: Product<'a>) -> Result<ProductKey, CatalogLookupError> {
        if self.codes.contains_key(&product.code) {
            return Err(CatalogLookupError::DuplicateProduct(product.code));
        }

        let code = product.code.clone();
        let key = self.products.insert(product);

        self.codes.insert(code, key);

        Ok(key)
    }

    /// Product by key.
    pub fn get(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Key for a product code.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogLookupError::UnknownProduct`] if no product has the code.
    pub fn key(&self, code: &str) -> Result<ProductKey, CatalogLookupError> {
        self.codes
            .get(code)
            .copied()
            .ok_or_else(|| CatalogLookupError::UnknownProduct(code.to_string()))
    }

    /// Product by code.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogLookupError::UnknownProduct`] if no product has the code.
    pub fn product(&self, code: &str) -> Result<&Product<'a>, CatalogLookupError> {
        let key = self.key(code)?;

        self.products
            .get(key)
            .ok_or_else(|| CatalogLookupError::UnknownProduct(code.to_string()))
    }

    /// All products, in insertion order of their keys.
    pub fn iter(&self) -> impl Iterator<Item = (ProductKey, &Product<'a>)> {
        self.products.iter()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
