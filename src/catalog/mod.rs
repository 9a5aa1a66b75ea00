//! Calculator catalog
//!
//! The configuration provider: seeds the built-in calculator set from YAML
//! definitions embedded at compile time, and loads additional definitions
//! from a base path. There is exactly one seed source per slug; a second
//! definition for an existing slug is rejected rather than silently
//! shadowing the first.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{catalog::schema::CalculatorFixture, config::PricingConfig};

pub mod schema;

/// Errors raised while loading calculator definitions.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a calculator file.
    #[error("Failed to read calculator file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid rate format.
    #[error("Invalid rate format: {0}")]
    InvalidRate(String),

    /// Invalid multiplier format.
    #[error("Invalid multiplier format: {0}")]
    InvalidMultiplier(String),

    /// Unknown currency code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Two amounts in one definition disagree on currency.
    #[error("Currency mismatch in {slug}: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Calculator slug being loaded.
        slug: String,
        /// Currency established by earlier amounts.
        expected: String,
        /// Conflicting currency.
        found: String,
    },

    /// No amount in the definition establishes a currency.
    #[error("No priced entries in {0}; currency unknown")]
    NoCurrency(String),

    /// A second definition was supplied for an existing slug.
    #[error("Duplicate calculator slug: {0}")]
    DuplicateSlug(String),

    /// Lookup for a slug the catalog does not hold.
    #[error("Unknown calculator slug: {0}")]
    UnknownSlug(String),
}

/// Embedded default calculator definitions, one YAML document per slug.
const BUILTIN_CALCULATORS: [&str; 5] = [
    include_str!("../../fixtures/calculators/wedding-photography.yml"),
    include_str!("../../fixtures/calculators/plumbing.yml"),
    include_str!("../../fixtures/calculators/landscaping.yml"),
    include_str!("../../fixtures/calculators/pest-control.yml"),
    include_str!("../../fixtures/calculators/dog-training.yml"),
];

/// Calculator catalog: pricing configuration per slug.
#[derive(Debug, Default)]
pub struct Catalog {
    base_path: Option<PathBuf>,
    configs: FxHashMap<String, PricingConfig>,
    order: Vec<String>,
}

impl Catalog {
    /// Create an empty catalog with no base path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog that loads files from the given base path.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(base_path.into()),
            configs: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Catalog seeded with the built-in calculator set.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded definition fails to parse; with
    /// intact fixtures this does not happen.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        for source in BUILTIN_CALCULATORS {
            catalog.insert_yaml(source)?;
        }

        Ok(catalog)
    }

    /// Parse a YAML definition and insert it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document fails to parse or convert, or if
    /// its slug is already present.
    pub fn insert_yaml(&mut self, source: &str) -> Result<&mut Self, CatalogError> {
        let fixture: CalculatorFixture = serde_norway::from_str(source)?;

        self.insert(fixture.try_into_config()?)
    }

    /// Insert a pricing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateSlug`] if the slug is already
    /// present.
    pub fn insert(&mut self, config: PricingConfig) -> Result<&mut Self, CatalogError> {
        if self.configs.contains_key(&config.slug) {
            return Err(CatalogError::DuplicateSlug(config.slug));
        }

        self.order.push(config.slug.clone());
        self.configs.insert(config.slug.clone(), config);

        Ok(self)
    }

    /// Load `<base>/calculators/<slug>.yml` from the base path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or converted, or
    /// if the slug is already present.
    pub fn load(&mut self, slug: &str) -> Result<&mut Self, CatalogError> {
        let base_path = self
            .base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("./fixtures"));

        let file_path = base_path.join("calculators").join(format!("{slug}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        self.insert_yaml(&contents)
    }

    /// Look up the pricing configuration for a slug.
    pub fn get(&self, slug: &str) -> Option<&PricingConfig> {
        self.configs.get(slug)
    }

    /// Look up the pricing configuration for a slug, erroring when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownSlug`] for a slug the catalog does not
    /// hold.
    pub fn pricing_config(&self, slug: &str) -> Result<&PricingConfig, CatalogError> {
        self.get(slug)
            .ok_or_else(|| CatalogError::UnknownSlug(slug.to_string()))
    }

    /// Slugs in insertion order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of calculators held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether the catalog holds no calculators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
