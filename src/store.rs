//! In-memory storage
//!
//! Users, calculators, per-user calculator customizations and captured
//! leads. Calculators are seeded from a [`Catalog`], so there is exactly one
//! canonical seed source; customizations layer on top with per-field
//! replacement semantics. Lead submission here is plain storage; transport
//! failures are the embedding application's concern.

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    breakdown::QuoteBreakdown,
    catalog::Catalog,
    config::{AddOnConfig, BasePrice, ComboRule, FieldConfig, PricingConfig},
    selection::Selection,
};

new_key_type! {
    /// User Key
    pub struct UserKey;
}

new_key_type! {
    /// Lead Key
    pub struct LeadKey;
}

/// Errors related to store lookups and lead submission.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The user key does not resolve to a registered user.
    #[error("Unknown user")]
    UnknownUser,

    /// The slug does not resolve to a registered calculator.
    #[error("Unknown calculator slug: {0}")]
    UnknownCalculator(String),

    /// A required contact field is empty.
    #[error("Contact is missing a {0}")]
    InvalidContact(&'static str),
}

/// A registered calculator owner.
#[derive(Debug, Clone)]
pub struct User {
    /// Display name.
    pub name: String,

    /// Contact email.
    pub email: String,
}

/// Contact details captured with a lead.
#[derive(Debug, Clone)]
pub struct ContactInfo {
    /// Lead name.
    pub name: String,

    /// Lead email.
    pub email: String,

    /// Optional phone number.
    pub phone: Option<String>,
}

/// A captured lead: contact details plus the quoted selection.
#[derive(Debug, Clone)]
pub struct Lead {
    /// Calculator the quote came from.
    pub slug: String,

    /// Contact details.
    pub contact: ContactInfo,

    /// Selection snapshot at submission time.
    pub selection: Selection,

    /// Quoted total in minor units at submission time.
    pub total_minor: i64,
}

/// Per-calculator customization for one user.
///
/// Each populated section replaces the corresponding default section
/// wholesale; this is per-field replacement, not a deep recursive merge.
#[derive(Debug, Clone, Default)]
pub struct CustomizationPatch {
    /// Replacement base price.
    pub base: Option<BasePrice>,

    /// Fields replaced by id; ids with no default counterpart are ignored.
    pub fields: Vec<FieldConfig>,

    /// Replacement add-on list.
    pub add_ons: Option<Vec<AddOnConfig>>,

    /// Replacement combination rules.
    pub combos: Option<Vec<ComboRule>>,

    /// Replacement promo table; keys are uppercased on application.
    pub promo_codes: Option<FxHashMap<String, Percentage>>,
}

/// In-memory store backing the calculator service.
#[derive(Debug, Default)]
pub struct Store {
    users: SlotMap<UserKey, User>,
    calculators: FxHashMap<String, PricingConfig>,
    calculator_order: Vec<String>,
    customizations: SecondaryMap<UserKey, FxHashMap<String, CustomizationPatch>>,
    leads: SlotMap<LeadKey, Lead>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with every calculator of a catalog registered as
    /// defaults.
    #[must_use]
    pub fn seed_from(catalog: &Catalog) -> Self {
        let mut store = Self::new();

        for slug in catalog.slugs() {
            if let Some(config) = catalog.get(slug) {
                store.calculator_order.push(slug.to_string());
                store.calculators.insert(slug.to_string(), config.clone());
            }
        }

        store
    }

    /// Register a user.
    pub fn add_user(&mut self, name: &str, email: &str) -> UserKey {
        self.users.insert(User {
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// Look up a user.
    pub fn user(&self, key: UserKey) -> Option<&User> {
        self.users.get(key)
    }

    /// Look up a calculator's default configuration.
    pub fn calculator(&self, slug: &str) -> Option<&PricingConfig> {
        self.calculators.get(slug)
    }

    /// Registered calculator slugs, in seed order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.calculator_order.iter().map(String::as_str)
    }

    /// Attach a customization patch for a user and calculator, replacing any
    /// earlier patch for the same pair.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered user or slug.
    pub fn customize(
        &mut self,
        user: UserKey,
        slug: &str,
        patch: CustomizationPatch,
    ) -> Result<(), StoreError> {
        if !self.users.contains_key(user) {
            return Err(StoreError::UnknownUser);
        }

        if !self.calculators.contains_key(slug) {
            return Err(StoreError::UnknownCalculator(slug.to_string()));
        }

        if let Some(entry) = self.customizations.entry(user) {
            entry.or_default().insert(slug.to_string(), patch);
        }

        Ok(())
    }

    /// Resolve the effective configuration for a user: the default config
    /// with the user's patch applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered user or slug.
    pub fn config_for(&self, user: UserKey, slug: &str) -> Result<PricingConfig, StoreError> {
        if !self.users.contains_key(user) {
            return Err(StoreError::UnknownUser);
        }

        let mut config = self
            .calculators
            .get(slug)
            .ok_or_else(|| StoreError::UnknownCalculator(slug.to_string()))?
            .clone();

        if let Some(patch) = self
            .customizations
            .get(user)
            .and_then(|patches| patches.get(slug))
        {
            apply_patch(&mut config, patch);
        }

        Ok(config)
    }

    /// Store a captured lead.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered slug or a contact with an empty
    /// name or email.
    pub fn submit_lead(
        &mut self,
        slug: &str,
        selection: &Selection,
        breakdown: &QuoteBreakdown,
        contact: ContactInfo,
    ) -> Result<LeadKey, StoreError> {
        if !self.calculators.contains_key(slug) {
            return Err(StoreError::UnknownCalculator(slug.to_string()));
        }

        if contact.name.trim().is_empty() {
            return Err(StoreError::InvalidContact("name"));
        }

        if contact.email.trim().is_empty() {
            return Err(StoreError::InvalidContact("email"));
        }

        let total_minor = breakdown.total().to_minor_units();

        let key = self.leads.insert(Lead {
            slug: slug.to_string(),
            contact,
            selection: selection.clone(),
            total_minor,
        });

        info!(slug, total_minor, "lead captured");

        Ok(key)
    }

    /// Look up a captured lead.
    pub fn lead(&self, key: LeadKey) -> Option<&Lead> {
        self.leads.get(key)
    }

    /// Captured leads for a calculator, in capture order.
    pub fn leads_for(&self, slug: &str) -> Vec<&Lead> {
        self.leads
            .values()
            .filter(|lead| lead.slug == slug)
            .collect()
    }
}

/// Apply a customization patch: populated sections replace their default
/// counterparts wholesale.
fn apply_patch(config: &mut PricingConfig, patch: &CustomizationPatch) {
    if let Some(base) = &patch.base {
        config.base = base.clone();
    }

    for replacement in &patch.fields {
        if let Some(slot) = config
            .fields
            .iter_mut()
            .find(|field| field.id == replacement.id)
        {
            *slot = replacement.clone();
        } else {
            warn!(field = %replacement.id, "customization references unknown field, ignored");
        }
    }

    if let Some(add_ons) = &patch.add_ons {
        config.add_ons = add_ons.clone();
    }

    if let Some(combos) = &patch.combos {
        config.combos = combos.clone();
    }

    if let Some(promo_codes) = &patch.promo_codes {
        config.promo_codes = promo_codes
            .iter()
            .map(|(code, rate)| (code.to_uppercase(), *rate))
            .collect();
    }
}
