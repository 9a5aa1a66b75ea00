//! Quotient prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    breakdown::{LineItem, QuoteBreakdown},
    catalog::{Catalog, CatalogError},
    config::{
        AddOnCharge, AddOnConfig, Adjustment, BasePrice, ComboRule, FieldConfig, FieldKind,
        OptionConfig, PricingConfig,
    },
    plans::{BillingGateway, Plan, RecordingGateway, default_plans, provision},
    prefill::prefill,
    pricing::compute_quote,
    selection::Selection,
    store::{ContactInfo, CustomizationPatch, Lead, LeadKey, Store, StoreError, User, UserKey},
};
