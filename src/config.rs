//! Pricing configuration
//!
//! The pricing model one calculator carries: a base price, adjustable fields
//! in a stable evaluation order, toggleable add-ons, combination rules and a
//! promo code table. Amounts are [`Money`] values sharing a single currency;
//! relative adjustments are [`Percentage`] or [`Decimal`] multipliers.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};

/// How the starting price of a quote is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum BasePrice {
    /// A flat starting price, independent of any selection.
    Flat {
        /// Display label for the base line item.
        label: String,

        /// Starting amount.
        amount: Money<'static, Currency>,
    },

    /// The base price is carried by the selected option of the named field
    /// (for example the chosen package or service type). That field's
    /// options must use [`Adjustment::Amount`]; anything else contributes
    /// zero.
    PerChoice {
        /// Field whose selected option supplies the base price.
        field: String,
    },
}

/// Price adjustment attached to a selectable option.
///
/// Multipliers and percentages are structurally exclusive per option. Both
/// apply to the running subtotal accumulated so far, not to the base alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// No price contribution.
    None,

    /// Flat amount added to the running subtotal.
    Amount(Money<'static, Currency>),

    /// Scale the running subtotal (e.g. `1.2` for a 20% surcharge).
    Multiplier(Decimal),

    /// Signed percentage of the running subtotal.
    Percent(Percentage),
}

/// One choice within a single-select field.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionConfig {
    /// Stable option identifier.
    pub id: String,

    /// Display name, used verbatim in line item labels.
    pub label: String,

    /// Price adjustment this choice carries.
    pub adjustment: Adjustment,

    /// Keywords the prefill helper matches against free text.
    pub keywords: Vec<String>,
}

/// The shape of a selectable field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Exactly one of a set of options may be chosen.
    SingleSelect {
        /// Choices, in display order.
        options: Vec<OptionConfig>,
    },

    /// A numeric quantity charged per unit above an included allowance
    /// (for example "€10 per floor above the first").
    Quantity {
        /// Charge per unit above `included`.
        unit_amount: Money<'static, Currency>,

        /// Units included in the base price.
        included: u32,
    },
}

/// A selectable field of the calculator form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Stable field identifier.
    pub id: String,

    /// Display name, used in quantity line item labels.
    pub label: String,

    /// The field shape and its pricing data.
    pub kind: FieldKind,

    /// Keywords the prefill helper matches against free text.
    pub keywords: Vec<String>,
}

/// Charge carried by an add-on or combination rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOnCharge {
    /// Flat amount.
    Flat(Money<'static, Currency>),

    /// Percentage of the reference subtotal: the pre-add-on subtotal for
    /// add-ons, the post-add-on running subtotal for combination rules.
    Percent(Percentage),
}

/// An independently toggleable extra, additive to the subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOnConfig {
    /// Stable add-on identifier.
    pub id: String,

    /// Display name, used verbatim in line item labels.
    pub label: String,

    /// Charge applied when the add-on is selected.
    pub charge: AddOnCharge,
}

/// An automatic surcharge or discount tied to a combination of choices
/// (for example an inspection fee for commercial properties).
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRule {
    /// Display label; `(recommended)` is appended when not user-chosen.
    pub label: String,

    /// Field/option pairs that must all be selected for the rule to fire.
    pub when: Vec<(String, String)>,

    /// Charge applied when the rule fires.
    pub charge: AddOnCharge,

    /// Whether the charge is system-recommended rather than user-chosen.
    pub recommended: bool,
}

/// Pricing configuration for one calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Calculator slug (e.g. `wedding-photography`).
    pub slug: String,

    /// Human-readable calculator name.
    pub name: String,

    /// Currency shared by every amount in this configuration.
    pub currency: &'static Currency,

    /// How the starting price is determined.
    pub base: BasePrice,

    /// Adjustable fields, in evaluation order.
    pub fields: Vec<FieldConfig>,

    /// Toggleable extras, in evaluation order.
    pub add_ons: Vec<AddOnConfig>,

    /// Combination rules, evaluated after add-ons.
    pub combos: Vec<ComboRule>,

    /// Promo code table; keys are stored uppercase only.
    pub promo_codes: FxHashMap<String, Percentage>,
}

impl PricingConfig {
    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Look up an option within a single-select field.
    ///
    /// Returns `None` for unknown fields, unknown options, and quantity
    /// fields; missing references are a degrade-to-zero concern for the
    /// pricing engine, never an error.
    pub fn option(&self, field: &str, option: &str) -> Option<&OptionConfig> {
        match &self.field(field)?.kind {
            FieldKind::SingleSelect { options } => {
                options.iter().find(|candidate| candidate.id == option)
            }
            FieldKind::Quantity { .. } => None,
        }
    }

    /// Look up an add-on by id.
    pub fn add_on(&self, id: &str) -> Option<&AddOnConfig> {
        self.add_ons.iter().find(|add_on| add_on.id == id)
    }

    /// Case-insensitive promo code lookup.
    ///
    /// The user's input is normalized (trimmed, uppercased) before the
    /// lookup; the table itself stores uppercase keys only.
    pub fn promo_rate(&self, code: &str) -> Option<Percentage> {
        let normalized = code.trim().to_uppercase();

        if normalized.is_empty() {
            return None;
        }

        self.promo_codes.get(&normalized).copied()
    }
}
