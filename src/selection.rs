//! User selection
//!
//! The mutable state a calculator form accumulates across wizard steps. A
//! selection is never validated here; the pricing engine prices whatever is
//! present and the form layer decides when it is complete enough to submit.

use rustc_hash::FxHashMap;

/// A user's selections for one quote request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    choices: FxHashMap<String, String>,
    quantities: FxHashMap<String, u32>,
    add_ons: Vec<String>,
    promo_code: Option<String>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose an option for a single-select field, replacing any earlier
    /// choice for the same field.
    pub fn choose(&mut self, field: &str, option: &str) -> &mut Self {
        self.choices.insert(field.to_string(), option.to_string());
        self
    }

    /// Set the quantity for a quantity field.
    pub fn set_quantity(&mut self, field: &str, quantity: u32) -> &mut Self {
        self.quantities.insert(field.to_string(), quantity);
        self
    }

    /// Toggle an add-on on or off.
    pub fn toggle_add_on(&mut self, add_on: &str) -> &mut Self {
        if let Some(position) = self.add_ons.iter().position(|id| id == add_on) {
            self.add_ons.remove(position);
        } else {
            self.add_ons.push(add_on.to_string());
        }

        self
    }

    /// Set the raw promo code text; `None` clears it.
    pub fn with_promo_code(&mut self, code: Option<&str>) -> &mut Self {
        self.promo_code = code.map(ToString::to_string);
        self
    }

    /// The chosen option for a single-select field, if any.
    pub fn choice(&self, field: &str) -> Option<&str> {
        self.choices.get(field).map(String::as_str)
    }

    /// The quantity for a quantity field, if set.
    pub fn quantity(&self, field: &str) -> Option<u32> {
        self.quantities.get(field).copied()
    }

    /// Whether an add-on is currently selected.
    pub fn has_add_on(&self, add_on: &str) -> bool {
        self.add_ons.iter().any(|id| id == add_on)
    }

    /// Selected add-ons, in the order they were toggled on.
    pub fn add_ons(&self) -> impl Iterator<Item = &str> {
        self.add_ons.iter().map(String::as_str)
    }

    /// The raw promo code text, if any.
    pub fn promo_code(&self) -> Option<&str> {
        self.promo_code.as_deref()
    }
}
