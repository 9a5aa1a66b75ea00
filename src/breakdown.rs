//! Quote breakdown
//!
//! The itemized output of a quote computation: an ordered list of labeled
//! signed amounts plus subtotal, discount and total. Amounts are carried as
//! [`Decimal`] minor units and may be fractional; rounding to the currency's
//! minor-unit precision happens exactly once, when a [`Money`] accessor is
//! read, never mid-computation.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

/// One labeled signed amount contributing to a quote.
///
/// Insertion order equals computation order and is used verbatim for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    label: String,
    amount: Decimal,
}

impl LineItem {
    pub(crate) fn new(label: String, amount: Decimal) -> Self {
        Self { label, amount }
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signed amount in minor units; may carry fractional minor units.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The amount rounded to a whole minor unit, for display.
    pub fn amount_rounded(&self) -> i64 {
        round_minor(self.amount)
    }
}

/// Itemized result of a quote computation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBreakdown {
    line_items: SmallVec<[LineItem; 8]>,
    subtotal: Decimal,
    discount: Decimal,
    currency: &'static Currency,
    promo_applied: bool,
}

impl QuoteBreakdown {
    pub(crate) fn new(
        line_items: SmallVec<[LineItem; 8]>,
        subtotal: Decimal,
        discount: Decimal,
        currency: &'static Currency,
        promo_applied: bool,
    ) -> Self {
        Self {
            line_items,
            subtotal,
            discount,
            currency,
            promo_applied,
        }
    }

    /// Line items in computation order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Currency of every amount in the breakdown.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Whether a promo code was recognized and applied.
    #[must_use]
    pub fn promo_applied(&self) -> bool {
        self.promo_applied
    }

    /// Subtotal before any discount, rounded to minor-unit precision.
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        Money::from_minor(round_minor(self.subtotal), self.currency)
    }

    /// Total discount, rounded to minor-unit precision.
    #[must_use]
    pub fn discount_total(&self) -> Money<'static, Currency> {
        Money::from_minor(round_minor(self.discount), self.currency)
    }

    /// Final total: `subtotal - discount`, rounded exactly once.
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        Money::from_minor(round_minor(self.subtotal - self.discount), self.currency)
    }

    /// Pre-rounding total. The signed line item amounts sum to exactly this
    /// value; there is no drift between the itemization and the total.
    #[must_use]
    pub fn unrounded_total(&self) -> Decimal {
        self.subtotal - self.discount
    }

    /// The discount as a fraction of the pre-discount subtotal.
    #[must_use]
    pub fn savings_percent(&self) -> Percentage {
        if self.subtotal.is_zero() {
            return Percentage::from(0.0);
        }

        Percentage::from(self.discount / self.subtotal)
    }

    /// Render the breakdown as a display table.
    #[must_use]
    pub fn table(&self) -> String {
        let mut builder = Builder::default();

        builder.push_record(["Line item", "Amount"]);

        for item in &self.line_items {
            builder.push_record([
                item.label().to_string(),
                Money::from_minor(item.amount_rounded(), self.currency).to_string(),
            ]);
        }

        builder.push_record(["Subtotal".to_string(), self.subtotal().to_string()]);
        builder.push_record(["Discount".to_string(), self.discount_total().to_string()]);
        builder.push_record(["Total".to_string(), self.total().to_string()]);

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::last(), Alignment::right());

        table.to_string()
    }
}

/// Round a minor-unit amount to a whole minor unit, midpoint away from zero.
pub(crate) fn round_minor(amount: Decimal) -> i64 {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use smallvec::smallvec;

    use super::*;

    fn test_breakdown() -> QuoteBreakdown {
        let items: SmallVec<[LineItem; 8]> = smallvec![
            LineItem::new("Full Day Coverage".to_string(), Decimal::from(180_000)),
            LineItem::new("Engagement Session".to_string(), Decimal::from(30_000)),
            LineItem::new("Promo WEDDING15 (-15%)".to_string(), Decimal::from(-31_500)),
        ];

        QuoteBreakdown::new(
            items,
            Decimal::from(210_000),
            Decimal::from(31_500),
            GBP,
            true,
        )
    }

    #[test]
    fn accessors_expose_rounded_money() {
        let breakdown = test_breakdown();

        assert_eq!(breakdown.subtotal(), Money::from_minor(210_000, GBP));
        assert_eq!(breakdown.discount_total(), Money::from_minor(31_500, GBP));
        assert_eq!(breakdown.total(), Money::from_minor(178_500, GBP));
        assert!(breakdown.promo_applied());
    }

    #[test]
    fn line_items_sum_to_unrounded_total() {
        let breakdown = test_breakdown();

        let sum: Decimal = breakdown.line_items().iter().map(LineItem::amount).sum();

        assert_eq!(sum, breakdown.unrounded_total());
    }

    #[test]
    fn fractional_amounts_round_once_at_the_end() {
        let amount = "12345.5".parse::<Decimal>().unwrap_or_default();
        let items: SmallVec<[LineItem; 8]> =
            smallvec![LineItem::new("Base".to_string(), amount)];

        let breakdown = QuoteBreakdown::new(items, amount, Decimal::ZERO, GBP, false);

        // Midpoint rounds away from zero.
        assert_eq!(breakdown.total(), Money::from_minor(12_346, GBP));
    }

    #[test]
    fn savings_percent_is_discount_over_subtotal() {
        let breakdown = test_breakdown();

        assert_eq!(breakdown.savings_percent(), Percentage::from(0.15));
    }

    #[test]
    fn savings_percent_is_zero_for_empty_subtotal() {
        let breakdown =
            QuoteBreakdown::new(SmallVec::new(), Decimal::ZERO, Decimal::ZERO, GBP, false);

        assert_eq!(breakdown.savings_percent(), Percentage::from(0.0));
    }

    #[test]
    fn table_lists_every_line_item_and_the_total() {
        let breakdown = test_breakdown();
        let table = breakdown.table();

        assert!(table.contains("Full Day Coverage"), "missing base line");
        assert!(table.contains("Engagement Session"), "missing add-on line");
        assert!(table.contains("Subtotal"), "missing subtotal row");
        assert!(table.contains("Total"), "missing total row");
    }
}
