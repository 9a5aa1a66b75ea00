//! Quote pricing
//!
//! The computation that turns a [`PricingConfig`] and a [`Selection`] into an
//! itemized [`QuoteBreakdown`]. The computation order is fixed: base price,
//! then fields in configuration order, then add-ons, then combination rules,
//! then the promo discount. Multipliers and percentages always apply to the
//! running subtotal accumulated so far; percent add-ons apply to the subtotal
//! as it stood immediately before any add-on.
//!
//! The engine never fails. A field with no chosen option contributes zero and
//! is omitted from the line items; a configuration gap (a selected id with no
//! matching configuration entry) degrades to a zero contribution with a debug
//! event. The caller always gets a valid, display-ready breakdown.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    breakdown::{LineItem, QuoteBreakdown},
    config::{AddOnCharge, Adjustment, BasePrice, FieldKind, PricingConfig},
    selection::Selection,
};

/// Compute the quote for a selection against a pricing configuration.
///
/// Pure and deterministic: the same inputs always produce the same breakdown,
/// and the call has no side effects beyond trace events. Safe to call on
/// every selection change.
#[must_use]
pub fn compute_quote(config: &PricingConfig, selection: &Selection) -> QuoteBreakdown {
    let mut items: SmallVec<[LineItem; 8]> = SmallVec::new();
    let mut running = Decimal::ZERO;

    apply_base(config, selection, &mut items, &mut running);
    apply_fields(config, selection, &mut items, &mut running);
    apply_add_ons(config, selection, &mut items, &mut running);
    apply_combos(config, selection, &mut items, &mut running);

    let subtotal = running;
    let (discount, promo_applied) = apply_promo(config, selection, subtotal, &mut items);

    QuoteBreakdown::new(items, subtotal, discount, config.currency, promo_applied)
}

fn apply_base(
    config: &PricingConfig,
    selection: &Selection,
    items: &mut SmallVec<[LineItem; 8]>,
    running: &mut Decimal,
) {
    match &config.base {
        // A flat base always emits, even at zero: the baseline of every
        // breakdown is the base price line.
        BasePrice::Flat { label, amount } => {
            let amount = minor(amount);

            *running += amount;
            items.push(LineItem::new(label.clone(), amount));
        }
        BasePrice::PerChoice { field } => {
            let Some(option_id) = selection.choice(field) else {
                return;
            };

            let Some(option) = config.option(field, option_id) else {
                debug!(%field, option = option_id, "unknown base option, contributing zero");
                return;
            };

            if let Adjustment::Amount(amount) = option.adjustment {
                let amount = minor(&amount);

                *running += amount;
                items.push(LineItem::new(option.label.clone(), amount));
            } else {
                debug!(%field, option = option_id, "base option carries no amount, contributing zero");
            }
        }
    }
}

fn apply_fields(
    config: &PricingConfig,
    selection: &Selection,
    items: &mut SmallVec<[LineItem; 8]>,
    running: &mut Decimal,
) {
    let base_field = match &config.base {
        BasePrice::PerChoice { field } => Some(field.as_str()),
        BasePrice::Flat { .. } => None,
    };

    for field in &config.fields {
        if Some(field.id.as_str()) == base_field {
            continue;
        }

        match &field.kind {
            FieldKind::SingleSelect { options } => {
                let Some(option_id) = selection.choice(&field.id) else {
                    continue;
                };

                let Some(option) = options.iter().find(|option| option.id == option_id) else {
                    debug!(field = %field.id, option = option_id, "unknown option, contributing zero");
                    continue;
                };

                match option.adjustment {
                    Adjustment::None => {}
                    Adjustment::Amount(amount) => {
                        push_delta(items, running, option.label.clone(), minor(&amount));
                    }
                    Adjustment::Multiplier(factor) => {
                        let delta_rate = factor - Decimal::ONE;
                        let delta = *running * delta_rate;
                        let label = format!("{} ({})", option.label, percent_label(delta_rate));

                        push_delta(items, running, label, delta);
                    }
                    Adjustment::Percent(percent) => {
                        let delta_rate = rate(percent);
                        let delta = *running * delta_rate;
                        let label = format!("{} ({})", option.label, percent_label(delta_rate));

                        push_delta(items, running, label, delta);
                    }
                }
            }
            FieldKind::Quantity {
                unit_amount,
                included,
            } => {
                let Some(quantity) = selection.quantity(&field.id) else {
                    continue;
                };

                let billable = quantity.saturating_sub(*included);

                if billable == 0 {
                    continue;
                }

                let delta = minor(unit_amount) * Decimal::from(billable);
                let label = format!("{} × {billable}", field.label);

                push_delta(items, running, label, delta);
            }
        }
    }
}

fn apply_add_ons(
    config: &PricingConfig,
    selection: &Selection,
    items: &mut SmallVec<[LineItem; 8]>,
    running: &mut Decimal,
) {
    // Percent add-ons are computed against the subtotal as it stood before
    // any add-on was applied, so add-on order cannot change their value.
    let before_add_ons = *running;

    for add_on in &config.add_ons {
        if !selection.has_add_on(&add_on.id) {
            continue;
        }

        let delta = match add_on.charge {
            AddOnCharge::Flat(amount) => minor(&amount),
            AddOnCharge::Percent(percent) => before_add_ons * rate(percent),
        };

        push_delta(items, running, add_on.label.clone(), delta);
    }

    for id in selection.add_ons() {
        if config.add_on(id).is_none() {
            debug!(add_on = id, "unknown add-on, contributing zero");
        }
    }
}

fn apply_combos(
    config: &PricingConfig,
    selection: &Selection,
    items: &mut SmallVec<[LineItem; 8]>,
    running: &mut Decimal,
) {
    for combo in &config.combos {
        let fires = !combo.when.is_empty()
            && combo
                .when
                .iter()
                .all(|(field, option)| selection.choice(field) == Some(option.as_str()));

        if !fires {
            continue;
        }

        let delta = match combo.charge {
            AddOnCharge::Flat(amount) => minor(&amount),
            AddOnCharge::Percent(percent) => *running * rate(percent),
        };

        let label = if combo.recommended {
            format!("{} (recommended)", combo.label)
        } else {
            combo.label.clone()
        };

        push_delta(items, running, label, delta);
    }
}

fn apply_promo(
    config: &PricingConfig,
    selection: &Selection,
    subtotal: Decimal,
    items: &mut SmallVec<[LineItem; 8]>,
) -> (Decimal, bool) {
    let Some(code) = selection.promo_code() else {
        return (Decimal::ZERO, false);
    };

    let normalized = code.trim().to_uppercase();

    if normalized.is_empty() {
        return (Decimal::ZERO, false);
    }

    let Some(percent) = config.promo_codes.get(&normalized).copied() else {
        // Unknown codes are a silent no-op; the quote stays valid.
        debug!(code = %normalized, "unknown promo code, ignored");
        return (Decimal::ZERO, false);
    };

    let discount = subtotal * rate(percent);

    if !discount.is_zero() {
        let label = format!("Promo {normalized} ({})", percent_label(-rate(percent)));

        items.push(LineItem::new(label, -discount));
    }

    (discount, true)
}

/// Append a line item and advance the running subtotal, omitting zero deltas.
fn push_delta(
    items: &mut SmallVec<[LineItem; 8]>,
    running: &mut Decimal,
    label: String,
    delta: Decimal,
) {
    if delta.is_zero() {
        return;
    }

    *running += delta;
    items.push(LineItem::new(label, delta));
}

/// Minor-unit amount of a money value as a decimal.
fn minor(amount: &Money<'static, Currency>) -> Decimal {
    Decimal::from(amount.to_minor_units())
}

/// Decimal rate of a percentage.
fn rate(percent: Percentage) -> Decimal {
    percent * Decimal::ONE
}

/// Display form of a signed rate, e.g. `+20%` or `-15%`.
fn percent_label(delta_rate: Decimal) -> String {
    let points = (delta_rate * Decimal::from(100)).normalize();

    if points.is_sign_negative() {
        format!("{points}%")
    } else {
        format!("+{points}%")
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rustc_hash::FxHashMap;
    use rusty_money::iso::{EUR, USD};

    use crate::config::{
        AddOnCharge, AddOnConfig, Adjustment, BasePrice, ComboRule, FieldConfig, FieldKind,
        OptionConfig, PricingConfig,
    };

    use super::*;

    fn option(id: &str, label: &str, adjustment: Adjustment) -> OptionConfig {
        OptionConfig {
            id: id.to_string(),
            label: label.to_string(),
            adjustment,
            keywords: Vec::new(),
        }
    }

    fn service_config() -> PricingConfig {
        let mut promo_codes = FxHashMap::default();
        promo_codes.insert("PIPES10".to_string(), Percentage::from(0.10));

        PricingConfig {
            slug: "plumbing".to_string(),
            name: "Plumbing".to_string(),
            currency: EUR,
            base: BasePrice::PerChoice {
                field: "service".to_string(),
            },
            fields: vec![
                FieldConfig {
                    id: "service".to_string(),
                    label: "Service".to_string(),
                    kind: FieldKind::SingleSelect {
                        options: vec![option(
                            "leak-repair",
                            "Leak repair",
                            Adjustment::Amount(Money::from_minor(12_000, EUR)),
                        )],
                    },
                    keywords: Vec::new(),
                },
                FieldConfig {
                    id: "property".to_string(),
                    label: "Property type".to_string(),
                    kind: FieldKind::SingleSelect {
                        options: vec![
                            option("apartment", "Apartment", Adjustment::None),
                            option(
                                "house",
                                "Detached house",
                                Adjustment::Multiplier("1.2".parse().unwrap_or(Decimal::ONE)),
                            ),
                        ],
                    },
                    keywords: Vec::new(),
                },
                FieldConfig {
                    id: "floor".to_string(),
                    label: "Extra floors".to_string(),
                    kind: FieldKind::Quantity {
                        unit_amount: Money::from_minor(1_000, EUR),
                        included: 1,
                    },
                    keywords: Vec::new(),
                },
            ],
            add_ons: vec![
                AddOnConfig {
                    id: "emergency".to_string(),
                    label: "Emergency call-out".to_string(),
                    charge: AddOnCharge::Flat(Money::from_minor(5_000, EUR)),
                },
                AddOnConfig {
                    id: "warranty".to_string(),
                    label: "Extended warranty".to_string(),
                    charge: AddOnCharge::Percent(Percentage::from(0.05)),
                },
            ],
            combos: Vec::new(),
            promo_codes,
        }
    }

    #[test]
    fn multiplier_applies_to_running_subtotal() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .choose("property", "house")
            .set_quantity("floor", 3);

        let breakdown = compute_quote(&config, &selection);

        // 120.00 base, ×1.2 adds 24.00, two extra floors add 20.00.
        assert_eq!(breakdown.total(), Money::from_minor(16_400, EUR));

        let labels: Vec<&str> = breakdown
            .line_items()
            .iter()
            .map(LineItem::label)
            .collect();

        assert_eq!(
            labels,
            vec!["Leak repair", "Detached house (+20%)", "Extra floors × 2"]
        );
    }

    #[test]
    fn percent_add_on_uses_pre_add_on_subtotal() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .toggle_add_on("emergency")
            .toggle_add_on("warranty");

        let breakdown = compute_quote(&config, &selection);

        // Warranty is 5% of 120.00, not of 170.00.
        assert_eq!(breakdown.total(), Money::from_minor(17_600, EUR));
    }

    #[test]
    fn quantity_below_included_allowance_contributes_nothing() {
        let config = service_config();
        let mut selection = Selection::new();

        selection.choose("service", "leak-repair").set_quantity("floor", 1);

        let breakdown = compute_quote(&config, &selection);

        assert_eq!(breakdown.total(), Money::from_minor(12_000, EUR));
        assert_eq!(breakdown.line_items().len(), 1);
    }

    #[test]
    fn unknown_option_degrades_to_zero() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .choose("property", "castle")
            .toggle_add_on("helicopter");

        let breakdown = compute_quote(&config, &selection);

        assert_eq!(breakdown.total(), Money::from_minor(12_000, EUR));
    }

    #[test]
    fn empty_selection_against_per_choice_base_is_zero() {
        let config = service_config();
        let breakdown = compute_quote(&config, &Selection::new());

        assert!(breakdown.line_items().is_empty());
        assert_eq!(breakdown.total(), Money::from_minor(0, EUR));
    }

    #[test]
    fn flat_base_emits_even_for_empty_selection() {
        let config = PricingConfig {
            slug: "dog-training".to_string(),
            name: "Dog Training".to_string(),
            currency: USD,
            base: BasePrice::Flat {
                label: "Evaluation session".to_string(),
                amount: Money::from_minor(7_500, USD),
            },
            fields: Vec::new(),
            add_ons: Vec::new(),
            combos: Vec::new(),
            promo_codes: FxHashMap::default(),
        };

        let breakdown = compute_quote(&config, &Selection::new());

        assert_eq!(breakdown.line_items().len(), 1);
        assert_eq!(breakdown.total(), Money::from_minor(7_500, USD));
    }

    #[test]
    fn combo_rule_fires_only_on_full_match() {
        let mut config = service_config();

        config.combos.push(ComboRule {
            label: "Camera inspection".to_string(),
            when: vec![("property".to_string(), "house".to_string())],
            charge: AddOnCharge::Flat(Money::from_minor(7_500, EUR)),
            recommended: true,
        });

        let mut selection = Selection::new();
        selection.choose("service", "leak-repair");

        let without = compute_quote(&config, &selection);
        assert_eq!(without.total(), Money::from_minor(12_000, EUR));

        selection.choose("property", "house");

        let with = compute_quote(&config, &selection);

        // 144.00 after the multiplier, plus the 75.00 inspection fee.
        assert_eq!(with.total(), Money::from_minor(21_900, EUR));

        let last = with.line_items().last().map(LineItem::label);

        assert_eq!(last, Some("Camera inspection (recommended)"));
    }

    #[test]
    fn promo_discount_applies_to_final_subtotal() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .with_promo_code(Some("pipes10"));

        let breakdown = compute_quote(&config, &selection);

        assert!(breakdown.promo_applied());
        assert_eq!(breakdown.discount_total(), Money::from_minor(1_200, EUR));
        assert_eq!(breakdown.total(), Money::from_minor(10_800, EUR));
    }

    #[test]
    fn unknown_promo_code_is_a_silent_no_op() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .with_promo_code(Some("BOGUS"));

        let breakdown = compute_quote(&config, &selection);

        assert!(!breakdown.promo_applied());
        assert_eq!(breakdown.discount_total(), Money::from_minor(0, EUR));
        assert_eq!(breakdown.total(), breakdown.subtotal());
    }

    #[test]
    fn line_items_sum_to_unrounded_total() {
        let config = service_config();
        let mut selection = Selection::new();

        selection
            .choose("service", "leak-repair")
            .choose("property", "house")
            .set_quantity("floor", 4)
            .toggle_add_on("warranty")
            .with_promo_code(Some("PIPES10"));

        let breakdown = compute_quote(&config, &selection);

        let sum: Decimal = breakdown.line_items().iter().map(LineItem::amount).sum();

        assert_eq!(sum, breakdown.unrounded_total());
    }

    #[test]
    fn percent_label_formats_signed_rates() {
        assert_eq!(percent_label("0.2".parse().unwrap_or(Decimal::ZERO)), "+20%");
        assert_eq!(
            percent_label("-0.15".parse().unwrap_or(Decimal::ZERO)),
            "-15%"
        );
    }
}
