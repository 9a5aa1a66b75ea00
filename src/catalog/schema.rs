//! Calculator definition schema
//!
//! Serde types for the YAML calculator definitions, plus the string parsers
//! for prices ("120.00 EUR"), rates ("15%" or "0.15") and multipliers
//! ("1.2"). A parsed definition converts into a [`PricingConfig`] with a
//! currency-consistency check across every amount it carries.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    catalog::CatalogError,
    config::{
        AddOnCharge, AddOnConfig, Adjustment, BasePrice, ComboRule, FieldConfig, FieldKind,
        OptionConfig, PricingConfig,
    },
};

/// A calculator definition as it appears in YAML.
#[derive(Debug, Deserialize)]
pub struct CalculatorFixture {
    /// Calculator slug.
    pub slug: String,

    /// Human-readable calculator name.
    pub name: String,

    /// Base price section.
    pub base: BaseFixture,

    /// Adjustable fields, in evaluation order.
    #[serde(default)]
    pub fields: Vec<FieldFixture>,

    /// Toggleable extras.
    #[serde(default)]
    pub add_ons: Vec<AddOnFixture>,

    /// Combination rules.
    #[serde(default)]
    pub combos: Vec<ComboFixture>,

    /// Promo code table: code -> rate string.
    #[serde(default)]
    pub promo_codes: FxHashMap<String, String>,
}

/// Base price section from YAML.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BaseFixture {
    /// Flat starting price.
    Flat {
        /// Display label for the base line item.
        label: String,

        /// Price string (e.g. "75.00 USD").
        amount: String,
    },

    /// Base price carried by the selected option of the named field.
    PerChoice {
        /// Field whose selected option supplies the base price.
        field: String,
    },
}

/// Field section from YAML.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldFixture {
    /// Single-select field.
    SingleSelect {
        /// Field id.
        id: String,

        /// Display label.
        label: String,

        /// Prefill keywords.
        #[serde(default)]
        keywords: Vec<String>,

        /// Choices, in display order.
        options: Vec<OptionFixture>,
    },

    /// Quantity field charged per unit above an included allowance.
    Quantity {
        /// Field id.
        id: String,

        /// Display label.
        label: String,

        /// Prefill keywords.
        #[serde(default)]
        keywords: Vec<String>,

        /// Per-unit price string (e.g. "10.00 EUR").
        unit: String,

        /// Units included in the base price.
        #[serde(default)]
        included: u32,
    },
}

/// Option entry from YAML.
#[derive(Debug, Deserialize)]
pub struct OptionFixture {
    /// Option id.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Prefill keywords.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Price adjustment; absent means no contribution.
    #[serde(default)]
    pub adjustment: Option<AdjustmentFixture>,
}

/// Option adjustment from YAML.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdjustmentFixture {
    /// Flat amount (e.g. "300.00 GBP").
    Amount {
        /// Price string.
        value: String,
    },

    /// Running-subtotal multiplier (e.g. "1.2").
    Multiplier {
        /// Decimal string.
        value: String,
    },

    /// Signed percentage of the running subtotal (e.g. "15%" or "-0.1").
    Percent {
        /// Rate string.
        value: String,
    },
}

/// Add-on or combo charge from YAML.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChargeFixture {
    /// Flat amount (e.g. "300.00 GBP").
    Flat {
        /// Price string.
        value: String,
    },

    /// Percentage of the reference subtotal (e.g. "10%").
    Percent {
        /// Rate string.
        value: String,
    },
}

/// Add-on entry from YAML.
#[derive(Debug, Deserialize)]
pub struct AddOnFixture {
    /// Add-on id.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Charge applied when selected.
    pub charge: ChargeFixture,
}

/// Combination rule from YAML.
#[derive(Debug, Deserialize)]
pub struct ComboFixture {
    /// Display label.
    pub label: String,

    /// Conditions that must all hold.
    pub when: Vec<ComboConditionFixture>,

    /// Charge applied when the rule fires.
    pub charge: ChargeFixture,

    /// Whether the charge is system-recommended.
    #[serde(default)]
    pub recommended: bool,
}

/// One field/option condition of a combination rule.
#[derive(Debug, Deserialize)]
pub struct ComboConditionFixture {
    /// Field id.
    pub field: String,

    /// Required option id.
    pub option: String,
}

/// Parse a price string (e.g. "2.99 GBP") into minor units and currency.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code is
/// not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Parse a rate string into a [`Percentage`].
///
/// Accepts two formats: "15%" for 15%, or the decimal "0.15". Signs are
/// allowed in both ("-10%" is a 10% reduction).
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_rate(s: &str) -> Result<Percentage, CatalogError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| CatalogError::InvalidRate(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| CatalogError::InvalidRate(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Parse a multiplier string (e.g. "1.2") into a [`Decimal`].
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a decimal.
pub fn parse_multiplier(s: &str) -> Result<Decimal, CatalogError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidMultiplier(s.to_string()))
}

/// Tracks the single currency every amount in a definition must share.
struct CurrencyCheck<'a> {
    slug: &'a str,
    currency: Option<&'static Currency>,
}

impl<'a> CurrencyCheck<'a> {
    fn new(slug: &'a str) -> Self {
        Self {
            slug,
            currency: None,
        }
    }

    fn money(&mut self, price: &str) -> Result<Money<'static, Currency>, CatalogError> {
        let (minor_units, currency) = parse_price(price)?;

        match self.currency {
            Some(existing) if existing != currency => Err(CatalogError::CurrencyMismatch {
                slug: self.slug.to_string(),
                expected: existing.iso_alpha_code.to_string(),
                found: currency.iso_alpha_code.to_string(),
            }),
            _ => {
                self.currency = Some(currency);

                Ok(Money::from_minor(minor_units, currency))
            }
        }
    }

    fn finish(self) -> Result<&'static Currency, CatalogError> {
        self.currency
            .ok_or_else(|| CatalogError::NoCurrency(self.slug.to_string()))
    }
}

impl CalculatorFixture {
    /// Convert the parsed definition into a [`PricingConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for malformed price/rate/multiplier strings, for a
    /// currency mismatch between amounts, or if no amount establishes the
    /// configuration currency.
    pub fn try_into_config(self) -> Result<PricingConfig, CatalogError> {
        let mut check = CurrencyCheck::new(&self.slug);

        let base = match &self.base {
            BaseFixture::Flat { label, amount } => BasePrice::Flat {
                label: label.clone(),
                amount: check.money(amount)?,
            },
            BaseFixture::PerChoice { field } => BasePrice::PerChoice {
                field: field.clone(),
            },
        };

        let mut fields = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            fields.push(convert_field(field, &mut check)?);
        }

        let mut add_ons = Vec::with_capacity(self.add_ons.len());

        for add_on in &self.add_ons {
            add_ons.push(AddOnConfig {
                id: add_on.id.clone(),
                label: add_on.label.clone(),
                charge: convert_charge(&add_on.charge, &mut check)?,
            });
        }

        let mut combos = Vec::with_capacity(self.combos.len());

        for combo in &self.combos {
            combos.push(ComboRule {
                label: combo.label.clone(),
                when: combo
                    .when
                    .iter()
                    .map(|condition| (condition.field.clone(), condition.option.clone()))
                    .collect(),
                charge: convert_charge(&combo.charge, &mut check)?,
                recommended: combo.recommended,
            });
        }

        let mut promo_codes = FxHashMap::default();

        for (code, rate) in &self.promo_codes {
            // Normalize to uppercase once at load; lookups normalize the
            // user's input, never the table.
            promo_codes.insert(code.to_uppercase(), parse_rate(rate)?);
        }

        let currency = check.finish()?;

        Ok(PricingConfig {
            slug: self.slug,
            name: self.name,
            currency,
            base,
            fields,
            add_ons,
            combos,
            promo_codes,
        })
    }
}

fn convert_field(
    field: &FieldFixture,
    check: &mut CurrencyCheck<'_>,
) -> Result<FieldConfig, CatalogError> {
    match field {
        FieldFixture::SingleSelect {
            id,
            label,
            keywords,
            options,
        } => {
            let mut converted = Vec::with_capacity(options.len());

            for option in options {
                converted.push(OptionConfig {
                    id: option.id.clone(),
                    label: option.label.clone(),
                    adjustment: convert_adjustment(option.adjustment.as_ref(), check)?,
                    keywords: option.keywords.clone(),
                });
            }

            Ok(FieldConfig {
                id: id.clone(),
                label: label.clone(),
                kind: FieldKind::SingleSelect { options: converted },
                keywords: keywords.clone(),
            })
        }
        FieldFixture::Quantity {
            id,
            label,
            keywords,
            unit,
            included,
        } => Ok(FieldConfig {
            id: id.clone(),
            label: label.clone(),
            kind: FieldKind::Quantity {
                unit_amount: check.money(unit)?,
                included: *included,
            },
            keywords: keywords.clone(),
        }),
    }
}

fn convert_adjustment(
    adjustment: Option<&AdjustmentFixture>,
    check: &mut CurrencyCheck<'_>,
) -> Result<Adjustment, CatalogError> {
    match adjustment {
        None => Ok(Adjustment::None),
        Some(AdjustmentFixture::Amount { value }) => Ok(Adjustment::Amount(check.money(value)?)),
        Some(AdjustmentFixture::Multiplier { value }) => {
            Ok(Adjustment::Multiplier(parse_multiplier(value)?))
        }
        Some(AdjustmentFixture::Percent { value }) => Ok(Adjustment::Percent(parse_rate(value)?)),
    }
}

fn convert_charge(
    charge: &ChargeFixture,
    check: &mut CurrencyCheck<'_>,
) -> Result<AddOnCharge, CatalogError> {
    match charge {
        ChargeFixture::Flat { value } => Ok(AddOnCharge::Flat(check.money(value)?)),
        ChargeFixture::Percent { value } => Ok(AddOnCharge::Percent(parse_rate(value)?)),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_accepts_supported_currencies() -> TestResult {
        let (gbp_minor, gbp) = parse_price("18.00 GBP")?;
        let (eur_minor, eur) = parse_price("1.20 EUR")?;
        let (usd_minor, usd) = parse_price("0.75 USD")?;

        assert_eq!(gbp_minor, 1_800);
        assert_eq!(gbp, GBP);
        assert_eq!(eur_minor, 120);
        assert_eq!(eur, EUR);
        assert_eq!(usd_minor, 75);
        assert_eq!(usd, USD);

        Ok(())
    }

    #[test]
    fn parse_rate_accepts_both_formats() -> TestResult {
        assert_eq!(parse_rate("15%")?, Percentage::from(0.15));
        assert_eq!(parse_rate("0.15")?, Percentage::from(0.15));
        assert_eq!(parse_rate("  15%  ")?, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_rate_accepts_negative_rates() -> TestResult {
        assert_eq!(parse_rate("-10%")?, Percentage::from(-0.10));

        Ok(())
    }

    #[test]
    fn parse_rate_rejects_invalid_input() {
        assert!(matches!(
            parse_rate("fifteen"),
            Err(CatalogError::InvalidRate(_))
        ));
    }

    #[test]
    fn parse_multiplier_parses_decimal_strings() -> TestResult {
        assert_eq!(parse_multiplier("1.2")?, Decimal::new(12, 1));

        Ok(())
    }

    #[test]
    fn fixture_converts_into_config() -> TestResult {
        let yaml = r#"
slug: demo
name: Demo Calculator
base:
  type: flat
  label: Call-out
  amount: "50.00 EUR"
fields:
  - type: single_select
    id: urgency
    label: Urgency
    options:
      - id: standard
        label: Standard
      - id: same-day
        label: Same day
        adjustment: { type: percent, value: "25%" }
add_ons:
  - id: cleanup
    label: Site cleanup
    charge: { type: flat, value: "15.00 EUR" }
promo_codes:
  Demo5: "5%"
"#;

        let fixture: CalculatorFixture = serde_norway::from_str(yaml)?;
        let config = fixture.try_into_config()?;

        assert_eq!(config.slug, "demo");
        assert_eq!(config.currency, EUR);
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.add_ons.len(), 1);

        // Keys are normalized to uppercase at load.
        assert_eq!(config.promo_rate("demo5"), Some(Percentage::from(0.05)));

        Ok(())
    }

    #[test]
    fn fixture_rejects_mixed_currencies() -> TestResult {
        let yaml = r#"
slug: demo
name: Demo Calculator
base:
  type: flat
  label: Call-out
  amount: "50.00 EUR"
add_ons:
  - id: cleanup
    label: Site cleanup
    charge: { type: flat, value: "15.00 USD" }
"#;

        let fixture: CalculatorFixture = serde_norway::from_str(yaml)?;
        let result = fixture.try_into_config();

        assert!(matches!(
            result,
            Err(CatalogError::CurrencyMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn fixture_without_amounts_has_no_currency() -> TestResult {
        let yaml = r#"
slug: demo
name: Demo Calculator
base:
  type: per_choice
  field: service
"#;

        let fixture: CalculatorFixture = serde_norway::from_str(yaml)?;
        let result = fixture.try_into_config();

        assert!(matches!(result, Err(CatalogError::NoCurrency(slug)) if slug == "demo"));

        Ok(())
    }
}
