//! Natural-language prefill
//!
//! Best-effort keyword matching over free text to pre-populate selection
//! fields ("2 hour ceremony on the 3rd floor"). Advisory only: it writes
//! unset fields and never overrides an existing choice, and the user can
//! change everything before the pricing engine runs. No match simply leaves
//! a field unset.

use crate::{
    config::{FieldConfig, FieldKind, PricingConfig},
    selection::Selection,
};

/// Prefill unset selection fields from free text.
///
/// Single-select fields match when an option keyword or its lowercased label
/// appears in the text; ties resolve to the first option in configuration
/// order. Quantity fields match a number followed by a field keyword within
/// the next two words ("3rd floor", "2 hours"). Returns the ids of the
/// fields that were filled.
pub fn prefill(config: &PricingConfig, text: &str, selection: &mut Selection) -> Vec<String> {
    let haystack = text.to_lowercase();
    let tokens: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let mut filled = Vec::new();

    for field in &config.fields {
        match &field.kind {
            FieldKind::SingleSelect { options } => {
                if selection.choice(&field.id).is_some() {
                    continue;
                }

                let matched = options.iter().find(|option| {
                    haystack.contains(&option.label.to_lowercase())
                        || option
                            .keywords
                            .iter()
                            .any(|keyword| haystack.contains(&keyword.to_lowercase()))
                });

                if let Some(option) = matched {
                    selection.choose(&field.id, &option.id);
                    filled.push(field.id.clone());
                }
            }
            FieldKind::Quantity { .. } => {
                if selection.quantity(&field.id).is_some() {
                    continue;
                }

                if let Some(quantity) = extract_quantity(&tokens, field) {
                    selection.set_quantity(&field.id, quantity);
                    filled.push(field.id.clone());
                }
            }
        }
    }

    filled
}

/// Find a number followed by a field keyword, e.g. "3rd floor" or "2 hours".
fn extract_quantity(tokens: &[&str], field: &FieldConfig) -> Option<u32> {
    let keywords: Vec<String> = field
        .keywords
        .iter()
        .map(|keyword| keyword.to_lowercase())
        .chain(
            field
                .label
                .to_lowercase()
                .split_whitespace()
                .map(ToString::to_string),
        )
        .collect();

    for (index, token) in tokens.iter().enumerate() {
        // Leading digits only, so ordinals like "3rd" still parse.
        let digits: String = token.chars().take_while(char::is_ascii_digit).collect();

        if digits.is_empty() {
            continue;
        }

        let Ok(quantity) = digits.parse::<u32>() else {
            continue;
        };

        let matches_keyword = tokens
            .get(index + 1..)
            .unwrap_or(&[])
            .iter()
            .take(2)
            .any(|next| keywords.iter().any(|keyword| next.starts_with(keyword.as_str())));

        if matches_keyword {
            return Some(quantity);
        }
    }

    None
}
