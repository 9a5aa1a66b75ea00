//! Quote Example
//!
//! Prices a selection against one of the built-in calculators and prints the
//! itemized breakdown.
//!
//! Use `-s` to pick a calculator slug (see `Catalog::builtin`)
//! Use `-d` to describe the job in free text (prefills the selection)
//! Use `-a` to toggle add-ons by id
//! Use `-p` to apply a promo code

use anyhow::Result;
use clap::Parser;

use quotient::prelude::*;

/// Arguments for the quote example
#[derive(Debug, Parser)]
struct QuoteArgs {
    /// Calculator slug to price against
    #[clap(short, long, default_value = "wedding-photography")]
    slug: String,

    /// Free-text job description used to prefill the selection
    #[clap(short, long)]
    describe: Option<String>,

    /// Add-on ids to toggle on
    #[clap(short, long)]
    add_on: Vec<String>,

    /// Promo code
    #[clap(short, long)]
    promo: Option<String>,
}

/// Quote Example
#[expect(clippy::print_stdout, reason = "Example code")]
fn main() -> Result<()> {
    let args = QuoteArgs::parse();

    let catalog = Catalog::builtin()?;
    let config = catalog.pricing_config(&args.slug)?;

    let mut selection = Selection::new();

    if let Some(text) = args.describe.as_deref() {
        let filled = prefill(config, text, &mut selection);

        if !filled.is_empty() {
            println!("Prefilled from description: {}", filled.join(", "));
        }
    }

    for add_on in &args.add_on {
        selection.toggle_add_on(add_on);
    }

    selection.with_promo_code(args.promo.as_deref());

    let breakdown = compute_quote(config, &selection);

    println!("{}", config.name);
    println!("{}", breakdown.table());

    Ok(())
}
