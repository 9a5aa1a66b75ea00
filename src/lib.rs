//! Quotient
//!
//! Quotient is a quote-pricing engine for lead-generation quote calculators:
//! multi-step estimate widgets for service verticals such as wedding
//! photography, plumbing or pest control. Each calculator is a
//! [`config::PricingConfig`] describing a base price, adjustable fields,
//! add-ons and promo codes; [`pricing::compute_quote`] turns a configuration
//! and a [`selection::Selection`] into an itemized [`breakdown::QuoteBreakdown`].
//!
//! The engine is pure and infallible: incomplete selections and dangling
//! configuration references contribute zero instead of failing, so a caller
//! can always render a number.

pub mod breakdown;
pub mod catalog;
pub mod config;
pub mod plans;
pub mod prefill;
pub mod prelude;
pub mod pricing;
pub mod selection;
pub mod store;
