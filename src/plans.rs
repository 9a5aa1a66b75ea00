//! Billing plans
//!
//! One-time provisioning of subscription plans on the external billing
//! platform. Decoupled from the runtime pricing path: only the plan catalog
//! and the provisioning seam live here, never a payment client.

use rusty_money::{
    Money,
    iso::{Currency, USD},
};
use thiserror::Error;
use tracing::info;

/// Errors surfaced by a billing gateway.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The platform rejected a plan definition.
    #[error("Billing platform rejected plan {0}: {1}")]
    Rejected(String, String),
}

/// A subscription plan to provision.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Stable plan code.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Monthly price.
    pub monthly_price: Money<'static, Currency>,
}

impl Plan {
    /// Create a plan.
    pub fn new(code: &str, name: &str, monthly_price: Money<'static, Currency>) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            monthly_price,
        }
    }
}

/// The default plan set.
#[must_use]
pub fn default_plans() -> Vec<Plan> {
    vec![
        Plan::new("starter", "Starter", Money::from_minor(1_900, USD)),
        Plan::new("pro", "Pro", Money::from_minor(4_900, USD)),
        Plan::new("agency", "Agency", Money::from_minor(9_900, USD)),
    ]
}

/// Provisioning seam for the external billing platform.
pub trait BillingGateway {
    /// Create the plan if it does not exist; succeed without change when it
    /// already does.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the plan definition.
    fn ensure_plan(&mut self, plan: &Plan) -> Result<(), BillingError>;
}

/// In-memory gateway that records provisioned plans.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    plans: Vec<Plan>,
}

impl RecordingGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans provisioned so far.
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}

impl BillingGateway for RecordingGateway {
    fn ensure_plan(&mut self, plan: &Plan) -> Result<(), BillingError> {
        if !self.plans.iter().any(|existing| existing.code == plan.code) {
            self.plans.push(plan.clone());
        }

        Ok(())
    }
}

/// Provision every plan; codes already present are left untouched.
///
/// # Errors
///
/// Returns the first gateway error encountered.
pub fn provision(gateway: &mut impl BillingGateway, plans: &[Plan]) -> Result<usize, BillingError> {
    for plan in plans {
        gateway.ensure_plan(plan)?;
        info!(code = %plan.code, "plan ensured");
    }

    Ok(plans.len())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn provision_creates_every_default_plan() -> TestResult {
        let mut gateway = RecordingGateway::new();
        let plans = default_plans();

        let ensured = provision(&mut gateway, &plans)?;

        assert_eq!(ensured, 3);
        assert_eq!(gateway.plans().len(), 3);

        Ok(())
    }

    #[test]
    fn provision_is_idempotent_per_plan_code() -> TestResult {
        let mut gateway = RecordingGateway::new();
        let plans = default_plans();

        provision(&mut gateway, &plans)?;
        provision(&mut gateway, &plans)?;

        assert_eq!(gateway.plans().len(), 3);

        Ok(())
    }

    #[test]
    fn gateway_errors_propagate() {
        struct RejectingGateway;

        impl BillingGateway for RejectingGateway {
            fn ensure_plan(&mut self, plan: &Plan) -> Result<(), BillingError> {
                Err(BillingError::Rejected(
                    plan.code.clone(),
                    "maintenance window".to_string(),
                ))
            }
        }

        let result = provision(&mut RejectingGateway, &default_plans());

        assert!(matches!(result, Err(BillingError::Rejected(code, _)) if code == "starter"));
    }
}
