//! Tax and service charge policy.
//!
//! Order totals are `subtotal + tax + service_charge - discount`. How tax and service charge
//! are derived from the subtotal is branch policy, so the order actor asks a
//! [`ChargePolicy`] rather than hard-coding rates.

use crate::model::BranchId;
use crate::money::round_money;
use rust_decimal::Decimal;
use std::fmt::Debug;

/// Tax and service charge for one subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Charges {
    pub tax: Decimal,
    pub service_charge: Decimal,
}

pub trait ChargePolicy: Debug + Send + Sync {
    fn compute_charges(&self, subtotal: Decimal, branch: BranchId) -> Charges;
}

/// No tax, no service charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCharges;

impl ChargePolicy for NoCharges {
    fn compute_charges(&self, _subtotal: Decimal, _branch: BranchId) -> Charges {
        Charges::default()
    }
}

/// Flat percentage rates applied to the subtotal, e.g. `0.05` for 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub tax_rate: Decimal,
    pub service_rate: Decimal,
}

impl ChargePolicy for RatePolicy {
    fn compute_charges(&self, subtotal: Decimal, _branch: BranchId) -> Charges {
        Charges {
            tax: round_money(subtotal * self.tax_rate),
            service_charge: round_money(subtotal * self.service_rate),
        }
    }
}
