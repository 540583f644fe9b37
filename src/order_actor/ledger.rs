//! Payment ledger.
//!
//! Payments are an append-only list of entries on the order. The order's payment status is
//! always derived from that list, never stored independently:
//!
//! | Condition | Status |
//! |-----------|--------|
//! | refunded >= paid > 0 | `REFUNDED` |
//! | paid = 0 and some attempt failed | `FAILED` |
//! | paid = 0 | `PENDING` |
//! | paid = total (within one minor unit) | `PAID` |
//! | otherwise | `PARTIAL` |
//!
//! `paid` is the gross sum of `PAID` entries; refunds are separate `REFUNDED` entries that
//! point at the payment they return money from.

use super::error::OrderError;
use crate::model::{Order, Payment, PaymentId, PaymentMethod, PaymentStatus};
use crate::money::{is_valid_amount, money_eq, money_exceeds, round_money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

fn sum_where(payments: &[Payment], keep: impl Fn(&Payment) -> bool) -> Decimal {
    round_money(payments.iter().filter(|p| keep(*p)).map(|p| p.amount).sum())
}

/// Gross amount collected.
pub fn paid_total(payments: &[Payment]) -> Decimal {
    sum_where(payments, |p| p.status == PaymentStatus::Paid)
}

pub fn refunded_total(payments: &[Payment]) -> Decimal {
    sum_where(payments, |p| p.status == PaymentStatus::Refunded)
}

/// Amount already refunded against one payment.
pub fn refunded_against(payments: &[Payment], original: PaymentId) -> Decimal {
    sum_where(payments, |p| {
        p.status == PaymentStatus::Refunded && p.refund_of == Some(original)
    })
}

pub fn derive_payment_status(payments: &[Payment], total: Decimal) -> PaymentStatus {
    let paid = paid_total(payments);
    let refunded = refunded_total(payments);

    if paid > Decimal::ZERO && !money_exceeds(paid, refunded) {
        PaymentStatus::Refunded
    } else if paid.is_zero() {
        if payments.iter().any(|p| p.status == PaymentStatus::Failed) {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Pending
        }
    } else if money_eq(paid, total) {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// What is still owed on the order.
pub fn outstanding(order: &Order) -> Decimal {
    (order.totals.total - paid_total(&order.payments)).max(Decimal::ZERO)
}

fn validate_amount(amount: Decimal) -> Result<(), OrderError> {
    if amount <= Decimal::ZERO || !is_valid_amount(amount) {
        return Err(OrderError::ValidationError(format!(
            "amount must be positive with at most two decimals, got {amount}"
        )));
    }
    Ok(())
}

fn next_payment_id(order: &mut Order) -> PaymentId {
    let id = PaymentId(order.next_payment_id);
    order.next_payment_id += 1;
    id
}

/// Appends a successful payment. Rejects the whole amount if it would overpay; amounts
/// are never clamped.
pub fn apply_payment(
    order: &mut Order,
    amount: Decimal,
    method: PaymentMethod,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> Result<Payment, OrderError> {
    validate_amount(amount)?;
    let paid = paid_total(&order.payments);
    if money_exceeds(paid + amount, order.totals.total) {
        return Err(OrderError::Overpayment {
            order: order.id,
            attempted: amount,
            outstanding: outstanding(order),
        });
    }
    let payment = Payment {
        id: next_payment_id(order),
        amount,
        method,
        status: PaymentStatus::Paid,
        reference,
        refund_of: None,
        note: None,
        recorded_at: now,
    };
    order.payments.push(payment.clone());
    order.payment_status = derive_payment_status(&order.payments, order.totals.total);
    Ok(payment)
}

/// Records a declined or failed attempt. It is kept for audit and never counts as paid.
pub fn record_failed_payment(
    order: &mut Order,
    amount: Decimal,
    method: PaymentMethod,
    reason: String,
    now: DateTime<Utc>,
) -> Result<Payment, OrderError> {
    validate_amount(amount)?;
    let payment = Payment {
        id: next_payment_id(order),
        amount,
        method,
        status: PaymentStatus::Failed,
        reference: None,
        refund_of: None,
        note: Some(reason),
        recorded_at: now,
    };
    order.payments.push(payment.clone());
    order.payment_status = derive_payment_status(&order.payments, order.totals.total);
    Ok(payment)
}

/// Appends a refund entry against `original`. The order must be fully paid, and the
/// refund can never exceed what remains unrefunded on the original payment.
pub fn refund(
    order: &mut Order,
    amount: Decimal,
    original: PaymentId,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Payment, OrderError> {
    validate_amount(amount)?;
    if order.payment_status != PaymentStatus::Paid {
        return Err(OrderError::NotRefundable {
            order: order.id,
            payment_status: order.payment_status,
        });
    }
    let source = order
        .payment(original)
        .filter(|p| p.status == PaymentStatus::Paid)
        .cloned()
        .ok_or(OrderError::PaymentNotFound { order: order.id, payment: original })?;

    let refundable = round_money(source.amount - refunded_against(&order.payments, original));
    if money_exceeds(amount, refundable) {
        return Err(OrderError::RefundExceedsPayment {
            payment: original,
            requested: amount,
            refundable,
        });
    }
    let payment = Payment {
        id: next_payment_id(order),
        amount,
        method: source.method,
        status: PaymentStatus::Refunded,
        reference: source.reference,
        refund_of: Some(original),
        note: reason,
        recorded_at: now,
    };
    order.payments.push(payment.clone());
    order.payment_status = derive_payment_status(&order.payments, order.totals.total);
    Ok(payment)
}

/// Gross collected money may never exceed the order total.
pub fn ensure_within_total(order: &Order) -> Result<(), OrderError> {
    let paid = paid_total(&order.payments);
    if money_exceeds(paid, order.totals.total) {
        return Err(OrderError::PaidExceedsTotal {
            order: order.id,
            paid,
            total: order.totals.total,
        });
    }
    Ok(())
}
