use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::proposal::LineItem;
use crate::errors::DomainError;

/// Decimal places shown wherever an amount leaves the core.
pub const MONEY_SCALE: u32 = 2;

/// Plain multiplication. Callers pass items that went through
/// `ProposalInput::validate`, which rejects products that do not fit.
pub fn line_total(item: &LineItem) -> Decimal {
    item.quantity * item.unit_price
}

/// Sum of `quantity * unit_price` over every item. The prompt context and the
/// rendered document both read totals from here.
pub fn proposal_total(items: &[LineItem]) -> Decimal {
    items.iter().map(line_total).sum()
}

/// Same sum as [`proposal_total`], failing on the first line item whose
/// product or running sum overflows `Decimal`.
pub fn checked_proposal_total(items: &[LineItem]) -> Result<Decimal, DomainError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.quantity
            .checked_mul(item.unit_price)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| DomainError::AmountOutOfRange(item.id.clone()))
    })
}

/// Rounds to cents, half away from zero. Both the prompt and the document
/// format amounts from this value.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
