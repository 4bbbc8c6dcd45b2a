//! Borrowing lifecycle.
//!
//! ```text
//! PENDING ──► APPROVED ──► RETURNED
//!    │           │           ▲
//!    ▼           ▼           │
//! REJECTED    OVERDUE ───────┘
//! ```
//!
//! Stock leaves the shelf when a request is approved and comes back when it
//! is returned. Creating, rejecting and marking overdue never touch stock.

use crate::entity::sea_orm_active_enums::BorrowingStatus;

/// What a transition does to `items.available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    None,
    /// Take `quantity` units out of `available`.
    Checkout,
    /// Put `quantity` units back into `available`.
    Restock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BorrowingStatus,
    pub to: BorrowingStatus,
    pub stock: StockEffect,
    /// Whether `actual_return_date` gets stamped.
    pub stamps_return: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot change borrowing status from {from} to {to}")]
pub struct IllegalTransition {
    pub from: BorrowingStatus,
    pub to: BorrowingStatus,
}

impl BorrowingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BorrowingStatus::Rejected | BorrowingStatus::Returned)
    }

    pub fn can_transition_to(&self, next: BorrowingStatus) -> bool {
        plan(*self, next).is_ok()
    }
}

pub fn plan(from: BorrowingStatus, to: BorrowingStatus) -> Result<Transition, IllegalTransition> {
    use BorrowingStatus::*;

    let stock = match (from, to) {
        (Pending, Approved) => StockEffect::Checkout,
        (Pending, Rejected) => StockEffect::None,
        (Approved, Overdue) => StockEffect::None,
        (Approved, Returned) | (Overdue, Returned) => StockEffect::Restock,
        _ => return Err(IllegalTransition { from, to }),
    };

    Ok(Transition {
        from,
        to,
        stock,
        stamps_return: to == Returned,
    })
}
