use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    New,
    Abandoned,
    Completed,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::New => "new",
            CartStatus::Abandoned => "abandoned",
            CartStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(CartStatus::New),
            "abandoned" => Ok(CartStatus::Abandoned),
            "completed" => Ok(CartStatus::Completed),
            other => Err(DomainError::Internal(format!("unknown cart status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A cart can be handed to a caller only while it is still open and owned
    /// by exactly the identity making the request.
    pub fn is_usable_by(&self, user_id: Option<Uuid>) -> bool {
        self.status == CartStatus::New && self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct CartLineView {
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
}

impl CartLineView {
    pub fn line_total(&self) -> BigDecimal {
        &self.price_per_item * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub lines: Vec<CartLineView>,
}

impl CartView {
    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn total(&self) -> BigDecimal {
        cart_total(&self.lines)
    }
}

/// Sum of `quantity * snapshot price` over all lines.
pub fn cart_total(lines: &[CartLineView]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| acc + line.line_total())
}

/// What the merge engine did with an anonymous cart at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The user had no open cart, so the anonymous one was handed over.
    Reassigned,
    /// Lines were folded into the user's existing cart and the anonymous
    /// cart was deleted.
    Merged { lines: usize },
    /// Nothing to do: cart missing, closed, or already owned.
    Skipped,
}
