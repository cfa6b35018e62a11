use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::Internal(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub country_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_id: Uuid,
}

// Widths of the matching VARCHAR columns on `orders`.
const TEXT_LEN: usize = 255;
const POSTAL_CODE_LEN: usize = 32;
const PHONE_LEN: usize = 64;
const EMAIL_LEN: usize = 255;

/// Raw checkout form as submitted by the client. Nothing here is trusted yet.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub customer_email: Option<String>,
    pub shipping: ShippingAddress,
    pub billing: BillingAddress,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
}

impl CheckoutForm {
    /// Checks that every required field is present and fits its order
    /// column. Reference lookups (countries, methods) happen later inside the
    /// checkout transaction.
    pub fn validate_fields(&self) -> Result<(), DomainError> {
        let s = &self.shipping;
        let b = &self.billing;
        // (field, value, column width in characters)
        let required = [
            ("shipping_name", s.name.as_str(), TEXT_LEN),
            ("shipping_address", s.address.as_str(), TEXT_LEN),
            ("shipping_city", s.city.as_str(), TEXT_LEN),
            ("shipping_postal_code", s.postal_code.as_str(), POSTAL_CODE_LEN),
            ("shipping_phone", s.phone.as_str(), PHONE_LEN),
            ("billing_name", b.name.as_str(), TEXT_LEN),
            ("billing_address", b.address.as_str(), TEXT_LEN),
            ("billing_city", b.city.as_str(), TEXT_LEN),
            ("billing_postal_code", b.postal_code.as_str(), POSTAL_CODE_LEN),
        ];
        for (field, value, max) in required {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{field} is required")));
            }
            if value.chars().count() > max {
                return Err(DomainError::Validation(format!(
                    "{field} must be at most {max} characters"
                )));
            }
        }

        let ids = [
            ("shipping_country_id", s.country_id),
            ("billing_country_id", b.country_id),
            ("shipping_method_id", self.shipping_method_id),
            ("payment_method_id", self.payment_method_id),
        ];
        if let Some((field, _)) = ids.iter().find(|(_, id)| id.is_nil()) {
            return Err(DomainError::Validation(format!("{field} is required")));
        }
        Ok(())
    }
}

/// A checkout request whose contact email has been settled: either the
/// account email of the authenticated user or a validated guest email.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub cart_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub shipping: ShippingAddress,
    pub billing: BillingAddress,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub customer_email: String,
    pub shipping: ShippingAddress,
    pub billing: BillingAddress,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Loose well-formedness check for a guest email: one `@`, a non-empty local
/// part, a dotted domain, no whitespace, and short enough for the
/// `customer_email` column.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty()
        || email.chars().count() > EMAIL_LEN
        || email.chars().any(char::is_whitespace)
    {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutForm {
        CheckoutForm {
            customer_email: Some("guest@example.com".to_string()),
            shipping: ShippingAddress {
                name: "Ada Lovelace".to_string(),
                address: "1 Analytical St".to_string(),
                city: "London".to_string(),
                postal_code: "N1 1AA".to_string(),
                phone: "+44 20 0000 0000".to_string(),
                country_id: Uuid::new_v4(),
            },
            billing: BillingAddress {
                name: "Ada Lovelace".to_string(),
                address: "1 Analytical St".to_string(),
                city: "London".to_string(),
                postal_code: "N1 1AA".to_string(),
                country_id: Uuid::new_v4(),
            },
            shipping_method_id: Uuid::new_v4(),
            payment_method_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn complete_request_passes_field_validation() {
        assert!(request().validate_fields().is_ok());
    }

    #[test]
    fn blank_shipping_city_is_rejected() {
        let mut req = request();
        req.shipping.city = "   ".to_string();
        let err = req.validate_fields().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: shipping_city is required");
    }

    #[test]
    fn nil_payment_method_is_rejected() {
        let mut req = request();
        req.payment_method_id = Uuid::nil();
        assert!(matches!(
            req.validate_fields(),
            Err(DomainError::Validation(msg)) if msg.contains("payment_method_id")
        ));
    }

    #[test]
    fn overlong_fields_are_rejected_at_column_width() {
        let mut req = request();
        req.shipping.postal_code = "9".repeat(40);
        let err = req.validate_fields().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: shipping_postal_code must be at most 32 characters"
        );

        let mut req = request();
        req.shipping.phone = "1".repeat(65);
        assert!(matches!(
            req.validate_fields(),
            Err(DomainError::Validation(msg)) if msg.contains("shipping_phone")
        ));

        let mut req = request();
        req.billing.address = "x".repeat(256);
        assert!(matches!(
            req.validate_fields(),
            Err(DomainError::Validation(msg)) if msg.contains("billing_address")
        ));

        let mut req = request();
        req.billing.city = "é".repeat(255);
        assert!(req.validate_fields().is_ok(), "width counts characters, not bytes");
    }

    #[test]
    fn overlong_email_is_invalid() {
        let local = "a".repeat(250);
        assert!(!is_valid_email(&format!("{local}@example.com")));
        assert!(is_valid_email(&format!("{}@example.com", "a".repeat(200))));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("  padded@example.org  "));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example."));
    }

    #[test]
    fn statuses_parse_their_own_names() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
