use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{is_valid_email, CheckoutForm, ListResult, OrderView, PlaceOrder};
use crate::domain::ports::OrderRepository;

pub const MAX_PAGE_SIZE: i64 = 100;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Turn the contents of `cart_id` into an order.
    ///
    /// For a signed-in customer the account email wins over whatever the form
    /// carried; guests must supply a well-formed one.
    pub fn checkout(
        &self,
        cart_id: Uuid,
        user_id: Option<Uuid>,
        req: CheckoutForm,
    ) -> Result<OrderView, DomainError> {
        req.validate_fields()?;

        let customer_email = match user_id {
            Some(uid) => self
                .repo
                .find_user_email(uid)?
                .ok_or_else(|| DomainError::NotFound("User".to_string()))?,
            None => {
                let email = req.customer_email.as_deref().unwrap_or("").trim();
                if !is_valid_email(email) {
                    return Err(DomainError::Validation("invalid email".to_string()));
                }
                email.to_string()
            }
        };

        self.repo.place_order(PlaceOrder {
            cart_id,
            user_id,
            customer_email,
            shipping: req.shipping,
            billing: req.billing,
            shipping_method_id: req.shipping_method_id,
            payment_method_id: req.payment_method_id,
        })
    }

    /// Orders are only visible to the account that placed them.
    pub fn get_order(&self, user_id: Option<Uuid>, id: Uuid) -> Result<OrderView, DomainError> {
        let not_found = || DomainError::NotFound("Order".to_string());
        let user_id = user_id.ok_or_else(not_found)?;

        self.repo
            .find_by_id(id)?
            .filter(|o| o.user_id == Some(user_id))
            .ok_or_else(not_found)
    }

    pub fn list_orders(
        &self,
        user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let user_id = user_id
            .ok_or_else(|| DomainError::Validation("authentication required".to_string()))?;
        self.repo
            .list_for_user(user_id, page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::order::{BillingAddress, ShippingAddress};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::test_support::*;

    fn form(refs: &Checkout, email: Option<&str>) -> CheckoutForm {
        CheckoutForm {
            customer_email: email.map(str::to_string),
            shipping: ShippingAddress {
                name: "Grace Hopper".to_string(),
                address: "2 Compiler Rd".to_string(),
                city: "Lyon".to_string(),
                postal_code: "69001".to_string(),
                phone: "+33 4 00 00 00 00".to_string(),
                country_id: refs.country_id,
            },
            billing: BillingAddress {
                name: "Grace Hopper".to_string(),
                address: "2 Compiler Rd".to_string(),
                city: "Lyon".to_string(),
                postal_code: "69001".to_string(),
                country_id: refs.country_id,
            },
            shipping_method_id: refs.shipping_method_id,
            payment_method_id: refs.payment_method_id,
        }
    }

    #[tokio::test]
    async fn account_email_overrides_form_email() {
        let (_container, pool) = setup_db().await;
        let svc = OrderService::new(DieselOrderRepository::new(pool.clone()));
        let refs = seed_checkout_refs(&pool, "0.00");
        let user = seed_user(&pool, "account@example.com");
        let v = seed_variant(&pool, "V", "1.00", 5);
        let cart = seed_cart(&pool, Some(user), "new", Utc::now());
        seed_line(&pool, cart, v, 1, "1.00");

        let order = svc
            .checkout(cart, Some(user), form(&refs, Some("typed@example.com")))
            .expect("checkout");

        assert_eq!(order.customer_email, "account@example.com");
        assert_eq!(order.user_id, Some(user));
    }

    #[tokio::test]
    async fn guest_needs_valid_email_before_anything_is_touched() {
        let (_container, pool) = setup_db().await;
        let svc = OrderService::new(DieselOrderRepository::new(pool.clone()));
        let refs = seed_checkout_refs(&pool, "0.00");
        let v = seed_variant(&pool, "V", "1.00", 5);
        let cart = seed_cart(&pool, None, "new", Utc::now());
        seed_line(&pool, cart, v, 1, "1.00");

        let overlong = format!("{}@example.com", "a".repeat(250));
        for email in [None, Some("not-an-email"), Some(overlong.as_str())] {
            assert!(matches!(
                svc.checkout(cart, None, form(&refs, email)),
                Err(DomainError::Validation(_))
            ));
        }
        assert_eq!(stock_of(&pool, v), 5);

        let order = svc
            .checkout(cart, None, form(&refs, Some(" guest@example.com ")))
            .expect("checkout");
        assert_eq!(order.customer_email, "guest@example.com");
        assert_eq!(order.user_id, None);
    }

    #[tokio::test]
    async fn overlong_field_is_rejected_before_checkout_starts() {
        let (_container, pool) = setup_db().await;
        let svc = OrderService::new(DieselOrderRepository::new(pool.clone()));
        let refs = seed_checkout_refs(&pool, "0.00");
        let v = seed_variant(&pool, "V", "2.00", 10);
        let cart = seed_cart(&pool, None, "new", Utc::now());
        seed_line(&pool, cart, v, 1, "2.00");

        let mut input = form(&refs, Some("guest@example.com"));
        input.shipping.postal_code = "9".repeat(40);

        assert!(matches!(
            svc.checkout(cart, None, input),
            Err(DomainError::Validation(ref m)) if m.contains("shipping_postal_code")
        ));
        assert_eq!(stock_of(&pool, v), 10);
        assert_eq!(cart_status(&pool, cart).as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn orders_are_private_to_their_owner() {
        let (_container, pool) = setup_db().await;
        let svc = OrderService::new(DieselOrderRepository::new(pool.clone()));
        let refs = seed_checkout_refs(&pool, "0.00");
        let owner = seed_user(&pool, "owner@example.com");
        let other = seed_user(&pool, "other@example.com");
        let v = seed_variant(&pool, "V", "1.00", 5);
        let cart = seed_cart(&pool, Some(owner), "new", Utc::now());
        seed_line(&pool, cart, v, 1, "1.00");
        let order = svc
            .checkout(cart, Some(owner), form(&refs, None))
            .expect("checkout");

        assert_eq!(svc.get_order(Some(owner), order.id).expect("owner").id, order.id);
        for caller in [Some(other), None] {
            assert!(matches!(
                svc.get_order(caller, order.id),
                Err(DomainError::NotFound(_))
            ));
        }
        assert!(matches!(
            svc.list_orders(None, 1, 20),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(svc.list_orders(Some(owner), 0, 500).expect("list").total, 1);
    }
}
