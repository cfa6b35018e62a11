use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::CartStatus;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    BillingAddress, ListResult, OrderLineView, OrderStatus, OrderView, PaymentStatus, PlaceOrder,
    ShippingAddress,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{
    carts, countries, order_lines, orders, payment_options, product_variants, shipping_options,
    users,
};

use super::cart_repo::load_line_details;
use super::models::{
    CartRow, CountryRow, NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow, PaymentOptionRow,
    ShippingOptionRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn order_view(order: OrderRow, lines: Vec<OrderLineRow>) -> Result<OrderView, DomainError> {
    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        status: order.status.parse()?,
        payment_status: order.payment_status.parse()?,
        total_price: order.total_price,
        shipping_price: order.shipping_price,
        customer_email: order.customer_email,
        shipping: ShippingAddress {
            name: order.shipping_name,
            address: order.shipping_address,
            city: order.shipping_city,
            postal_code: order.shipping_postal_code,
            phone: order.shipping_phone,
            country_id: order.shipping_country_id,
        },
        billing: BillingAddress {
            name: order.billing_name,
            address: order.billing_address,
            city: order.billing_city,
            postal_code: order.billing_postal_code,
            country_id: order.billing_country_id,
        },
        shipping_method_id: order.shipping_option_id,
        payment_method_id: order.payment_option_id,
        created_at: order.created_at,
        updated_at: order.updated_at,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                variant_id: l.variant_id,
                sku: l.sku,
                quantity: l.quantity,
                price_per_item: l.price_per_item,
            })
            .collect(),
    })
}

// ── Reference lookups inside the checkout transaction ────────────────────────

fn active_country(
    conn: &mut PgConnection,
    id: Uuid,
    label: &str,
) -> Result<CountryRow, DomainError> {
    countries::table
        .find(id)
        .select(CountryRow::as_select())
        .first(conn)
        .optional()?
        .filter(|c| c.is_active)
        .ok_or_else(|| DomainError::NotFound(label.to_string()))
}

fn active_shipping_option(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<ShippingOptionRow, DomainError> {
    shipping_options::table
        .find(id)
        .select(ShippingOptionRow::as_select())
        .first(conn)
        .optional()?
        .filter(|s| s.is_active)
        .ok_or_else(|| DomainError::NotFound("Shipping method".to_string()))
}

fn active_payment_option(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<PaymentOptionRow, DomainError> {
    payment_options::table
        .find(id)
        .select(PaymentOptionRow::as_select())
        .first(conn)
        .optional()?
        .filter(|p| p.is_active)
        .ok_or_else(|| DomainError::NotFound("Payment method".to_string()))
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn find_user_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(users::table
            .find(user_id)
            .select(users::email)
            .first(&mut conn)
            .optional()?)
    }

    fn place_order(&self, req: PlaceOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 0. Reference data must exist and be active.
            let shipping_country = active_country(conn, req.shipping.country_id, "Shipping country")?;
            let billing_country = active_country(conn, req.billing.country_id, "Billing country")?;
            let shipping_method = active_shipping_option(conn, req.shipping_method_id)?;
            let payment_method = active_payment_option(conn, req.payment_method_id)?;

            // 1. Lock the cart; a second checkout of the same cart waits here
            //    and then sees it completed.
            let cart = carts::table
                .find(req.cart_id)
                .select(CartRow::as_select())
                .for_update()
                .get_result(conn)
                .optional()?
                .filter(|c| c.user_id == req.user_id)
                .ok_or_else(|| DomainError::NotFound("Cart".to_string()))?;
            if cart.status != CartStatus::New.as_str() {
                return Err(DomainError::CartAlreadyCheckedOut);
            }

            let lines = load_line_details(conn, cart.id)?;
            if lines.is_empty() {
                return Err(DomainError::Validation("cart is empty".to_string()));
            }

            // 2. Guarded decrement, before any order row exists.
            for line in &lines {
                let reserved = diesel::update(
                    product_variants::table
                        .filter(product_variants::id.eq(line.variant_id))
                        .filter(product_variants::stock_quantity.ge(line.quantity)),
                )
                .set((
                    product_variants::stock_quantity
                        .eq(product_variants::stock_quantity - line.quantity),
                    product_variants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

                if reserved == 0 {
                    log::info!(
                        "checkout of cart {} rejected: SKU {} has {} left, {} requested",
                        cart.id,
                        line.sku,
                        line.stock_quantity,
                        line.quantity
                    );
                    return Err(DomainError::InsufficientStock {
                        sku: line.sku.clone(),
                    });
                }
            }

            // 3. Totals from snapshot prices and the stored shipping price.
            let subtotal = lines.iter().fold(BigDecimal::from(0), |acc, l| {
                acc + &l.price_per_item * BigDecimal::from(l.quantity)
            });
            let total_price = &subtotal + &shipping_method.price;

            // 4. Order header.
            let order_id = Uuid::new_v4();
            let order = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id: req.user_id,
                    status: OrderStatus::Pending.as_str().to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                    total_price,
                    shipping_price: shipping_method.price.clone(),
                    customer_email: req.customer_email,
                    shipping_name: req.shipping.name,
                    shipping_address: req.shipping.address,
                    shipping_city: req.shipping.city,
                    shipping_postal_code: req.shipping.postal_code,
                    shipping_phone: req.shipping.phone,
                    shipping_country_id: shipping_country.id,
                    billing_name: req.billing.name,
                    billing_address: req.billing.address,
                    billing_city: req.billing.city,
                    billing_postal_code: req.billing.postal_code,
                    billing_country_id: billing_country.id,
                    shipping_option_id: shipping_method.id,
                    payment_option_id: payment_method.id,
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 5. Snapshot the cart lines.
            let new_lines: Vec<NewOrderLineRow> = lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    variant_id: l.variant_id,
                    sku: l.sku.clone(),
                    quantity: l.quantity,
                    price_per_item: l.price_per_item.clone(),
                })
                .collect();
            let mut order_lines: Vec<OrderLineRow> = diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .returning(OrderLineRow::as_returning())
                .get_results(conn)?;
            order_lines.sort_by_key(|l| l.variant_id);

            // 6. Close the cart.
            let completed = diesel::update(
                carts::table
                    .filter(carts::id.eq(cart.id))
                    .filter(carts::status.eq(CartStatus::New.as_str())),
            )
            .set((
                carts::status.eq(CartStatus::Completed.as_str()),
                carts::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
            if completed != 1 {
                return Err(DomainError::CartAlreadyCheckedOut);
            }

            log::info!(
                "order {} placed from cart {} ({} lines, total {})",
                order.id,
                cart.id,
                order_lines.len(),
                order.total_price
            );

            order_view(order, order_lines)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = OrderLineRow::belonging_to(&order)
            .select(OrderLineRow::as_select())
            .order(order_lines::variant_id.asc())
            .load(&mut conn)?;

        order_view(order, lines).map(Some)
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page
            .checked_sub(1)
            .filter(|p| *p >= 0)
            .and_then(|p| p.checked_mul(limit))
            .ok_or_else(|| DomainError::Validation(format!("page {page} is out of range")))?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items = rows
                .into_iter()
                .map(|o| order_view(o, vec![]))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ListResult { items, total })
        })
    }
}
