use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::CartContext;
use crate::application::order_service::{OrderService, MAX_PAGE_SIZE};
use crate::domain::errors::DomainError;
use crate::domain::order::{BillingAddress, CheckoutForm, OrderView, ShippingAddress};
use crate::errors::AppError;
use crate::infrastructure::order_repo::DieselOrderRepository;

use super::carts::Carts;
use super::session::{respond, CookieSettings, CurrentUser};

pub type Orders = web::Data<OrderService<DieselOrderRepository>>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    /// Required for guests; ignored for signed-in customers.
    #[serde(default)]
    pub customer_email: Option<String>,
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_phone: String,
    pub shipping_country_id: Uuid,
    pub billing_name: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_postal_code: String,
    pub billing_country_id: Uuid,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
}

impl From<CheckoutRequest> for CheckoutForm {
    fn from(r: CheckoutRequest) -> Self {
        CheckoutForm {
            customer_email: r.customer_email,
            shipping: ShippingAddress {
                name: r.shipping_name,
                address: r.shipping_address,
                city: r.shipping_city,
                postal_code: r.shipping_postal_code,
                phone: r.shipping_phone,
                country_id: r.shipping_country_id,
            },
            billing: BillingAddress {
                name: r.billing_name,
                address: r.billing_address,
                city: r.billing_city,
                postal_code: r.billing_postal_code,
                country_id: r.billing_country_id,
            },
            shipping_method_id: r.shipping_method_id,
            payment_method_id: r.payment_method_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_per_item: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub total_price: String,
    pub shipping_price: String,
    pub customer_email: String,
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_phone: String,
    pub shipping_country_id: Uuid,
    pub billing_name: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_postal_code: String,
    pub billing_country_id: Uuid,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            user_id: o.user_id,
            status: o.status.to_string(),
            payment_status: o.payment_status.to_string(),
            total_price: o.total_price.to_string(),
            shipping_price: o.shipping_price.to_string(),
            customer_email: o.customer_email,
            shipping_name: o.shipping.name,
            shipping_address: o.shipping.address,
            shipping_city: o.shipping.city,
            shipping_postal_code: o.shipping.postal_code,
            shipping_phone: o.shipping.phone,
            shipping_country_id: o.shipping.country_id,
            billing_name: o.billing.name,
            billing_address: o.billing.address,
            billing_city: o.billing.city,
            billing_postal_code: o.billing.postal_code,
            billing_country_id: o.billing.country_id,
            shipping_method_id: o.shipping_method_id,
            payment_method_id: o.payment_method_id,
            created_at: o.created_at,
            updated_at: o.updated_at,
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    variant_id: l.variant_id,
                    sku: l.sku,
                    quantity: l.quantity,
                    price_per_item: l.price_per_item.to_string(),
                })
                .collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /checkout
///
/// Converts the caller's cart into an order. Stock reservation, the order
/// header, its lines and closing the cart happen in one database transaction;
/// on any failure nothing is persisted.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Missing or malformed field, or empty cart"),
        (status = 404, description = "Unknown or inactive shipping method, payment method or country"),
        (status = 409, description = "Insufficient stock or cart already checked out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    carts: Carts,
    orders: Orders,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let input = CheckoutForm::from(body.into_inner());
    let user_id = ctx.user_id;

    let (resolved, result) = web::block(move || {
        let resolved = carts.resolve(&ctx)?;
        let result = orders.checkout(resolved.cart_id, user_id, input);
        Ok::<_, DomainError>((resolved, result))
    })
    .await??;

    Ok(respond(
        StatusCode::CREATED,
        &resolved.cookie,
        &settings,
        result.map(OrderResponse::from),
    ))
}

/// GET /orders/{id}
///
/// Returns one of the caller's orders together with its lines.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    orders: Orders,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || orders.get_order(user.0, order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns the caller's order history, newest first, without lines.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Not authenticated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    orders: Orders,
    user: CurrentUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let result = web::block(move || orders.list_orders(user.0, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
