use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::{CartContext, CartService};
use crate::cart_cookie::CART_COOKIE_NAME;
use crate::domain::cart::{CartLineView, CartView};
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::infrastructure::cart_repo::DieselCartRepository;

use super::session::{respond, CookieSettings, CurrentUser};

pub type Carts = web::Data<CartService<DieselCartRepository>>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    /// Zero or negative removes the item.
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    /// Price captured when the item was added, e.g. "9.99"
    pub price_per_item: String,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub item_count: i64,
    pub items: Vec<CartItemResponse>,
    pub total: String,
}

impl From<&CartLineView> for CartItemResponse {
    fn from(line: &CartLineView) -> Self {
        CartItemResponse {
            variant_id: line.variant_id,
            sku: line.sku.clone(),
            quantity: line.quantity,
            price_per_item: line.price_per_item.to_string(),
            line_total: line.line_total().to_string(),
        }
    }
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        CartResponse {
            id: cart.id,
            item_count: cart.item_count(),
            total: cart.total().to_string(),
            items: cart.lines.iter().map(CartItemResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Resolve the caller's cart, run `op` against it on the blocking pool and
/// render the cart, attaching a new cookie when one was issued.
async fn with_cart<F>(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
    op: F,
) -> Result<HttpResponse, AppError>
where
    F: FnOnce(&CartService<DieselCartRepository>, Uuid) -> Result<CartView, DomainError>
        + Send
        + 'static,
{
    let (resolved, result) = web::block(move || {
        let resolved = carts.resolve(&ctx)?;
        let result = op(carts.get_ref(), resolved.cart_id);
        Ok::<_, DomainError>((resolved, result))
    })
    .await??;

    Ok(respond(
        StatusCode::OK,
        &resolved.cookie,
        &settings,
        result.map(CartResponse::from),
    ))
}

/// GET /cart
///
/// Returns the caller's cart, creating an empty one on first visit.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Current cart", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
) -> Result<HttpResponse, AppError> {
    with_cart(carts, settings, ctx, |svc, cart_id| svc.view(cart_id)).await
}

/// POST /cart/items
///
/// Adds a variant to the cart. Adding a variant already in the cart increases
/// its quantity and refreshes the price snapshot.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Invalid quantity, or line would exceed the per-line maximum"),
        (status = 404, description = "Variant not found"),
        (status = 409, description = "Not enough stock, or cart already checked out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    with_cart(carts, settings, ctx, move |svc, cart_id| {
        svc.add_line(cart_id, body.variant_id, body.quantity)
    })
    .await
}

/// PUT /cart/items/{variant_id}
#[utoipa::path(
    put,
    path = "/cart/items/{variant_id}",
    params(
        ("variant_id" = Uuid, Path, description = "Variant UUID"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Item not in cart"),
        (status = 409, description = "Cart already checked out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let variant_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    with_cart(carts, settings, ctx, move |svc, cart_id| {
        svc.update_line(cart_id, variant_id, quantity)
    })
    .await
}

/// DELETE /cart/items/{variant_id}
#[utoipa::path(
    delete,
    path = "/cart/items/{variant_id}",
    params(
        ("variant_id" = Uuid, Path, description = "Variant UUID"),
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 409, description = "Cart already checked out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    ctx: CartContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let variant_id = path.into_inner();
    with_cart(carts, settings, ctx, move |svc, cart_id| {
        svc.remove_line(cart_id, variant_id)
    })
    .await
}

/// POST /cart/merge
///
/// Called by the login flow once the customer is authenticated. Folds the
/// anonymous cart named by the cookie into the customer's cart and returns
/// the result. Merge problems never fail the request.
#[utoipa::path(
    post,
    path = "/cart/merge",
    responses(
        (status = 200, description = "The customer's cart after merging", body = CartResponse),
        (status = 400, description = "Not authenticated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn merge_cart(
    carts: Carts,
    settings: web::Data<CookieSettings>,
    user: CurrentUser,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let Some(user_id) = user.0 else {
        return Err(AppError::BadRequest("authentication required".to_string()));
    };
    let cookie = req.cookie(CART_COOKIE_NAME).map(|c| c.value().to_string());

    let (resolved, result) = web::block(move || {
        let resolved = carts.merge_on_login(user_id, cookie)?;
        let result = carts.view(resolved.cart_id);
        Ok::<_, DomainError>((resolved, result))
    })
    .await??;

    Ok(respond(
        StatusCode::OK,
        &resolved.cookie,
        &settings,
        result.map(CartResponse::from),
    ))
}
