use std::future::{ready, Ready};

use actix_web::cookie::time::Duration as CookieMaxAge;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

use crate::application::cart_service::{CartContext, CookieAction};
use crate::cart_cookie::{CART_COOKIE_MAX_AGE_SECS, CART_COOKIE_NAME};
use crate::domain::errors::DomainError;
use crate::errors::AppError;

/// Set by the upstream authentication gateway for signed-in customers.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated customer, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Option<Uuid>);

fn user_from_request(req: &HttpRequest) -> Option<Uuid> {
    let raw = req.headers().get(USER_ID_HEADER)?.to_str().ok()?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) if !id.is_nil() => Some(id),
        _ => {
            log::warn!("ignoring malformed {} header", USER_ID_HEADER);
            None
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(CurrentUser(user_from_request(req))))
    }
}

impl FromRequest for CartContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(CartContext {
            user_id: user_from_request(req),
            cookie: req
                .cookie(CART_COOKIE_NAME)
                .map(|c| c.value().to_string()),
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

pub fn cart_cookie(value: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(CART_COOKIE_NAME, value)
        .path("/")
        .max_age(CookieMaxAge::seconds(CART_COOKIE_MAX_AGE_SECS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .finish()
}

/// Render `result` and attach the cart cookie if the resolver issued one.
/// The cookie goes out on error responses too, so a freshly created cart is
/// not orphaned by a failed operation.
pub fn respond<T: Serialize>(
    status: StatusCode,
    cookie: &CookieAction,
    settings: &CookieSettings,
    result: Result<T, DomainError>,
) -> HttpResponse {
    let mut resp = match result {
        Ok(body) => HttpResponse::build(status).json(body),
        Err(e) => AppError::from(e).error_response(),
    };
    if let CookieAction::Set(value) = cookie {
        if let Err(e) = resp.add_cookie(&cart_cookie(value.clone(), settings)) {
            log::error!("failed to attach cart cookie: {}", e);
        }
    }
    resp
}
