use uuid::Uuid;

use crate::cart_cookie::CartCookieSigner;
use crate::domain::cart::{CartView, MergeOutcome};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

/// Who is asking, as far as the cart is concerned. Built per request from the
/// upstream auth header and the raw cart cookie.
#[derive(Debug, Clone, Default)]
pub struct CartContext {
    pub user_id: Option<Uuid>,
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    /// The presented cookie still names the cart in use.
    Keep,
    /// Replace whatever the client holds with this value.
    Set(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedCart {
    pub cart_id: Uuid,
    pub cookie: CookieAction,
}

pub struct CartService<R> {
    repo: R,
    signer: CartCookieSigner,
    max_quantity: i32,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R, signer: CartCookieSigner, max_quantity: i32) -> Self {
        Self {
            repo,
            signer,
            max_quantity,
        }
    }

    /// Turn the caller's identity and cookie into a cart they may use,
    /// creating one when nothing usable exists.
    pub fn resolve(&self, ctx: &CartContext) -> Result<ResolvedCart, DomainError> {
        if let Some(cart_id) = ctx.cookie.as_deref().and_then(|c| self.signer.verify(c)) {
            match self.repo.find_cart(cart_id)? {
                Some(cart) if cart.is_usable_by(ctx.user_id) => {
                    return Ok(ResolvedCart {
                        cart_id: cart.id,
                        cookie: CookieAction::Keep,
                    });
                }
                Some(cart) if cart.user_id != ctx.user_id => {
                    log::warn!(
                        "cart cookie for {} presented by a different identity, discarding",
                        cart.id
                    );
                }
                _ => log::debug!("cart cookie for {} is stale, discarding", cart_id),
            }
        }

        if let Some(user_id) = ctx.user_id {
            if let Some(cart) = self.repo.find_open_cart_for_user(user_id)? {
                return Ok(self.issue(cart.id));
            }
        }

        let cart = self.repo.create_cart(ctx.user_id)?;
        log::debug!("created cart {} for {:?}", cart.id, ctx.user_id);
        Ok(self.issue(cart.id))
    }

    fn issue(&self, cart_id: Uuid) -> ResolvedCart {
        ResolvedCart {
            cart_id,
            cookie: CookieAction::Set(self.signer.sign(cart_id)),
        }
    }

    pub fn view(&self, cart_id: Uuid) -> Result<CartView, DomainError> {
        Ok(CartView {
            id: cart_id,
            lines: self.repo.load_lines(cart_id)?,
        })
    }

    pub fn add_line(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        if quantity <= 0 || quantity > self.max_quantity {
            return Err(DomainError::Validation(format!(
                "quantity must be between 1 and {}",
                self.max_quantity
            )));
        }

        self.repo
            .add_to_line(cart_id, variant_id, quantity, self.max_quantity)?;
        self.view(cart_id)
    }

    /// Set a line's quantity; zero or less removes the line.
    pub fn update_line(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        if quantity <= 0 {
            return self.remove_line(cart_id, variant_id);
        }
        if quantity > self.max_quantity {
            return Err(DomainError::Validation(format!(
                "quantity must not exceed {}",
                self.max_quantity
            )));
        }
        if !self.repo.set_line_quantity(cart_id, variant_id, quantity)? {
            return Err(DomainError::NotFound("Cart item".to_string()));
        }
        self.view(cart_id)
    }

    pub fn remove_line(&self, cart_id: Uuid, variant_id: Uuid) -> Result<CartView, DomainError> {
        self.repo.remove_line(cart_id, variant_id)?;
        self.view(cart_id)
    }

    /// Login hook. Folds the cookie's anonymous cart into the user's cart,
    /// then resolves the user's cart. A failed merge is logged and the login
    /// proceeds; the leftover anonymous cart is eventually swept.
    pub fn merge_on_login(
        &self,
        user_id: Uuid,
        cookie: Option<String>,
    ) -> Result<ResolvedCart, DomainError> {
        if let Some(anon_cart_id) = cookie.as_deref().and_then(|c| self.signer.verify(c)) {
            match self.repo.merge_into_user(anon_cart_id, user_id) {
                Ok(MergeOutcome::Skipped) => {}
                Ok(outcome) => log::info!(
                    "merged cart {} into user {}: {:?}",
                    anon_cart_id,
                    user_id,
                    outcome
                ),
                Err(e) => log::warn!(
                    "failed to merge cart {} into user {}: {}",
                    anon_cart_id,
                    user_id,
                    e
                ),
            }
        }

        self.resolve(&CartContext {
            user_id: Some(user_id),
            cookie,
        })
    }
}
