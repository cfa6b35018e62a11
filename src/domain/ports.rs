use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::{Cart, CartLineView, MergeOutcome};
use super::errors::DomainError;
use super::order::{ListResult, OrderView, PlaceOrder};

pub trait CartRepository: Send + Sync + 'static {
    fn find_cart(&self, id: Uuid) -> Result<Option<Cart>, DomainError>;
    fn find_open_cart_for_user(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError>;
    /// Creates an open cart. For a user who concurrently gained an open cart,
    /// returns that one instead.
    fn create_cart(&self, user_id: Option<Uuid>) -> Result<Cart, DomainError>;
    fn load_lines(&self, cart_id: Uuid) -> Result<Vec<CartLineView>, DomainError>;
    /// Adds `quantity` of the variant to the cart at its current price,
    /// refreshing the snapshot of an existing line. The resulting line must
    /// stay within `max_quantity` and current stock. Fails with
    /// `CartAlreadyCheckedOut` once the cart is no longer open.
    fn add_to_line(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<(), DomainError>;
    /// Returns `false` when the cart has no line for `variant_id`.
    fn set_line_quantity(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError>;
    fn remove_line(&self, cart_id: Uuid, variant_id: Uuid) -> Result<(), DomainError>;
    fn merge_into_user(&self, anon_cart_id: Uuid, user_id: Uuid)
        -> Result<MergeOutcome, DomainError>;
    /// Marks every open cart idle since before `cutoff` as abandoned.
    fn abandon_idle_carts(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn find_user_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError>;
    fn place_order(&self, order: PlaceOrder) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid, page: i64, limit: i64)
        -> Result<ListResult, DomainError>;
}
