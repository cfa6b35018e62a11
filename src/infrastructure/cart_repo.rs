use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartLineView, CartStatus, MergeOutcome};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_lines, carts, product_variants};

use super::models::{CartLineDetailRow, CartRow, NewCartLineRow, NewCartRow, VariantRow};

impl TryFrom<CartRow> for Cart {
    type Error = DomainError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<CartLineDetailRow> for CartLineView {
    fn from(row: CartLineDetailRow) -> Self {
        CartLineView {
            variant_id: row.variant_id,
            sku: row.sku,
            quantity: row.quantity,
            price_per_item: row.price_per_item,
        }
    }
}

// ── Connection-level helpers, shared with the order repository ───────────────

pub(crate) fn open_cart_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> QueryResult<Option<CartRow>> {
    carts::table
        .filter(carts::user_id.eq(user_id))
        .filter(carts::status.eq(CartStatus::New.as_str()))
        .select(CartRow::as_select())
        .first(conn)
        .optional()
}

/// Lines of `cart_id` with SKU and live stock, ordered by variant id so that
/// concurrent checkouts lock variant rows in the same order.
pub(crate) fn load_line_details(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> QueryResult<Vec<CartLineDetailRow>> {
    cart_lines::table
        .inner_join(product_variants::table)
        .filter(cart_lines::cart_id.eq(cart_id))
        .select((
            cart_lines::variant_id,
            cart_lines::quantity,
            cart_lines::price_per_item,
            product_variants::sku,
            product_variants::stock_quantity,
        ))
        .order(cart_lines::variant_id.asc())
        .load(conn)
}

/// Lock `cart_id` for the rest of the transaction. Line edits are only
/// allowed while the cart is `new`; checkout and the sweeper take the same
/// lock before closing it.
fn lock_open_cart(conn: &mut PgConnection, cart_id: Uuid) -> Result<(), DomainError> {
    let status: String = carts::table
        .find(cart_id)
        .select(carts::status)
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::NotFound("Cart".to_string()))?;

    if status != CartStatus::New.as_str() {
        return Err(DomainError::CartAlreadyCheckedOut);
    }
    Ok(())
}

fn touch_cart(conn: &mut PgConnection, cart_id: Uuid) -> QueryResult<usize> {
    diesel::update(carts::table.find(cart_id))
        .set(carts::updated_at.eq(Utc::now()))
        .execute(conn)
}

fn upsert_line_on(
    conn: &mut PgConnection,
    cart_id: Uuid,
    variant_id: Uuid,
    quantity: i32,
    price_per_item: BigDecimal,
) -> QueryResult<usize> {
    diesel::insert_into(cart_lines::table)
        .values(&NewCartLineRow {
            cart_id,
            variant_id,
            quantity,
            price_per_item,
        })
        .on_conflict((cart_lines::cart_id, cart_lines::variant_id))
        .do_update()
        .set((
            cart_lines::quantity.eq(cart_lines::quantity + excluded(cart_lines::quantity)),
            cart_lines::price_per_item.eq(excluded(cart_lines::price_per_item)),
            cart_lines::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn find_cart(&self, id: Uuid) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;

        carts::table
            .find(id)
            .select(CartRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Cart::try_from)
            .transpose()
    }

    fn find_open_cart_for_user(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;
        open_cart_for_user(&mut conn, user_id)?
            .map(Cart::try_from)
            .transpose()
    }

    fn create_cart(&self, user_id: Option<Uuid>) -> Result<Cart, DomainError> {
        let mut conn = self.pool.get()?;

        let inserted = diesel::insert_into(carts::table)
            .values(&NewCartRow {
                id: Uuid::new_v4(),
                user_id,
                status: CartStatus::New.as_str().to_string(),
            })
            .returning(CartRow::as_returning())
            .get_result(&mut conn);

        match (inserted, user_id) {
            (Ok(row), _) => row.try_into(),
            // Another request opened a cart for this user first; use theirs.
            (Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)), Some(uid)) => {
                log::debug!("open cart for user {} already exists, reusing it", uid);
                open_cart_for_user(&mut conn, uid)?
                    .map(Cart::try_from)
                    .transpose()?
                    .ok_or_else(|| {
                        DomainError::Internal(format!(
                            "open cart for user {uid} vanished after unique violation"
                        ))
                    })
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    fn load_lines(&self, cart_id: Uuid) -> Result<Vec<CartLineView>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(load_line_details(&mut conn, cart_id)?
            .into_iter()
            .map(CartLineView::from)
            .collect())
    }

    fn add_to_line(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            lock_open_cart(conn, cart_id)?;

            let variant = product_variants::table
                .find(variant_id)
                .select(VariantRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| DomainError::NotFound("Variant".to_string()))?;

            let existing: i32 = cart_lines::table
                .find((cart_id, variant_id))
                .select(cart_lines::quantity)
                .first(conn)
                .optional()?
                .unwrap_or(0);
            let wanted = i64::from(existing) + i64::from(quantity);

            if wanted > i64::from(max_quantity) {
                return Err(DomainError::Validation(format!(
                    "cart may hold at most {} of SKU {}",
                    max_quantity, variant.sku
                )));
            }
            // Early courtesy check only; checkout re-checks under lock.
            if wanted > i64::from(variant.stock_quantity) {
                return Err(DomainError::InsufficientStock { sku: variant.sku });
            }

            upsert_line_on(conn, cart_id, variant.id, quantity, variant.price)?;
            touch_cart(conn, cart_id)?;
            Ok(())
        })
    }

    fn set_line_quantity(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            lock_open_cart(conn, cart_id)?;

            let updated = diesel::update(cart_lines::table.find((cart_id, variant_id)))
                .set((
                    cart_lines::quantity.eq(quantity),
                    cart_lines::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Ok(false);
            }
            touch_cart(conn, cart_id)?;
            Ok(true)
        })
    }

    fn remove_line(&self, cart_id: Uuid, variant_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            lock_open_cart(conn, cart_id)?;

            let deleted =
                diesel::delete(cart_lines::table.find((cart_id, variant_id))).execute(conn)?;
            if deleted > 0 {
                touch_cart(conn, cart_id)?;
            }
            Ok(())
        })
    }

    fn merge_into_user(
        &self,
        anon_cart_id: Uuid,
        user_id: Uuid,
    ) -> Result<MergeOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let anon = carts::table
                .find(anon_cart_id)
                .select(CartRow::as_select())
                .for_update()
                .get_result(conn)
                .optional()?;

            let Some(anon) = anon else {
                return Ok(MergeOutcome::Skipped);
            };
            if anon.status != CartStatus::New.as_str() {
                return Ok(MergeOutcome::Skipped);
            }
            match anon.user_id {
                None => {}
                Some(owner) if owner == user_id => return Ok(MergeOutcome::Skipped),
                Some(owner) => {
                    log::warn!(
                        "refusing to merge cart {} owned by {} into user {}",
                        anon.id,
                        owner,
                        user_id
                    );
                    return Ok(MergeOutcome::Skipped);
                }
            }

            let target = carts::table
                .filter(carts::user_id.eq(user_id))
                .filter(carts::status.eq(CartStatus::New.as_str()))
                .select(CartRow::as_select())
                .for_update()
                .get_result(conn)
                .optional()?;

            // 1. No open user cart: hand the anonymous cart over as-is.
            let Some(target) = target else {
                diesel::update(carts::table.find(anon.id))
                    .set((
                        carts::user_id.eq(Some(user_id)),
                        carts::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                return Ok(MergeOutcome::Reassigned);
            };

            // 2. Fold each anonymous line into the user cart at today's price.
            let lines: Vec<(Uuid, i32, BigDecimal)> = cart_lines::table
                .inner_join(product_variants::table)
                .filter(cart_lines::cart_id.eq(anon.id))
                .select((
                    cart_lines::variant_id,
                    cart_lines::quantity,
                    product_variants::price,
                ))
                .order(cart_lines::variant_id.asc())
                .load(conn)?;

            for (variant_id, quantity, price) in &lines {
                upsert_line_on(conn, target.id, *variant_id, *quantity, price.clone())?;
            }

            // 3. Drop the anonymous cart.
            diesel::delete(cart_lines::table.filter(cart_lines::cart_id.eq(anon.id)))
                .execute(conn)?;
            diesel::delete(carts::table.find(anon.id)).execute(conn)?;
            touch_cart(conn, target.id)?;

            Ok(MergeOutcome::Merged { lines: lines.len() })
        })
    }

    fn abandon_idle_carts(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let swept = diesel::update(
            carts::table
                .filter(carts::status.eq(CartStatus::New.as_str()))
                .filter(carts::updated_at.lt(cutoff)),
        )
        .set((
            carts::status.eq(CartStatus::Abandoned.as_str()),
            carts::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(swept)
    }
}
