use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{
    cart_lines, carts, countries, order_lines, orders, payment_options, product_variants,
    shipping_options,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_lines)]
pub struct NewCartLineRow {
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
}

/// A cart line joined with its variant's SKU and live stock.
#[derive(Debug, Clone, Queryable)]
pub struct CartLineDetailRow {
    pub variant_id: Uuid,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
    pub sku: String,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = product_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VariantRow {
    pub id: Uuid,
    pub sku: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = countries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CountryRow {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = shipping_options)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingOptionRow {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_options)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentOptionRow {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub total_price: BigDecimal,
    pub shipping_price: BigDecimal,
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
    pub shipping_option_id: Uuid,
    pub payment_option_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub total_price: BigDecimal,
    pub shipping_price: BigDecimal,
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
    pub shipping_option_id: Uuid,
    pub payment_option_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub price_per_item: BigDecimal,
}
