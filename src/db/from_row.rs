//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PROFILE_COLS: &str =
    "id, name, email, whatsapp, store_name, created_at, updated_at";

pub const PRODUCT_COLS: &str = "id, profile_id, name, price_cents, quantity, description, category, tags, image_url, created_at, updated_at";

pub const PLAN_COLS: &str =
    "id, name, price_monthly_cents, price_annual_cents, description, created_at";

pub const ORDER_COLS: &str = "id, payment_id, store_id, customer_name, customer_email, customer_phone, customer_cpf, customer_address, customer_notes, total_cents, items, status, delivery_status, created_at, updated_at";

pub const SUBSCRIPTION_COLS: &str = "id, user_id, plan_id, status, period_type, current_period_start, current_period_end, created_at, updated_at";

pub const SUBSCRIPTION_PAYMENT_COLS: &str =
    "payment_id, user_id, plan_id, status, amount_cents, period_type, created_at";

// ============ FromRow Implementations ============

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            whatsapp: row.get(3)?,
            store_name: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let tags_str: String = row.get(7)?;
        Ok(Product {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            name: row.get(2)?,
            price_cents: row.get(3)?,
            quantity: row.get(4)?,
            description: row.get(5)?,
            category: row.get(6)?,
            tags: serde_json::from_str(&tags_str).unwrap_or_default(),
            image_url: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Plan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Plan {
            id: row.get(0)?,
            name: row.get(1)?,
            price_monthly_cents: row.get(2)?,
            price_annual_cents: row.get(3)?,
            description: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let items_str: String = row.get(10)?;
        let items = serde_json::from_str(&items_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(10, "items".to_string(), rusqlite::types::Type::Text)
        })?;
        Ok(Order {
            id: row.get(0)?,
            payment_id: row.get(1)?,
            store_id: row.get(2)?,
            customer_name: row.get(3)?,
            customer_email: row.get(4)?,
            customer_phone: row.get(5)?,
            customer_cpf: row.get(6)?,
            customer_address: row.get(7)?,
            customer_notes: row.get(8)?,
            total_cents: row.get(9)?,
            items,
            status: parse_enum(row, 11, "status")?,
            delivery_status: parse_enum(row, 12, "delivery_status")?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            user_id: row.get(1)?,
            plan_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            period_type: parse_enum(row, 4, "period_type")?,
            current_period_start: row.get(5)?,
            current_period_end: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for SubscriptionPayment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get(3)?;
        Ok(SubscriptionPayment {
            payment_id: row.get(0)?,
            user_id: row.get(1)?,
            plan_id: row.get(2)?,
            status: PaymentStatus::from_gateway(&status),
            amount_cents: row.get(4)?,
            period_type: parse_enum(row, 5, "period_type")?,
            created_at: row.get(6)?,
        })
    }
}
