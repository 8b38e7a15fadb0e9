use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{msg, AppError, Result};
use crate::models::*;
use crate::util::amount_to_cents;

use super::from_row::{
    query_all, query_one, FromRow, ORDER_COLS, PLAN_COLS, PRODUCT_COLS, PROFILE_COLS,
    SUBSCRIPTION_COLS, SUBSCRIPTION_PAYMENT_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Profiles ============

pub fn create_profile(conn: &Connection, input: &CreateProfile) -> Result<Profile> {
    let id = gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO profiles (id, name, email, whatsapp, store_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            &input.name,
            &email,
            &input.whatsapp,
            &input.store_name,
            now,
            now
        ],
    )?;

    Ok(Profile {
        id,
        name: input.name.clone(),
        email,
        whatsapp: input.whatsapp.clone(),
        store_name: input.store_name.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS),
        &[&id],
    )
}

// ============ Products ============

pub fn create_product(
    conn: &Connection,
    profile_id: &str,
    input: &CreateProduct,
) -> Result<Product> {
    input.validate()?;
    let id = gen_id();
    let now = now();
    let price_cents = amount_to_cents(input.price)?;
    let tags_json = serde_json::to_string(&input.tags)?;

    conn.execute(
        "INSERT INTO products (id, profile_id, name, price_cents, quantity, description, category, tags, image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            profile_id,
            &input.name,
            price_cents,
            input.quantity,
            &input.description,
            &input.category,
            &tags_json,
            &input.image_url,
            now,
            now
        ],
    )?;

    Ok(Product {
        id,
        profile_id: profile_id.to_string(),
        name: input.name.clone(),
        price_cents,
        quantity: input.quantity,
        description: input.description.clone(),
        category: input.category.clone(),
        tags: input.tags.clone(),
        image_url: input.image_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn list_products_for_store(conn: &Connection, profile_id: &str) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM products WHERE profile_id = ?1 ORDER BY created_at DESC",
            PRODUCT_COLS
        ),
        &[&profile_id],
    )
}

// ============ Plans ============

pub fn create_plan(
    conn: &Connection,
    name: &str,
    price_monthly_cents: i64,
    price_annual_cents: i64,
    description: Option<&str>,
) -> Result<Plan> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO plans (id, name, price_monthly_cents, price_annual_cents, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, name, price_monthly_cents, price_annual_cents, description, now],
    )?;

    Ok(Plan {
        id,
        name: name.to_string(),
        price_monthly_cents,
        price_annual_cents,
        description: description.map(String::from),
        created_at: now,
    })
}

pub fn get_plan_by_id(conn: &Connection, id: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM plans WHERE id = ?1", PLAN_COLS),
        &[&id],
    )
}

pub fn get_plan_by_name(conn: &Connection, name: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM plans WHERE name = ?1", PLAN_COLS),
        &[&name],
    )
}

// ============ Orders ============

/// Outcome of order finalization for an approved payment.
#[derive(Debug)]
pub enum OrderOutcome {
    /// The order row was created by this call; stock was decremented.
    Created(Order),
    /// A previous poll already created the order; nothing was written.
    AlreadyExists(Order),
}

impl OrderOutcome {
    pub fn order(&self) -> &Order {
        match self {
            OrderOutcome::Created(o) | OrderOutcome::AlreadyExists(o) => o,
        }
    }
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn get_order_by_payment_id(conn: &Connection, payment_id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE payment_id = ?1", ORDER_COLS),
        &[&payment_id],
    )
}

/// Create the order for an approved payment, exactly once, and decrement
/// stock for every line — all inside one transaction.
///
/// Reconciliation is polled, so this runs under at-least-once delivery of
/// the "payment approved" observation: the existence check (plus the UNIQUE
/// constraint on payment_id as a backstop) makes repeated calls return the
/// already-created order without touching stock again.
///
/// Stock is taken with a read-then-guarded-write per line; any shortfall
/// aborts the whole transaction, so a partially applied order is never
/// visible.
pub fn finalize_order(
    conn: &mut Connection,
    payment_id: &str,
    store_id: &str,
    data: &OrderData,
) -> Result<OrderOutcome> {
    let total_cents = amount_to_cents(data.total_amount)?;
    let tx = conn.transaction()?;

    if let Some(existing) = get_order_by_payment_id(&tx, payment_id)? {
        return Ok(OrderOutcome::AlreadyExists(existing));
    }

    let now = now();
    for item in &data.items {
        let current: Option<i64> = tx
            .query_row(
                "SELECT quantity FROM products WHERE id = ?1",
                params![&item.id],
                |row| row.get(0),
            )
            .optional()?;

        let current = current
            .ok_or_else(|| AppError::NotFound(msg::PRODUCT_NOT_FOUND.to_string()))?;
        if current < item.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Estoque insuficiente para o produto {}",
                item.name
            )));
        }

        // Guarded write: the floor check is repeated in the WHERE clause so
        // a concurrent decrement between read and write cannot oversell.
        let affected = tx.execute(
            "UPDATE products SET quantity = quantity - ?1, updated_at = ?2
             WHERE id = ?3 AND quantity >= ?1",
            params![item.quantity, now, &item.id],
        )?;
        if affected == 0 {
            return Err(AppError::InsufficientStock(format!(
                "Estoque insuficiente para o produto {}",
                item.name
            )));
        }
    }

    let id = gen_id();
    let items_json = serde_json::to_string(&data.items)?;
    tx.execute(
        "INSERT INTO orders (id, payment_id, store_id, customer_name, customer_email, customer_phone, customer_cpf, customer_address, customer_notes, total_cents, items, status, delivery_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            &id,
            payment_id,
            store_id,
            &data.customer_name,
            &data.customer_email,
            &data.customer_phone,
            &data.customer_cpf,
            &data.customer_address,
            &data.customer_notes,
            total_cents,
            &items_json,
            OrderStatus::Aprovado.as_str(),
            DeliveryStatus::EntregaPendente.as_str(),
            now,
            now
        ],
    )?;

    tx.commit()?;

    Ok(OrderOutcome::Created(Order {
        id,
        payment_id: payment_id.to_string(),
        store_id: store_id.to_string(),
        customer_name: data.customer_name.clone(),
        customer_email: data.customer_email.clone(),
        customer_phone: data.customer_phone.clone(),
        customer_cpf: data.customer_cpf.clone(),
        customer_address: data.customer_address.clone(),
        customer_notes: data.customer_notes.clone(),
        total_cents,
        items: data.items.clone(),
        status: OrderStatus::Aprovado,
        delivery_status: DeliveryStatus::EntregaPendente,
        created_at: now,
        updated_at: now,
    }))
}

/// Set a new delivery status. No transition-graph validation beyond the
/// CHECK constraint; the merchant UI restricts the selectable set.
pub fn update_delivery_status(
    conn: &Connection,
    order_id: &str,
    status: DeliveryStatus,
) -> Result<Option<Order>> {
    conn.query_row(
        &format!(
            "UPDATE orders SET delivery_status = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
            ORDER_COLS
        ),
        params![status.as_str(), now(), order_id],
        Order::from_row,
    )
    .optional()
    .map_err(Into::into)
}

// ============ Subscription payments ============

/// Record payment evidence for a plan activation. Idempotent on payment_id:
/// recording the same payment twice is a no-op returning the stored row.
pub fn create_subscription_payment(
    conn: &Connection,
    payment_id: &str,
    user_id: &str,
    plan_id: &str,
    status: PaymentStatus,
    amount_cents: i64,
    period_type: PeriodType,
) -> Result<SubscriptionPayment> {
    conn.execute(
        "INSERT OR IGNORE INTO subscription_payments (payment_id, user_id, plan_id, status, amount_cents, period_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            payment_id,
            user_id,
            plan_id,
            status.as_str(),
            amount_cents,
            period_type.as_str(),
            now()
        ],
    )?;

    get_subscription_payment(conn, payment_id)?
        .ok_or_else(|| AppError::Internal("subscription payment vanished after insert".into()))
}

pub fn get_subscription_payment(
    conn: &Connection,
    payment_id: &str,
) -> Result<Option<SubscriptionPayment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscription_payments WHERE payment_id = ?1",
            SUBSCRIPTION_PAYMENT_COLS
        ),
        &[&payment_id],
    )
}

/// Most recent approved payment for a user. Used when reconciling a plan
/// change that doesn't come through the live payment flow (e.g. an admin
/// manually activating a plan).
pub fn latest_approved_subscription_payment(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<SubscriptionPayment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscription_payments WHERE user_id = ?1 AND status = 'approved' ORDER BY created_at DESC LIMIT 1",
            SUBSCRIPTION_PAYMENT_COLS
        ),
        &[&user_id],
    )
}

// ============ Subscriptions ============

pub fn get_active_subscription(conn: &Connection, user_id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 AND status = 'active'",
            SUBSCRIPTION_COLS
        ),
        &[&user_id],
    )
}

pub fn count_active_subscriptions(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1 AND status = 'active'",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn list_subscriptions_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Subscription>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 ORDER BY created_at DESC",
            SUBSCRIPTION_COLS
        ),
        &[&user_id],
    )
}

/// Apply a subscription transition as one atomic operation.
///
/// Activating a paid plan requires approved payment evidence: the explicit
/// payment_id when given, otherwise the user's most recent approved
/// subscription payment. Any prior active row is retired in the same
/// transaction, and the single-active-subscription invariant is re-checked
/// as a postcondition before commit. Concurrent readers see either the whole
/// transition or none of it.
///
/// Returns the resulting subscription row, or None when a cancel found
/// nothing active.
pub fn transition_subscription(
    conn: &mut Connection,
    input: &SubscriptionTransition,
) -> Result<Option<Subscription>> {
    let tx = conn.transaction()?;

    let plan = get_plan_by_id(&tx, &input.plan_id)?
        .ok_or_else(|| AppError::NotFound(msg::PLAN_NOT_FOUND.to_string()))?;

    if input.status == SubscriptionStatus::Active && !plan.is_free_for(input.period_type) {
        let evidence = match &input.payment_id {
            Some(pid) => get_subscription_payment(&tx, pid)?,
            None => latest_approved_subscription_payment(&tx, &input.user_id)?,
        };
        let approved = evidence
            .map(|p| p.status == PaymentStatus::Approved && p.user_id == input.user_id)
            .unwrap_or(false);
        if !approved {
            return Err(AppError::Validation(
                msg::SUBSCRIPTION_PAYMENT_REQUIRED.into(),
            ));
        }
    }

    let existing = get_active_subscription(&tx, &input.user_id)?;
    let now = now();

    let result = match input.status {
        SubscriptionStatus::Canceled => match existing {
            Some(sub) => tx
                .query_row(
                    &format!(
                        "UPDATE subscriptions SET status = 'canceled', updated_at = ?1 WHERE id = ?2 RETURNING {}",
                        SUBSCRIPTION_COLS
                    ),
                    params![now, &sub.id],
                    Subscription::from_row,
                )
                .optional()?,
            None => None,
        },
        SubscriptionStatus::Active => {
            let period_end = now + input.period_type.days() * 86_400;
            match existing {
                // Plan switch: update the active row in place rather than
                // leaving a second active row behind.
                Some(sub) => tx
                    .query_row(
                        &format!(
                            "UPDATE subscriptions SET plan_id = ?1, period_type = ?2, current_period_start = ?3, current_period_end = ?4, updated_at = ?5 WHERE id = ?6 RETURNING {}",
                            SUBSCRIPTION_COLS
                        ),
                        params![
                            &plan.id,
                            input.period_type.as_str(),
                            now,
                            period_end,
                            now,
                            &sub.id
                        ],
                        Subscription::from_row,
                    )
                    .optional()?,
                None => {
                    let id = gen_id();
                    tx.execute(
                        "INSERT INTO subscriptions (id, user_id, plan_id, status, period_type, current_period_start, current_period_end, created_at, updated_at)
                         VALUES (?1, ?2, ?3, 'active', ?4, ?5, ?6, ?7, ?8)",
                        params![
                            &id,
                            &input.user_id,
                            &plan.id,
                            input.period_type.as_str(),
                            now,
                            period_end,
                            now,
                            now
                        ],
                    )?;
                    get_active_subscription(&tx, &input.user_id)?
                }
            }
        }
    };

    // Postcondition: the invariant must hold before anything becomes
    // visible. A violation rolls the whole transition back.
    let active = count_active_subscriptions(&tx, &input.user_id)?;
    let expected = match input.status {
        SubscriptionStatus::Active => 1,
        SubscriptionStatus::Canceled => 0,
    };
    if active != expected {
        return Err(AppError::Internal(format!(
            "subscription invariant violated: {} active rows for user {}",
            active, input.user_id
        )));
    }

    tx.commit()?;
    Ok(result)
}
