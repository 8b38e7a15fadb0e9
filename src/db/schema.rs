use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Merchant/user profiles. The profile id doubles as the store id.
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            whatsapp TEXT,
            store_name TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_email ON profiles(email);

        -- Inventory. quantity is decremented only by approved orders and is
        -- floor-checked in the decrement UPDATE itself.
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            price_cents INTEGER NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            description TEXT,
            category TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            image_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_profile ON products(profile_id);

        -- Platform subscription plans. Zero price = free for that period.
        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            price_monthly_cents INTEGER NOT NULL DEFAULT 0,
            price_annual_cents INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            created_at INTEGER NOT NULL
        );

        -- Orders ("pedidos"). The UNIQUE payment_id backs the
        -- at-most-once-per-approved-payment invariant; the reconciliation
        -- transaction also checks existence explicitly before inserting.
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            payment_id TEXT NOT NULL UNIQUE,
            store_id TEXT NOT NULL REFERENCES profiles(id),
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            customer_cpf TEXT NOT NULL,
            customer_address TEXT NOT NULL,
            customer_notes TEXT,
            total_cents INTEGER NOT NULL,
            items TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pendente', 'aprovado', 'rejeitado', 'cancelado', 'finalizado')),
            delivery_status TEXT NOT NULL CHECK (delivery_status IN ('entrega_pendente', 'em_preparacao', 'em_transito', 'entregue', 'cancelado')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_store ON orders(store_id, created_at DESC);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_payment ON orders(payment_id);

        -- Plan subscriptions. The partial unique index enforces the
        -- single-active-subscription invariant at the storage layer; the
        -- transition transaction enforces it as a postcondition too.
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            plan_id TEXT NOT NULL REFERENCES plans(id),
            status TEXT NOT NULL CHECK (status IN ('active', 'canceled')),
            period_type TEXT NOT NULL CHECK (period_type IN ('monthly', 'annual')),
            current_period_start INTEGER NOT NULL,
            current_period_end INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_subscriptions_one_active
            ON subscriptions(user_id) WHERE status = 'active';

        -- Payment evidence for paid-plan activations. payment_id as primary
        -- key makes recording idempotent under repeated polls.
        CREATE TABLE IF NOT EXISTS subscription_payments (
            payment_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            plan_id TEXT NOT NULL REFERENCES plans(id),
            status TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            period_type TEXT NOT NULL CHECK (period_type IN ('monthly', 'annual')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscription_payments_user
            ON subscription_payments(user_id, created_at DESC);
        "#,
    )?;
    Ok(())
}
