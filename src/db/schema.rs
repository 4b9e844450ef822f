use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- Payments (one row per merchant order sent to the gateway)
        -- merchant_trans_id is the correlation key the gateway echoes back
        -- in every callback; it must be unique for the lifetime of the system.
        -- status transitions: pending -> paid | canceled | failed (terminal)
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            merchant_trans_id TEXT NOT NULL UNIQUE,
            gateway_payment_id TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'paid', 'canceled', 'failed')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id);
        CREATE INDEX IF NOT EXISTS idx_payments_status_created
            ON payments(status, created_at);
        "#,
    )?;
    Ok(())
}
