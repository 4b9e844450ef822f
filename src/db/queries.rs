use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreatePayment, Payment, PaymentStatus};

use super::from_row::{query_all, query_one, FromRow, PAYMENT_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Outcome of the conditional status update.
#[derive(Debug)]
pub enum Transition {
    /// Guard held; the payment was moved to the target status.
    Applied(Payment),
    /// The row exists but was already terminal. A concurrent or duplicate
    /// delivery got there first; the caller maps this to "already processed".
    Conflict(Payment),
    NotFound,
}

/// Create a payment with a fresh merchant transaction id.
pub fn create_payment(conn: &Connection, input: &CreatePayment) -> Result<Payment> {
    let merchant_trans_id = Uuid::new_v4().to_string();
    let now = now();

    conn.execute(
        "INSERT INTO payments (user_id, amount, merchant_trans_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?5)",
        params![&input.user_id, input.amount, &merchant_trans_id, now, now],
    )?;
    let id = conn.last_insert_rowid();

    Ok(Payment {
        id,
        user_id: input.user_id.clone(),
        amount: input.amount,
        merchant_trans_id,
        gateway_payment_id: None,
        status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_payment_by_id(conn: &Connection, id: i64) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

pub fn get_payment_by_merchant_trans_id(
    conn: &Connection,
    merchant_trans_id: &str,
) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE merchant_trans_id = ?1",
            PAYMENT_COLS
        ),
        &[&merchant_trans_id],
    )
}

/// Move a payment to a terminal status with a single guarded update.
///
/// The guard (`status = 'pending'`) closes the read-then-write race: two
/// racing COMPLETE deliveries can both observe PENDING, but only one update
/// matches the guard. The loser gets `Transition::Conflict` with the row as
/// the winner left it.
///
/// `gateway_payment_id` is only written if the column is still NULL, so the
/// id assigned by the gateway is set exactly once.
pub fn transition_payment(
    conn: &Connection,
    id: i64,
    target: PaymentStatus,
    gateway_payment_id: Option<&str>,
) -> Result<Transition> {
    debug_assert!(target.is_terminal());

    let updated = conn
        .query_row(
            &format!(
                "UPDATE payments
                 SET status = ?1,
                     gateway_payment_id = COALESCE(gateway_payment_id, ?2),
                     updated_at = ?3
                 WHERE id = ?4 AND status = 'pending'
                 RETURNING {}",
                PAYMENT_COLS
            ),
            params![target.to_string(), gateway_payment_id, now(), id],
            Payment::from_row,
        )
        .optional()?;

    if let Some(payment) = updated {
        return Ok(Transition::Applied(payment));
    }

    // Guard failed: distinguish an already-terminal row from a missing one.
    match get_payment_by_id(conn, id)? {
        Some(payment) => Ok(Transition::Conflict(payment)),
        None => Ok(Transition::NotFound),
    }
}

/// PENDING payments older than `stale_after_secs`, oldest first.
/// Candidates for gateway status reconciliation (callbacks are not
/// guaranteed to arrive).
pub fn list_stale_pending_payments(
    conn: &Connection,
    stale_after_secs: i64,
    limit: i64,
) -> Result<Vec<Payment>> {
    let cutoff = now() - stale_after_secs;
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payments
             WHERE status = 'pending' AND created_at < ?1
             ORDER BY created_at ASC
             LIMIT ?2",
            PAYMENT_COLS
        ),
        &[&cutoff, &limit],
    )
}
