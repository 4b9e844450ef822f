//! Status reconciliation against the gateway.
//!
//! PREPARE/COMPLETE callbacks are not guaranteed to arrive (network loss,
//! user closing the return page), so a lower-frequency poll asks the gateway
//! for the authoritative status and applies the same terminal-state-guarded
//! transition the COMPLETE path uses.

use std::time::Duration;

use crate::db::queries::{self, Transition};
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::gateway::{GatewayClient, GATEWAY_STATUS_CONFIRMED};
use crate::models::{Payment, PaymentStatus};

/// Reconcile one payment with the gateway.
///
/// A gateway error or an in-flight status leaves the payment untouched.
/// Losing the transition guard to a callback that landed mid-poll is fine;
/// the row is returned as the callback left it.
pub async fn sync_payment(state: &AppState, merchant_trans_id: &str) -> Result<Payment> {
    let payment = {
        let conn = state.db.get()?;
        queries::get_payment_by_merchant_trans_id(&conn, merchant_trans_id)?
            .ok_or_else(|| AppError::NotFound(format!("Payment {merchant_trans_id}")))?
    };

    if payment.status.is_terminal() {
        return Ok(payment);
    }

    let client = GatewayClient::new(&state.click);
    let status = client
        .query_status(&state.click.service_id, merchant_trans_id, payment.created_at)
        .await?;

    if status.error_code != 0 {
        tracing::info!(
            merchant_trans_id,
            error_code = status.error_code,
            error_note = status.error_note.as_deref().unwrap_or(""),
            "gateway has no settled record for payment, leaving untouched"
        );
        return Ok(payment);
    }

    let target = match status.payment_status {
        Some(GATEWAY_STATUS_CONFIRMED) => PaymentStatus::Paid,
        Some(s) if s < 0 => PaymentStatus::Canceled,
        _ => return Ok(payment),
    };
    let gateway_payment_id = status.payment_id.map(|id| id.to_string());

    let conn = state.db.get()?;
    match queries::transition_payment(&conn, payment.id, target, gateway_payment_id.as_deref())? {
        Transition::Applied(updated) => {
            tracing::info!(
                merchant_trans_id,
                payment_id = updated.id,
                status = %updated.status,
                "payment reconciled from gateway status"
            );
            Ok(updated)
        }
        Transition::Conflict(current) => Ok(current),
        Transition::NotFound => {
            Err(AppError::NotFound(format!("Payment {merchant_trans_id}")))
        }
    }
}

/// Spawns the periodic sweep over stale PENDING payments.
pub fn spawn_sync_task(state: AppState, interval_secs: u64, stale_after_secs: i64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let stale = {
                let conn = match state.db.get() {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("Failed to get db connection for sync sweep: {}", e);
                        continue;
                    }
                };
                match queries::list_stale_pending_payments(&conn, stale_after_secs, 100) {
                    Ok(payments) => payments,
                    Err(e) => {
                        tracing::warn!("Failed to list stale payments: {}", e);
                        continue;
                    }
                }
            };

            for payment in stale {
                if let Err(e) = sync_payment(&state, &payment.merchant_trans_id).await {
                    tracing::warn!(
                        merchant_trans_id = %payment.merchant_trans_id,
                        "sync sweep failed for payment: {}",
                        e
                    );
                }
            }
        }
    });

    tracing::info!(
        "Background sync task started (every {}s, payments stale after {}s)",
        interval_secs,
        stale_after_secs
    );
}
