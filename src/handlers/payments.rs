//! Merchant-facing payment endpoints: intake, lookup, reconciliation, and
//! reversal. Payment records are created here, outside the callback
//! protocol; the callbacks only ever mutate them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::db::{queries, AppState};
use crate::db::queries::Transition;
use crate::error::{AppError, Result};
use crate::gateway::GatewayClient;
use crate::models::{CreatePayment, Payment, PaymentStatus};
use crate::sync;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/{merchant_trans_id}", get(get_payment))
        .route("/payments/{merchant_trans_id}/sync", post(sync_payment))
        .route("/payments/{merchant_trans_id}/reverse", post(reverse_payment))
}

/// Create a PENDING payment with a fresh merchant transaction id.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<Payment>)> {
    if input.amount <= 0 {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }

    let conn = state.db.get()?;
    let payment = queries::create_payment(&conn, &input)?;

    tracing::info!(
        payment_id = payment.id,
        merchant_trans_id = %payment.merchant_trans_id,
        amount = payment.amount,
        "payment created"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(merchant_trans_id): Path<String>,
) -> Result<Json<Payment>> {
    let conn = state.db.get()?;
    let payment = queries::get_payment_by_merchant_trans_id(&conn, &merchant_trans_id)?
        .ok_or_else(|| AppError::NotFound(format!("Payment {merchant_trans_id}")))?;
    Ok(Json(payment))
}

/// Reconcile a payment with the gateway's authoritative status.
pub async fn sync_payment(
    State(state): State<AppState>,
    Path(merchant_trans_id): Path<String>,
) -> Result<Json<Payment>> {
    let payment = sync::sync_payment(&state, &merchant_trans_id).await?;
    Ok(Json(payment))
}

/// Ask the gateway to reverse a transaction.
///
/// The gateway id is taken from the payment record, or looked up when no
/// COMPLETE ever landed. Locally only the guarded PENDING -> CANCELED
/// transition is attempted; terminal payments keep their status.
pub async fn reverse_payment(
    State(state): State<AppState>,
    Path(merchant_trans_id): Path<String>,
) -> Result<Json<Payment>> {
    let payment = {
        let conn = state.db.get()?;
        queries::get_payment_by_merchant_trans_id(&conn, &merchant_trans_id)?
            .ok_or_else(|| AppError::NotFound(format!("Payment {merchant_trans_id}")))?
    };

    let client = GatewayClient::new(&state.click);

    let gateway_payment_id = match &payment.gateway_payment_id {
        Some(id) => id.clone(),
        None => {
            let status = client
                .query_status(&state.click.service_id, &merchant_trans_id, payment.created_at)
                .await?;
            status
                .payment_id
                .map(|id| id.to_string())
                .ok_or_else(|| {
                    AppError::Conflict("gateway has no payment for this transaction".into())
                })?
        }
    };

    let ack = client
        .reverse(&state.click.service_id, &gateway_payment_id)
        .await?;
    if ack.error_code != 0 {
        return Err(AppError::Gateway(format!(
            "reversal refused: {} ({})",
            ack.error_code,
            ack.error_note.as_deref().unwrap_or("")
        )));
    }

    tracing::info!(
        payment_id = payment.id,
        merchant_trans_id = %merchant_trans_id,
        gateway_payment_id = %gateway_payment_id,
        "gateway acknowledged reversal"
    );

    let conn = state.db.get()?;
    let payment = match queries::transition_payment(
        &conn,
        payment.id,
        PaymentStatus::Canceled,
        Some(&gateway_payment_id),
    )? {
        Transition::Applied(p) | Transition::Conflict(p) => p,
        Transition::NotFound => {
            return Err(AppError::NotFound(format!("Payment {merchant_trans_id}")));
        }
    };
    Ok(Json(payment))
}
