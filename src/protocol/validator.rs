//! Ordered validation chains for the PREPARE and COMPLETE callbacks.
//!
//! Checks run in the gateway-mandated order and short-circuit on the first
//! failure. PREPARE is a pure dry run; COMPLETE commits through the guarded
//! transition in `db::queries::transition_payment`, which is what keeps the
//! monetary state change at-most-once under duplicate and racing delivery.

use rusqlite::Connection;

use crate::config::ClickConfig;
use crate::db::queries::{self, Transition};
use crate::error::Result;
use crate::models::{Payment, PaymentStatus};

use super::request::{parse_amount, CallbackAction, CallbackRequest};
use super::response::{CallbackResponse, ProtocolError};
use super::sign::{verify_sign, SignFields};

fn reject(req: &CallbackRequest, error: ProtocolError) -> CallbackResponse {
    CallbackResponse::err(
        error,
        req.click_trans_id.as_deref(),
        req.merchant_trans_id.as_deref(),
    )
}

/// Validate a PREPARE callback. Never mutates payment state.
pub fn handle_prepare(
    conn: &Connection,
    cfg: &ClickConfig,
    req: &CallbackRequest,
) -> Result<CallbackResponse> {
    // 1. Required fields
    let (
        Some(click_trans_id),
        Some(service_id),
        Some(merchant_trans_id),
        Some(amount),
        Some(action),
        Some(sign_time),
        Some(sign_string),
    ) = (
        req.click_trans_id.as_deref(),
        req.service_id.as_deref(),
        req.merchant_trans_id.as_deref(),
        req.amount.as_deref(),
        req.action.as_deref(),
        req.sign_time.as_deref(),
        req.sign_string.as_deref(),
    )
    else {
        return Ok(reject(req, ProtocolError::BadRequest));
    };

    // 2. Service identity
    if service_id != cfg.service_id {
        return Ok(reject(req, ProtocolError::BadRequest));
    }

    // 3. Action
    if req.action_code().and_then(CallbackAction::from_code) != Some(CallbackAction::Prepare) {
        return Ok(reject(req, ProtocolError::ActionNotFound));
    }

    // 4. Signature, over the fields exactly as delivered
    let fields = SignFields {
        click_trans_id,
        service_id,
        merchant_trans_id,
        merchant_prepare_id: None,
        amount,
        action,
        sign_time,
    };
    if !verify_sign(&cfg.secret_key, &fields, sign_string) {
        tracing::warn!(
            merchant_trans_id,
            click_trans_id,
            "prepare rejected: sign check failed"
        );
        return Ok(reject(req, ProtocolError::SignCheckFailed));
    }

    // 5. Payment lookup
    let Some(payment) = queries::get_payment_by_merchant_trans_id(conn, merchant_trans_id)? else {
        return Ok(reject(req, ProtocolError::TransactionNotFound));
    };

    // 6. Terminal payments cannot be re-prepared
    if payment.status.is_terminal() {
        return Ok(reject(req, ProtocolError::AlreadyPaid));
    }

    // 7. Amount (numeric comparison at hundredth precision, not string)
    match parse_amount(amount) {
        None => return Ok(reject(req, ProtocolError::BadRequest)),
        Some(hundredths) if hundredths != payment.amount.saturating_mul(100) => {
            return Ok(reject(req, ProtocolError::IncorrectAmount));
        }
        Some(_) => {}
    }

    tracing::info!(
        merchant_trans_id,
        click_trans_id,
        payment_id = payment.id,
        "prepare accepted"
    );
    Ok(CallbackResponse::prepare_ok(
        click_trans_id,
        merchant_trans_id,
        payment.id,
    ))
}

/// Validate a COMPLETE callback and commit the terminal transition.
pub fn handle_complete(
    conn: &Connection,
    cfg: &ClickConfig,
    req: &CallbackRequest,
) -> Result<CallbackResponse> {
    // 1. Required fields; amount is checked later because the provider-error
    //    relay path carries none.
    let (
        Some(click_trans_id),
        Some(service_id),
        Some(merchant_trans_id),
        Some(merchant_prepare_id),
        Some(action),
        Some(sign_time),
        Some(sign_string),
    ) = (
        req.click_trans_id.as_deref(),
        req.service_id.as_deref(),
        req.merchant_trans_id.as_deref(),
        req.merchant_prepare_id.as_deref(),
        req.action.as_deref(),
        req.sign_time.as_deref(),
        req.sign_string.as_deref(),
    )
    else {
        return Ok(reject(req, ProtocolError::BadRequest));
    };

    let provider_error = req.provider_error();
    if provider_error == 0 && req.amount.is_none() {
        return Ok(reject(req, ProtocolError::BadRequest));
    }

    // 2. Service identity
    if service_id != cfg.service_id {
        return Ok(reject(req, ProtocolError::BadRequest));
    }

    // 3. Action
    if req.action_code().and_then(CallbackAction::from_code) != Some(CallbackAction::Complete) {
        return Ok(reject(req, ProtocolError::ActionNotFound));
    }

    // 4. Signature (COMPLETE digest includes merchant_prepare_id)
    let fields = SignFields {
        click_trans_id,
        service_id,
        merchant_trans_id,
        merchant_prepare_id: Some(merchant_prepare_id),
        amount: req.amount.as_deref().unwrap_or(""),
        action,
        sign_time,
    };
    if !verify_sign(&cfg.secret_key, &fields, sign_string) {
        tracing::warn!(
            merchant_trans_id,
            click_trans_id,
            "complete rejected: sign check failed"
        );
        return Ok(reject(req, ProtocolError::SignCheckFailed));
    }

    // 5. Payment lookup
    let Some(payment) = queries::get_payment_by_merchant_trans_id(conn, merchant_trans_id)? else {
        return Ok(reject(req, ProtocolError::TransactionNotFound));
    };

    // 6. merchant_prepare_id must be the payment id we issued at PREPARE.
    //    A mismatch answers the same code as not-found so the response does
    //    not reveal which lookup failed.
    if merchant_prepare_id.parse::<i64>() != Ok(payment.id) {
        return Ok(reject(req, ProtocolError::TransactionNotFound));
    }

    // 7. Terminal status
    if payment.status.is_terminal() {
        return Ok(reject(req, ProtocolError::AlreadyPaid));
    }

    // 8. Provider-side failure relay: no amount check, echo the provider's
    //    code, record the gateway transaction id.
    if provider_error != 0 {
        let target = if provider_error < 0 {
            PaymentStatus::Canceled
        } else {
            PaymentStatus::Failed
        };
        return commit(conn, req, &payment, target, click_trans_id, |payment| {
            let note = req.error_note.as_deref().unwrap_or("Failed");
            tracing::info!(
                merchant_trans_id,
                click_trans_id,
                payment_id = payment.id,
                provider_error,
                status = %payment.status,
                "complete relayed provider failure"
            );
            CallbackResponse::complete_ok(
                provider_error,
                note,
                click_trans_id,
                merchant_trans_id,
                payment.id,
            )
        });
    }

    // 9. Amount
    let amount = req.amount.as_deref().unwrap_or("");
    match parse_amount(amount) {
        None => return Ok(reject(req, ProtocolError::BadRequest)),
        Some(hundredths) if hundredths != payment.amount.saturating_mul(100) => {
            return Ok(reject(req, ProtocolError::IncorrectAmount));
        }
        Some(_) => {}
    }

    // 10. Commit the PAID transition
    commit(
        conn,
        req,
        &payment,
        PaymentStatus::Paid,
        click_trans_id,
        |payment| {
            tracing::info!(
                merchant_trans_id,
                click_trans_id,
                payment_id = payment.id,
                "complete accepted, payment paid"
            );
            CallbackResponse::complete_ok(
                0,
                "Success",
                click_trans_id,
                merchant_trans_id,
                payment.id,
            )
        },
    )
}

/// Apply the guarded transition and map its outcome to the protocol response.
///
/// A guard failure means a concurrent or duplicate delivery already moved the
/// payment: an expected occurrence answered with "already paid", never a
/// server error.
fn commit(
    conn: &Connection,
    req: &CallbackRequest,
    payment: &Payment,
    target: PaymentStatus,
    click_trans_id: &str,
    on_applied: impl FnOnce(&Payment) -> CallbackResponse,
) -> Result<CallbackResponse> {
    match queries::transition_payment(conn, payment.id, target, Some(click_trans_id))? {
        Transition::Applied(updated) => Ok(on_applied(&updated)),
        Transition::Conflict(current) => {
            tracing::info!(
                payment_id = current.id,
                status = %current.status,
                "transition lost to concurrent delivery"
            );
            Ok(reject(req, ProtocolError::AlreadyPaid))
        }
        // Payments are never deleted; a vanished row still must not 500.
        Transition::NotFound => Ok(reject(req, ProtocolError::TransactionNotFound)),
    }
}
