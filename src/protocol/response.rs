//! The fixed-shape callback response.
//!
//! The gateway only inspects the body: every protocol outcome, success or
//! failure, is answered with HTTP 200 and a numeric `error` code.

use serde::Serialize;

/// Gateway-defined validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// `-1` - supplied sign_string does not match the expected digest.
    SignCheckFailed,
    /// `-2` - callback amount differs from the recorded payment amount.
    IncorrectAmount,
    /// `-3` - action is not the one this endpoint serves.
    ActionNotFound,
    /// `-4` - payment already reached a terminal status.
    AlreadyPaid,
    /// `-5` - no payment for the given merchant transaction id.
    TransactionNotFound,
    /// `-8` - missing or invalid parameters.
    BadRequest,
}

impl ProtocolError {
    pub fn code(&self) -> i64 {
        match self {
            ProtocolError::SignCheckFailed => -1,
            ProtocolError::IncorrectAmount => -2,
            ProtocolError::ActionNotFound => -3,
            ProtocolError::AlreadyPaid => -4,
            ProtocolError::TransactionNotFound => -5,
            ProtocolError::BadRequest => -8,
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            ProtocolError::SignCheckFailed => "SIGN CHECK FAILED!",
            ProtocolError::IncorrectAmount => "Incorrect parameter amount",
            ProtocolError::ActionNotFound => "Action not found",
            ProtocolError::AlreadyPaid => "Already paid",
            ProtocolError::TransactionNotFound => "Transaction does not exist",
            ProtocolError::BadRequest => "Error in request from click",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub error: i64,
    pub error_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_prepare_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_confirm_id: Option<i64>,
}

impl CallbackResponse {
    /// Successful PREPARE: echo identifiers and report the payment id the
    /// gateway must send back as `merchant_prepare_id` on COMPLETE.
    pub fn prepare_ok(
        click_trans_id: &str,
        merchant_trans_id: &str,
        payment_id: i64,
    ) -> Self {
        Self {
            error: 0,
            error_note: "Success".to_string(),
            click_trans_id: Some(click_trans_id.to_string()),
            merchant_trans_id: Some(merchant_trans_id.to_string()),
            merchant_prepare_id: Some(payment_id),
            merchant_confirm_id: None,
        }
    }

    /// Successful COMPLETE, or the relay of a provider-side failure
    /// (`error` carries the provider's code in that case).
    pub fn complete_ok(
        error: i64,
        error_note: &str,
        click_trans_id: &str,
        merchant_trans_id: &str,
        payment_id: i64,
    ) -> Self {
        Self {
            error,
            error_note: error_note.to_string(),
            click_trans_id: Some(click_trans_id.to_string()),
            merchant_trans_id: Some(merchant_trans_id.to_string()),
            merchant_prepare_id: None,
            merchant_confirm_id: Some(payment_id),
        }
    }

    /// Validation failure; identifiers are echoed when they were supplied.
    pub fn err(
        error: ProtocolError,
        click_trans_id: Option<&str>,
        merchant_trans_id: Option<&str>,
    ) -> Self {
        Self {
            error: error.code(),
            error_note: error.note().to_string(),
            click_trans_id: click_trans_id.map(|s| s.to_string()),
            merchant_trans_id: merchant_trans_id.map(|s| s.to_string()),
            merchant_prepare_id: None,
            merchant_confirm_id: None,
        }
    }
}
