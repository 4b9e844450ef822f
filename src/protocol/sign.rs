//! Callback authentication digest.
//!
//! The gateway signs each callback with the MD5 of a fixed-order
//! concatenation of fields and the shared secret, rendered as lowercase hex.
//! PREPARE and COMPLETE differ only in the presence of `merchant_prepare_id`
//! between `merchant_trans_id` and `amount`.

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Fields entering the digest, in wire form (exactly as delivered).
#[derive(Debug)]
pub struct SignFields<'a> {
    pub click_trans_id: &'a str,
    pub service_id: &'a str,
    pub merchant_trans_id: &'a str,
    /// Present for COMPLETE only.
    pub merchant_prepare_id: Option<&'a str>,
    pub amount: &'a str,
    pub action: &'a str,
    pub sign_time: &'a str,
}

/// Compute the expected `sign_string` for a callback.
pub fn compute_sign(secret_key: &str, fields: &SignFields) -> String {
    let mut hasher = Md5::new();
    hasher.update(fields.click_trans_id.as_bytes());
    hasher.update(fields.service_id.as_bytes());
    hasher.update(secret_key.as_bytes());
    hasher.update(fields.merchant_trans_id.as_bytes());
    if let Some(prepare_id) = fields.merchant_prepare_id {
        hasher.update(prepare_id.as_bytes());
    }
    hasher.update(fields.amount.as_bytes());
    hasher.update(fields.action.as_bytes());
    hasher.update(fields.sign_time.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a supplied `sign_string` against the expected digest.
///
/// Comparison is exact (no case or whitespace normalization) and
/// constant-time once lengths match; the digest length is not secret.
pub fn verify_sign(secret_key: &str, fields: &SignFields, supplied: &str) -> bool {
    let expected = compute_sign(secret_key, fields);
    if expected.len() != supplied.len() {
        return false;
    }
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}
