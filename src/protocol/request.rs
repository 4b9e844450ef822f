//! Wire-to-typed conversion for inbound callbacks.
//!
//! The gateway delivers callbacks form-encoded (every value a string) but
//! integrations also see JSON bodies with bare numbers. All fields
//! deserialize into optional strings once, up front; the validator then
//! checks presence and coerces numerics, so loosely-typed field access never
//! reaches the transition logic.

use serde::{Deserialize, Deserializer};

/// Callback action discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Dry-run reservation check (`action=0`). Never mutates state.
    Prepare,
    /// Charge confirmation or failure (`action=1`).
    Complete,
}

impl CallbackAction {
    pub fn code(&self) -> i64 {
        match self {
            CallbackAction::Prepare => 0,
            CallbackAction::Complete => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CallbackAction::Prepare),
            1 => Some(CallbackAction::Complete),
            _ => None,
        }
    }
}

/// Raw callback body. Every field is optional here; the validator answers
/// `-8` for anything missing rather than letting deserialization reject the
/// request with a transport-level error the gateway would not inspect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackRequest {
    #[serde(default, deserialize_with = "de_stringy")]
    pub click_trans_id: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub service_id: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub click_paydoc_id: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub merchant_trans_id: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub merchant_prepare_id: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub action: Option<String>,
    /// Provider-side error code. Nonzero means the gateway is reporting a
    /// failed charge on COMPLETE.
    #[serde(default, deserialize_with = "de_stringy")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub error_note: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub sign_time: Option<String>,
    #[serde(default, deserialize_with = "de_stringy")]
    pub sign_string: Option<String>,
}

impl CallbackRequest {
    /// Action as a number, if present and numeric.
    pub fn action_code(&self) -> Option<i64> {
        self.action.as_deref().and_then(|a| a.parse().ok())
    }

    /// Provider error code; absent or unparseable counts as zero (the
    /// gateway omits the field on success paths).
    pub fn provider_error(&self) -> i64 {
        self.error
            .as_deref()
            .and_then(|e| e.parse().ok())
            .unwrap_or(0)
    }
}

/// Accept a string, integer, or float and keep its textual form.
fn de_stringy<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stringy {
        S(String),
        I(i64),
        F(f64),
    }

    Ok(Option::<Stringy>::deserialize(deserializer)?.map(|v| match v {
        Stringy::S(s) => s,
        Stringy::I(i) => i.to_string(),
        Stringy::F(f) => f.to_string(),
    }))
}

/// Parse a gateway amount string ("500", "500.5", "500.00") into hundredths
/// of the gateway's amount unit, so `"500.00"` compares equal to a recorded
/// amount of 500. At most two fractional digits; anything else is invalid.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw, ""),
    };
    if int_part.is_empty() || frac_part.len() > 2 {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let whole: i64 = int_part.parse().ok()?;
    let frac: i64 = if frac_part.is_empty() {
        0
    } else {
        // ".5" means 50 hundredths, ".05" means 5
        let parsed: i64 = frac_part.parse().ok()?;
        if frac_part.len() == 1 {
            parsed * 10
        } else {
            parsed
        }
    };
    whole.checked_mul(100)?.checked_add(frac)
}
