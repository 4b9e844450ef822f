use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a payment.
///
/// `Pending` is the only initial and only non-terminal status. Once a
/// payment reaches `Paid`, `Canceled`, or `Failed` no further transition is
/// permitted; the conditional update in `db::queries::transition_payment`
/// enforces this at the store level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Canceled,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// A unit of work tracked across the callback protocol.
///
/// Created once outside the protocol (payment intake), mutated only by the
/// COMPLETE transition or the out-of-band status sync.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    /// Locally-assigned id; echoed to the gateway as `merchant_prepare_id`
    /// and `merchant_confirm_id`.
    pub id: i64,
    /// Opaque owner reference.
    pub user_id: String,
    /// Amount in the gateway's currency unit (UZS soum). The wire carries a
    /// decimal string with up to two fractional digits; callbacks compare at
    /// hundredth precision, see `protocol::request::parse_amount`.
    pub amount: i64,
    /// Merchant-generated correlation key, globally unique. The gateway
    /// echoes it back in every callback.
    pub merchant_trans_id: String,
    /// Gateway-assigned transaction id, set exactly once on the terminal
    /// transition (from `click_trans_id`).
    pub gateway_payment_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePayment {
    pub user_id: String,
    /// Amount in the gateway's currency unit.
    pub amount: i64,
}
