//! The express checkout record kept per PayPal session.

use crate::models::RefundType;
use crate::payment::{Payment, PaymentState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundState {
    #[default]
    None,
    /// Only ever set by the host; gateway refunds always write `Refunded`.
    Partial,
    Refunded,
}

/// One buyer session. Never deleted; it doubles as the audit trail for the
/// payment it funded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressCheckoutSession {
    pub token: String,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub refund_transaction_id: Option<String>,
    #[serde(default)]
    pub refund_type: Option<RefundType>,
    #[serde(default)]
    pub state: RefundState,
    #[serde(default)]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl ExpressCheckoutSession {
    pub fn new(token: &str) -> ExpressCheckoutSession {
        ExpressCheckoutSession {
            token: token.to_string(),
            ..ExpressCheckoutSession::default()
        }
    }

    pub fn with_payer(token: &str, payer_id: &str) -> ExpressCheckoutSession {
        ExpressCheckoutSession {
            payer_id: Some(payer_id.to_string()),
            ..ExpressCheckoutSession::new(token)
        }
    }

    pub fn payer_id(&self) -> &str {
        self.payer_id.as_deref().unwrap_or_default()
    }

    /// Records a successful refund against this session. Full and partial
    /// refunds both end in `Refunded`; `refund_type` tells them apart.
    pub fn mark_refunded(
        &mut self,
        refund_transaction_id: Option<String>,
        refund_type: RefundType,
        at: DateTime<Utc>,
    ) {
        self.refunded_at = Some(at);
        self.refund_transaction_id = refund_transaction_id;
        self.state = RefundState::Refunded;
        self.refund_type = Some(refund_type);
    }

    pub fn actions(&self) -> &'static [&'static str] {
        &["capture"]
    }

    pub fn can_capture(&self, payment: &Payment) -> bool {
        payment.state == PaymentState::Pending
    }

    pub fn can_credit(&self, payment: &Payment) -> bool {
        payment.state == PaymentState::Completed
    }
}
