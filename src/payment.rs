//! Host-side payment records the gateway reads and writes back to.

use crate::checkout::ExpressCheckoutSession;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Checkout,
    Pending,
    Processing,
    Completed,
    Failed,
    Void,
    Invalid,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Checkout => "checkout",
            PaymentState::Pending => "pending",
            PaymentState::Processing => "processing",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Void => "void",
            PaymentState::Invalid => "invalid",
        }
    }
}

impl FromStr for PaymentState {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "checkout" => Ok(PaymentState::Checkout),
            "pending" => Ok(PaymentState::Pending),
            "processing" => Ok(PaymentState::Processing),
            "completed" => Ok(PaymentState::Completed),
            "failed" => Ok(PaymentState::Failed),
            "void" => Ok(PaymentState::Void),
            "invalid" => Ok(PaymentState::Invalid),
            other => Err(format!("unknown payment state: {other}")),
        }
    }
}

/// A payment funded by an express checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    /// Major units; compared exactly when deciding Full vs Partial refunds.
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub state: PaymentState,
    /// Set by the host from the capture/authorization response.
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub source: ExpressCheckoutSession,
}

impl Payment {
    pub fn new(amount: f64, currency: &str, source: ExpressCheckoutSession) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            order_id: None,
            payment_method_id: None,
            amount,
            currency: currency.to_string(),
            state: PaymentState::default(),
            transaction_id: None,
            source,
        }
    }
}

/// Negative payment row recorded after a successful refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub order_id: Option<String>,
    pub source_payment_id: Uuid,
    pub payment_method_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub response_code: Option<String>,
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The stored amount is always `-abs(refunded)`.
    pub fn refund_of(
        payment: &Payment,
        refunded: f64,
        response_code: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            order_id: payment.order_id.clone(),
            source_payment_id: payment.id,
            payment_method_id: payment.payment_method_id.clone(),
            amount: -refunded.abs(),
            currency: payment.currency.clone(),
            response_code,
            state: PaymentState::Completed,
            created_at: at,
        }
    }
}

/// Where refund rows go. The host's persistence layer implements this.
pub trait PaymentLedger {
    fn record(&mut self, entry: LedgerEntry) -> Result<()>;
}

impl PaymentLedger for Vec<LedgerEntry> {
    fn record(&mut self, entry: LedgerEntry) -> Result<()> {
        self.push(entry);
        Ok(())
    }
}
