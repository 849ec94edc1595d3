//! Typed Merchant API requests.
//!
//! Each request serializes to JSON using the provider's schema names (what
//! ends up in audit logs) and encodes to NVP fields for the wire.

use crate::error::{GatewayError, Result};
use crate::nvp::{NvpRequest, NvpResponse};
use crate::util::format_amount;
use serde::{Deserialize, Serialize};
use std::fmt;

const PAYMENT_REQUEST: &str = "PAYMENTREQUEST_0_";
const PAYMENT_ITEM: &str = "L_PAYMENTREQUEST_0_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAmount {
    #[serde(rename = "currencyID")]
    pub currency_id: String,
    pub value: String,
}

impl BasicAmount {
    pub fn new(currency_id: &str, value: f64) -> BasicAmount {
        BasicAmount {
            currency_id: currency_id.to_string(),
            value: format_amount(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentAction {
    Sale,
    Authorization,
    Order,
}

impl PaymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAction::Sale => "Sale",
            PaymentAction::Authorization => "Authorization",
            PaymentAction::Order => "Order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundType {
    Full,
    Partial,
}

impl RefundType {
    /// Exact `f64` comparison; any difference at all makes the refund partial.
    pub fn for_amounts(payment_amount: f64, refund_amount: f64) -> RefundType {
        if payment_amount == refund_amount {
            RefundType::Full
        } else {
            RefundType::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundType::Full => "Full",
            RefundType::Partial => "Partial",
        }
    }
}

impl fmt::Display for RefundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompleteType {
    Complete,
    NotComplete,
}

impl CompleteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompleteType::Complete => "Complete",
            CompleteType::NotComplete => "NotComplete",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: String,
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,
}

/// The `PaymentDetails` block as GetExpressCheckoutDetails returns it.
/// Amounts stay as the remote formatted them so they can be echoed back
/// untouched in DoExpressCheckoutPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentDetails {
    pub order_total: BasicAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handling_total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(default, rename = "PaymentDetailsItem")]
    pub items: Vec<PaymentItem>,
}

impl PaymentDetails {
    pub fn from_nvp(response: &NvpResponse) -> Result<PaymentDetails> {
        let field = |name: &str| {
            response
                .get(&format!("{PAYMENT_REQUEST}{name}"))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let total = field("AMT")
            .ok_or_else(|| GatewayError::MissingField(format!("{PAYMENT_REQUEST}AMT")))?;
        let currency = field("CURRENCYCODE")
            .ok_or_else(|| GatewayError::MissingField(format!("{PAYMENT_REQUEST}CURRENCYCODE")))?;

        let mut items = Vec::new();
        for index in 0.. {
            let item = |name: &str| {
                response
                    .get(&format!("{PAYMENT_ITEM}{name}{index}"))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let (name, amount) = match (item("NAME"), item("AMT")) {
                (None, None) => break,
                (name, amount) => (name.unwrap_or_default(), amount.unwrap_or_default()),
            };
            items.push(PaymentItem {
                name,
                number: item("NUMBER"),
                description: item("DESC"),
                amount,
                quantity: item("QTY").unwrap_or_else(|| "1".to_string()),
                tax: item("TAXAMT"),
            });
        }

        Ok(PaymentDetails {
            order_total: BasicAmount {
                currency_id: currency,
                value: total,
            },
            item_total: field("ITEMAMT"),
            shipping_total: field("SHIPPINGAMT"),
            handling_total: field("HANDLINGAMT"),
            tax_total: field("TAXAMT"),
            shipping_discount: field("SHIPDISCAMT"),
            order_description: field("DESC"),
            invoice_id: field("INVNUM"),
            custom: field("CUSTOM"),
            items,
        })
    }

    pub fn write_nvp(&self, request: &mut NvpRequest) {
        request
            .set(format!("{PAYMENT_REQUEST}AMT"), self.order_total.value.as_str())
            .set(
                format!("{PAYMENT_REQUEST}CURRENCYCODE"),
                self.order_total.currency_id.as_str(),
            )
            .set_opt(format!("{PAYMENT_REQUEST}ITEMAMT"), self.item_total.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}SHIPPINGAMT"), self.shipping_total.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}HANDLINGAMT"), self.handling_total.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}TAXAMT"), self.tax_total.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}SHIPDISCAMT"), self.shipping_discount.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}DESC"), self.order_description.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}INVNUM"), self.invoice_id.as_deref())
            .set_opt(format!("{PAYMENT_REQUEST}CUSTOM"), self.custom.as_deref());

        for (index, item) in self.items.iter().enumerate() {
            request
                .set(format!("{PAYMENT_ITEM}NAME{index}"), item.name.as_str())
                .set(format!("{PAYMENT_ITEM}AMT{index}"), item.amount.as_str())
                .set(format!("{PAYMENT_ITEM}QTY{index}"), item.quantity.as_str())
                .set_opt(format!("{PAYMENT_ITEM}NUMBER{index}"), item.number.as_deref())
                .set_opt(format!("{PAYMENT_ITEM}DESC{index}"), item.description.as_deref())
                .set_opt(format!("{PAYMENT_ITEM}TAXAMT{index}"), item.tax.as_deref());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetExpressCheckoutDetailsRequest {
    pub token: String,
}

impl GetExpressCheckoutDetailsRequest {
    pub const METHOD: &'static str = "GetExpressCheckoutDetails";

    pub fn to_nvp(&self) -> NvpRequest {
        let mut request = NvpRequest::new(Self::METHOD);
        request.set("TOKEN", self.token.as_str());
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoExpressCheckoutPaymentRequestDetails {
    #[serde(rename = "PaymentAction")]
    pub payment_action: PaymentAction,
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "PayerID")]
    pub payer_id: String,
    #[serde(rename = "PaymentDetails")]
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoExpressCheckoutPaymentRequest {
    #[serde(rename = "DoExpressCheckoutPaymentRequestDetails")]
    pub details: DoExpressCheckoutPaymentRequestDetails,
}

impl DoExpressCheckoutPaymentRequest {
    pub const METHOD: &'static str = "DoExpressCheckoutPayment";

    pub fn new(
        payment_action: PaymentAction,
        token: &str,
        payer_id: &str,
        payment_details: PaymentDetails,
    ) -> DoExpressCheckoutPaymentRequest {
        DoExpressCheckoutPaymentRequest {
            details: DoExpressCheckoutPaymentRequestDetails {
                payment_action,
                token: token.to_string(),
                payer_id: payer_id.to_string(),
                payment_details,
            },
        }
    }

    pub fn to_nvp(&self) -> NvpRequest {
        let details = &self.details;
        let mut request = NvpRequest::new(Self::METHOD);
        request
            .set("TOKEN", details.token.as_str())
            .set("PAYERID", details.payer_id.as_str())
            .set(
                format!("{PAYMENT_REQUEST}PAYMENTACTION"),
                details.payment_action.as_str(),
            );
        details.payment_details.write_nvp(&mut request);
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoCaptureRequest {
    #[serde(rename = "AuthorizationID")]
    pub authorization_id: String,
    #[serde(rename = "Amount")]
    pub amount: BasicAmount,
    #[serde(rename = "CompleteType")]
    pub complete_type: CompleteType,
}

impl DoCaptureRequest {
    pub const METHOD: &'static str = "DoCapture";

    pub fn to_nvp(&self) -> NvpRequest {
        let mut request = NvpRequest::new(Self::METHOD);
        request
            .set("AUTHORIZATIONID", self.authorization_id.as_str())
            .set("AMT", self.amount.value.as_str())
            .set("CURRENCYCODE", self.amount.currency_id.as_str())
            .set("COMPLETETYPE", self.complete_type.as_str());
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundTransactionRequest {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "RefundType")]
    pub refund_type: RefundType,
    #[serde(rename = "Amount")]
    pub amount: BasicAmount,
    #[serde(rename = "RefundSource")]
    pub refund_source: String,
}

impl RefundTransactionRequest {
    pub const METHOD: &'static str = "RefundTransaction";

    pub fn to_nvp(&self) -> NvpRequest {
        let mut request = NvpRequest::new(Self::METHOD);
        request
            .set("TRANSACTIONID", self.transaction_id.as_str())
            .set("REFUNDTYPE", self.refund_type.as_str())
            .set("AMT", self.amount.value.as_str())
            .set("CURRENCYCODE", self.amount.currency_id.as_str())
            .set("REFUNDSOURCE", self.refund_source.as_str());
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetExpressCheckoutRequest {
    #[serde(rename = "ReturnURL")]
    pub return_url: String,
    #[serde(rename = "CancelURL")]
    pub cancel_url: String,
    #[serde(rename = "SolutionType")]
    pub solution_type: String,
    #[serde(rename = "LandingPage")]
    pub landing_page: String,
    #[serde(rename = "cpp-header-image", skip_serializing_if = "String::is_empty")]
    pub logo_url: String,
    #[serde(rename = "PaymentAction")]
    pub payment_action: PaymentAction,
    #[serde(rename = "PaymentDetails")]
    pub payment_details: PaymentDetails,
}

impl SetExpressCheckoutRequest {
    pub const METHOD: &'static str = "SetExpressCheckout";

    pub fn to_nvp(&self) -> NvpRequest {
        let mut request = NvpRequest::new(Self::METHOD);
        request
            .set("RETURNURL", self.return_url.as_str())
            .set("CANCELURL", self.cancel_url.as_str())
            .set("SOLUTIONTYPE", self.solution_type.as_str())
            .set("LANDINGPAGE", self.landing_page.as_str())
            .set_opt("LOGOIMG", Some(self.logo_url.as_str()))
            .set(
                format!("{PAYMENT_REQUEST}PAYMENTACTION"),
                self.payment_action.as_str(),
            );
        self.payment_details.write_nvp(&mut request);
        request
    }
}
