//! PayPal Express as a host payment method.
//!
//! Host-facing operations map onto Merchant API calls:
//!
//! | operation   | remote calls                                        |
//! |-------------|-----------------------------------------------------|
//! | `purchase`  | GetExpressCheckoutDetails, DoExpressCheckoutPayment |
//! | `authorize` | GetExpressCheckoutDetails, DoExpressCheckoutPayment |
//! | `capture`   | DoCapture                                           |
//! | `refund`    | RefundTransaction                                   |
//! | `credit`    | RefundTransaction                                   |
//!
//! Capture and credit receive minor units (cents); refund receives major
//! units. Nothing is retried here.

use crate::checkout::ExpressCheckoutSession;
use crate::client::{MerchantApi, NvpClient};
use crate::config::{GatewayConfig, Server};
use crate::error::{GatewayError, Result};
use crate::models::{
    BasicAmount, CompleteType, DoCaptureRequest, DoExpressCheckoutPaymentRequest,
    GetExpressCheckoutDetailsRequest, PaymentAction, PaymentDetails, RefundTransactionRequest,
    RefundType, SetExpressCheckoutRequest,
};
use crate::nvp::NvpResponse;
use crate::payment::{LedgerEntry, Payment, PaymentLedger};
use crate::response::{format_error_messages, raw_payload, GatewayResponse};
use crate::util::{cents_to_amount, encode_form, format_amount};
use chrono::Utc;

pub const METHOD_TYPE: &str = "paypal";
const REFUND_SOURCE: &str = "any";

/// Whatever started a credit; the gateway only needs its payment.
pub trait Originator {
    fn payment_mut(&mut self) -> &mut Payment;
}

impl Originator for Payment {
    fn payment_mut(&mut self) -> &mut Payment {
        self
    }
}

pub struct PayPalExpress<A = NvpClient> {
    config: GatewayConfig,
    api: A,
}

impl PayPalExpress<NvpClient> {
    /// Builds the gateway with its own NVP client for `config`.
    pub fn new(config: GatewayConfig) -> Result<PayPalExpress<NvpClient>> {
        let api = NvpClient::new(&config)?;
        Ok(PayPalExpress { config, api })
    }
}

impl<A: MerchantApi> PayPalExpress<A> {
    pub fn with_api(config: GatewayConfig, api: A) -> PayPalExpress<A> {
        PayPalExpress { config, api }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn supports<S: ?Sized>(&self, _source: &S) -> bool {
        true
    }

    pub fn method_type(&self) -> &'static str {
        METHOD_TYPE
    }

    pub fn auto_capture(&self) -> bool {
        true
    }

    pub fn is_sandbox(&self) -> bool {
        self.config.is_sandbox()
    }

    pub fn server_domain(&self) -> &'static str {
        match self.config.server {
            Server::Live => "",
            Server::Sandbox => "sandbox.",
        }
    }

    /// Where to send the buyer after SetExpressCheckout. `token` comes first;
    /// `extra_params` are merged over it in order, so a later key replaces the
    /// value of an earlier one in place.
    pub fn express_checkout_url(&self, token: &str, extra_params: &[(&str, &str)]) -> String {
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(extra_params.len() + 1);
        params.push(("token", token));
        for &(key, value) in extra_params {
            match params.iter().position(|(existing, _)| *existing == key) {
                Some(index) => params[index].1 = value,
                None => params.push((key, value)),
            }
        }

        let base = if self.config.use_new_layout {
            format!("https://www.{}paypal.com/checkoutnow/2?", self.server_domain())
        } else {
            format!(
                "https://www.{}paypal.com/cgi-bin/webscr?cmd=_express-checkout&force_sa=true&",
                self.server_domain()
            )
        };
        base + &encode_form(&params)
    }

    /// Starts a buyer session. On success `transaction_id` carries the
    /// checkout token to redirect with.
    pub fn setup_checkout(
        &self,
        payment_details: PaymentDetails,
        return_url: &str,
        cancel_url: &str,
        payment_action: PaymentAction,
    ) -> Result<GatewayResponse> {
        let request = SetExpressCheckoutRequest {
            return_url: return_url.to_string(),
            cancel_url: cancel_url.to_string(),
            solution_type: self.config.solution.clone(),
            landing_page: self.config.landing_page.clone(),
            logo_url: self.config.logourl.clone(),
            payment_action,
            payment_details,
        };
        let response = self.api.set_express_checkout(&request)?;
        let token = response.get("TOKEN").map(str::to_string);
        Ok(self.build_response(&response, token))
    }

    pub fn payment_details(&self, token: &str) -> Result<PaymentDetails> {
        let request = GetExpressCheckoutDetailsRequest {
            token: token.to_string(),
        };
        let response = self.api.get_express_checkout_details(&request)?;
        if !response.is_success() {
            return Err(GatewayError::Rejected {
                method: GetExpressCheckoutDetailsRequest::METHOD.to_string(),
                message: format_error_messages(&response),
            });
        }
        PaymentDetails::from_nvp(&response)
    }

    pub fn purchase(
        &self,
        amount: f64,
        session: &mut ExpressCheckoutSession,
    ) -> Result<GatewayResponse> {
        log::info!("purchase {} for token {}", format_amount(amount), session.token);
        let details = self.payment_details(&session.token)?;
        let request = DoExpressCheckoutPaymentRequest::new(
            PaymentAction::Sale,
            &session.token,
            session.payer_id(),
            details,
        );
        let response = self.api.do_express_checkout_payment(&request)?;

        if !response.is_success() {
            log::warn!(
                "purchase for token {} failed: {}",
                session.token,
                format_error_messages(&response)
            );
            return Ok(self.build_response(&response, None));
        }

        // Kept on the session so a later refund can reference the sale.
        let transaction_id = payment_transaction_id(&response)?;
        session.transaction_id = Some(transaction_id);
        Ok(GatewayResponse {
            success: true,
            transaction_id: None,
            raw_payload: raw_payload(&response),
            error_message: None,
            test: self.is_sandbox(),
        })
    }

    pub fn authorize(
        &self,
        amount: f64,
        session: &mut ExpressCheckoutSession,
    ) -> Result<GatewayResponse> {
        log::info!("authorize {} for token {}", format_amount(amount), session.token);
        let response = self.do_authorize(&session.token, session.payer_id())?;
        session.transaction_id = response.transaction_id.clone();
        Ok(response)
    }

    fn do_authorize(&self, token: &str, payer_id: &str) -> Result<GatewayResponse> {
        let details = self.payment_details(token)?;
        let request = DoExpressCheckoutPaymentRequest::new(
            PaymentAction::Authorization,
            token,
            payer_id,
            details,
        );
        let response = self.api.do_express_checkout_payment(&request)?;
        let transaction_id = if response.is_success() {
            Some(payment_transaction_id(&response)?)
        } else {
            None
        };
        Ok(self.build_response(&response, transaction_id))
    }

    pub fn capture(
        &self,
        amount_cents: i64,
        authorization: &str,
        currency: &str,
    ) -> Result<GatewayResponse> {
        let request = DoCaptureRequest {
            authorization_id: authorization.to_string(),
            amount: BasicAmount::new(currency, cents_to_amount(amount_cents)),
            complete_type: CompleteType::Complete,
        };
        log::info!(
            "capture {} {} against authorization {}",
            request.amount.value,
            currency,
            authorization
        );
        let response = self.api.do_capture(&request)?;
        let transaction_id = if response.is_success() {
            Some(response.require("TRANSACTIONID")?.to_string())
        } else {
            None
        };
        Ok(self.build_response(&response, transaction_id))
    }

    /// Refunds `amount` (major units) of `payment` and, on success, records
    /// the negative ledger row.
    pub fn refund<L: PaymentLedger + ?Sized>(
        &self,
        payment: &mut Payment,
        amount: f64,
        ledger: &mut L,
    ) -> Result<GatewayResponse> {
        let transaction_id = payment
            .source
            .transaction_id
            .clone()
            .ok_or_else(|| GatewayError::MissingField("source.transaction_id".to_string()))?;
        let refund_type = RefundType::for_amounts(payment.amount, amount);
        let response =
            self.refund_transaction(&transaction_id, refund_type, &payment.currency, amount)?;
        let refund_transaction_id = response.get("REFUNDTRANSACTIONID").map(str::to_string);

        if response.is_success() {
            let now = Utc::now();
            payment
                .source
                .mark_refunded(refund_transaction_id.clone(), refund_type, now);
            ledger.record(LedgerEntry::refund_of(
                payment,
                amount,
                refund_transaction_id.clone(),
                now,
            ))?;
        }
        Ok(self.build_response(&response, refund_transaction_id))
    }

    /// Credit initiated by a host refund; `credit_cents` is in minor units.
    /// The payment's own transaction id is preferred over `transaction_id`.
    pub fn credit<O: Originator + ?Sized>(
        &self,
        credit_cents: i64,
        transaction_id: &str,
        originator: &mut O,
    ) -> Result<GatewayResponse> {
        let payment = originator.payment_mut();
        let amount = cents_to_amount(credit_cents);
        let refund_type = RefundType::for_amounts(payment.amount, amount);
        let target = payment
            .transaction_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| transaction_id.to_string());

        let response = self.refund_transaction(&target, refund_type, &payment.currency, amount)?;
        let refund_transaction_id = response.get("REFUNDTRANSACTIONID").map(str::to_string);

        if response.is_success() {
            payment
                .source
                .mark_refunded(refund_transaction_id.clone(), refund_type, Utc::now());
        }
        Ok(self.build_response(&response, refund_transaction_id))
    }

    fn refund_transaction(
        &self,
        transaction_id: &str,
        refund_type: RefundType,
        currency: &str,
        amount: f64,
    ) -> Result<NvpResponse> {
        let request = RefundTransactionRequest {
            transaction_id: transaction_id.to_string(),
            refund_type,
            amount: BasicAmount::new(currency, amount),
            refund_source: REFUND_SOURCE.to_string(),
        };
        log::info!(
            "{} refund of {} {} for transaction {}",
            refund_type,
            request.amount.value,
            currency,
            transaction_id
        );
        let response = self.api.refund_transaction(&request)?;
        if !response.is_success() {
            log::warn!(
                "refund for transaction {} failed: {}",
                transaction_id,
                format_error_messages(&response)
            );
        }
        Ok(response)
    }

    fn build_response(
        &self,
        response: &NvpResponse,
        transaction_id: Option<String>,
    ) -> GatewayResponse {
        GatewayResponse::from_remote(response, transaction_id, self.is_sandbox())
    }
}

fn payment_transaction_id(response: &NvpResponse) -> Result<String> {
    response
        .require("PAYMENTINFO_0_TRANSACTIONID")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MerchantApi;
    use crate::models::*;

    struct Unreachable;

    impl MerchantApi for Unreachable {
        fn set_express_checkout(&self, _: &SetExpressCheckoutRequest) -> Result<NvpResponse> {
            unreachable!()
        }
        fn get_express_checkout_details(
            &self,
            _: &GetExpressCheckoutDetailsRequest,
        ) -> Result<NvpResponse> {
            unreachable!()
        }
        fn do_express_checkout_payment(
            &self,
            _: &DoExpressCheckoutPaymentRequest,
        ) -> Result<NvpResponse> {
            unreachable!()
        }
        fn do_capture(&self, _: &DoCaptureRequest) -> Result<NvpResponse> {
            unreachable!()
        }
        fn refund_transaction(&self, _: &RefundTransactionRequest) -> Result<NvpResponse> {
            unreachable!()
        }
    }

    fn gateway(server: Server, use_new_layout: bool) -> PayPalExpress<Unreachable> {
        PayPalExpress::with_api(
            GatewayConfig {
                server,
                use_new_layout,
                ..GatewayConfig::default()
            },
            Unreachable,
        )
    }

    #[test]
    fn new_layout_url() {
        let url = gateway(Server::Sandbox, true).express_checkout_url("EC-1", &[]);
        assert_eq!(url, "https://www.sandbox.paypal.com/checkoutnow/2?token=EC-1");
    }

    #[test]
    fn legacy_layout_url_with_extra_params() {
        let url = gateway(Server::Sandbox, false)
            .express_checkout_url("EC-1", &[("useraction", "commit"), ("locale.x", "en US")]);
        assert_eq!(
            url,
            "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&force_sa=true&token=EC-1&useraction=commit&locale.x=en+US"
        );
    }

    #[test]
    fn live_server_has_no_subdomain() {
        let gateway = gateway(Server::Live, true);
        assert_eq!(gateway.server_domain(), "");
        assert!(!gateway.is_sandbox());
        assert!(gateway
            .express_checkout_url("EC-2", &[])
            .starts_with("https://www.paypal.com/checkoutnow/2?token=EC-2"));
    }

    #[test]
    fn extra_token_param_replaces_session_token_in_place() {
        let url = gateway(Server::Sandbox, false)
            .express_checkout_url("EC-1", &[("useraction", "commit"), ("token", "EC-2")]);
        assert_eq!(
            url,
            "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&force_sa=true&token=EC-2&useraction=commit"
        );
    }

    #[test]
    fn blank_server_reports_test_responses() {
        let config = GatewayConfig::from_toml_str("server = \"\"").unwrap();
        let gateway = PayPalExpress::with_api(config, Unreachable);
        assert!(gateway.is_sandbox());
        assert_eq!(gateway.server_domain(), "sandbox.");

        let remote = NvpResponse::from_pairs([("ACK", "Success"), ("TRANSACTIONID", "TX1")]);
        let response = gateway.build_response(&remote, Some("TX1".to_string()));
        assert!(response.test);
    }

    #[test]
    fn host_capabilities() {
        let gateway = gateway(Server::Sandbox, true);
        assert!(gateway.supports("anything"));
        assert!(gateway.supports(&42));
        assert_eq!(gateway.method_type(), "paypal");
        assert!(gateway.auto_capture());
    }

    #[test]
    fn refund_without_captured_transaction_is_rejected_locally() {
        let gateway = gateway(Server::Sandbox, true);
        let mut payment = Payment::new(10.0, "USD", ExpressCheckoutSession::new("EC-1"));
        let mut ledger: Vec<LedgerEntry> = Vec::new();
        let err = gateway.refund(&mut payment, 10.0, &mut ledger).unwrap_err();
        assert!(matches!(err, GatewayError::MissingField(_)));
        assert!(ledger.is_empty());
    }
}
