//! Authenticated access to the Merchant API.

use crate::config::{Credentials, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::models::{
    DoCaptureRequest, DoExpressCheckoutPaymentRequest, GetExpressCheckoutDetailsRequest,
    RefundTransactionRequest, SetExpressCheckoutRequest,
};
use crate::nvp::{NvpRequest, NvpResponse};
use std::time::Duration;

/// The remote operations the gateway relies on.
///
/// A non-success `ACK` is returned as `Ok`; only transport or decoding
/// failures are `Err`.
pub trait MerchantApi {
    fn set_express_checkout(&self, request: &SetExpressCheckoutRequest) -> Result<NvpResponse>;

    fn get_express_checkout_details(
        &self,
        request: &GetExpressCheckoutDetailsRequest,
    ) -> Result<NvpResponse>;

    fn do_express_checkout_payment(
        &self,
        request: &DoExpressCheckoutPaymentRequest,
    ) -> Result<NvpResponse>;

    fn do_capture(&self, request: &DoCaptureRequest) -> Result<NvpResponse>;

    fn refund_transaction(&self, request: &RefundTransactionRequest) -> Result<NvpResponse>;
}

/// Blocking NVP client. Owns its credentials; nothing is shared process-wide.
pub struct NvpClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    credentials: Credentials,
    api_version: String,
}

impl NvpClient {
    pub fn new(config: &GatewayConfig) -> Result<NvpClient> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("paypal-express/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(NvpClient {
            http,
            endpoint: config.nvp_endpoint().to_string(),
            credentials: config.credentials.clone(),
            api_version: config.api_version.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call(&self, request: NvpRequest) -> Result<NvpResponse> {
        log::debug!(
            "{} -> {} fields [{}]",
            request.method(),
            self.endpoint,
            request
                .fields()
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        let body = request.encode(
            &self.credentials.login,
            &self.credentials.password,
            &self.credentials.signature,
            &self.api_version,
        );
        let reply = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()?;

        let status = reply.status();
        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        let text = reply.text()?;
        let response = NvpResponse::parse(&text)?;
        log::info!(
            "{} ack={:?} correlation_id={}",
            request.method(),
            response.ack(),
            response.correlation_id().unwrap_or("-")
        );
        Ok(response)
    }
}

impl MerchantApi for NvpClient {
    fn set_express_checkout(&self, request: &SetExpressCheckoutRequest) -> Result<NvpResponse> {
        self.call(request.to_nvp())
    }

    fn get_express_checkout_details(
        &self,
        request: &GetExpressCheckoutDetailsRequest,
    ) -> Result<NvpResponse> {
        self.call(request.to_nvp())
    }

    fn do_express_checkout_payment(
        &self,
        request: &DoExpressCheckoutPaymentRequest,
    ) -> Result<NvpResponse> {
        self.call(request.to_nvp())
    }

    fn do_capture(&self, request: &DoCaptureRequest) -> Result<NvpResponse> {
        self.call(request.to_nvp())
    }

    fn refund_transaction(&self, request: &RefundTransactionRequest) -> Result<NvpResponse> {
        self.call(request.to_nvp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Server, LIVE_NVP_ENDPOINT, SANDBOX_NVP_ENDPOINT};

    #[test]
    fn endpoint_follows_server() {
        let sandbox = NvpClient::new(&GatewayConfig::default()).unwrap();
        assert_eq!(sandbox.endpoint(), SANDBOX_NVP_ENDPOINT);

        let live = NvpClient::new(&GatewayConfig {
            server: Server::Live,
            ..GatewayConfig::default()
        })
        .unwrap();
        assert_eq!(live.endpoint(), LIVE_NVP_ENDPOINT);
    }

    #[test]
    fn unreachable_endpoint_surfaces_http_error() {
        let client = NvpClient::new(&GatewayConfig {
            endpoint: Some("http://127.0.0.1:1/nvp".to_string()),
            timeout_secs: 2,
            ..GatewayConfig::default()
        })
        .unwrap();
        let err = client
            .get_express_checkout_details(&GetExpressCheckoutDetailsRequest {
                token: "EC-1".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, GatewayError::Http(_)));
    }
}
