//! Name-value pair wire format of the classic Merchant API.
//!
//! Requests are form-encoded `KEY=value` pairs; replies come back in the same
//! encoding. Repeated values are indexed by suffix (`L_LONGMESSAGE0`,
//! `L_LONGMESSAGE1`, ...).

use crate::error::{GatewayError, Result};
use crate::util::encode_form;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outbound call: the API method plus its operation-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NvpRequest {
    method: String,
    fields: Vec<(String, String)>,
}

impl NvpRequest {
    pub fn new(method: &str) -> NvpRequest {
        NvpRequest {
            method: method.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Appends a field; setting the same key twice keeps the last value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.fields.push((key, value));
        }
        self
    }

    /// Like [`set`](Self::set) but skips empty values, which PayPal rejects.
    pub fn set_opt(&mut self, key: impl Into<String>, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.is_empty() => self.set(key, value),
            _ => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Full form body including the authentication header fields.
    pub fn encode(&self, user: &str, pwd: &str, signature: &str, version: &str) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(self.fields.len() + 5);
        pairs.push(("USER", user));
        pairs.push(("PWD", pwd));
        pairs.push(("SIGNATURE", signature));
        pairs.push(("VERSION", version));
        pairs.push(("METHOD", &self.method));
        for (key, value) in &self.fields {
            pairs.push((key.as_str(), value.as_str()));
        }
        encode_form(&pairs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Success,
    SuccessWithWarning,
    Failure,
    FailureWithWarning,
    Other,
}

impl Ack {
    pub fn parse(value: &str) -> Ack {
        match value {
            "Success" => Ack::Success,
            "SuccessWithWarning" => Ack::SuccessWithWarning,
            "Failure" => Ack::Failure,
            "FailureWithWarning" => Ack::FailureWithWarning,
            _ => Ack::Other,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Ack::Success | Ack::SuccessWithWarning)
    }
}

/// One entry of the `L_ERRORCODEn` / `L_SHORTMESSAGEn` / ... block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NvpError {
    pub code: String,
    pub short_message: String,
    pub long_message: String,
    pub severity: String,
}

/// Decoded reply. Keys are kept verbatim and sorted, which is also the order
/// used for the audit payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NvpResponse {
    fields: BTreeMap<String, String>,
}

impl NvpResponse {
    pub fn parse(body: &str) -> Result<NvpResponse> {
        let fields: BTreeMap<String, String> = url::form_urlencoded::parse(body.trim().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !fields.contains_key("ACK") {
            let preview: String = body.chars().take(120).collect();
            return Err(GatewayError::MalformedResponse(format!(
                "no ACK field in response: {}",
                preview
            )));
        }
        Ok(NvpResponse { fields })
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> NvpResponse
    where
        K: Into<String>,
        V: Into<String>,
    {
        NvpResponse {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| GatewayError::MissingField(key.to_string()))
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn ack(&self) -> Ack {
        Ack::parse(self.get("ACK").unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        self.ack().is_success()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.get("CORRELATIONID")
    }

    pub fn errors(&self) -> Vec<NvpError> {
        let mut errors = Vec::new();
        for index in 0.. {
            let code = self.get(&format!("L_ERRORCODE{index}"));
            let long = self.get(&format!("L_LONGMESSAGE{index}"));
            if code.is_none() && long.is_none() {
                break;
            }
            errors.push(NvpError {
                code: code.unwrap_or_default().to_string(),
                short_message: self
                    .get(&format!("L_SHORTMESSAGE{index}"))
                    .unwrap_or_default()
                    .to_string(),
                long_message: long.unwrap_or_default().to_string(),
                severity: self
                    .get(&format!("L_SEVERITYCODE{index}"))
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_auth_header_before_fields() {
        let mut request = NvpRequest::new("GetExpressCheckoutDetails");
        request.set("TOKEN", "EC-123");
        let body = request.encode("api_user", "p w", "sig", "204.0");
        assert_eq!(
            body,
            "USER=api_user&PWD=p+w&SIGNATURE=sig&VERSION=204.0&METHOD=GetExpressCheckoutDetails&TOKEN=EC-123"
        );
    }

    #[test]
    fn set_replaces_and_set_opt_skips_empty() {
        let mut request = NvpRequest::new("DoCapture");
        request.set("AMT", "1.00").set("AMT", "2.00");
        request.set_opt("NOTE", Some("")).set_opt("INVNUM", None);
        assert_eq!(request.fields().len(), 1);
        assert_eq!(request.get("AMT"), Some("2.00"));
    }

    #[test]
    fn parses_success_reply() {
        let response = NvpResponse::parse(
            "TOKEN=EC%2d123&ACK=SuccessWithWarning&CORRELATIONID=abc123&VERSION=204%2e0",
        )
        .unwrap();
        assert_eq!(response.get("TOKEN"), Some("EC-123"));
        assert_eq!(response.ack(), Ack::SuccessWithWarning);
        assert!(response.is_success());
        assert_eq!(response.correlation_id(), Some("abc123"));
    }

    #[test]
    fn collects_indexed_errors() {
        let response = NvpResponse::parse(
            "ACK=Failure&L_ERRORCODE0=10410&L_SHORTMESSAGE0=Invalid%20token&L_LONGMESSAGE0=Invalid%20token.&L_SEVERITYCODE0=Error\
             &L_ERRORCODE1=10002&L_LONGMESSAGE1=Security%20header%20is%20not%20valid",
        )
        .unwrap();
        assert!(!response.is_success());
        let errors = response.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, "10410");
        assert_eq!(errors[0].severity, "Error");
        assert_eq!(errors[1].long_message, "Security header is not valid");
        assert_eq!(errors[1].short_message, "");
    }

    #[test]
    fn body_without_ack_is_malformed() {
        let err = NvpResponse::parse("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn require_treats_empty_as_missing() {
        let response = NvpResponse::from_pairs([("ACK", "Success"), ("TRANSACTIONID", "")]);
        assert!(matches!(
            response.require("TRANSACTIONID"),
            Err(GatewayError::MissingField(_))
        ));
    }
}
