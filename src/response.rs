use crate::nvp::NvpResponse;
use serde::Serialize;

/// The single result shape every gateway operation returns to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    pub success: bool,
    /// Authorization, capture or refund id, depending on the operation.
    pub transaction_id: Option<String>,
    /// Pretty-printed JSON of the remote reply, kept for audit.
    #[serde(with = "payload_as_text")]
    pub raw_payload: Vec<u8>,
    pub error_message: Option<String>,
    pub test: bool,
}

impl GatewayResponse {
    pub fn from_remote(
        response: &NvpResponse,
        transaction_id: Option<String>,
        test: bool,
    ) -> GatewayResponse {
        let success = response.is_success();
        GatewayResponse {
            success,
            transaction_id: if success { transaction_id } else { None },
            raw_payload: raw_payload(response),
            error_message: if success {
                None
            } else {
                Some(format_error_messages(response))
            },
            test,
        }
    }

    /// Host-facing alias: the authorization code is the transaction id.
    pub fn authorization(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn raw_payload_str(&self) -> &str {
        std::str::from_utf8(&self.raw_payload).unwrap_or_default()
    }
}

pub fn raw_payload(response: &NvpResponse) -> Vec<u8> {
    serde_json::to_vec_pretty(response).unwrap_or_default()
}

/// Joins every long error message with a space, e.g. for flash messages.
pub fn format_error_messages(response: &NvpResponse) -> String {
    response
        .errors()
        .iter()
        .map(|error| error.long_message.as_str())
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

mod payload_as_text {
    use serde::Serializer;

    pub fn serialize<S>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&String::from_utf8_lossy(payload))
    }
}
