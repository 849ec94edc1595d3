//! Error types for gateway operations.
//!
//! Only failures that prevent a usable answer from PayPal end up here:
//! transport problems, unparseable replies, bad configuration and ledger
//! writes. A reply with `ACK=Failure` is not an error at this level; it is
//! reported through [`GatewayResponse::success`](crate::response::GatewayResponse).

use thiserror::Error;

/// Result alias used by every fallible function in the crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network, TLS or timeout failure talking to the NVP endpoint.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The body could not be read as an NVP reply (no `ACK` field).
    #[error("malformed NVP response: {0}")]
    MalformedResponse(String),

    /// A reply or record lacked a field the operation depends on.
    #[error("required field {0} is missing")]
    MissingField(String),

    /// PayPal refused a lookup the operation cannot continue without.
    #[error("{method} rejected: {message}")]
    Rejected { method: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("ledger write failed: {0}")]
    Ledger(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for GatewayError {
    fn from(err: csv::Error) -> Self {
        GatewayError::Ledger(err.to_string())
    }
}
