//! PayPal Express Checkout for a host commerce platform, over the classic
//! Merchant API (NVP).
//!
//! ```no_run
//! use paypal_express::{ExpressCheckoutSession, GatewayConfig, PayPalExpress};
//!
//! # fn main() -> paypal_express::Result<()> {
//! let gateway = PayPalExpress::new(GatewayConfig::default())?;
//! let mut session = ExpressCheckoutSession::with_payer("EC-1AB23456CD789012E", "PAYER123");
//! let response = gateway.authorize(100.0, &mut session)?;
//! if response.success {
//!     println!("authorized as {:?}", response.authorization());
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod nvp;
pub mod payment;
pub mod response;
pub mod util;

pub use checkout::{ExpressCheckoutSession, RefundState};
pub use client::{MerchantApi, NvpClient};
pub use config::{Credentials, GatewayConfig, Server};
pub use error::{GatewayError, Result};
pub use gateway::{Originator, PayPalExpress};
pub use ledger::CsvLedger;
pub use payment::{LedgerEntry, Payment, PaymentLedger, PaymentState};
pub use response::GatewayResponse;
