use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    domain::{Transaction, User},
    error::Result,
};

pub mod midtrans;

pub use midtrans::MidtransClient;

/// Hosted-checkout provider used to collect pledges.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout for `transaction` and returns the URL the backer is redirected to.
    async fn payment_url(&self, transaction: &Transaction, user: &User) -> Result<String>;

    /// Checks that a notification was produced by the gateway.
    fn verify_notification(&self, notification: &PaymentNotification) -> bool;
}

/// Asynchronous status callback posted by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
}
