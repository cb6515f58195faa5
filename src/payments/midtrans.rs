use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::{
    config::{GatewayEnvironment, MidtransConfig},
    domain::{Transaction, User},
    error::{AppError, Result},
    payments::{PaymentGateway, PaymentNotification},
};

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com/snap/v1/transactions";

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    redirect_url: Option<String>,
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Midtrans Snap client.
pub struct MidtransClient {
    http: reqwest::Client,
    server_key: String,
    snap_url: String,
}

impl MidtransClient {
    pub fn new(config: &MidtransConfig) -> Self {
        let snap_url = match config.environment {
            GatewayEnvironment::Sandbox => SANDBOX_SNAP_URL,
            GatewayEnvironment::Production => PRODUCTION_SNAP_URL,
        };

        Self {
            http: reqwest::Client::new(),
            server_key: config.server_key.clone(),
            snap_url: snap_url.to_string(),
        }
    }

    /// Points the client at a different Snap endpoint.
    pub fn with_snap_url(mut self, snap_url: impl Into<String>) -> Self {
        self.snap_url = snap_url.into();
        self
    }

    /// `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.
    pub fn notification_signature(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(order_id.as_bytes());
        hasher.update(status_code.as_bytes());
        hasher.update(gross_amount.as_bytes());
        hasher.update(self.server_key.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn payment_url(&self, transaction: &Transaction, user: &User) -> Result<String> {
        let request = SnapRequest {
            transaction_details: TransactionDetails {
                order_id: &transaction.code,
                gross_amount: transaction.amount,
            },
            customer_details: CustomerDetails {
                first_name: &user.name,
                email: &user.email,
            },
        };

        let response = self
            .http
            .post(&self.snap_url)
            .basic_auth(&self.server_key, None::<&str>)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Snap request failed: {}", e)))?;

        let status = response.status();
        let body: SnapResponse = response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Unreadable Snap response ({}): {}", status, e)))?;

        if !status.is_success() {
            let detail = if body.error_messages.is_empty() {
                status.to_string()
            } else {
                body.error_messages.join("; ")
            };
            return Err(AppError::PaymentGateway(detail));
        }

        tracing::debug!("Snap checkout opened for order {}", transaction.code);

        body.redirect_url
            .ok_or_else(|| AppError::PaymentGateway("No redirect URL returned".to_string()))
    }

    fn verify_notification(&self, notification: &PaymentNotification) -> bool {
        if self.server_key.is_empty() || notification.signature_key.is_empty() {
            return false;
        }

        let expected = self.notification_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
        );

        expected
            .as_bytes()
            .ct_eq(notification.signature_key.to_ascii_lowercase().as_bytes())
            .into()
    }
}
