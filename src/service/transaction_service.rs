use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use crate::{
    domain::*,
    error::{AppError, Result},
    payments::{PaymentGateway, PaymentNotification},
    repository::{CampaignRepository, TransactionRepository},
    service::campaign_service::ensure_owner,
};

pub struct TransactionService {
    repo: Arc<dyn TransactionRepository>,
    campaign_repo: Arc<dyn CampaignRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl TransactionService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        campaign_repo: Arc<dyn CampaignRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self { repo, campaign_repo, gateway }
    }

    /// Opens a pledge of `amount` from `backer` toward a campaign.
    ///
    /// The gateway checkout is requested before anything is stored, so a
    /// gateway failure leaves no pending row behind.
    pub async fn create_transaction(&self, backer: &User, campaign_id: Uuid, amount: i64) -> Result<Transaction> {
        if amount <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        self.campaign_repo
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        let now = Utc::now();
        let mut transaction = Transaction {
            id: Uuid::new_v4(),
            campaign_id,
            user_id: backer.id,
            amount,
            status: TransactionStatus::Pending,
            code: new_order_code(),
            payment_url: String::new(),
            created_at: now,
            updated_at: now,
        };

        transaction.payment_url = self.gateway.payment_url(&transaction, backer).await?;

        let transaction = self.repo.create(transaction).await?;

        tracing::info!(
            "Transaction {} opened: {} toward campaign {} by user {}",
            transaction.code, transaction.amount, campaign_id, backer.id
        );

        Ok(transaction)
    }

    /// Applies a gateway status callback. Redelivered notifications for an
    /// order that has already settled are accepted without effect.
    pub async fn handle_notification(&self, notification: PaymentNotification) -> Result<Transaction> {
        if !self.gateway.verify_notification(&notification) {
            tracing::warn!("Rejected notification with bad signature for order {}", notification.order_id);
            return Err(AppError::Unauthorized);
        }

        let transaction = self.repo
            .find_by_code(&notification.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        let Some(status) = TransactionStatus::from_gateway(
            &notification.transaction_status,
            notification.fraud_status.as_deref(),
        ) else {
            tracing::debug!(
                "Notification for {} leaves it pending (status={}, fraud={:?})",
                transaction.code, notification.transaction_status, notification.fraud_status
            );
            return Ok(transaction);
        };

        if transaction.status.is_terminal() {
            tracing::debug!("Transaction {} already {}", transaction.code, transaction.status.as_str());
            return Ok(transaction);
        }

        if self.repo.settle(transaction.id, status).await? {
            tracing::info!("Transaction {} is now {}", transaction.code, status.as_str());
        } else {
            tracing::debug!("Transaction {} was settled concurrently", transaction.code);
        }

        self.repo
            .find_by_id(transaction.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// Pledges toward a campaign, newest first. Only the owner may see them.
    pub async fn list_campaign_transactions(&self, campaign_id: Uuid, requester_id: Uuid) -> Result<Vec<CampaignTransaction>> {
        let campaign = self.campaign_repo
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;
        ensure_owner(&campaign, requester_id)?;

        self.repo.list_by_campaign(campaign_id).await
    }

    pub async fn list_user_transactions(&self, user_id: Uuid) -> Result<Vec<UserTransaction>> {
        self.repo.list_by_user(user_id).await
    }
}

fn new_order_code() -> String {
    format!("TRX-{}", Uuid::new_v4().simple()).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_codes_are_unique_and_fit_the_gateway_limit() {
        let a = new_order_code();
        let b = new_order_code();
        assert_ne!(a, b);
        assert!(a.starts_with("TRX-"));
        assert!(a.len() <= 50);
    }
}
