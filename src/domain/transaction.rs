use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub status: TransactionStatus,
    pub code: String,
    pub payment_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Maps the gateway's settlement vocabulary onto a terminal state.
    /// Returns `None` when the notification does not settle the order yet.
    pub fn from_gateway(transaction_status: &str, fraud_status: Option<&str>) -> Option<Self> {
        match (transaction_status, fraud_status) {
            ("capture", Some("accept")) => Some(TransactionStatus::Paid),
            ("settlement", _) => Some(TransactionStatus::Paid),
            ("deny" | "cancel" | "expire", _) => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}

/// A campaign pledge listed on the campaign owner's page.
#[derive(Debug, Clone)]
pub struct CampaignTransaction {
    pub transaction: Transaction,
    pub backer_name: String,
}

/// A pledge listed on the backer's own page.
#[derive(Debug, Clone)]
pub struct UserTransaction {
    pub transaction: Transaction,
    pub campaign_name: String,
    pub campaign_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_capture_and_settlement_are_paid() {
        assert_eq!(
            TransactionStatus::from_gateway("capture", Some("accept")),
            Some(TransactionStatus::Paid)
        );
        assert_eq!(
            TransactionStatus::from_gateway("settlement", None),
            Some(TransactionStatus::Paid)
        );
    }

    #[test]
    fn denied_cancelled_and_expired_are_cancelled() {
        for status in ["deny", "cancel", "expire"] {
            assert_eq!(
                TransactionStatus::from_gateway(status, Some("accept")),
                Some(TransactionStatus::Cancelled)
            );
        }
    }

    #[test]
    fn challenged_or_pending_orders_do_not_settle() {
        assert_eq!(TransactionStatus::from_gateway("capture", Some("challenge")), None);
        assert_eq!(TransactionStatus::from_gateway("capture", None), None);
        assert_eq!(TransactionStatus::from_gateway("pending", None), None);
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Paid.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }
}
