use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        extract::{ApiJson, ValidatedJson},
        middleware::auth::CurrentUser,
        response::{ok, ApiResult},
        state::AppState,
    },
    domain::{CampaignTransaction, Transaction, TransactionStatus, UserTransaction},
    payments::PaymentNotification,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub campaign_id: Uuid,
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionDto {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub status: TransactionStatus,
    pub code: String,
    pub payment_url: String,
}

impl From<Transaction> for TransactionDto {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            campaign_id: t.campaign_id,
            user_id: t.user_id,
            amount: t.amount,
            status: t.status,
            code: t.code,
            payment_url: t.payment_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignTransactionDto {
    pub id: Uuid,
    pub name: String,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<CampaignTransaction> for CampaignTransactionDto {
    fn from(item: CampaignTransaction) -> Self {
        Self {
            id: item.transaction.id,
            name: item.backer_name,
            amount: item.transaction.amount,
            status: item.transaction.status,
            created_at: item.transaction.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionCampaignDto {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserTransactionDto {
    pub id: Uuid,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub campaign: TransactionCampaignDto,
}

impl From<UserTransaction> for UserTransactionDto {
    fn from(item: UserTransaction) -> Self {
        Self {
            id: item.transaction.id,
            amount: item.transaction.amount,
            status: item.transaction.status,
            created_at: item.transaction.created_at,
            campaign: TransactionCampaignDto {
                name: item.campaign_name,
                image_url: item.campaign_image,
            },
        }
    }
}

pub async fn list_for_campaign(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Vec<CampaignTransactionDto>> {
    let transactions = state.service_context.transaction_service
        .list_campaign_transactions(campaign_id, current_user.user.id)
        .await?;

    let transactions: Vec<CampaignTransactionDto> = transactions.into_iter().map(Into::into).collect();
    ok("Campaign's transactions", transactions)
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<Vec<UserTransactionDto>> {
    let transactions = state.service_context.transaction_service
        .list_user_transactions(current_user.user.id)
        .await?;

    let transactions: Vec<UserTransactionDto> = transactions.into_iter().map(Into::into).collect();
    ok("User's transactions", transactions)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateTransactionRequest>,
) -> ApiResult<TransactionDto> {
    let transaction = state.service_context.transaction_service
        .create_transaction(&current_user.user, req.campaign_id, req.amount)
        .await?;

    ok("Transaction created", transaction.into())
}

/// Gateway callback. Authenticated by the notification signature rather than a user token.
pub async fn notification(
    State(state): State<AppState>,
    ApiJson(notification): ApiJson<PaymentNotification>,
) -> ApiResult<TransactionDto> {
    let transaction = state.service_context.transaction_service
        .handle_notification(notification)
        .await?;

    ok("Notification processed", transaction.into())
}
