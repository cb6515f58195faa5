pub mod user_service;
pub mod campaign_service;
pub mod transaction_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::payments::PaymentGateway;

pub use user_service::UserService;
pub use campaign_service::CampaignService;
pub use transaction_service::TransactionService;

pub struct ServiceContext {
    pub user_service: Arc<UserService>,
    pub campaign_service: Arc<CampaignService>,
    pub transaction_service: Arc<TransactionService>,
    pub auth_service: Arc<AuthService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        campaign_repo: Arc<dyn CampaignRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        auth_service: Arc<AuthService>,
        db_pool: SqlitePool,
    ) -> Self {
        let user_service = Arc::new(UserService::new(user_repo, auth_service.clone()));
        let campaign_service = Arc::new(CampaignService::new(campaign_repo.clone()));
        let transaction_service = Arc::new(TransactionService::new(
            transaction_repo,
            campaign_repo,
            payment_gateway,
        ));

        Self {
            user_service,
            campaign_service,
            transaction_service,
            auth_service,
            db_pool,
        }
    }

    /// Wires the SQLite repositories over `db_pool`.
    pub fn with_sqlite(
        db_pool: SqlitePool,
        payment_gateway: Arc<dyn PaymentGateway>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self::new(
            Arc::new(SqliteUserRepository::new(db_pool.clone())),
            Arc::new(SqliteCampaignRepository::new(db_pool.clone())),
            Arc::new(SqliteTransactionRepository::new(db_pool.clone())),
            payment_gateway,
            auth_service,
            db_pool,
        )
    }
}
