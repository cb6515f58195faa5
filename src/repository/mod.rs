use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod campaign_repository;
pub mod transaction_repository;

pub use user_repository::SqliteUserRepository;
pub use campaign_repository::SqliteCampaignRepository;
pub use transaction_repository::SqliteTransactionRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn update_token(&self, id: Uuid, token: &str) -> Result<()>;
    async fn update_avatar(&self, id: Uuid, avatar_path: &str) -> Result<User>;
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Returns `None` when another campaign already holds the slug.
    async fn create(&self, campaign: NewCampaign) -> Result<Option<Campaign>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>>;
    async fn slug_exists(&self, slug: &str) -> Result<bool>;
    async fn list(&self, owner: Option<Uuid>) -> Result<Vec<Campaign>>;
    async fn update(&self, id: Uuid, changes: CampaignChanges) -> Result<Campaign>;
    async fn add_image(&self, campaign_id: Uuid, file_path: &str, is_primary: bool) -> Result<CampaignImage>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: Transaction) -> Result<Transaction>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Transaction>>;
    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CampaignTransaction>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<UserTransaction>>;
    /// Moves a pending transaction to `status`, crediting its campaign when the
    /// new status is `Paid`. Returns `false` if the transaction had already left
    /// `Pending`, in which case nothing is written.
    async fn settle(&self, id: Uuid, status: TransactionStatus) -> Result<bool>;
}
