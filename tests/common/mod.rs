#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use crowdfund::{
    auth::AuthService,
    domain::{Campaign, CampaignChanges, Registration, Transaction, User},
    error::{AppError, Result},
    payments::{PaymentGateway, PaymentNotification},
    service::ServiceContext,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const VALID_SIGNATURE: &str = "signed-by-gateway";

/// Single-connection in-memory database with migrations applied.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Temporary on-disk database served by several connections, so spawned
/// tasks really overlap. The files are removed on drop.
pub struct FileDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl FileDb {
    pub async fn new(max_connections: u32) -> anyhow::Result<Self> {
        let path = std::env::temp_dir().join(format!("crowdfund-test-{}.db", Uuid::new_v4()));
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, path })
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

/// Stands in for Midtrans: hands out predictable URLs and trusts one signature.
#[derive(Default)]
pub struct StubGateway {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubGateway {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn payment_url(&self, transaction: &Transaction, _user: &User) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::PaymentGateway("sandbox unavailable".to_string()));
        }
        Ok(format!("https://pay.example.test/snap/{}", transaction.code))
    }

    fn verify_notification(&self, notification: &PaymentNotification) -> bool {
        notification.signature_key == VALID_SIGNATURE
    }
}

pub fn context(pool: SqlitePool, gateway: Arc<StubGateway>) -> ServiceContext {
    ServiceContext::with_sqlite(pool, gateway, Arc::new(AuthService::new(JWT_SECRET)))
}

pub async fn register(ctx: &ServiceContext, name: &str, email: &str) -> Result<(User, String)> {
    ctx.user_service
        .register(Registration {
            name: name.to_string(),
            email: email.to_string(),
            occupation: "Engineer".to_string(),
            password: "correct horse".to_string(),
        })
        .await
}

pub fn campaign_fields(name: &str, goal_amount: i64) -> CampaignChanges {
    CampaignChanges {
        name: name.to_string(),
        short_description: "Short pitch".to_string(),
        description: "A longer story about the campaign".to_string(),
        perks: "sticker, t-shirt".to_string(),
        goal_amount,
    }
}

pub async fn create_campaign(ctx: &ServiceContext, owner: &User, name: &str, goal_amount: i64) -> Result<Campaign> {
    ctx.campaign_service
        .create_campaign(owner.id, campaign_fields(name, goal_amount))
        .await
}

pub fn notification(order_id: &str, transaction_status: &str, fraud_status: Option<&str>) -> PaymentNotification {
    PaymentNotification {
        order_id: order_id.to_string(),
        transaction_status: transaction_status.to_string(),
        fraud_status: fraud_status.map(String::from),
        payment_type: Some("credit_card".to_string()),
        status_code: "200".to_string(),
        gross_amount: "50000.00".to_string(),
        signature_key: VALID_SIGNATURE.to_string(),
    }
}

pub async fn count_transactions(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await?)
}
