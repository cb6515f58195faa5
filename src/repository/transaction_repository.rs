use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CampaignTransaction, Transaction, TransactionStatus, UserTransaction},
    error::{AppError, Result},
    repository::TransactionRepository,
};

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    campaign_id: String,
    user_id: String,
    amount: i64,
    status: String,
    code: String,
    payment_url: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CampaignTransactionRow {
    #[sqlx(flatten)]
    transaction: TransactionRow,
    backer_name: String,
}

#[derive(FromRow)]
struct UserTransactionRow {
    #[sqlx(flatten)]
    transaction: TransactionRow,
    campaign_name: String,
    campaign_image: Option<String>,
}

const TRANSACTION_COLUMNS: &str = r#"
    t.id, t.campaign_id, t.user_id, t.amount, t.status, t.code,
    t.payment_url, t.created_at, t.updated_at
"#;

pub struct SqliteTransactionRepository {
    pool: SqlitePool,
}

impl SqliteTransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: TransactionRow) -> Result<Transaction> {
        Ok(Transaction {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            campaign_id: Uuid::parse_str(&row.campaign_id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| AppError::Database(e.to_string()))?,
            amount: row.amount,
            status: Self::parse_status(&row.status)?,
            code: row.code,
            payment_url: row.payment_url,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<TransactionStatus> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(AppError::Database(format!("Invalid transaction status: {}", s))),
        }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions t WHERE t.{} = ?",
            TRANSACTION_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_transaction).transpose()
    }
}

#[async_trait]
impl TransactionRepository for SqliteTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, campaign_id, user_id, amount, status, code,
                payment_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(transaction.id.to_string())
        .bind(transaction.campaign_id.to_string())
        .bind(transaction.user_id.to_string())
        .bind(transaction.amount)
        .bind(transaction.status.as_str())
        .bind(&transaction.code)
        .bind(&transaction.payment_url)
        .bind(transaction.created_at.naive_utc())
        .bind(transaction.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(transaction.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created transaction".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.fetch_one_by("id", &id.to_string()).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Transaction>> {
        self.fetch_one_by("code", code).await
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CampaignTransaction>> {
        let rows = sqlx::query_as::<_, CampaignTransactionRow>(&format!(
            r#"
            SELECT {}, u.name AS backer_name
            FROM transactions t
            JOIN users u ON u.id = t.user_id
            WHERE t.campaign_id = ?
            ORDER BY t.created_at DESC, t.rowid DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(campaign_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CampaignTransaction {
                    transaction: Self::row_to_transaction(row.transaction)?,
                    backer_name: row.backer_name,
                })
            })
            .collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<UserTransaction>> {
        let rows = sqlx::query_as::<_, UserTransactionRow>(&format!(
            r#"
            SELECT {}, c.name AS campaign_name, ci.file_path AS campaign_image
            FROM transactions t
            JOIN campaigns c ON c.id = t.campaign_id
            LEFT JOIN campaign_images ci ON ci.campaign_id = c.id AND ci.is_primary = 1
            WHERE t.user_id = ?
            ORDER BY t.created_at DESC, t.rowid DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserTransaction {
                    transaction: Self::row_to_transaction(row.transaction)?,
                    campaign_name: row.campaign_name,
                    campaign_image: row.campaign_image,
                })
            })
            .collect()
    }

    async fn settle(&self, id: Uuid, status: TransactionStatus) -> Result<bool> {
        if !status.is_terminal() {
            return Err(AppError::Internal(format!(
                "Cannot settle transaction {} into non-terminal status", id
            )));
        }

        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        // Guarded by the current status so concurrent or repeated deliveries
        // can only ever win once.
        let updated = sqlx::query(
            r#"
            UPDATE transactions
            SET status = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#
        )
        .bind(status.as_str())
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if status == TransactionStatus::Paid {
            sqlx::query(
                r#"
                UPDATE campaigns
                SET current_amount = current_amount + (SELECT amount FROM transactions WHERE id = ?),
                    backer_count = backer_count + 1,
                    updated_at = ?
                WHERE id = (SELECT campaign_id FROM transactions WHERE id = ?)
                "#
            )
            .bind(&id_str)
            .bind(now)
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}
