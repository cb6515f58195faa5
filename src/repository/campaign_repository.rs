use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Campaign, CampaignChanges, CampaignImage, NewCampaign},
    error::{AppError, Result},
    repository::CampaignRepository,
};

#[derive(FromRow)]
struct CampaignRow {
    id: String,
    user_id: String,
    name: String,
    short_description: String,
    description: String,
    perks: String,
    backer_count: i64,
    goal_amount: i64,
    current_amount: i64,
    slug: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CampaignImageRow {
    id: String,
    campaign_id: String,
    file_path: String,
    is_primary: i32,
    created_at: NaiveDateTime,
}

const CAMPAIGN_COLUMNS: &str = r#"
    id, user_id, name, short_description, description, perks,
    backer_count, goal_amount, current_amount, slug, created_at, updated_at
"#;

pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_id(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn row_to_campaign(row: CampaignRow, images: Vec<CampaignImage>) -> Result<Campaign> {
        Ok(Campaign {
            id: Self::parse_id(&row.id)?,
            user_id: Self::parse_id(&row.user_id)?,
            name: row.name,
            short_description: row.short_description,
            description: row.description,
            perks: row.perks,
            backer_count: row.backer_count,
            goal_amount: row.goal_amount,
            current_amount: row.current_amount,
            slug: row.slug,
            images,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_image(row: CampaignImageRow) -> Result<CampaignImage> {
        Ok(CampaignImage {
            id: Self::parse_id(&row.id)?,
            campaign_id: Self::parse_id(&row.campaign_id)?,
            file_path: row.file_path,
            is_primary: row.is_primary != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    async fn images_for(&self, campaign_id: &str) -> Result<Vec<CampaignImage>> {
        let rows = sqlx::query_as::<_, CampaignImageRow>(
            r#"
            SELECT id, campaign_id, file_path, is_primary, created_at
            FROM campaign_images
            WHERE campaign_id = ?
            ORDER BY created_at ASC
            "#
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_image).collect()
    }

    async fn hydrate(&self, row: CampaignRow) -> Result<Campaign> {
        let images = self.images_for(&row.id).await?;
        Self::row_to_campaign(row, images)
    }
}

#[async_trait]
impl CampaignRepository for SqliteCampaignRepository {
    async fn create(&self, campaign: NewCampaign) -> Result<Option<Campaign>> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let inserted = sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, user_id, name, short_description, description, perks,
                backer_count, goal_amount, current_amount, slug,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, 0, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(campaign.user_id.to_string())
        .bind(&campaign.name)
        .bind(&campaign.short_description)
        .bind(&campaign.description)
        .bind(&campaign.perks)
        .bind(campaign.goal_amount)
        .bind(&campaign.slug)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db))
                if db.is_unique_violation() && db.message().contains("campaigns.slug") =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let created = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created campaign".to_string())
        })?;

        Ok(Some(created))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {} FROM campaigns WHERE id = ?",
            CAMPAIGN_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM campaigns WHERE slug = ?"
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn list(&self, owner: Option<Uuid>) -> Result<Vec<Campaign>> {
        let rows = match owner {
            Some(user_id) => {
                sqlx::query_as::<_, CampaignRow>(&format!(
                    "SELECT {} FROM campaigns WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
                    CAMPAIGN_COLUMNS
                ))
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CampaignRow>(&format!(
                    "SELECT {} FROM campaigns ORDER BY created_at ASC, rowid ASC",
                    CAMPAIGN_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut campaigns = Vec::with_capacity(rows.len());
        for row in rows {
            campaigns.push(self.hydrate(row).await?);
        }

        Ok(campaigns)
    }

    async fn update(&self, id: Uuid, changes: CampaignChanges) -> Result<Campaign> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET name = ?,
                short_description = ?,
                description = ?,
                perks = ?,
                goal_amount = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&changes.name)
        .bind(&changes.short_description)
        .bind(&changes.description)
        .bind(&changes.perks)
        .bind(changes.goal_amount)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated campaign".to_string())
        })
    }

    async fn add_image(&self, campaign_id: Uuid, file_path: &str, is_primary: bool) -> Result<CampaignImage> {
        let id = Uuid::new_v4();
        let campaign_id_str = campaign_id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        if is_primary {
            sqlx::query("UPDATE campaign_images SET is_primary = 0 WHERE campaign_id = ?")
                .bind(&campaign_id_str)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO campaign_images (id, campaign_id, file_path, is_primary, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&campaign_id_str)
        .bind(file_path)
        .bind(i32::from(is_primary))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CampaignImage {
            id,
            campaign_id,
            file_path: file_path.to_string(),
            is_primary,
            created_at: DateTime::from_naive_utc_and_offset(now, Utc),
        })
    }
}
