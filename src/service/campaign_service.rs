use std::sync::Arc;
use rand::RngCore;
use uuid::Uuid;
use crate::{
    domain::*,
    error::{AppError, Result},
    repository::CampaignRepository,
};

/// Gives up on finding a free slug after this many random suffixes.
const MAX_SLUG_ATTEMPTS: usize = 16;

pub struct CampaignService {
    repo: Arc<dyn CampaignRepository>,
}

impl CampaignService {
    pub fn new(repo: Arc<dyn CampaignRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_campaign(&self, owner_id: Uuid, fields: CampaignChanges) -> Result<Campaign> {
        validate_goal(fields.goal_amount)?;

        let base = slugify(&fields.name);
        let mut new_campaign = NewCampaign {
            user_id: owner_id,
            name: fields.name,
            short_description: fields.short_description,
            description: fields.description,
            perks: fields.perks,
            goal_amount: fields.goal_amount,
            slug: base.clone(),
        };

        // The first attempt uses the bare slug, later ones a random suffix.
        for attempt in 0..=MAX_SLUG_ATTEMPTS {
            if attempt > 0 {
                new_campaign.slug = format!("{}-{}", base, random_suffix());
            }

            if self.repo.slug_exists(&new_campaign.slug).await? {
                continue;
            }

            // The check above can race another create; the unique index decides.
            match self.repo.create(new_campaign.clone()).await? {
                Some(campaign) => {
                    tracing::info!("User {} created campaign {} ({})", owner_id, campaign.id, campaign.slug);
                    return Ok(campaign);
                }
                None => tracing::debug!("Slug {} was taken concurrently, retrying", new_campaign.slug),
            }
        }

        Err(AppError::Internal(format!("Could not allocate a slug for '{}'", new_campaign.name)))
    }

    pub async fn update_campaign(&self, id: Uuid, requester_id: Uuid, fields: CampaignChanges) -> Result<Campaign> {
        validate_goal(fields.goal_amount)?;

        let campaign = self.get_campaign(id).await?;
        ensure_owner(&campaign, requester_id)?;

        self.repo.update(id, fields).await
    }

    /// Campaigns in creation order, optionally only those owned by `owner`.
    pub async fn list_campaigns(&self, owner: Option<Uuid>) -> Result<Vec<Campaign>> {
        self.repo.list(owner).await
    }

    pub async fn get_campaign(&self, id: Uuid) -> Result<Campaign> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
    }

    pub async fn save_campaign_image(
        &self,
        campaign_id: Uuid,
        requester_id: Uuid,
        file_path: &str,
        is_primary: bool,
    ) -> Result<CampaignImage> {
        let campaign = self.get_campaign(campaign_id).await?;
        ensure_owner(&campaign, requester_id)?;

        self.repo.add_image(campaign_id, file_path, is_primary).await
    }
}

pub(crate) fn ensure_owner(campaign: &Campaign, requester_id: Uuid) -> Result<()> {
    if campaign.user_id != requester_id {
        tracing::warn!("User {} is not the owner of campaign {}", requester_id, campaign.id);
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn validate_goal(goal_amount: i64) -> Result<()> {
    if goal_amount <= 0 {
        return Err(AppError::Validation("Goal amount must be positive".to_string()));
    }
    Ok(())
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("campaign");
    }
    slug
}

fn random_suffix() -> String {
    let mut bytes = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
