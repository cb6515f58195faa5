use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub perks: String,
    pub backer_count: i64,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub slug: String,
    pub images: Vec<CampaignImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Perks are stored comma separated.
    pub fn perk_list(&self) -> Vec<String> {
        self.perks
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn primary_image(&self) -> Option<&CampaignImage> {
        self.images.iter().find(|image| image.is_primary)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignImage {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub file_path: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub user_id: Uuid,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub perks: String,
    pub goal_amount: i64,
    pub slug: String,
}

/// The owner-editable fields of a campaign.
#[derive(Debug, Clone)]
pub struct CampaignChanges {
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub perks: String,
    pub goal_amount: i64,
}
