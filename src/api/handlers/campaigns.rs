use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        extract::ValidatedJson,
        middleware::auth::CurrentUser,
        response::{ok, ApiResult},
        state::AppState,
    },
    domain::{Campaign, CampaignChanges, CampaignImage, User},
    error::AppError,
    web::uploads,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CampaignInput {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub perks: String,
    #[validate(range(min = 1, message = "Goal amount must be positive"))]
    pub goal_amount: i64,
}

impl From<CampaignInput> for CampaignChanges {
    fn from(input: CampaignInput) -> Self {
        Self {
            name: input.name,
            short_description: input.short_description,
            description: input.description,
            perks: input.perks,
            goal_amount: input.goal_amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub short_description: String,
    pub image_url: Option<String>,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub backer_count: i64,
    pub slug: String,
}

impl From<Campaign> for CampaignDto {
    fn from(campaign: Campaign) -> Self {
        Self {
            image_url: campaign.primary_image().map(|image| image.file_path.clone()),
            id: campaign.id,
            user_id: campaign.user_id,
            name: campaign.name,
            short_description: campaign.short_description,
            goal_amount: campaign.goal_amount,
            current_amount: campaign.current_amount,
            backer_count: campaign.backer_count,
            slug: campaign.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignOwnerDto {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CampaignImageDto {
    pub image_url: String,
    pub is_primary: bool,
}

impl From<CampaignImage> for CampaignImageDto {
    fn from(image: CampaignImage) -> Self {
        Self {
            image_url: image.file_path,
            is_primary: image.is_primary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignDetailDto {
    #[serde(flatten)]
    pub summary: CampaignDto,
    pub description: String,
    pub perks: Vec<String>,
    pub user: CampaignOwnerDto,
    pub images: Vec<CampaignImageDto>,
}

impl CampaignDetailDto {
    fn new(campaign: Campaign, owner: User) -> Self {
        let description = campaign.description.clone();
        let perks = campaign.perk_list();
        let images: Vec<CampaignImageDto> = campaign.images.iter().cloned().map(Into::into).collect();

        Self {
            summary: campaign.into(),
            description,
            perks,
            user: CampaignOwnerDto {
                name: owner.name,
                image_url: owner.avatar_path,
            },
            images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageUploaded {
    pub is_uploaded: bool,
    pub image_url: String,
    pub is_primary: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<CampaignDto>> {
    let campaigns = state.service_context.campaign_service
        .list_campaigns(params.user_id)
        .await?;

    let campaigns: Vec<CampaignDto> = campaigns.into_iter().map(Into::into).collect();
    ok("List of campaigns", campaigns)
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CampaignDetailDto> {
    let campaign = state.service_context.campaign_service
        .get_campaign(id)
        .await?;
    let owner = state.service_context.user_service
        .get_user_by_id(campaign.user_id)
        .await?;

    ok("Campaign detail", CampaignDetailDto::new(campaign, owner))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(input): ValidatedJson<CampaignInput>,
) -> ApiResult<CampaignDto> {
    let campaign = state.service_context.campaign_service
        .create_campaign(current_user.user.id, input.into())
        .await?;

    ok("Campaign created", campaign.into())
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<CampaignInput>,
) -> ApiResult<CampaignDto> {
    let campaign = state.service_context.campaign_service
        .update_campaign(id, current_user.user.id, input.into())
        .await?;

    ok("Campaign updated", campaign.into())
}

pub async fn upload_image(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<ImageUploaded> {
    let mut campaign_id: Option<Uuid> = None;
    let mut is_primary = false;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "campaign_id" => {
                let text = field.text().await.map_err(|e| AppError::Validation(e.body_text()))?;
                campaign_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| AppError::Validation("Invalid campaign_id".to_string()))?,
                );
            }
            "is_primary" => {
                let text = field.text().await.map_err(|e| AppError::Validation(e.body_text()))?;
                is_primary = matches!(text.trim(), "true" | "1" | "on");
            }
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| AppError::Validation(e.body_text()))?;
                file = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let campaign_id = campaign_id.ok_or_else(|| AppError::Validation("Missing campaign_id".to_string()))?;
    let (filename, data) = file.ok_or_else(|| AppError::Validation("Missing file".to_string()))?;

    let images_dir = &state.settings.server.images_dir;
    let image_url = uploads::save_image(images_dir, current_user.user.id, &filename, &data).await?;

    let image = match state.service_context.campaign_service
        .save_campaign_image(campaign_id, current_user.user.id, &image_url, is_primary)
        .await
    {
        Ok(image) => image,
        Err(e) => {
            if let Err(cleanup) = uploads::delete_image(images_dir, &image_url).await {
                tracing::warn!("Could not remove orphaned campaign image {}: {}", image_url, cleanup);
            }
            return Err(e);
        }
    };

    ok("Campaign image successfully uploaded", ImageUploaded {
        is_uploaded: true,
        image_url: image.file_path,
        is_primary: image.is_primary,
    })
}
