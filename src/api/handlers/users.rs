use axum::{
    extract::{Multipart, State},
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
    domain::{Registration, User},
    error::AppError,
    web::uploads,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub occupation: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailCheckRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub token: String,
    pub image_url: Option<String>,
}

impl UserDto {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            occupation: user.occupation,
            email: user.email,
            token,
            image_url: user.avatar_path,
        }
    }
}

impl From<User> for UserDto {
    fn from(mut user: User) -> Self {
        let token = user.token.take().unwrap_or_default();
        Self::new(user, token)
    }
}

#[derive(Debug, Serialize)]
pub struct EmailAvailability {
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct AvatarUploaded {
    pub is_uploaded: bool,
    pub image_url: String,
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<UserDto> {
    let (user, token) = state.service_context.user_service
        .register(Registration {
            name: req.name,
            email: req.email,
            occupation: req.occupation,
            password: req.password,
        })
        .await?;

    ok("Account has been registered", UserDto::new(user, token))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<UserDto> {
    let (user, token) = state.service_context.user_service
        .login(&req.email, &req.password)
        .await?;

    ok("Successfully logged in", UserDto::new(user, token))
}

pub async fn check_email_availability(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailCheckRequest>,
) -> ApiResult<EmailAvailability> {
    let is_available = state.service_context.user_service
        .is_email_available(&req.email)
        .await?;

    let message = if is_available {
        "Email is available"
    } else {
        "Email has been registered"
    };

    ok(message, EmailAvailability { is_available })
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<AvatarUploaded> {
    let images_dir = &state.settings.server.images_dir;
    let mut saved: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        saved = Some(uploads::save_image(images_dir, current_user.user.id, &filename, &data).await?);
        break;
    }

    let image_url = saved.ok_or_else(|| AppError::Validation("Missing avatar file".to_string()))?;

    let previous = current_user.user.avatar_path.clone();
    if let Err(e) = state.service_context.user_service
        .save_avatar(current_user.user.id, &image_url)
        .await
    {
        if let Err(cleanup) = uploads::delete_image(images_dir, &image_url).await {
            tracing::warn!("Could not remove orphaned avatar {}: {}", image_url, cleanup);
        }
        return Err(e);
    }

    if let Some(previous) = previous {
        if let Err(e) = uploads::delete_image(images_dir, &previous).await {
            tracing::warn!("Could not remove old avatar {}: {}", previous, e);
        }
    }

    ok("Avatar successfully uploaded", AvatarUploaded { is_uploaded: true, image_url })
}

pub async fn fetch_user(
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<UserDto> {
    ok("Successfully fetched user data", current_user.user.into())
}
