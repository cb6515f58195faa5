use std::sync::Arc;
use uuid::Uuid;
use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { repo, auth }
    }

    /// Creates the account and signs the new user in.
    pub async fn register(&self, registration: Registration) -> Result<(User, String)> {
        if self.repo.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = AuthService::hash_password(&registration.password).await?;

        let user = self.repo.create(NewUser {
            name: registration.name,
            email: registration.email,
            occupation: registration.occupation,
            password_hash,
        }).await?;

        tracing::info!("Registered user {}", user.id);

        self.start_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let password_hash = self.repo
            .password_hash(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !AuthService::verify_password(password, &password_hash).await? {
            tracing::debug!("Failed login attempt for {}", email);
            return Err(AppError::InvalidCredentials);
        }

        let user = self.repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.start_session(user).await
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool> {
        Ok(self.repo.find_by_email(email).await?.is_none())
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.auth.validate_token(token)?;

        match self.get_user_by_id(user_id).await {
            Err(AppError::NotFound(_)) => Err(AppError::Unauthorized),
            other => other,
        }
    }

    pub async fn save_avatar(&self, id: Uuid, avatar_path: &str) -> Result<User> {
        self.repo.update_avatar(id, avatar_path).await
    }

    async fn start_session(&self, mut user: User) -> Result<(User, String)> {
        let token = self.auth.issue_token(user.id)?;
        self.repo.update_token(user.id, &token).await?;
        user.token = Some(token.clone());
        Ok((user, token))
    }
}
