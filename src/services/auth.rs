// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{AuthResponse, User, UserRole, UserView},
    services::token::TokenService,
};

#[derive(Clone)]
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(user_store: Arc<dyn UserStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            user_store,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthResponse, AppError> {
        if password != confirm_password {
            return Err(AppError::PasswordMismatch);
        }
        if self.user_store.exists_by_email(email).await? {
            return Err(AppError::EmailTaken);
        }

        let user = self
            .create_account(full_name, email, password, UserRole::User)
            .await?;
        tracing::info!(user_id = user.id, "user registered");

        self.respond(&user)
    }

    /// Unknown email and wrong password fail with the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let mut user = self
            .user_store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt is CPU-bound; keep it off the async workers.
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))?
                .unwrap_or_else(|e| {
                    tracing::warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
                    false
                });

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        user.last_login = Some(Utc::now());
        let user = self.user_store.save(user).await?;
        tracing::info!(user_id = user.id, "user logged in");

        self.respond(&user)
    }

    /// Looks up the account behind a verified token subject.
    pub async fn current_user(&self, email: &str) -> Result<UserView, AppError> {
        self.user_store
            .find_by_email(email)
            .await?
            .map(|user| UserView::from(&user))
            .ok_or(AppError::UserNotFound)
    }

    /// Hashes the password and persists a new account with the given role.
    pub async fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;

        let user = User {
            id: None,
            full_name: full_name.to_owned(),
            email: email.to_owned(),
            password_hash,
            role,
            created_at: Utc::now(),
            last_login: None,
        };
        self.user_store.save(user).await
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, AppError> {
        let token = self
            .tokens
            .issue(&user.email, Utc::now(), self.tokens.ttl())?;
        Ok(AuthResponse {
            token,
            user: UserView::from(user),
        })
    }
}
