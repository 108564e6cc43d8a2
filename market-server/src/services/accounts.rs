//! Accounts: signup, login, `me`

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{AuthSession, Identity, Role, User, UserInfo};
use shared::util::{new_id, now_millis};
use std::sync::Arc;
use validator::Validate;

use crate::auth::JwtService;
use crate::auth::password::{hash_password, verify_decoy, verify_password};
use crate::db::{MarketStore, StoreError};
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, from_validation_errors,
    validate_required_text,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    /// Login page the user came through; must match the account role
    #[serde(default)]
    pub role: Option<Role>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone)]
pub struct AccountService {
    store: Arc<dyn MarketStore>,
    jwt: Arc<JwtService>,
}

impl AccountService {
    pub fn new(store: Arc<dyn MarketStore>, jwt: Arc<JwtService>) -> Self {
        Self { store, jwt }
    }

    fn session(&self, user: &User) -> AppResult<AuthSession> {
        let identity = user.identity().ok_or_else(|| {
            tracing::error!(user_id = %user.id, "Stored user has inconsistent role ids");
            AppError::internal("Account is misconfigured")
        })?;
        let issued = self.jwt.issue(&identity)?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user: UserInfo::from(user),
        })
    }

    /// Create a buyer or seller account and sign it in
    pub async fn signup(&self, req: SignupRequest) -> AppResult<AuthSession> {
        req.validate().map_err(from_validation_errors)?;
        validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::new(ErrorCode::PasswordTooShort)
                .with_detail("minLength", MIN_PASSWORD_LEN as u64));
        }
        let (buyer_id, seller_id) = match req.role {
            Role::Buyer => (Some(new_id()), None),
            Role::Seller => (None, Some(new_id())),
            Role::Admin => {
                return Err(AppError::validation("Admin accounts cannot sign up"));
            }
        };

        let password_hash = hash_password(&req.password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        let user = User {
            id: new_id(),
            email: normalize_email(&req.email),
            name: req.name.trim().to_string(),
            password_hash,
            role: req.role,
            buyer_id,
            seller_id,
            created_at: now_millis(),
        };

        match self.store.create_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User signed up");
        self.session(&user)
    }

    /// Check credentials and issue a token
    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthSession> {
        req.validate().map_err(from_validation_errors)?;
        let email = normalize_email(&req.email);

        // Same answer for unknown email and wrong password
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) if verify_password(&req.password, &user.password_hash) => user,
            Some(user) => {
                crate::security_log!("WARN", "login_failed", user_id = user.id.clone());
                return Err(AppError::invalid_credentials());
            }
            None => {
                verify_decoy(&req.password);
                crate::security_log!("WARN", "login_failed", email = email.clone());
                return Err(AppError::invalid_credentials());
            }
        };

        if let Some(role) = req.role
            && role != user.role
        {
            return Err(AppError::with_message(
                ErrorCode::RoleMismatch,
                format!("User is not a {}", role.as_str().to_ascii_lowercase()),
            )
            .with_detail("redirect", user.role.home_path()));
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        self.session(&user)
    }

    /// Account behind a resolved identity
    pub async fn me(&self, identity: &Identity) -> AppResult<UserInfo> {
        self.store
            .find_user_by_id(identity.user_id())
            .await?
            .map(|user| UserInfo::from(&user))
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Create the admin account if it does not exist yet
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<()> {
        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Ok(());
        }
        if password.len() < MIN_PASSWORD_LEN
            || password.len() > MAX_PASSWORD_LEN
            || email.len() > MAX_EMAIL_LEN
        {
            return Err(AppError::validation("Invalid admin bootstrap credentials"));
        }

        let password_hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        let user = User {
            id: new_id(),
            email,
            name: "Administrator".to_string(),
            password_hash,
            role: Role::Admin,
            buyer_id: None,
            seller_id: None,
            created_at: now_millis(),
        };
        match self.store.create_user(&user).await {
            // Another instance created it concurrently
            Ok(()) | Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %user.id, "Admin account created");
        Ok(())
    }
}
