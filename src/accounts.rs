//! User accounts and token authentication.
//!
//! Passwords are stored as argon2id PHC strings. Each user holds at most one
//! token; logging in returns the existing token when there is one.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tracing::info;

use crate::{
    entities::{app_user, auth_token},
    models::{Credentials, FieldErrors, NewUser, now_millis},
};

pub const TOKEN_LEN: usize = 40;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Hash(err.to_string())
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

fn generate_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LEN).map(char::from).collect()
}

fn validate_new_user(user: &NewUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    let username = user.username.trim();
    if username.is_empty() {
        errors.add("username", "username is required");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add("username", format!("username must be at most {USERNAME_MAX_LEN} characters"));
    }

    let email = user.email.trim();
    if email.is_empty() {
        errors.add("email", "email is required");
    } else if !email.contains('@') {
        errors.add("email", "enter a valid email address");
    }

    if user.password.chars().count() < PASSWORD_MIN_LEN {
        errors.add("password", format!("password must be at least {PASSWORD_MIN_LEN} characters"));
    }

    errors.into_result()
}

pub async fn register(db: &DatabaseConnection, user: NewUser) -> Result<app_user::Model, AccountError> {
    validate_new_user(&user).map_err(AccountError::Validation)?;

    let now = now_millis();
    let model = app_user::ActiveModel {
        id: Default::default(),
        username: Set(user.username.trim().to_string()),
        email: Set(user.email.trim().to_lowercase()),
        password_hash: Set(hash_password(&user.password)?),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = model.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AccountError::Conflict("username or email is already taken")
        },
        _ => AccountError::Db(err),
    })?;

    info!(user_id = created.id, username = %created.username, "user registered");
    Ok(created)
}

/// Checks credentials and returns the user's token, creating one if needed.
pub async fn login(db: &DatabaseConnection, creds: Credentials) -> Result<String, AccountError> {
    const BAD_CREDENTIALS: &str = "unable to log in with provided credentials";

    let user = app_user::Entity::find()
        .filter(app_user::Column::Username.eq(creds.username.trim()))
        .one(db)
        .await?
        .ok_or(AccountError::Unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(&creds.password, &user.password_hash)? {
        return Err(AccountError::Unauthorized(BAD_CREDENTIALS));
    }

    let existing = auth_token::Entity::find()
        .filter(auth_token::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if let Some(token) = existing {
        return Ok(token.key);
    }

    let token = auth_token::ActiveModel {
        key: Set(generate_token()),
        user_id: Set(user.id),
        created_at: Set(now_millis()),
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "token issued");
    Ok(token.key)
}

pub async fn logout(db: &DatabaseConnection, key: &str) -> Result<(), AccountError> {
    let res = auth_token::Entity::delete_by_id(key.to_string()).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(AccountError::Unauthorized("invalid token"));
    }
    Ok(())
}

/// Maps a token key to its owner's id.
pub async fn resolve_token(db: &DatabaseConnection, key: &str) -> Result<i32, AccountError> {
    auth_token::Entity::find_by_id(key.to_string())
        .one(db)
        .await?
        .map(|t| t.user_id)
        .ok_or(AccountError::Unauthorized("invalid token"))
}
