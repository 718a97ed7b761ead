//! Account Service - registration, credential checks and profile edits
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::auth::{hash_password, verify_password};
use crate::domain::DomainError;
use crate::forms::{Credentials, NewAccount, ProfileUpdate};
use crate::models::account::{self, ActiveModel as AccountActiveModel, Entity as AccountEntity};

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<account::Model>, DomainError> {
    Ok(AccountEntity::find_by_id(id).one(db).await?)
}

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<account::Model>, DomainError> {
    Ok(AccountEntity::find()
        .filter(account::Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Persist a new account row. Only the supplied hash is stored; the
/// plaintext in `new_account` is never written.
pub async fn create_account(
    db: &DatabaseConnection,
    new_account: &NewAccount,
    password_hash: String,
) -> Result<account::Model, DomainError> {
    let now = chrono::Utc::now().to_rfc3339();
    let model = AccountActiveModel {
        username: Set(new_account.username.clone()),
        password_hash: Set(password_hash),
        email: Set(Some(new_account.email.clone())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(model)
}

/// Hash the password and create the account. Does not log the user in.
pub async fn register(
    db: &DatabaseConnection,
    new_account: &NewAccount,
    hash_iterations: u32,
) -> Result<account::Model, DomainError> {
    if find_by_username(db, &new_account.username).await?.is_some() {
        return Err(DomainError::Validation(
            "username is already taken".to_string(),
        ));
    }

    let password_hash =
        hash_password(&new_account.password, hash_iterations).map_err(DomainError::Internal)?;
    let account = create_account(db, new_account, password_hash).await?;

    tracing::info!("Registered account {} ({})", account.id, account.username);
    Ok(account)
}

/// Check a username/password pair. Unknown users, wrong passwords and
/// unreadable stored hashes all come back as `None`.
///
/// An unknown username still pays for one hash at `hash_iterations`, so the
/// response time does not tell which usernames exist.
pub async fn authenticate(
    db: &DatabaseConnection,
    credentials: &Credentials,
    hash_iterations: u32,
) -> Result<Option<account::Model>, DomainError> {
    let Some(account) = find_by_username(db, &credentials.username).await? else {
        tracing::warn!("Login for unknown user: {}", credentials.username);
        let _ = hash_password(&credentials.password, hash_iterations);
        return Ok(None);
    };

    match verify_password(&credentials.password, &account.password_hash) {
        Ok(true) => Ok(Some(account)),
        Ok(false) => {
            tracing::warn!("Password verification failed for user: {}", account.username);
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Stored hash for {} is unreadable: {}", account.username, e);
            Ok(None)
        }
    }
}

/// Overwrite the profile fields that were filled in; empty ones keep their value.
pub async fn update_profile(
    db: &DatabaseConnection,
    account_id: i32,
    update: ProfileUpdate,
) -> Result<account::Model, DomainError> {
    let existing = find_by_id(db, account_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let mut active: AccountActiveModel = existing.into();
    if let Some(email) = update.email {
        active.email = Set(Some(email));
    }
    if let Some(hobbies) = update.hobbies {
        active.hobbies = Set(Some(hobbies));
    }
    if let Some(country) = update.country {
        active.country = Set(Some(country));
    }
    if let Some(about) = update.about {
        active.about = Set(Some(about));
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    Ok(active.update(db).await?)
}

/// Invalidate every session token issued to the account so far.
pub async fn end_sessions(
    db: &DatabaseConnection,
    account: account::Model,
) -> Result<(), DomainError> {
    let next_epoch = account.session_epoch.wrapping_add(1);
    let mut active: AccountActiveModel = account.into();
    active.session_epoch = Set(next_epoch);
    active.update(db).await?;
    Ok(())
}
