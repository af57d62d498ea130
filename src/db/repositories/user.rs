use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::db::StoreError;
use crate::entities::prelude::*;
use crate::entities::{profiles, users};

/// An account row together with its optional profile row.
pub type AccountRecord = (users::Model, Option<profiles::Model>);

/// Input for account creation. The password is already hashed by the
/// time it reaches the repository; plaintext never crosses this boundary.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl AccountChanges {
    fn touches_profile(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.avatar.is_some()
            || self.bio.is_some()
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<AccountRecord>, StoreError> {
        let record = Users::find_by_id(id)
            .find_also_related(Profiles)
            .one(&self.conn)
            .await?;

        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let records = Users::find()
            .find_also_related(Profiles)
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(records)
    }

    /// Insert a new account (and profile, when name fields are present).
    /// A duplicate email or username surfaces as [`StoreError::Conflict`].
    pub async fn create(&self, new: NewAccount) -> Result<AccountRecord, StoreError> {
        // Pre-check gives the common case a clean conflict answer; the
        // unique constraints remain the backstop for races.
        let existing = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(&new.email))
                    .add(users::Column::Username.eq(&new.username)),
            )
            .one(&self.conn)
            .await?;

        if existing.is_some() {
            return Err(StoreError::Conflict);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            email: Set(new.email),
            username: Set(new.username),
            password_hash: Set(new.password_hash),
            role: Set(new.role),
            version: Set(1),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .map_err(StoreError::from_db)?;

        let profile = if new.first_name.is_some() || new.last_name.is_some() {
            let profile = profiles::ActiveModel {
                user_id: Set(user.id),
                first_name: Set(new.first_name),
                last_name: Set(new.last_name),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?;
            Some(profile)
        } else {
            None
        };

        Ok((user, profile))
    }

    /// Apply a partial update, bumping the optimistic-lock version and
    /// the updated timestamp. Creates the profile row on first use of a
    /// profile field.
    pub async fn update(
        &self,
        id: i32,
        changes: AccountChanges,
    ) -> Result<AccountRecord, StoreError> {
        let (user, profile) = self.find_by_id(id).await?.ok_or(StoreError::NotFound)?;

        let version = user.version;
        let mut active: users::ActiveModel = user.into();

        if let Some(email) = changes.email.clone() {
            active.email = Set(email);
        }
        if let Some(username) = changes.username.clone() {
            active.username = Set(username);
        }
        if let Some(password_hash) = changes.password_hash.clone() {
            active.password_hash = Set(password_hash);
        }
        if let Some(role) = changes.role.clone() {
            active.role = Set(role);
        }

        active.version = Set(version + 1);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let user = active
            .update(&self.conn)
            .await
            .map_err(StoreError::from_db)?;

        let profile = if changes.touches_profile() {
            let mut active: profiles::ActiveModel = match profile {
                Some(profile) => profile.into(),
                None => profiles::ActiveModel {
                    user_id: Set(user.id),
                    ..Default::default()
                }
                .insert(&self.conn)
                .await?
                .into(),
            };

            if let Some(first_name) = changes.first_name {
                active.first_name = Set(Some(first_name));
            }
            if let Some(last_name) = changes.last_name {
                active.last_name = Set(Some(last_name));
            }
            if let Some(avatar) = changes.avatar {
                active.avatar = Set(Some(avatar));
            }
            if let Some(bio) = changes.bio {
                active.bio = Set(Some(bio));
            }

            Some(active.update(&self.conn).await?)
        } else {
            profile
        };

        Ok((user, profile))
    }

    /// Delete an account; the profile row goes with it (FK cascade).
    pub async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        user.delete(&self.conn).await?;

        Ok(())
    }
}
