use crate::db::DbPool;
use crate::entities::{session_log, user, Role};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct UserService {
    db: Arc<DbPool>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", id)))
    }

    /// Changes a user's role. Open sessions are revoked so stale role
    /// claims cannot outlive the change.
    #[instrument(skip(self))]
    pub async fn update_role(&self, id: i64, role: Role) -> Result<user::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut model: user::ActiveModel = existing.into();
        model.role = Set(role);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.db.as_ref()).await?;

        self.revoke_sessions(id).await?;
        info!(user_id = id, role = %role, "changed user role");
        Ok(updated)
    }

    /// Stores a new password hash. The caller has already verified the
    /// acting user is allowed to change this account's password.
    #[instrument(skip(self, password_hash))]
    pub async fn set_password_hash(
        &self,
        id: i64,
        password_hash: String,
    ) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        let mut model: user::ActiveModel = existing.into();
        model.password_hash = Set(password_hash);
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;
        info!(user_id = id, "changed user password");
        Ok(())
    }

    /// Deletes an account along with its sessions. Self-deletion is
    /// refused so the last admin cannot lock everyone out mid-session.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64, acting_user_id: i64) -> Result<(), ServiceError> {
        if id == acting_user_id {
            return Err(ServiceError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }
        let existing = self.get(id).await?;
        self.revoke_sessions(id).await?;
        user::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(user_id = id, "deleted user");
        Ok(())
    }

    async fn revoke_sessions(&self, user_id: i64) -> Result<(), ServiceError> {
        session_log::Entity::delete_many()
            .filter(session_log::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
