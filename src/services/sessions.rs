use crate::db::DbPool;
use crate::entities::{session_log, user};
use crate::errors::ServiceError;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Session log entry with its user joined in.
#[derive(Debug, Serialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub session: session_log::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<user::Model>,
}

pub struct SessionService {
    db: Arc<DbPool>,
}

impl SessionService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All sessions, newest first.
    pub async fn list(&self) -> Result<Vec<SessionRecord>, ServiceError> {
        let rows = session_log::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(session_log::Column::CreatedAt)
            .order_by_desc(session_log::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(session, user)| SessionRecord { session, user })
            .collect())
    }

    /// Removes a session by its token id, revoking the matching JWT.
    #[instrument(skip(self))]
    pub async fn delete_by_token(&self, token: &str) -> Result<(), ServiceError> {
        let existing = session_log::Entity::find()
            .filter(session_log::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Session".to_string()))?;
        session_log::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(user_id = existing.user_id, "revoked session");
        Ok(())
    }
}
