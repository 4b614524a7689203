use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff account. The password hash never leaves the server.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_log::Entity")]
    SessionLogs,
}

impl Related<super::session_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Staff role, ordered ADMIN > MANAGER > USER.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "MANAGER")]
    #[serde(rename = "MANAGER")]
    Manager,
    #[sea_orm(string_value = "USER")]
    #[serde(rename = "USER")]
    User,
}

impl Role {
    /// Numeric rank used for hierarchy checks.
    pub fn rank(self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::User => 1,
        }
    }

    /// Whether this role satisfies the `required` role or a lower one.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hierarchy_is_admin_manager_user() {
        assert!(Role::Admin.satisfies(Role::User));
        assert!(Role::Admin.satisfies(Role::Manager));
        assert!(Role::Manager.satisfies(Role::User));
        assert!(!Role::Manager.satisfies(Role::Admin));
        assert!(!Role::User.satisfies(Role::Manager));
        assert!(Role::User.satisfies(Role::User));
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let parsed: Role = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(parsed, Role::Manager);
    }
}
