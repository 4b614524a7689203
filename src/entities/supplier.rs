use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Milk supplier master record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[sea_orm(nullable)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::milk_purchase::Entity")]
    MilkPurchases,
}

impl Related<super::milk_purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MilkPurchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
