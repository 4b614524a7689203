use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sellable product. `unit` is the sales unit ("liter", "kg", "piece", ...)
/// and drives the per-unit bucketing of dashboard sales series.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub price_per_unit: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this product is sold by the liter. Accepts the spellings
    /// seen in production data, including the Uzbek "litr".
    pub fn is_liter_unit(&self) -> bool {
        matches!(
            self.unit.trim().to_ascii_lowercase().as_str(),
            "liter" | "litre" | "litr" | "l"
        )
    }

    /// Whether this product is sold by the kilogram.
    pub fn is_kg_unit(&self) -> bool {
        matches!(
            self.unit.trim().to_ascii_lowercase().as_str(),
            "kg" | "kilogram" | "kilogramm"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(unit: &str) -> Model {
        Model {
            id: 1,
            name: "milk".into(),
            unit: unit.into(),
            price_per_unit: 1.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unit_classification() {
        assert!(product("liter").is_liter_unit());
        assert!(product("Litr").is_liter_unit());
        assert!(product("kg").is_kg_unit());
        assert!(!product("piece").is_liter_unit());
        assert!(!product("piece").is_kg_unit());
    }
}
