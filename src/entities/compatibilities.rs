use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "compatibilities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Trimmed and uppercased before storage.
    #[sea_orm(unique)]
    pub chemical_name: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::compatibility_pairs::Entity")]
    CompatibilityPairs,
}

impl Related<super::compatibility_pairs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompatibilityPairs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
