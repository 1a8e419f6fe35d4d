use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "compatibility_pairs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub compatibility_id: i32,

    pub metal_id: i32,

    pub is_compatible: bool,

    /// Order of the pair within its entry.
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::compatibilities::Entity",
        from = "Column::CompatibilityId",
        to = "super::compatibilities::Column::Id",
        on_delete = "Cascade"
    )]
    Compatibility,

    #[sea_orm(
        belongs_to = "super::metals::Entity",
        from = "Column::MetalId",
        to = "super::metals::Column::Id",
        on_delete = "Restrict"
    )]
    Metal,
}

impl Related<super::compatibilities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Compatibility.def()
    }
}

impl Related<super::metals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Metal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
