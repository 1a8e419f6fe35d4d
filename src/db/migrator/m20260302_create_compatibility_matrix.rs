use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Metals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Metals::Name)
                            .string()
                            .not_null()
                            .unique_key()
                            .extra("COLLATE NOCASE".to_owned()),
                    )
                    .col(ColumnDef::new(Metals::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Metals::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Compatibilities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Compatibilities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Compatibilities::ChemicalName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Compatibilities::CreatedAt)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Compatibilities::UpdatedAt)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompatibilityPairs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompatibilityPairs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CompatibilityPairs::CompatibilityId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompatibilityPairs::MetalId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompatibilityPairs::IsCompatible)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompatibilityPairs::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compatibility_pairs_entry")
                            .from(
                                CompatibilityPairs::Table,
                                CompatibilityPairs::CompatibilityId,
                            )
                            .to(Compatibilities::Table, Compatibilities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compatibility_pairs_metal")
                            .from(CompatibilityPairs::Table, CompatibilityPairs::MetalId)
                            .to(Metals::Table, Metals::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one verdict per (chemical, metal)
        manager
            .create_index(
                Index::create()
                    .name("idx_compatibility_pairs_entry_metal")
                    .table(CompatibilityPairs::Table)
                    .col(CompatibilityPairs::CompatibilityId)
                    .col(CompatibilityPairs::MetalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_compatibility_pairs_metal")
                    .table(CompatibilityPairs::Table)
                    .col(CompatibilityPairs::MetalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompatibilityVersion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompatibilityVersion::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CompatibilityVersion::Version)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(CompatibilityVersion::Table)
            .columns([CompatibilityVersion::Id, CompatibilityVersion::Version])
            .values_panic([1.into(), 1.into()])
            .on_conflict(
                OnConflict::column(CompatibilityVersion::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompatibilityVersion::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompatibilityPairs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Compatibilities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Metals::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Metals {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Compatibilities {
    Table,
    Id,
    ChemicalName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CompatibilityPairs {
    Table,
    Id,
    CompatibilityId,
    MetalId,
    IsCompatible,
    Position,
}

#[derive(Iden)]
enum CompatibilityVersion {
    Table,
    Id,
    Version,
}
