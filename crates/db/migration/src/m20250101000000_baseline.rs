use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(DailyLogs::Table)
                    .col(pk_id_col(manager, DailyLogs::Id))
                    .col(
                        ColumnDef::new(DailyLogs::ProjectName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyLogs::ProjectType)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("frontend")),
                    )
                    .col(
                        ColumnDef::new(DailyLogs::NombreTarea)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DailyLogs::Descripcion).text())
                    .col(ColumnDef::new(DailyLogs::Horas).double().not_null())
                    .col(
                        ColumnDef::new(DailyLogs::TecnologiasUtilizadas)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(timestamp_col(DailyLogs::FechaCreacion))
                    .col(ColumnDef::new(DailyLogs::Imagen1).string())
                    .col(ColumnDef::new(DailyLogs::Imagen2).string())
                    .col(ColumnDef::new(DailyLogs::Imagen3).string())
                    .col(ColumnDef::new(DailyLogs::LinkPublicacionLinkedin).string())
                    .col(ColumnDef::new(DailyLogs::LinkIaPrincipal).string())
                    .col(ColumnDef::new(DailyLogs::LinkIaSecundaria).string())
                    .col(ColumnDef::new(DailyLogs::LinkIaTerciaria).string())
                    .col(ColumnDef::new(DailyLogs::LinkRespositorio).string())
                    .col(ColumnDef::new(DailyLogs::CommitPrincipal).string_len(200))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_daily_logs_fecha_creacion")
                    .table(DailyLogs::Table)
                    .col(DailyLogs::FechaCreacion)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_daily_logs_project_type")
                    .table(DailyLogs::Table)
                    .col(DailyLogs::ProjectType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum DailyLogs {
    Table,
    Id,
    ProjectName,
    ProjectType,
    NombreTarea,
    Descripcion,
    Horas,
    TecnologiasUtilizadas,
    FechaCreacion,
    #[iden = "imagen_1"]
    Imagen1,
    #[iden = "imagen_2"]
    Imagen2,
    #[iden = "imagen_3"]
    Imagen3,
    LinkPublicacionLinkedin,
    LinkIaPrincipal,
    LinkIaSecundaria,
    LinkIaTerciaria,
    LinkRespositorio,
    CommitPrincipal,
}
