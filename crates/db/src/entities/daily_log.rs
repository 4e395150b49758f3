use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_name: String,
    pub project_type: String,
    pub nombre_tarea: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub descripcion: Option<String>,
    pub horas: f64,
    pub tecnologias_utilizadas: String,
    pub fecha_creacion: DateTimeUtc,
    pub imagen_1: Option<String>,
    pub imagen_2: Option<String>,
    pub imagen_3: Option<String>,
    pub link_publicacion_linkedin: Option<String>,
    pub link_ia_principal: Option<String>,
    pub link_ia_secundaria: Option<String>,
    pub link_ia_terciaria: Option<String>,
    pub link_respositorio: Option<String>,
    pub commit_principal: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
