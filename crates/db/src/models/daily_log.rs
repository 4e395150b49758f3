use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use thiserror::Error;

use crate::{
    entities::daily_log,
    types::{ListParams, OrderField},
};
use protocol::{CreateDailyLog, DailyLog, UpdateDailyLog};

#[derive(Debug, Error)]
pub enum DailyLogError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Daily log not found")]
    NotFound,
}

/// Outer `None` leaves the stored image untouched, `Some(None)` clears it,
/// `Some(Some(path))` replaces it with a new media-relative path.
pub type ImageUpdate = Option<Option<String>>;

/// Query layer over the `daily_logs` table. All functions are generic over
/// the connection so they compose with transactions.
pub struct DailyLogStore;

impl DailyLogStore {
    fn from_model(model: daily_log::Model) -> DailyLog {
        DailyLog {
            id: model.id,
            project_name: model.project_name,
            project_type: model.project_type.parse().unwrap_or_default(),
            nombre_tarea: model.nombre_tarea,
            descripcion: model.descripcion,
            horas: model.horas,
            tecnologias_utilizadas: model.tecnologias_utilizadas,
            fecha_creacion: model.fecha_creacion,
            imagen_1: model.imagen_1,
            imagen_2: model.imagen_2,
            imagen_3: model.imagen_3,
            imagen_1_url: None,
            imagen_2_url: None,
            imagen_3_url: None,
            link_publicacion_linkedin: model.link_publicacion_linkedin,
            link_ia_principal: model.link_ia_principal,
            link_ia_secundaria: model.link_ia_secundaria,
            link_ia_terciaria: model.link_ia_terciaria,
            link_respositorio: model.link_respositorio,
            commit_principal: model.commit_principal,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateDailyLog,
        images: [Option<String>; 3],
    ) -> Result<DailyLog, DbErr> {
        let [imagen_1, imagen_2, imagen_3] = images;
        let active = daily_log::ActiveModel {
            project_name: Set(data.project_name.clone()),
            project_type: Set(data.project_type.to_string()),
            nombre_tarea: Set(data.nombre_tarea.clone()),
            descripcion: Set(normalize_optional(data.descripcion.clone())),
            horas: Set(round_horas(data.horas)),
            tecnologias_utilizadas: Set(data.tecnologias_utilizadas.clone()),
            fecha_creacion: Set(Utc::now()),
            imagen_1: Set(imagen_1),
            imagen_2: Set(imagen_2),
            imagen_3: Set(imagen_3),
            link_publicacion_linkedin: Set(normalize_optional(
                data.link_publicacion_linkedin.clone(),
            )),
            link_ia_principal: Set(normalize_optional(data.link_ia_principal.clone())),
            link_ia_secundaria: Set(normalize_optional(data.link_ia_secundaria.clone())),
            link_ia_terciaria: Set(normalize_optional(data.link_ia_terciaria.clone())),
            link_respositorio: Set(normalize_optional(data.link_respositorio.clone())),
            commit_principal: Set(normalize_optional(data.commit_principal.clone())),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<DailyLog>, DbErr> {
        let record = daily_log::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Returns one page of records plus the total count for the filter.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        params: &ListParams,
    ) -> Result<(Vec<DailyLog>, u64), DbErr> {
        let mut query = daily_log::Entity::find();

        if let Some(search) = &params.search {
            let pattern = search.trim();
            query = query.filter(
                Condition::any()
                    .add(daily_log::Column::NombreTarea.contains(pattern))
                    .add(daily_log::Column::Descripcion.contains(pattern))
                    .add(daily_log::Column::TecnologiasUtilizadas.contains(pattern))
                    .add(daily_log::Column::ProjectName.contains(pattern)),
            );
        }

        if let Some(project_type) = params.project_type {
            query = query.filter(daily_log::Column::ProjectType.eq(project_type.to_string()));
        }

        let order_column = match params.ordering.field {
            OrderField::FechaCreacion => daily_log::Column::FechaCreacion,
            OrderField::Horas => daily_log::Column::Horas,
        };
        // Id as tiebreaker so pages stay disjoint when timestamps collide.
        query = if params.ordering.descending {
            query
                .order_by_desc(order_column)
                .order_by_desc(daily_log::Column::Id)
        } else {
            query
                .order_by_asc(order_column)
                .order_by_asc(daily_log::Column::Id)
        };

        let paginator = query.paginate(db, params.page_size);
        let count = paginator.num_items().await?;
        let records = paginator.fetch_page(params.page - 1).await?;
        Ok((
            records.into_iter().map(Self::from_model).collect(),
            count,
        ))
    }

    /// Full replacement (PUT). `fecha_creacion` and `id` stay untouched.
    pub async fn replace<C: ConnectionTrait>(
        db: &C,
        id: i64,
        data: &CreateDailyLog,
        images: [ImageUpdate; 3],
    ) -> Result<DailyLog, DailyLogError> {
        let record = daily_log::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DailyLogError::NotFound)?;

        let mut active: daily_log::ActiveModel = record.into();
        active.project_name = Set(data.project_name.clone());
        active.project_type = Set(data.project_type.to_string());
        active.nombre_tarea = Set(data.nombre_tarea.clone());
        active.descripcion = Set(normalize_optional(data.descripcion.clone()));
        active.horas = Set(round_horas(data.horas));
        active.tecnologias_utilizadas = Set(data.tecnologias_utilizadas.clone());
        active.link_publicacion_linkedin =
            Set(normalize_optional(data.link_publicacion_linkedin.clone()));
        active.link_ia_principal = Set(normalize_optional(data.link_ia_principal.clone()));
        active.link_ia_secundaria = Set(normalize_optional(data.link_ia_secundaria.clone()));
        active.link_ia_terciaria = Set(normalize_optional(data.link_ia_terciaria.clone()));
        active.link_respositorio = Set(normalize_optional(data.link_respositorio.clone()));
        active.commit_principal = Set(normalize_optional(data.commit_principal.clone()));
        apply_image_updates(&mut active, images);

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Partial update (PATCH): only fields present in the payload change.
    /// An explicitly empty optional field clears the stored value.
    pub async fn patch<C: ConnectionTrait>(
        db: &C,
        id: i64,
        data: &UpdateDailyLog,
        images: [ImageUpdate; 3],
    ) -> Result<DailyLog, DailyLogError> {
        let record = daily_log::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DailyLogError::NotFound)?;

        let mut active: daily_log::ActiveModel = record.into();
        if let Some(project_name) = &data.project_name {
            active.project_name = Set(project_name.clone());
        }
        if let Some(project_type) = data.project_type {
            active.project_type = Set(project_type.to_string());
        }
        if let Some(nombre_tarea) = &data.nombre_tarea {
            active.nombre_tarea = Set(nombre_tarea.clone());
        }
        if data.descripcion.is_some() {
            active.descripcion = Set(normalize_optional(data.descripcion.clone()));
        }
        if let Some(horas) = data.horas {
            active.horas = Set(round_horas(horas));
        }
        if let Some(tecnologias) = &data.tecnologias_utilizadas {
            active.tecnologias_utilizadas = Set(tecnologias.clone());
        }
        if data.link_publicacion_linkedin.is_some() {
            active.link_publicacion_linkedin =
                Set(normalize_optional(data.link_publicacion_linkedin.clone()));
        }
        if data.link_ia_principal.is_some() {
            active.link_ia_principal = Set(normalize_optional(data.link_ia_principal.clone()));
        }
        if data.link_ia_secundaria.is_some() {
            active.link_ia_secundaria = Set(normalize_optional(data.link_ia_secundaria.clone()));
        }
        if data.link_ia_terciaria.is_some() {
            active.link_ia_terciaria = Set(normalize_optional(data.link_ia_terciaria.clone()));
        }
        if data.link_respositorio.is_some() {
            active.link_respositorio = Set(normalize_optional(data.link_respositorio.clone()));
        }
        if data.commit_principal.is_some() {
            active.commit_principal = Set(normalize_optional(data.commit_principal.clone()));
        }
        apply_image_updates(&mut active, images);

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = daily_log::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}

fn apply_image_updates(active: &mut daily_log::ActiveModel, images: [ImageUpdate; 3]) {
    let [imagen_1, imagen_2, imagen_3] = images;
    if let Some(value) = imagen_1 {
        active.imagen_1 = Set(value);
    }
    if let Some(value) = imagen_2 {
        active.imagen_2 = Set(value);
    }
    if let Some(value) = imagen_3 {
        active.imagen_3 = Set(value);
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn round_horas(horas: f64) -> f64 {
    (horas * 100.0).round() / 100.0
}
