use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::responses::{DeleteResponse, IdQuery};
use crate::app::AppState;
use crate::db::article_repository::ArticleRepository;
use crate::db::models::{new_id, Section, SectionChanges};
use crate::db::section_repository::SectionRepository;
use crate::error::{optional_text, require_text, AppError};
use crate::models::catalog::{build_catalog, creates_cycle, Catalog};

/// Request payload for creating a section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSectionRequest {
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub parent_id: Option<String>,
}

/// Request payload for updating a section.
///
/// `parent_id` distinguishes "absent" (unchanged) from `null` (cleared).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSectionRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_id: Option<Option<String>>,
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn validate_parent(
    sections: &dyn SectionRepository,
    section_id: &str,
    parent_id: &str,
) -> Result<(), AppError> {
    if parent_id == section_id {
        return Err(AppError::BadRequest(
            "A section cannot be its own parent".into(),
        ));
    }

    let all = sections.list_all().await?;
    if !all.iter().any(|s| s.id == parent_id) {
        return Err(AppError::BadRequest(format!(
            "Parent section '{}' does not exist",
            parent_id
        )));
    }
    if creates_cycle(&all, section_id, parent_id) {
        return Err(AppError::BadRequest(
            "A section cannot be nested inside its own subsection".into(),
        ));
    }

    Ok(())
}

pub async fn process_get_section(
    sections: &dyn SectionRepository,
    id: &str,
) -> Result<Section, AppError> {
    sections
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Section not found".into()))
}

pub async fn process_list_sections(
    sections: &dyn SectionRepository,
) -> Result<Vec<Section>, AppError> {
    sections.list_all().await
}

pub async fn process_create_section(
    sections: &dyn SectionRepository,
    request: CreateSectionRequest,
) -> Result<Section, AppError> {
    let name = require_text(request.name.as_deref(), "Section name is required")?;

    let now = Utc::now();
    let section = Section {
        id: new_id(),
        name,
        priority: request.priority.unwrap_or_default(),
        parent_id: blank_to_none(request.parent_id),
        created_at: now,
        updated_at: now,
    };

    if let Some(parent_id) = &section.parent_id {
        validate_parent(sections, &section.id, parent_id).await?;
    }

    sections.insert(&section).await?;
    tracing::info!(section_id = %section.id, name = %section.name, "Created section");

    Ok(section)
}

pub async fn process_update_section(
    sections: &dyn SectionRepository,
    request: UpdateSectionRequest,
) -> Result<Section, AppError> {
    let id = require_text(request.id.as_deref(), "Section id is required")?;

    let changes = SectionChanges {
        name: optional_text(request.name, "Section name cannot be empty")?,
        priority: request.priority,
        parent_id: request.parent_id.map(blank_to_none),
        updated_at: Utc::now(),
    };

    if let Some(Some(parent_id)) = &changes.parent_id {
        if sections.find_by_id(&id).await?.is_none() {
            return Err(AppError::NotFound("Section not found".into()));
        }
        validate_parent(sections, &id, parent_id).await?;
    }

    let section = sections
        .update(&id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Section not found".into()))?;

    tracing::info!(section_id = %id, "Updated section");
    Ok(section)
}

/// Delete a section. Its articles and subsections are left in place.
pub async fn process_delete_section(
    sections: &dyn SectionRepository,
    id: Option<&str>,
) -> Result<DeleteResponse, AppError> {
    let id = require_text(id, "Section id is required")?;

    if !sections.delete(&id).await? {
        return Err(AppError::NotFound("Section not found".into()));
    }

    tracing::info!(section_id = %id, "Deleted section");
    Ok(DeleteResponse::new("Section deleted successfully", &id))
}

pub async fn process_overview(
    sections: &dyn SectionRepository,
    articles: &dyn ArticleRepository,
) -> Result<Catalog, AppError> {
    let (all_sections, all_articles) =
        futures::try_join!(sections.list_all(), articles.list(None))?;

    let catalog = build_catalog(&all_sections, &all_articles);
    if !catalog.orphaned_articles.is_empty() {
        tracing::warn!(
            orphaned = catalog.orphaned_articles.len(),
            "Articles reference missing sections"
        );
    }

    Ok(catalog)
}

/// Axum handler for `GET /api/v1/sections`.
pub async fn get_sections_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) {
        let section = process_get_section(state.section_repo.as_ref(), id).await?;
        return Ok(axum::Json(section).into_response());
    }

    let list = process_list_sections(state.section_repo.as_ref()).await?;
    Ok(axum::Json(list).into_response())
}

/// Axum handler for `POST /api/v1/sections`.
pub async fn create_section_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSectionRequest>,
) -> Result<axum::Json<Section>, AppError> {
    let section = process_create_section(state.section_repo.as_ref(), request).await?;
    Ok(axum::Json(section))
}

/// Axum handler for `PUT /api/v1/sections`.
pub async fn update_section_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateSectionRequest>,
) -> Result<axum::Json<Section>, AppError> {
    let section = process_update_section(state.section_repo.as_ref(), request).await?;
    Ok(axum::Json(section))
}

/// Axum handler for `DELETE /api/v1/sections?id=...`.
pub async fn delete_section_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<axum::Json<DeleteResponse>, AppError> {
    let response =
        process_delete_section(state.section_repo.as_ref(), query.id.as_deref()).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `GET /api/v1/sections/overview`.
pub async fn overview_handler(
    State(state): State<AppState>,
) -> Result<axum::Json<Catalog>, AppError> {
    let catalog =
        process_overview(state.section_repo.as_ref(), state.article_repo.as_ref()).await?;
    Ok(axum::Json(catalog))
}
