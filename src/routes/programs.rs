// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Program template routes for authenticated trainers.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::program::{Difficulty, ProgramTemplate};
use crate::services::autosave::MetaPatch;
use crate::services::engine::{self, EditOp};
use crate::time_utils;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_WORKOUT_ID_LEN: usize = 128;

/// Program routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/programs", get(list_programs).post(create_program))
        .route(
            "/api/programs/{id}",
            get(get_program)
                .patch(update_program)
                .delete(delete_program),
        )
        .route("/api/programs/{id}/edits", post(apply_edit))
        .route("/api/programs/{id}/duplicate", post(duplicate_program))
        .route("/api/programs/{id}/archive", post(archive_program))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProgramsQuery {
    /// Include archived templates
    #[serde(default)]
    include_archived: bool,
}

/// One row in the trainer's program list.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    pub id: String,
    pub title: String,
    pub duration_weeks: u32,
    pub difficulty: Difficulty,
    pub archived: bool,
    pub updated_at: String,
}

impl From<&ProgramTemplate> for ProgramSummary {
    fn from(template: &ProgramTemplate) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            duration_weeks: template.duration_weeks,
            difficulty: template.difficulty,
            archived: template.archived,
            updated_at: template.updated_at.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProgramListResponse {
    pub programs: Vec<ProgramSummary>,
}

/// List the trainer's program templates, newest first.
async fn list_programs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListProgramsQuery>,
) -> Result<Json<ProgramListResponse>> {
    let templates = state
        .db
        .list_program_templates(&user.trainer_id, params.include_archived)
        .await?;

    Ok(Json(ProgramListResponse {
        programs: templates.iter().map(ProgramSummary::from).collect(),
    }))
}

// ─── Creation ────────────────────────────────────────────────

fn default_phase_count() -> u32 {
    1
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Total program length in weeks
    pub duration_weeks: u32,
    /// How many phases to split the weeks across
    #[serde(default = "default_phase_count")]
    pub phase_count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Create a program template seeded with evenly split phases.
async fn create_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateProgramRequest>,
) -> Result<Json<ProgramTemplate>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let doc_state =
        engine::build_initial_state(payload.duration_weeks, payload.phase_count, payload.difficulty)?;

    let now = time_utils::now_rfc3339();
    let template = ProgramTemplate {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: user.trainer_id.clone(),
        title: payload.title,
        description: payload.description,
        duration_weeks: doc_state.duration_weeks,
        difficulty: payload.difficulty,
        archived: false,
        created_at: now.clone(),
        updated_at: now.clone(),
        last_edited_at: now,
        state: doc_state,
    };

    state.db.set_program_template(&template).await?;
    tracing::info!(
        trainer_id = %user.trainer_id,
        program_id = %template.id,
        duration_weeks = template.duration_weeks,
        "Program template created"
    );

    Ok(Json(template))
}

// ─── Load / Metadata ─────────────────────────────────────────

/// Load a program into an editor session and return the document.
async fn get_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProgramTemplate>> {
    let template = state.autosave.load(&id, &user.trainer_id).await?;
    Ok(Json(template))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Patch title/description/difficulty. Persisted on the debounce cycle
/// like any other edit.
async fn update_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProgramRequest>,
) -> Result<Json<ProgramTemplate>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let patch = MetaPatch {
        title: payload.title,
        description: payload.description,
        difficulty: payload.difficulty,
    };
    let template = state
        .autosave
        .apply_meta(&id, &user.trainer_id, patch)
        .await?;
    Ok(Json(template))
}

// ─── State Edits ─────────────────────────────────────────────

/// Apply one state-transition operation to the program document. The
/// updated document is returned immediately; persistence is debounced.
async fn apply_edit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(op): Json<EditOp>,
) -> Result<Json<ProgramTemplate>> {
    if let EditOp::SetDayWorkoutFromTable { workout_id, .. } = &op {
        if workout_id.is_empty() || workout_id.len() > MAX_WORKOUT_ID_LEN {
            return Err(AppError::BadRequest(
                "workoutId must be between 1 and 128 characters".to_string(),
            ));
        }
    }

    let template = state.autosave.apply_edit(&id, &user.trainer_id, &op).await?;
    Ok(Json(template))
}

// ─── Duplicate / Archive / Delete ────────────────────────────

/// Duplicate a program template under a fresh id with a "(Copy)" title.
async fn duplicate_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProgramTemplate>> {
    let source = state.autosave.load(&id, &user.trainer_id).await?;

    let copy = source.duplicated(
        uuid::Uuid::new_v4().to_string(),
        &time_utils::now_rfc3339(),
    );
    state.db.set_program_template(&copy).await?;

    tracing::info!(
        trainer_id = %user.trainer_id,
        source_id = %id,
        copy_id = %copy.id,
        "Program template duplicated"
    );
    Ok(Json(copy))
}

/// Soft-delete: flush pending edits, mark the row archived, drop the
/// editor session.
async fn archive_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProgramTemplate>> {
    let mut template = state.autosave.load(&id, &user.trainer_id).await?;
    state.autosave.flush(&id).await?;

    template.archived = true;
    template.updated_at = time_utils::now_rfc3339();
    state.db.set_program_template(&template).await?;
    state.autosave.evict(&id);

    tracing::info!(trainer_id = %user.trainer_id, program_id = %id, "Program template archived");
    Ok(Json(template))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct DeleteProgramResponse {
    pub success: bool,
    pub message: String,
}

/// Hard-delete a program template row.
async fn delete_program(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteProgramResponse>> {
    // Owner check before touching the row.
    state.autosave.load(&id, &user.trainer_id).await?;
    state.autosave.evict(&id);
    state.db.delete_program_template(&id).await?;

    tracing::info!(trainer_id = %user.trainer_id, program_id = %id, "Program template deleted");
    Ok(Json(DeleteProgramResponse {
        success: true,
        message: "Program template deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mirrors_template_fields() {
        let template = ProgramTemplate {
            id: "p1".to_string(),
            owner_id: "t1".to_string(),
            title: "Hypertrophy".to_string(),
            description: None,
            duration_weeks: 12,
            difficulty: Difficulty::Advanced,
            archived: false,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-02-01T00:00:00Z".to_string(),
            last_edited_at: "2024-02-01T00:00:00Z".to_string(),
            state: Default::default(),
        };

        let summary = ProgramSummary::from(&template);

        assert_eq!(summary.id, "p1");
        assert_eq!(summary.duration_weeks, 12);
        assert_eq!(summary.updated_at, "2024-02-01T00:00:00Z");
    }
}
