// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Bulk "today's workout" lookup for a trainer's client list.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::time_utils;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_CLIENTS_PER_LOOKUP: usize = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/schedule/today", get(get_today))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodayQuery {
    /// Comma-separated client ids
    client_ids: String,
    /// Plain `YYYY-MM-DD` date; defaults to today (UTC)
    date: Option<String>,
}

/// Today's workout for one client.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ClientTodayResponse {
    pub workout_template_id: String,
    pub program_day_key: String,
    pub workout_title: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    /// Clients with no workout today are absent from the map
    pub clients: HashMap<String, ClientTodayResponse>,
}

/// Resolve today's scheduled workout for each requested client.
async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<TodayQuery>,
) -> Result<Json<TodayResponse>> {
    let client_ids: Vec<String> = params
        .client_ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if client_ids.is_empty() {
        return Err(AppError::BadRequest(
            "clientIds must name at least one client".to_string(),
        ));
    }
    if client_ids.len() > MAX_CLIENTS_PER_LOOKUP {
        return Err(AppError::BadRequest(format!(
            "clientIds is limited to {} clients per lookup",
            MAX_CLIENTS_PER_LOOKUP
        )));
    }

    let today = match params.date {
        Some(raw) => {
            if time_utils::parse_plain_date(&raw).is_none() {
                return Err(AppError::BadRequest(
                    "Invalid 'date' parameter: must be YYYY-MM-DD".to_string(),
                ));
            }
            raw
        }
        None => time_utils::today_utc_plain(),
    };

    let resolved = state
        .schedule
        .today_for_clients(&user.trainer_id, &client_ids, &today)
        .await?;

    let clients = resolved
        .into_iter()
        .map(|(client_id, entry)| {
            (
                client_id,
                ClientTodayResponse {
                    workout_template_id: entry.workout_template_id,
                    program_day_key: entry.program_day_key,
                    workout_title: entry.workout_title,
                },
            )
        })
        .collect();

    Ok(Json(TodayResponse { clients }))
}
