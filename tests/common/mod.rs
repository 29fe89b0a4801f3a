// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

use coachtrack::config::Config;
use coachtrack::db::FirestoreDb;
use coachtrack::routes::create_router;
use coachtrack::services::{AutosaveService, ScheduleService};
use coachtrack::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Create a test app backed by the in-memory document store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = FirestoreDb::new_in_memory();
    let autosave =
        AutosaveService::new(db.clone(), Duration::from_millis(config.save_debounce_ms));
    let schedule = ScheduleService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        autosave,
        schedule,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with an offline mock database (every operation fails).
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = FirestoreDb::new_mock();
    let autosave =
        AutosaveService::new(db.clone(), Duration::from_millis(config.save_debounce_ms));
    let schedule = ScheduleService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        autosave,
        schedule,
    });

    (create_router(state.clone()), state)
}

/// Mint a session JWT for a trainer.
#[allow(dead_code)]
pub fn create_test_jwt(trainer_id: &str, signing_key: &[u8]) -> String {
    coachtrack::middleware::auth::create_jwt(trainer_id, signing_key)
        .expect("JWT creation should succeed")
}

/// Deserialize a response body as JSON.
#[allow(dead_code)]
pub async fn body_json<T: serde::de::DeserializeOwned>(
    response: axum::http::Response<axum::body::Body>,
) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}
