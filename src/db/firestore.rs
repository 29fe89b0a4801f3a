// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Program templates (trainer-owned program documents)
//! - Program assignments (client ↔ program links for scheduling)
//! - Workout templates (title lookups for schedule enrichment)
//!
//! Besides the remote client there is an in-memory backend (tests, local
//! development without credentials) and an offline mock where every
//! operation fails.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ProgramAssignment, ProgramTemplate, WorkoutAssignment, WorkoutTemplate};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

#[derive(Clone)]
enum Backend {
    Remote(firestore::FirestoreDb),
    /// Process-local document store keyed by `collection/id`.
    Memory(Arc<DashMap<String, serde_json::Value>>),
    /// Every operation fails.
    Offline,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

fn doc_key(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, id)
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

fn decode<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value.clone()).map_err(|e| AppError::Database(e.to_string()))
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Remote(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Remote(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Create an in-memory document store (tests, credential-free local runs).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    async fn set_document<T: Serialize + DeserializeOwned + Send + Sync>(
        &self,
        collection: &'static str,
        id: &str,
        document: &T,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Remote(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(document)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                let value = serde_json::to_value(document)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                store.insert(doc_key(collection, id), value);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    async fn get_document<T: DeserializeOwned + Send + 'static>(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        match &self.backend {
            Backend::Remote(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store
                .get(&doc_key(collection, id))
                .map(|entry| decode(entry.value()))
                .transpose(),
            Backend::Offline => Err(offline()),
        }
    }

    async fn delete_document(&self, collection: &'static str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Remote(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.remove(&doc_key(collection, id));
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Scan a whole collection out of the in-memory backend.
    fn memory_collection<T: DeserializeOwned>(
        store: &DashMap<String, serde_json::Value>,
        collection: &str,
    ) -> Result<Vec<T>, AppError> {
        let prefix = format!("{}/", collection);
        store
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| decode(entry.value()))
            .collect()
    }

    // ─── Program Template Operations ─────────────────────────────

    /// Get a program template by id. The embedded state document is
    /// normalized on every read so callers always see canonical shape.
    pub async fn get_program_template(
        &self,
        id: &str,
    ) -> Result<Option<ProgramTemplate>, AppError> {
        let mut template: Option<ProgramTemplate> = self
            .get_document(collections::PROGRAM_TEMPLATES, id)
            .await?;
        if let Some(t) = template.as_mut() {
            t.state.normalize();
            t.duration_weeks = t.state.duration_weeks;
        }
        Ok(template)
    }

    /// Create or overwrite a program template. The state document is
    /// re-normalized so only canonical shapes are persisted.
    pub async fn set_program_template(&self, template: &ProgramTemplate) -> Result<(), AppError> {
        let mut template = template.clone();
        template.state.normalize();
        template.duration_weeks = template.state.duration_weeks;
        self.set_document(collections::PROGRAM_TEMPLATES, &template.id, &template)
            .await
    }

    /// Delete a program template row.
    pub async fn delete_program_template(&self, id: &str) -> Result<(), AppError> {
        self.delete_document(collections::PROGRAM_TEMPLATES, id)
            .await
    }

    /// List a trainer's program templates, most recently updated first.
    pub async fn list_program_templates(
        &self,
        owner_id: &str,
        include_archived: bool,
    ) -> Result<Vec<ProgramTemplate>, AppError> {
        let mut templates: Vec<ProgramTemplate> = match &self.backend {
            Backend::Remote(client) => {
                let owner = owner_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::PROGRAM_TEMPLATES)
                    .filter(move |q| {
                        if include_archived {
                            q.for_all([q.field("ownerId").eq(owner.clone())])
                        } else {
                            q.for_all([
                                q.field("ownerId").eq(owner.clone()),
                                q.field("archived").eq(false),
                            ])
                        }
                    })
                    .order_by([(
                        "updatedAt",
                        firestore::FirestoreQueryDirection::Descending,
                    )])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
            Backend::Memory(store) => {
                let mut all: Vec<ProgramTemplate> =
                    Self::memory_collection(store, collections::PROGRAM_TEMPLATES)?;
                all.retain(|t| t.owner_id == owner_id && (include_archived || !t.archived));
                all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                all
            }
            Backend::Offline => return Err(offline()),
        };

        for template in &mut templates {
            template.state.normalize();
            template.duration_weeks = template.state.duration_weeks;
        }
        Ok(templates)
    }

    // ─── Assignment Operations ───────────────────────────────────

    /// Active assignments made by a trainer.
    pub async fn get_active_assignments(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<ProgramAssignment>, AppError> {
        match &self.backend {
            Backend::Remote(client) => {
                let trainer = trainer_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::PROGRAM_ASSIGNMENTS)
                    .filter(move |q| {
                        q.for_all([
                            q.field("trainerId").eq(trainer.clone()),
                            q.field("active").eq(true),
                        ])
                    })
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => {
                let mut all: Vec<ProgramAssignment> =
                    Self::memory_collection(store, collections::PROGRAM_ASSIGNMENTS)?;
                all.retain(|a| a.trainer_id == trainer_id && a.active);
                Ok(all)
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Create or overwrite an assignment.
    pub async fn set_assignment(&self, assignment: &ProgramAssignment) -> Result<(), AppError> {
        self.set_document(collections::PROGRAM_ASSIGNMENTS, &assignment.id, assignment)
            .await
    }

    /// Explicit per-day workout pins a trainer made for one date.
    pub async fn get_workout_assignments_for_date(
        &self,
        trainer_id: &str,
        date: &str,
    ) -> Result<Vec<WorkoutAssignment>, AppError> {
        match &self.backend {
            Backend::Remote(client) => {
                let trainer = trainer_id.to_string();
                let date = date.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::WORKOUT_ASSIGNMENTS)
                    .filter(move |q| {
                        q.for_all([
                            q.field("trainerId").eq(trainer.clone()),
                            q.field("date").eq(date.clone()),
                        ])
                    })
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => {
                let mut all: Vec<WorkoutAssignment> =
                    Self::memory_collection(store, collections::WORKOUT_ASSIGNMENTS)?;
                all.retain(|a| a.trainer_id == trainer_id && a.date == date);
                Ok(all)
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Create or overwrite a per-day workout pin.
    pub async fn set_workout_assignment(
        &self,
        assignment: &WorkoutAssignment,
    ) -> Result<(), AppError> {
        self.set_document(collections::WORKOUT_ASSIGNMENTS, &assignment.id, assignment)
            .await
    }

    // ─── Workout Template Operations ─────────────────────────────

    /// Create or overwrite a workout template row.
    pub async fn set_workout_template(&self, workout: &WorkoutTemplate) -> Result<(), AppError> {
        self.set_document(collections::WORKOUT_TEMPLATES, &workout.id, workout)
            .await
    }

    /// Fetch titles for a set of workout ids.
    ///
    /// Fetches run concurrently with a limit to avoid overloading
    /// Firestore. Individual failures are logged and skipped; missing rows
    /// simply don't appear in the map.
    pub async fn get_workout_titles(
        &self,
        workout_ids: &[String],
    ) -> Result<HashMap<String, String>, AppError> {
        if let Backend::Offline = &self.backend {
            return Err(offline());
        }

        let titles: HashMap<String, String> = stream::iter(workout_ids.to_vec())
            .map(|id| async move {
                match self
                    .get_document::<WorkoutTemplate>(collections::WORKOUT_TEMPLATES, &id)
                    .await
                {
                    Ok(Some(workout)) => Some((id, workout.title)),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!(workout_id = %id, error = %e, "Title lookup failed");
                        None
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .filter_map(|pair| async move { pair })
            .collect()
            .await;

        Ok(titles)
    }
}
