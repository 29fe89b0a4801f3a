// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Per-program editor sessions with debounced persistence.
//!
//! Edits apply to the in-memory document immediately; the Firestore write
//! is deferred behind a cancellable timer. Rapid edits collapse into a
//! single save carrying the latest document — intermediate states are never
//! persisted. A failed save keeps the edits in memory and the next edit
//! re-arms the timer, so nothing is lost while the backend is unhappy.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::program::{Difficulty, ProgramTemplate};
use crate::services::engine::{self, EditOp};
use crate::time_utils;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Save status of an editor session.
///
/// A loaded session starts `Ready`. Edits move it to `Armed` (timer
/// pending), the firing timer to `Saving`, and a save outcome back to
/// `Ready` or to `Failed` with edits retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Ready,
    Armed,
    Saving,
    Failed(String),
}

/// Partial metadata update applied through the session.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
}

struct Session {
    template: ProgramTemplate,
    status: SaveStatus,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    db: FirestoreDb,
    delay: Duration,
    sessions: DashMap<String, Session>,
}

/// Editor-session registry with debounced saves.
#[derive(Clone)]
pub struct AutosaveService {
    inner: Arc<Inner>,
}

impl AutosaveService {
    pub fn new(db: FirestoreDb, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                delay,
                sessions: DashMap::new(),
            }),
        }
    }

    /// Load a program into an editor session (or return the in-memory
    /// document when a session already exists — it is never older than
    /// storage). Owner mismatches surface as not-found.
    pub async fn load(&self, id: &str, owner_id: &str) -> Result<ProgramTemplate, AppError> {
        if let Some(session) = self.inner.sessions.get(id) {
            let template = session.template.clone();
            drop(session);
            return ensure_owner(template, owner_id);
        }

        let template = self
            .inner
            .db
            .get_program_template(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Program {} not found", id)))?;
        let template = ensure_owner(template, owner_id)?;

        self.inner.sessions.insert(
            id.to_string(),
            Session {
                template: template.clone(),
                status: SaveStatus::Ready,
                timer: None,
            },
        );
        tracing::debug!(program_id = id, "Editor session loaded");
        Ok(template)
    }

    /// Apply a state edit: run the pure engine operation against the
    /// session document, commit the result in memory, re-arm the debounce
    /// timer. Returns the updated document immediately (optimistic).
    pub async fn apply_edit(
        &self,
        id: &str,
        owner_id: &str,
        op: &EditOp,
    ) -> Result<ProgramTemplate, AppError> {
        self.load(id, owner_id).await?;

        let updated = {
            let mut session = self
                .inner
                .sessions
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Program {} not found", id)))?;
            let next_state = engine::apply(&session.template.state, op)?;
            session.template.state = next_state;
            session.template.duration_weeks = session.template.state.duration_weeks;
            session.template.last_edited_at = time_utils::now_rfc3339();
            session.template.clone()
        };

        self.arm_timer(id);
        Ok(updated)
    }

    /// Apply a metadata patch (title/description/difficulty) through the
    /// session, debounced like any other edit.
    pub async fn apply_meta(
        &self,
        id: &str,
        owner_id: &str,
        patch: MetaPatch,
    ) -> Result<ProgramTemplate, AppError> {
        self.load(id, owner_id).await?;

        let updated = {
            let mut session = self
                .inner
                .sessions
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Program {} not found", id)))?;
            if let Some(title) = patch.title {
                session.template.title = title;
            }
            if let Some(description) = patch.description {
                session.template.description = Some(description);
            }
            if let Some(difficulty) = patch.difficulty {
                session.template.difficulty = difficulty;
                session.template.state.difficulty = difficulty;
            }
            session.template.last_edited_at = time_utils::now_rfc3339();
            session.template.clone()
        };

        self.arm_timer(id);
        Ok(updated)
    }

    /// Persist a session now, cancelling any pending timer.
    pub async fn flush(&self, id: &str) -> Result<(), AppError> {
        if let Some(mut session) = self.inner.sessions.get_mut(id) {
            if let Some(handle) = session.timer.take() {
                handle.abort();
            }
        }
        Inner::save_session(&self.inner, id).await
    }

    /// Persist every live session (shutdown path).
    pub async fn flush_all(&self) {
        let ids: Vec<String> = self
            .inner
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in ids {
            if let Err(e) = self.flush(&id).await {
                tracing::warn!(program_id = %id, error = %e, "Flush on shutdown failed");
            }
        }
    }

    /// Drop a session (after archive/delete), cancelling any pending timer.
    pub fn evict(&self, id: &str) {
        if let Some((_, session)) = self.inner.sessions.remove(id) {
            if let Some(handle) = session.timer {
                handle.abort();
            }
        }
    }

    /// Current save status, if a session exists.
    pub fn status(&self, id: &str) -> Option<SaveStatus> {
        self.inner.sessions.get(id).map(|s| s.status.clone())
    }

    /// Cancel-and-restart the debounce timer for a session.
    fn arm_timer(&self, id: &str) {
        let Some(mut session) = self.inner.sessions.get_mut(id) else {
            return;
        };
        if let Some(handle) = session.timer.take() {
            handle.abort();
        }
        session.status = SaveStatus::Armed;

        let inner = Arc::clone(&self.inner);
        let key = id.to_string();
        session.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            // Clear our own handle first so the save can't abort itself.
            if let Some(mut session) = inner.sessions.get_mut(&key) {
                session.timer = None;
            }
            if let Err(e) = Inner::save_session(&inner, &key).await {
                tracing::warn!(program_id = %key, error = %e, "Autosave failed; edits retained");
            }
        }));
    }

    #[cfg(test)]
    fn insert_session_for_test(&self, template: ProgramTemplate) {
        self.inner.sessions.insert(
            template.id.clone(),
            Session {
                template,
                status: SaveStatus::Ready,
                timer: None,
            },
        );
    }
}

impl Inner {
    async fn save_session(inner: &Arc<Inner>, id: &str) -> Result<(), AppError> {
        let mut to_save = match inner.sessions.get_mut(id) {
            Some(mut session) => {
                session.status = SaveStatus::Saving;
                session.template.clone()
            }
            None => return Ok(()),
        };
        to_save.updated_at = time_utils::now_rfc3339();

        match inner.db.set_program_template(&to_save).await {
            Ok(()) => {
                if let Some(mut session) = inner.sessions.get_mut(id) {
                    // An edit during the in-flight save re-armed the timer;
                    // leave that newer state alone.
                    if session.status == SaveStatus::Saving {
                        session.template.updated_at = to_save.updated_at;
                        session.template.state.normalize();
                        session.template.duration_weeks =
                            session.template.state.duration_weeks;
                        session.status = SaveStatus::Ready;
                    }
                }
                tracing::debug!(program_id = id, "Autosave complete");
                Ok(())
            }
            Err(e) => {
                if let Some(mut session) = inner.sessions.get_mut(id) {
                    if session.status == SaveStatus::Saving {
                        session.status = SaveStatus::Failed(e.to_string());
                    }
                }
                Err(e)
            }
        }
    }
}

fn ensure_owner(template: ProgramTemplate, owner_id: &str) -> Result<ProgramTemplate, AppError> {
    if template.owner_id != owner_id {
        return Err(AppError::NotFound(format!(
            "Program {} not found",
            template.id
        )));
    }
    Ok(template)
}
