// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Program assignment and workout template rows backing schedule lookups.

use serde::{Deserialize, Serialize};

/// Links a client to a program template with a start date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramAssignment {
    /// Document ID
    pub id: String,
    /// Client the program is assigned to
    pub client_id: String,
    /// Trainer that made the assignment
    pub trainer_id: String,
    /// Assigned program template
    pub program_template_id: String,
    /// Program day 0 maps to this calendar date (plain `YYYY-MM-DD`)
    pub start_date: String,
    /// Inactive assignments are ignored by schedule lookups
    #[serde(default)]
    pub active: bool,
}

/// Explicit per-day workout assignment, pinned by the trainer.
///
/// When a row exists for a client and date it wins over the program
/// derivation; most days have no row and are derived from the program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutAssignment {
    /// Document ID (doubles as the day key for pinned workouts)
    pub id: String,
    pub client_id: String,
    pub trainer_id: String,
    /// Plain `YYYY-MM-DD` date the workout is pinned to
    pub date: String,
    pub workout_template_id: String,
}

/// Workout template row. Only the fields schedule enrichment needs; the
/// full editor document lives with the workout editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    /// Document ID
    pub id: String,
    /// Trainer that owns this workout
    pub owner_id: String,
    pub title: String,
}
