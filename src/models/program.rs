// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Program template row for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::state::ProgramTemplateState;

/// Program difficulty rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Stored program template in Firestore.
///
/// Field names are camelCase on the wire because these documents are shared
/// with the mobile client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramTemplate {
    /// Document ID
    pub id: String,
    /// Trainer that owns this template
    pub owner_id: String,
    /// Display title
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Total program length in weeks (mirrors the state document)
    #[serde(default)]
    pub duration_weeks: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Soft-delete flag
    #[serde(default)]
    pub archived: bool,
    /// When the template was created (ISO 8601)
    pub created_at: String,
    /// When the row was last written (ISO 8601)
    pub updated_at: String,
    /// When the editor last touched the document (ISO 8601)
    #[serde(default)]
    pub last_edited_at: String,
    /// Embedded phases/weeks/days document
    #[serde(default)]
    pub state: ProgramTemplateState,
}

impl ProgramTemplate {
    /// Copy of this template under a new id with reset timestamps and a
    /// "(Copy)" title suffix. The archived flag does not carry over.
    pub fn duplicated(&self, new_id: String, now: &str) -> Self {
        Self {
            id: new_id,
            owner_id: self.owner_id.clone(),
            title: format!("{} (Copy)", self.title),
            description: self.description.clone(),
            duration_weeks: self.duration_weeks,
            difficulty: self.difficulty,
            archived: false,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            last_edited_at: now.to_string(),
            state: self.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicated_resets_identity() {
        let original = ProgramTemplate {
            id: "p1".to_string(),
            owner_id: "t1".to_string(),
            title: "Strength Block".to_string(),
            description: Some("8 week base".to_string()),
            duration_weeks: 8,
            difficulty: Difficulty::Intermediate,
            archived: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-02-01T00:00:00Z".to_string(),
            last_edited_at: "2024-02-01T00:00:00Z".to_string(),
            state: ProgramTemplateState::default(),
        };

        let copy = original.duplicated("p2".to_string(), "2024-03-01T00:00:00Z");

        assert_eq!(copy.id, "p2");
        assert_eq!(copy.title, "Strength Block (Copy)");
        assert_eq!(copy.owner_id, "t1");
        assert!(!copy.archived);
        assert_eq!(copy.created_at, "2024-03-01T00:00:00Z");
        assert_eq!(copy.duration_weeks, 8);
    }
}
