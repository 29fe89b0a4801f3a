// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Program template state document: phases → weeks → days → workout refs.
//!
//! This is the versioned document the mobile editor reads and writes. Wire
//! names are camelCase; deserialization is deliberately forgiving so that
//! partially-corrupt legacy documents still load in a usable form (missing
//! fields get safe defaults, malformed workout refs are dropped).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::models::program::Difficulty;

/// Current document schema version. Bumped on shape migrations; loading
/// always rewrites the document to this version.
pub const STATE_SCHEMA_VERSION: u32 = 2;

/// Number of weekday slots in a week.
pub const DAYS_PER_WEEK: usize = 7;

/// Default day labels, Monday-first by convention.
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] =
    ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Reference from a day to a workout.
///
/// Tagged by `source` on the wire. A JSON `null` in the workouts list is an
/// explicit "no workout" placeholder and is represented as `None` in
/// `Day::workouts`, distinct from the entry being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum DayWorkoutRef {
    /// Resolves against the external workout-templates collection.
    #[serde(rename = "workoutsTable", rename_all = "camelCase")]
    Table { workout_id: String },
    /// Resolves against `WorkoutLibrary::inline_workouts` in this document.
    #[serde(rename = "inline", rename_all = "camelCase")]
    Inline { inline_workout_id: String },
}

impl DayWorkoutRef {
    /// Table workout id, if this ref is table-backed.
    pub fn table_workout_id(&self) -> Option<&str> {
        match self {
            DayWorkoutRef::Table { workout_id } => Some(workout_id),
            DayWorkoutRef::Inline { .. } => None,
        }
    }
}

/// Accept well-formed refs and null placeholders; silently drop anything
/// else (wrong tag, missing or non-string id).
fn deserialize_workout_slots<'de, D>(
    deserializer: D,
) -> Result<Vec<Option<DayWorkoutRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Slot {
        Known(Option<DayWorkoutRef>),
        Malformed(serde_json::Value),
    }

    let raw = Vec::<Slot>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Known(r) => Some(r),
            Slot::Malformed(_) => None,
        })
        .collect())
}

/// Whether a day is a workout or rest day. Derived from the workouts list,
/// not independently authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Workout,
    #[default]
    Rest,
}

/// A single weekday slot within a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: String,
    /// Position within the week, 0 (Mon) through 6 (Sun)
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub day_type: DayType,
    /// Display/execution order of workout refs; empty means rest day
    #[serde(default, deserialize_with = "deserialize_workout_slots")]
    pub workouts: Vec<Option<DayWorkoutRef>>,
    /// Legacy singular ref from v1 documents. Folded into `workouts` on
    /// normalization and never written back.
    #[serde(rename = "workoutRef", default, skip_serializing)]
    pub legacy_workout_ref: Option<DayWorkoutRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Day {
    /// A rest day for the given weekday slot.
    pub fn rest(order: u32) -> Self {
        let label = WEEKDAY_LABELS
            .get(order as usize)
            .copied()
            .unwrap_or("Day")
            .to_string();
        Self {
            id: new_id(),
            order,
            label,
            day_type: DayType::Rest,
            workouts: Vec::new(),
            legacy_workout_ref: None,
            notes: None,
        }
    }

    /// Deep copy with a fresh id; workout refs are preserved by value.
    pub fn with_new_id(&self) -> Self {
        let mut day = self.clone();
        day.id = new_id();
        day
    }

    /// True when any non-null workout ref is present.
    pub fn has_workout(&self) -> bool {
        self.workouts.iter().any(Option::is_some)
    }

    /// First table-backed workout id, in display order.
    pub fn first_table_workout_id(&self) -> Option<&str> {
        self.workouts
            .iter()
            .flatten()
            .find_map(DayWorkoutRef::table_workout_id)
    }

    fn normalize(&mut self, order: u32) {
        self.order = order;
        if self.id.is_empty() {
            self.id = new_id();
        }
        if self.label.is_empty() {
            self.label = WEEKDAY_LABELS
                .get(order as usize)
                .copied()
                .unwrap_or("Day")
                .to_string();
        }
        // v1 documents carried a singular workoutRef; the list wins when
        // both are present.
        if let Some(legacy) = self.legacy_workout_ref.take() {
            if self.workouts.is_empty() {
                self.workouts.push(Some(legacy));
            }
        }
        self.day_type = if self.has_workout() {
            DayType::Workout
        } else {
            DayType::Rest
        };
    }
}

/// An ordered set of exactly 7 days inside a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    /// Dense position within the phase
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Week {
    /// An empty week (7 rest days) at the given position.
    pub fn rest_week(index: u32) -> Self {
        Self {
            index,
            label: format!("Week {}", index + 1),
            days: (0..DAYS_PER_WEEK as u32).map(Day::rest).collect(),
        }
    }

    /// Deep copy with fresh day ids; workout refs are preserved by value.
    pub fn duplicated(&self) -> Self {
        Self {
            index: self.index,
            label: self.label.clone(),
            days: self.days.iter().map(Day::with_new_id).collect(),
        }
    }

    fn normalize(&mut self, index: u32) {
        self.index = index;
        if self.label.is_empty() {
            self.label = format!("Week {}", index + 1);
        }
        // Exactly 7 days, one per weekday slot.
        self.days.truncate(DAYS_PER_WEEK);
        while self.days.len() < DAYS_PER_WEEK {
            self.days.push(Day::rest(self.days.len() as u32));
        }
        for (i, day) in self.days.iter_mut().enumerate() {
            day.normalize(i as u32);
        }
    }
}

/// A named, ordered grouping of weeks within a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dense position within the phase list
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub duration_weeks: u32,
    #[serde(default)]
    pub weeks: Vec<Week>,
}

impl Phase {
    /// A new phase at `order` holding `week_count` empty weeks.
    pub fn with_weeks(order: u32, week_count: u32) -> Self {
        Self {
            id: new_id(),
            title: format!("Phase {}", order + 1),
            description: None,
            order,
            duration_weeks: week_count,
            weeks: (0..week_count).map(Week::rest_week).collect(),
        }
    }
}

/// Inline workout snapshot embedded in the document (no external row yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineWorkout {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Opaque editor state, owned by the workout editor
    #[serde(default)]
    pub state: serde_json::Value,
}

/// Manifest of workouts referenced by the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLibrary {
    /// Table-workout ids referenced anywhere in the document, for bulk
    /// title prefetch
    #[serde(default)]
    pub linked_workout_ids: BTreeSet<String>,
    #[serde(default)]
    pub inline_workouts: Vec<InlineWorkout>,
}

/// UI selection hints. Not business-critical; cleared when out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionHint {
    pub phase_index: u32,
    pub week_index: u32,
}

/// Versioned program state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramTemplateState {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Always equals the sum of phase durations after normalization
    #[serde(default)]
    pub duration_weeks: u32,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub workout_library: WorkoutLibrary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectionHint>,
}

impl Default for ProgramTemplateState {
    fn default() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            difficulty: Difficulty::default(),
            duration_weeks: 0,
            phases: Vec::new(),
            workout_library: WorkoutLibrary::default(),
            selected: None,
        }
    }
}

impl ProgramTemplateState {
    /// Repair a loaded document in place: dense order/index fields, exactly
    /// 7 days per week, legacy field migration, duration sums recomputed
    /// from content, linked-workout manifest rebuilt.
    pub fn normalize(&mut self) {
        self.schema_version = STATE_SCHEMA_VERSION;

        for (i, phase) in self.phases.iter_mut().enumerate() {
            phase.order = i as u32;
            if phase.id.is_empty() {
                phase.id = new_id();
            }
            if phase.title.is_empty() {
                phase.title = format!("Phase {}", i + 1);
            }
            for (w, week) in phase.weeks.iter_mut().enumerate() {
                week.normalize(w as u32);
            }
            phase.duration_weeks = phase.weeks.len() as u32;
        }
        self.duration_weeks = self.phases.iter().map(|p| p.duration_weeks).sum();

        self.rebuild_linked_workout_ids();
        self.workout_library
            .inline_workouts
            .retain(|w| !w.id.is_empty());

        if let Some(sel) = self.selected {
            let valid = self
                .phases
                .get(sel.phase_index as usize)
                .is_some_and(|p| (sel.week_index as usize) < p.weeks.len());
            if !valid {
                self.selected = None;
            }
        }
    }

    /// Rebuild the linked-workout manifest from the refs actually present.
    pub fn rebuild_linked_workout_ids(&mut self) {
        self.workout_library.linked_workout_ids = self
            .days_in_program_order()
            .flat_map(|day| day.workouts.iter().flatten())
            .filter_map(DayWorkoutRef::table_workout_id)
            .map(str::to_string)
            .collect();
    }

    /// All days as one linear sequence: phases in order, weeks in order,
    /// then the 7 days in order.
    pub fn days_in_program_order(&self) -> impl Iterator<Item = &Day> {
        self.phases
            .iter()
            .flat_map(|p| p.weeks.iter())
            .flat_map(|w| w.days.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_workout_ref_folds_into_workouts() {
        let json = r#"{
            "phases": [{
                "id": "ph1", "title": "Base",
                "weeks": [{
                    "days": [{
                        "id": "d1",
                        "workoutRef": { "source": "workoutsTable", "workoutId": "w9" }
                    }]
                }]
            }]
        }"#;

        let mut state: ProgramTemplateState = serde_json::from_str(json).unwrap();
        state.normalize();

        let day = &state.phases[0].weeks[0].days[0];
        assert_eq!(
            day.workouts,
            vec![Some(DayWorkoutRef::Table {
                workout_id: "w9".to_string()
            })]
        );
        assert!(day.legacy_workout_ref.is_none());
        assert_eq!(day.day_type, DayType::Workout);

        // The legacy field is dropped on write.
        let written = serde_json::to_string(&state).unwrap();
        assert!(!written.contains("workoutRef"));
    }

    #[test]
    fn test_workouts_list_wins_over_legacy_ref() {
        let json = r#"{
            "id": "d1",
            "workouts": [{ "source": "inline", "inlineWorkoutId": "i1" }],
            "workoutRef": { "source": "workoutsTable", "workoutId": "w9" }
        }"#;

        let mut day: Day = serde_json::from_str(json).unwrap();
        day.normalize(0);

        assert_eq!(
            day.workouts,
            vec![Some(DayWorkoutRef::Inline {
                inline_workout_id: "i1".to_string()
            })]
        );
    }

    #[test]
    fn test_malformed_refs_dropped_nulls_kept() {
        let json = r#"{
            "id": "d1",
            "workouts": [
                { "source": "workoutsTable", "workoutId": "w1" },
                null,
                { "source": "workoutsTable" },
                { "source": "mystery", "workoutId": "w2" },
                { "source": "workoutsTable", "workoutId": 42 }
            ]
        }"#;

        let day: Day = serde_json::from_str(json).unwrap();

        assert_eq!(day.workouts.len(), 2);
        assert_eq!(
            day.workouts[0],
            Some(DayWorkoutRef::Table {
                workout_id: "w1".to_string()
            })
        );
        assert_eq!(day.workouts[1], None);
    }

    #[test]
    fn test_normalize_pads_short_weeks_and_renumbers() {
        let mut state = ProgramTemplateState {
            phases: vec![Phase {
                id: String::new(),
                title: String::new(),
                description: None,
                order: 9,
                duration_weeks: 99,
                weeks: vec![Week {
                    index: 5,
                    label: String::new(),
                    days: vec![Day::rest(3)],
                }],
            }],
            ..ProgramTemplateState::default()
        };

        state.normalize();

        let phase = &state.phases[0];
        assert_eq!(phase.order, 0);
        assert_eq!(phase.duration_weeks, 1);
        assert_eq!(state.duration_weeks, 1);

        let week = &phase.weeks[0];
        assert_eq!(week.index, 0);
        assert_eq!(week.label, "Week 1");
        assert_eq!(week.days.len(), DAYS_PER_WEEK);
        let orders: Vec<u32> = week.days.iter().map(|d| d.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rebuild_linked_workout_ids_from_refs() {
        let mut state = ProgramTemplateState::default();
        let mut phase = Phase::with_weeks(0, 1);
        phase.weeks[0].days[0].workouts.push(Some(DayWorkoutRef::Table {
            workout_id: "w2".to_string(),
        }));
        phase.weeks[0].days[4].workouts.push(Some(DayWorkoutRef::Table {
            workout_id: "w1".to_string(),
        }));
        state.phases.push(phase);
        // Stale manifest entry should disappear.
        state
            .workout_library
            .linked_workout_ids
            .insert("gone".to_string());

        state.normalize();

        let ids: Vec<&str> = state
            .workout_library
            .linked_workout_ids
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(ids, vec!["w1", "w2"]);
    }

    #[test]
    fn test_out_of_range_selection_cleared() {
        let mut state = ProgramTemplateState {
            phases: vec![Phase::with_weeks(0, 2)],
            selected: Some(SelectionHint {
                phase_index: 0,
                week_index: 5,
            }),
            ..ProgramTemplateState::default()
        };

        state.normalize();

        assert!(state.selected.is_none());
    }
}
