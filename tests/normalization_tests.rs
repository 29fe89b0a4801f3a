// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Loading legacy and partially-corrupt documents.

use coachtrack::db::FirestoreDb;
use coachtrack::models::state::{DayType, DayWorkoutRef, STATE_SCHEMA_VERSION};
use coachtrack::models::ProgramTemplate;

/// A v1-era document: singular workoutRef, short week, missing labels and
/// indices, stale workout manifest, one malformed ref.
const LEGACY_DOC: &str = r#"{
    "id": "legacy-1",
    "ownerId": "trainer-1",
    "title": "Old Plan",
    "createdAt": "2023-06-01T00:00:00Z",
    "updatedAt": "2023-06-01T00:00:00Z",
    "state": {
        "schemaVersion": 1,
        "durationWeeks": 99,
        "phases": [{
            "id": "ph1",
            "title": "",
            "order": 7,
            "durationWeeks": 3,
            "weeks": [{
                "days": [
                    { "id": "d1", "workoutRef": { "source": "workoutsTable", "workoutId": "w1" } },
                    { "id": "d2", "workouts": [ { "source": "workoutsTable" }, null ] },
                    { "id": "d3" }
                ]
            }]
        }],
        "workoutLibrary": {
            "linkedWorkoutIds": ["w1", "stale-id"]
        }
    }
}"#;

#[tokio::test]
async fn test_legacy_document_loads_in_canonical_shape() {
    let db = FirestoreDb::new_in_memory();
    let template: ProgramTemplate = serde_json::from_str(LEGACY_DOC).unwrap();
    db.set_program_template(&template).await.unwrap();

    let loaded = db.get_program_template("legacy-1").await.unwrap().unwrap();

    assert_eq!(loaded.state.schema_version, STATE_SCHEMA_VERSION);
    // Declared durations are recomputed from content, not trusted.
    assert_eq!(loaded.state.duration_weeks, 1);
    assert_eq!(loaded.duration_weeks, 1);

    let phase = &loaded.state.phases[0];
    assert_eq!(phase.order, 0);
    assert_eq!(phase.title, "Phase 1");
    assert_eq!(phase.duration_weeks, 1);

    let week = &phase.weeks[0];
    assert_eq!(week.index, 0);
    assert_eq!(week.label, "Week 1");
    // Short week padded out to 7 rest days with dense orders.
    assert_eq!(week.days.len(), 7);
    let orders: Vec<u32> = week.days.iter().map(|d| d.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(week.days[1].label, "Tue");

    // Legacy singular ref folded into the workouts list.
    let day = &week.days[0];
    assert_eq!(
        day.workouts,
        vec![Some(DayWorkoutRef::Table {
            workout_id: "w1".to_string()
        })]
    );
    assert_eq!(day.day_type, DayType::Workout);

    // Malformed ref dropped, null placeholder kept, day derived as rest.
    let day = &week.days[1];
    assert_eq!(day.workouts, vec![None]);
    assert_eq!(day.day_type, DayType::Rest);

    // Manifest rebuilt from live refs only.
    let ids: Vec<&str> = loaded
        .state
        .workout_library
        .linked_workout_ids
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(ids, vec!["w1"]);
}

#[tokio::test]
async fn test_missing_state_defaults_to_empty_document() {
    let db = FirestoreDb::new_in_memory();
    let raw = r#"{
        "id": "bare-1",
        "ownerId": "trainer-1",
        "title": "Bare Row",
        "createdAt": "2023-06-01T00:00:00Z",
        "updatedAt": "2023-06-01T00:00:00Z"
    }"#;
    let template: ProgramTemplate = serde_json::from_str(raw).unwrap();
    db.set_program_template(&template).await.unwrap();

    let loaded = db.get_program_template("bare-1").await.unwrap().unwrap();

    assert_eq!(loaded.state.schema_version, STATE_SCHEMA_VERSION);
    assert!(loaded.state.phases.is_empty());
    assert_eq!(loaded.duration_weeks, 0);
}
