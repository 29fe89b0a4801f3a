// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Scheduling derivation: which workout is a client doing today?
//!
//! There is no per-day assignment record. The program's days form one
//! flattened sequence (phase-major, then week, then day) and the calendar
//! offset from the assignment start date indexes straight into it. The
//! derivation is a read-only projection, re-derived on every call.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{ProgramAssignment, ProgramTemplate, ProgramTemplateState};
use crate::time_utils;
use futures_util::{stream, StreamExt};
use std::collections::{BTreeSet, HashMap, HashSet};

const MAX_CONCURRENT_PROGRAM_FETCHES: usize = 25;

/// Fallback title when workout enrichment fails or the row is gone.
pub const PLACEHOLDER_WORKOUT_TITLE: &str = "Workout";

/// The day a calendar offset resolved to.
///
/// `workout_template_id` is the first table-backed ref of that day; it is
/// `None` both for rest days and for days holding only inline workouts
/// (inline workouts have no externally assignable id).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToday {
    pub program_day_key: String,
    pub workout_template_id: Option<String>,
}

/// Project `today` onto the program's flattened day sequence.
///
/// Returns `None` when the program has not started, has already ended, or
/// either date fails to parse.
pub fn resolve_today(
    state: &ProgramTemplateState,
    start_date: &str,
    today: &str,
) -> Option<ResolvedToday> {
    let offset = time_utils::diff_in_days(today, start_date)?;
    if offset < 0 {
        return None;
    }
    let day = state.days_in_program_order().nth(offset as usize)?;
    Some(ResolvedToday {
        program_day_key: day.id.clone(),
        workout_template_id: day.first_table_workout_id().map(str::to_string),
    })
}

/// Today's workout for one client, enriched with a title.
#[derive(Debug, Clone)]
pub struct ClientToday {
    pub workout_template_id: String,
    pub program_day_key: String,
    pub workout_title: String,
}

/// Bulk schedule lookups for a trainer's client list.
#[derive(Clone)]
pub struct ScheduleService {
    db: FirestoreDb,
}

impl ScheduleService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Resolve today's workout for each of the given clients.
    ///
    /// An explicit per-day pin wins when one exists; clients lacking one
    /// fall back to the program derivation. Programs are fetched once per
    /// distinct program id, not once per client. Title enrichment is
    /// best-effort: a failed lookup degrades to a placeholder instead of
    /// failing the call. Clients with no pin, no active assignment, or
    /// whose program yields no table-backed workout today, are absent from
    /// the result map.
    pub async fn today_for_clients(
        &self,
        trainer_id: &str,
        client_ids: &[String],
        today: &str,
    ) -> Result<HashMap<String, ClientToday>, AppError> {
        let wanted: HashSet<&str> = client_ids.iter().map(String::as_str).collect();

        // Explicit pins first.
        let mut resolved: HashMap<String, ResolvedToday> = HashMap::new();
        for pin in self
            .db
            .get_workout_assignments_for_date(trainer_id, today)
            .await?
        {
            if wanted.contains(pin.client_id.as_str()) {
                resolved.insert(
                    pin.client_id,
                    ResolvedToday {
                        program_day_key: pin.id,
                        workout_template_id: Some(pin.workout_template_id),
                    },
                );
            }
        }

        // Derive for everyone else from their active program assignment.
        let mut assignments = self.db.get_active_assignments(trainer_id).await?;
        assignments.retain(|a| {
            wanted.contains(a.client_id.as_str()) && !resolved.contains_key(&a.client_id)
        });

        if !assignments.is_empty() {
            let programs = self.fetch_programs_once(&assignments).await?;

            // First active assignment per client wins.
            for assignment in &assignments {
                if resolved.contains_key(&assignment.client_id) {
                    continue;
                }
                let Some(program) = programs.get(&assignment.program_template_id) else {
                    continue;
                };
                if let Some(today_entry) =
                    resolve_today(&program.state, &assignment.start_date, today)
                {
                    resolved.insert(assignment.client_id.clone(), today_entry);
                }
            }
        }

        // Best-effort title enrichment over the distinct workout ids.
        let workout_ids: Vec<String> = resolved
            .values()
            .filter_map(|r| r.workout_template_id.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let titles = match self.db.get_workout_titles(&workout_ids).await {
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(error = %e, "Workout title enrichment failed");
                HashMap::new()
            }
        };

        let mut result = HashMap::new();
        for (client_id, entry) in resolved {
            let Some(workout_template_id) = entry.workout_template_id else {
                // Rest day, or an inline-only day with no external id.
                continue;
            };
            let workout_title = titles
                .get(&workout_template_id)
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_WORKOUT_TITLE.to_string());
            result.insert(
                client_id,
                ClientToday {
                    workout_template_id,
                    program_day_key: entry.program_day_key,
                    workout_title,
                },
            );
        }

        tracing::debug!(
            trainer_id,
            clients = client_ids.len(),
            resolved = result.len(),
            "Bulk today lookup complete"
        );

        Ok(result)
    }

    /// Fetch each distinct program referenced by the assignments exactly once.
    async fn fetch_programs_once(
        &self,
        assignments: &[ProgramAssignment],
    ) -> Result<HashMap<String, ProgramTemplate>, AppError> {
        let program_ids: BTreeSet<String> = assignments
            .iter()
            .map(|a| a.program_template_id.clone())
            .collect();

        let fetched: Vec<Result<Option<(String, ProgramTemplate)>, AppError>> =
            stream::iter(program_ids)
                .map(|id| async move {
                    let program = self.db.get_program_template(&id).await?;
                    Ok(program.map(|p| (id, p)))
                })
                .buffer_unordered(MAX_CONCURRENT_PROGRAM_FETCHES)
                .collect()
                .await;

        let mut programs = HashMap::new();
        for entry in fetched {
            if let Some((id, program)) = entry? {
                programs.insert(id, program);
            }
        }
        Ok(programs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::program::Difficulty;
    use crate::models::state::DayWorkoutRef;
    use crate::services::engine;

    /// Two phases of one week each: 14 flattened days.
    fn two_phase_state() -> ProgramTemplateState {
        engine::build_initial_state(2, 2, Difficulty::Beginner).unwrap()
    }

    #[test]
    fn test_before_start_is_none() {
        let state = two_phase_state();
        assert_eq!(resolve_today(&state, "2024-01-01", "2023-12-31"), None);
    }

    #[test]
    fn test_offset_seven_hits_second_phase_monday() {
        let mut state = two_phase_state();
        state.phases[1].weeks[0].days[0]
            .workouts
            .push(Some(DayWorkoutRef::Table {
                workout_id: "w42".to_string(),
            }));

        let resolved = resolve_today(&state, "2024-01-01", "2024-01-08").unwrap();

        assert_eq!(resolved.workout_template_id.as_deref(), Some("w42"));
        assert_eq!(
            resolved.program_day_key,
            state.phases[1].weeks[0].days[0].id
        );
    }

    #[test]
    fn test_past_end_is_none() {
        let state = two_phase_state();
        // 14 flattened days; offset 14 is one past the end.
        assert_eq!(resolve_today(&state, "2024-01-01", "2024-01-15"), None);
    }

    #[test]
    fn test_rest_day_resolves_with_no_workout() {
        let state = two_phase_state();

        let resolved = resolve_today(&state, "2024-01-01", "2024-01-03").unwrap();

        assert_eq!(resolved.workout_template_id, None);
        assert_eq!(
            resolved.program_day_key,
            state.phases[0].weeks[0].days[2].id
        );
    }

    #[test]
    fn test_inline_only_day_yields_no_external_id() {
        let mut state = two_phase_state();
        state.phases[0].weeks[0].days[0]
            .workouts
            .push(Some(DayWorkoutRef::Inline {
                inline_workout_id: "i1".to_string(),
            }));

        let resolved = resolve_today(&state, "2024-01-01", "2024-01-01").unwrap();

        assert_eq!(resolved.workout_template_id, None);
    }

    #[test]
    fn test_null_placeholders_skipped_for_first_table_ref() {
        let mut state = two_phase_state();
        let day = &mut state.phases[0].weeks[0].days[0];
        day.workouts.push(None);
        day.workouts.push(Some(DayWorkoutRef::Inline {
            inline_workout_id: "i1".to_string(),
        }));
        day.workouts.push(Some(DayWorkoutRef::Table {
            workout_id: "w1".to_string(),
        }));

        let resolved = resolve_today(&state, "2024-01-01", "2024-01-01").unwrap();

        assert_eq!(resolved.workout_template_id.as_deref(), Some("w1"));
    }

    #[test]
    fn test_unparseable_dates_are_none() {
        let state = two_phase_state();
        assert_eq!(resolve_today(&state, "someday", "2024-01-01"), None);
        assert_eq!(resolve_today(&state, "2024-01-01", ""), None);
    }
}
