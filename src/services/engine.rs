// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Pure state-transition operations over the program template document.
//!
//! Every operation takes the current state by reference and returns a new
//! state; inputs are never mutated and nothing here touches storage or
//! suspends. Callers commit the result and schedule persistence themselves.

use serde::Deserialize;

use crate::models::program::Difficulty;
use crate::models::state::{
    Day, DayType, DayWorkoutRef, Phase, ProgramTemplateState, Week, DAYS_PER_WEEK,
};

/// Errors from state-transition operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Program duration must be at least 1 week")]
    InvalidDuration,

    #[error("Phase count must be at least 1")]
    InvalidPhaseCount,

    #[error("Phase count cannot exceed the duration in weeks")]
    PhaseCountExceedsDuration,

    #[error("Phase index {0} is out of range")]
    PhaseIndexOutOfRange(usize),

    #[error("Week index {0} is out of range")]
    WeekIndexOutOfRange(usize),

    #[error("Day order {0} is out of range (expected 0-6)")]
    DayOrderOutOfRange(usize),

    #[error("A program must keep at least one phase")]
    MustKeepAtLeastOnePhase,

    #[error("A phase must keep at least one week")]
    MustKeepAtLeastOneWeek,
}

type Result<T> = std::result::Result<T, EngineError>;

/// Seed a fresh state: `phase_count` phases whose week counts sum to
/// `duration_weeks`, split as evenly as possible (the first
/// `duration_weeks % phase_count` phases get one extra week, so no two
/// phases differ by more than one).
pub fn build_initial_state(
    duration_weeks: u32,
    phase_count: u32,
    difficulty: Difficulty,
) -> Result<ProgramTemplateState> {
    if duration_weeks < 1 {
        return Err(EngineError::InvalidDuration);
    }
    if phase_count < 1 {
        return Err(EngineError::InvalidPhaseCount);
    }
    if phase_count > duration_weeks {
        return Err(EngineError::PhaseCountExceedsDuration);
    }

    let base = duration_weeks / phase_count;
    let remainder = duration_weeks % phase_count;

    let phases = (0..phase_count)
        .map(|i| {
            let extra = u32::from(i < remainder);
            Phase::with_weeks(i, base + extra)
        })
        .collect();

    Ok(ProgramTemplateState {
        difficulty,
        duration_weeks,
        phases,
        ..ProgramTemplateState::default()
    })
}

/// Append a new phase holding one empty week.
pub fn add_phase(state: &ProgramTemplateState) -> ProgramTemplateState {
    let mut next = state.clone();
    let order = next.phases.len() as u32;
    next.phases.push(Phase::with_weeks(order, 1));
    recompute_durations(&mut next);
    next
}

/// Remove the phase at `phase_index` and renumber the rest.
pub fn remove_phase(
    state: &ProgramTemplateState,
    phase_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_phase_index(&next, phase_index)?;
    if next.phases.len() == 1 {
        return Err(EngineError::MustKeepAtLeastOnePhase);
    }
    next.phases.remove(phase_index);
    renumber_phases(&mut next);
    recompute_durations(&mut next);
    Ok(next)
}

/// Append an empty week (7 rest days) to the phase at `phase_index`.
pub fn add_phase_week(
    state: &ProgramTemplateState,
    phase_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_phase_index(&next, phase_index)?;
    let phase = &mut next.phases[phase_index];
    phase.weeks.push(Week::rest_week(phase.weeks.len() as u32));
    recompute_durations(&mut next);
    Ok(next)
}

/// Remove the week at `week_index` from the phase and renumber the rest.
pub fn remove_phase_week(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_week_index(&next, phase_index, week_index)?;
    let phase = &mut next.phases[phase_index];
    if phase.weeks.len() == 1 {
        return Err(EngineError::MustKeepAtLeastOneWeek);
    }
    phase.weeks.remove(week_index);
    renumber_weeks(phase);
    recompute_durations(&mut next);
    Ok(next)
}

/// Deep-clone the week at `week_index` (fresh day ids, workout refs
/// preserved by value) and insert the clone immediately after the source.
pub fn duplicate_week(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_week_index(&next, phase_index, week_index)?;
    let phase = &mut next.phases[phase_index];
    let clone = phase.weeks[week_index].duplicated();
    phase.weeks.insert(week_index + 1, clone);
    renumber_weeks(phase);
    recompute_durations(&mut next);
    Ok(next)
}

/// Move a phase from `from_index` to `to_index` (splice semantics).
/// `to_index` is clamped to the list; equal indices are a no-op.
pub fn reorder_phases(
    state: &ProgramTemplateState,
    from_index: usize,
    to_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_phase_index(&next, from_index)?;
    let to_index = to_index.min(next.phases.len() - 1);
    if from_index != to_index {
        let phase = next.phases.remove(from_index);
        next.phases.insert(to_index, phase);
        renumber_phases(&mut next);
    }
    Ok(next)
}

/// Move a week within a phase from `from_index` to `to_index` (splice
/// semantics). `to_index` is clamped; equal indices are a no-op.
pub fn reorder_weeks_in_phase(
    state: &ProgramTemplateState,
    phase_index: usize,
    from_index: usize,
    to_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    check_week_index(&next, phase_index, from_index)?;
    let phase = &mut next.phases[phase_index];
    let to_index = to_index.min(phase.weeks.len() - 1);
    if from_index != to_index {
        let week = phase.weeks.remove(from_index);
        phase.weeks.insert(to_index, week);
        renumber_weeks(phase);
    }
    Ok(next)
}

/// Append a table-backed workout ref to the target day. Existing entries
/// are kept; a day can hold multiple workouts. The workout id is also
/// recorded in the linked-workout manifest.
pub fn set_day_workout_from_table(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
    day_order: usize,
    workout_id: &str,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    let day = day_mut(&mut next, phase_index, week_index, day_order)?;
    day.workouts.push(Some(DayWorkoutRef::Table {
        workout_id: workout_id.to_string(),
    }));
    refresh_day_type(day);
    next.workout_library
        .linked_workout_ids
        .insert(workout_id.to_string());
    Ok(next)
}

/// Remove the entry at `workout_index` from the day's workouts list.
/// An out-of-range index is a no-op.
pub fn remove_workout_from_day_at(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
    day_order: usize,
    workout_index: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    let day = day_mut(&mut next, phase_index, week_index, day_order)?;
    if workout_index >= day.workouts.len() {
        return Ok(next);
    }
    day.workouts.remove(workout_index);
    refresh_day_type(day);
    next.rebuild_linked_workout_ids();
    Ok(next)
}

/// Move the ref at `workout_index` from one day to the end of another
/// day's list, within the same week. Same-day moves and out-of-range
/// indices are no-ops.
pub fn move_workout_between_days(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
    from_day_order: usize,
    workout_index: usize,
    to_day_order: usize,
) -> Result<ProgramTemplateState> {
    let mut next = state.clone();
    if from_day_order == to_day_order {
        check_day_order(from_day_order)?;
        return Ok(next);
    }

    let moved = {
        let from_day = day_mut(&mut next, phase_index, week_index, from_day_order)?;
        if workout_index >= from_day.workouts.len() {
            return Ok(next);
        }
        let moved = from_day.workouts.remove(workout_index);
        refresh_day_type(from_day);
        moved
    };

    let to_day = day_mut(&mut next, phase_index, week_index, to_day_order)?;
    to_day.workouts.push(moved);
    refresh_day_type(to_day);
    Ok(next)
}

// ─── Edit Commands ───────────────────────────────────────────

/// Tagged edit command as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditOp {
    AddPhase,
    RemovePhase {
        phase_index: usize,
    },
    AddPhaseWeek {
        phase_index: usize,
    },
    RemovePhaseWeek {
        phase_index: usize,
        week_index: usize,
    },
    DuplicateWeek {
        phase_index: usize,
        week_index: usize,
    },
    ReorderPhases {
        from_index: usize,
        to_index: usize,
    },
    ReorderWeeksInPhase {
        phase_index: usize,
        from_index: usize,
        to_index: usize,
    },
    SetDayWorkoutFromTable {
        phase_index: usize,
        week_index: usize,
        day_order: usize,
        workout_id: String,
    },
    RemoveWorkoutFromDayAt {
        phase_index: usize,
        week_index: usize,
        day_order: usize,
        workout_index: usize,
    },
    MoveWorkoutBetweenDays {
        phase_index: usize,
        week_index: usize,
        from_day_order: usize,
        workout_index: usize,
        to_day_order: usize,
    },
}

/// Dispatch an edit command to the matching operation.
pub fn apply(state: &ProgramTemplateState, op: &EditOp) -> Result<ProgramTemplateState> {
    match op {
        EditOp::AddPhase => Ok(add_phase(state)),
        EditOp::RemovePhase { phase_index } => remove_phase(state, *phase_index),
        EditOp::AddPhaseWeek { phase_index } => add_phase_week(state, *phase_index),
        EditOp::RemovePhaseWeek {
            phase_index,
            week_index,
        } => remove_phase_week(state, *phase_index, *week_index),
        EditOp::DuplicateWeek {
            phase_index,
            week_index,
        } => duplicate_week(state, *phase_index, *week_index),
        EditOp::ReorderPhases {
            from_index,
            to_index,
        } => reorder_phases(state, *from_index, *to_index),
        EditOp::ReorderWeeksInPhase {
            phase_index,
            from_index,
            to_index,
        } => reorder_weeks_in_phase(state, *phase_index, *from_index, *to_index),
        EditOp::SetDayWorkoutFromTable {
            phase_index,
            week_index,
            day_order,
            workout_id,
        } => set_day_workout_from_table(state, *phase_index, *week_index, *day_order, workout_id),
        EditOp::RemoveWorkoutFromDayAt {
            phase_index,
            week_index,
            day_order,
            workout_index,
        } => remove_workout_from_day_at(
            state,
            *phase_index,
            *week_index,
            *day_order,
            *workout_index,
        ),
        EditOp::MoveWorkoutBetweenDays {
            phase_index,
            week_index,
            from_day_order,
            workout_index,
            to_day_order,
        } => move_workout_between_days(
            state,
            *phase_index,
            *week_index,
            *from_day_order,
            *workout_index,
            *to_day_order,
        ),
    }
}

// ─── Helpers ─────────────────────────────────────────────────

fn check_phase_index(state: &ProgramTemplateState, phase_index: usize) -> Result<()> {
    if phase_index >= state.phases.len() {
        return Err(EngineError::PhaseIndexOutOfRange(phase_index));
    }
    Ok(())
}

fn check_week_index(
    state: &ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
) -> Result<()> {
    check_phase_index(state, phase_index)?;
    if week_index >= state.phases[phase_index].weeks.len() {
        return Err(EngineError::WeekIndexOutOfRange(week_index));
    }
    Ok(())
}

fn check_day_order(day_order: usize) -> Result<()> {
    if day_order >= DAYS_PER_WEEK {
        return Err(EngineError::DayOrderOutOfRange(day_order));
    }
    Ok(())
}

fn day_mut<'a>(
    state: &'a mut ProgramTemplateState,
    phase_index: usize,
    week_index: usize,
    day_order: usize,
) -> Result<&'a mut Day> {
    check_week_index(state, phase_index, week_index)?;
    check_day_order(day_order)?;
    // Days are dense 0..6, so the order doubles as the list index.
    Ok(&mut state.phases[phase_index].weeks[week_index].days[day_order])
}

fn refresh_day_type(day: &mut Day) {
    day.day_type = if day.has_workout() {
        DayType::Workout
    } else {
        DayType::Rest
    };
}

fn renumber_phases(state: &mut ProgramTemplateState) {
    for (i, phase) in state.phases.iter_mut().enumerate() {
        phase.order = i as u32;
    }
}

fn renumber_weeks(phase: &mut Phase) {
    for (i, week) in phase.weeks.iter_mut().enumerate() {
        week.index = i as u32;
    }
}

fn recompute_durations(state: &mut ProgramTemplateState) {
    for phase in &mut state.phases {
        phase.duration_weeks = phase.weeks.len() as u32;
    }
    state.duration_weeks = state.phases.iter().map(|p| p.duration_weeks).sum();
}
