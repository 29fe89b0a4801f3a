// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Data models for the application.

pub mod assignment;
pub mod program;
pub mod state;

pub use assignment::{ProgramAssignment, WorkoutAssignment, WorkoutTemplate};
pub use program::{Difficulty, ProgramTemplate};
pub use state::{Day, DayWorkoutRef, Phase, ProgramTemplateState, Week, WorkoutLibrary};
