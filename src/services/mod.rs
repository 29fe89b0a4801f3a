// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Services module - business logic layer.

pub mod autosave;
pub mod engine;
pub mod schedule;

pub use autosave::{AutosaveService, MetaPatch, SaveStatus};
pub use engine::{EditOp, EngineError};
pub use schedule::{ClientToday, ScheduleService};
