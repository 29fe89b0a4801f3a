// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Coachtrack: trainer/client fitness coaching backend
//!
//! This crate provides the backend API for program templates: the
//! phases/weeks/days document model, the pure editing engine, debounced
//! persistence, and schedule derivation for "today's workout".

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AutosaveService, ScheduleService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub autosave: AutosaveService,
    pub schedule: ScheduleService,
}
