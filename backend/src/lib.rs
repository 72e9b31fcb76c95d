//! School admission backend: academic years, majors, per-major quotas with
//! an audit trail, and non-overlapping admission schedules.

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
