//! The Daily Poet: a social publishing platform for short-form writing
//! with optional audio narration.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
