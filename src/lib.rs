//! YouSoul - a mood-aware task board backend
//!
//! Tasks live on a four-column kanban board and carry how the user expects
//! to feel before the work and how they felt after it.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Task, UserPreferences, User)
//! - [`validate`] - Input normalization with typo suggestions
//! - [`storage`] - SQLite database layer
//! - [`board`] - Kanban columns and drag planning
//! - [`calendar`] - Calendar events, day summaries, mood tips
//! - [`auth`] - Caller identity
//! - [`reflections`] - Reflection photo paths and presigned URLs
//! - [`http`] - axum API
//! - [`client`] - API client and optimistic client stores
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod board;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod reflections;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
