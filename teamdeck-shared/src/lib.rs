//! # Teamdeck Shared Library
//!
//! This crate contains the types and business logic shared between the
//! Teamdeck API server and supporting tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, token issuing/verification, session
//!   orchestration, tenant resolution, and the permission table
//! - `db`: Connection pool management and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Teamdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
