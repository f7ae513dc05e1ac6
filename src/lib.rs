//! Lead API Library
//!
//! CRUD backend for lead records (prospective customers). Lead attributes are
//! kept as a validated JSON document; email is unique among live leads.
//!
//! # Modules
//!
//! - `api`: Router and middleware.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Postgres lead store.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Lead data models.
//! - `services`: Lead business rules.
//! - `store`: Storage trait and in-memory store.
//! - `validation`: Field rules for lead payloads.

pub mod api;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;
