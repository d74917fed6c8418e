//! Sesame Core: shared domain models, error types and repository
//! traits for the session lifecycle.

pub mod error;
pub mod models;
pub mod repository;
