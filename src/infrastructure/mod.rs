//! Infrastructure Layer
//!
//! Implementations of the store and cache boundaries:
//! - Database connection and repositories (PostgreSQL, in-memory)
//! - Cache backends (in-process, Redis)

pub mod cache;
pub mod database;
pub mod repositories;
