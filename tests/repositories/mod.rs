//! PostgreSQL Repository Tests
//!
//! Skipped unless `TEST_DATABASE_URL` points at a disposable database.

mod streamer_settings_repository_tests;
