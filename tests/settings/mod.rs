//! Settings Service Tests

mod cache_coherence_tests;
mod notification_tests;
mod redis_coherence_tests;
mod remove_tests;
