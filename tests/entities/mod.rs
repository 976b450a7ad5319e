//! Entity Service Tests
