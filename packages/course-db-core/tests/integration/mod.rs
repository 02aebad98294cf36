//! Integration test suite for the course store.
//!
//! 1. End-to-end record workflows
//! 2. Persistence integration

pub mod end_to_end_tests;
pub mod persistence_tests;
