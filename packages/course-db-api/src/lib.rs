//! REST API server for the course service.
//!
//! Provides HTTP endpoints for the course and student resources
//! under `/api/v1/`, and request routing.

pub mod handlers;
pub mod router;
pub mod server;
