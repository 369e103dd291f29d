//! blogapi-api: HTTP API layer
//!
//! This crate provides the API layer including:
//! - HTTP REST endpoints via Axum
//! - The uniform JSON error envelope
//! - Middleware (request id, tracing, logging, timing)
//! - Observability (logging setup, Prometheus exposition)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                blogapi-api                   │
//! ├─────────────────────────────────────────────┤
//! │  http/          - REST endpoints            │
//! │  errors.rs      - Error envelope            │
//! │  middleware/    - Request id, timing, logs  │
//! │  observability/ - Logging and metrics       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod http;
pub mod middleware;
pub mod observability;
