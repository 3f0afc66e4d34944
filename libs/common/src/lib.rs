//! Common library for the Lumen backend
//!
//! This crate provides shared infrastructure used by the Lumen services:
//! PostgreSQL connection pooling, the Redis cache used for revoked-token
//! bookkeeping, and common error types.

pub mod cache;
pub mod database;
pub mod error;
