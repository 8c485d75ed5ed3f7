//! Store use-case services.
//!
//! # Responsibility
//! - Stamp audit metadata with the acting principal.
//! - Turn typed change requests into store mutations.
//! - Run retention sweeps outside of request-path transactions.

pub mod metric_service;
pub mod retention_service;
pub mod simple_service;
