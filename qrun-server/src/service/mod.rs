//! Service Module
//!
//! Business logic layer for the server.
//! Services own the in-memory stores and enforce the job and session rules.

pub mod job;
pub mod session;

// Re-export for convenience
pub use job as job_service;
pub use session as session_service;
