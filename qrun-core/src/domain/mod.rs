//! Core domain types
//!
//! This module contains the core domain structures used across qrun crates.
//! These types represent the fundamental business entities and are shared between
//! the server (which owns and mutates them) and the client (which reads them).

pub mod backend;
pub mod job;
pub mod session;
