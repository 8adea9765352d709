//! qrun Core
//!
//! Core types and abstractions for the qrun quantum runtime server.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, Session, backend metadata)
//! - DTOs: Request/response shapes for the REST API

pub mod domain;
pub mod dto;
