//! Data Transfer Objects for the REST API
//!
//! This module contains the request and response bodies exchanged between
//! the qrun server and its clients.

pub mod backend;
pub mod job;
pub mod session;
