//! Service Module
//!
//! Business logic layer for the server.

pub mod build;

pub use build::BuildService;
