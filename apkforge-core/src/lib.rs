//! apkforge Core
//!
//! Core types shared by the apkforge build server, client and CLI.
//!
//! This crate contains:
//! - Domain types: build parameters, derived build status, stage results
//! - DTOs: request/response bodies of the HTTP API and their validation

pub mod domain;
pub mod dto;
pub mod error;
