//! Core domain types
//!
//! These types describe a build job as the pipeline sees it. They are shared
//! between the pipeline (which produces them) and the server (which reports
//! them over HTTP).

pub mod build;
pub mod stage;
