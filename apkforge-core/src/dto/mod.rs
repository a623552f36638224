//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the server and its
//! clients (the client library and the CLI). Field names are camelCase on
//! the wire.

pub mod build;
pub mod health;
