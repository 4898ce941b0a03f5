//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` entity structs matching the database rows
//! - `Deserialize` (or handler-built) create DTOs for inserts
//! - Summary structs for list endpoints

pub mod agent;
pub mod application;
pub mod payment;
pub mod user;
