//! Domain logic for the enrollment platform.
//!
//! Pure types and functions shared by the persistence and API layers:
//! status workflows, external-to-internal field mapping, form validation,
//! and proposal-number sequencing. Nothing in this crate performs I/O.

pub mod error;
pub mod fields;
pub mod proposal;
pub mod status;
pub mod types;
pub mod validation;
