#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for upstate
//!
//! This crate provides the value types shared by the progress record, the
//! record store and the sync coordinator: transfer identities, upload status,
//! the transportable outcome and uploaded-file handles and storage tiers.

pub mod file;
pub mod outcome;
pub mod status;
pub mod tier;
pub mod transfer;

// Re-export commonly used types
pub use file::{FieldStates, UploadedFile};
pub use outcome::Outcome;
pub use status::UploadStatus;
pub use tier::Tier;
pub use transfer::TransferId;
