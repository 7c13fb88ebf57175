//! # corpdir-core
//!
//! Core types shared by corporate directory clients.
//!
//! This crate provides the error hierarchy and service-account credential
//! types used by the directory client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and stable error codes
//! - [`credentials`] - Service-account bind credentials

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod error;

// Re-export commonly used types
pub use credentials::ServiceCredentials;
pub use error::{Error, Result};
