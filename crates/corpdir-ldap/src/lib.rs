//! LDAP client for a corporate directory.
//!
//! This crate provides a small directory-service client: it authenticates a
//! user by binding with supplied credentials, and retrieves user and group
//! attributes via search queries with optional pagination. The LDAP wire
//! protocol itself is delegated to `ldap3`.

#![deny(missing_docs)]

mod attrs;
mod client;
mod config;
mod dn;
mod person;

pub use attrs::{normalize_attributes, DEFAULT_ATTRIBUTES};
pub use client::{AuthOutcome, DirectoryClient, LdapEntry};
pub use config::{DirectoryConfig, TlsIdentity, DEFAULT_CONNECTION_TIMEOUT_SECS};
pub use dn::{common_name, organisation_units};
pub use person::Person;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = corpdir_core::Result<T>;
