//! Foundation types for Harbor.
//!
//! This crate provides the core identifier and naming types shared by the
//! pack index and push report layers. Every other Harbor crate depends on
//! `harbor-types`.
//!
//! # Key Types
//!
//! - [`HashKind`] — Hash algorithm selector (SHA-1 or SHA-256)
//! - [`ObjectId`] — Fixed-width content-addressed identifier
//! - [`Checksum`] — Incremental digest matching a hash kind
//! - [`RefName`] — Reference name with git-style validation

pub mod checksum;
pub mod error;
pub mod object;
pub mod refname;

pub use checksum::Checksum;
pub use error::TypeError;
pub use object::{HashKind, ObjectId};
pub use refname::RefName;
