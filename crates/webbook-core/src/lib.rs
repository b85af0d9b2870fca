//! Webbook Core: shared ingestion abstractions.
//!
//! This crate defines the types every other crate agrees on: the inbound
//! event shape, header validation, the shared secret, the ingestion policy,
//! and the repository seam the persistence layer implements. It contains no
//! infrastructure code.

pub mod error;
pub mod event;
pub mod headers;
pub mod policy;
pub mod repository;
pub mod secret;
