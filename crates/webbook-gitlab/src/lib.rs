//! Webbook: GitLab payload handling.
//!
//! Responsible for classifying webhook bodies into GitLab event kinds,
//! normalizing pipeline and build events, and orchestrating a delivery from
//! header policy through to persistence.

pub mod application;
pub mod domain;
