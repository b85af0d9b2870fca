//! GitLab payload shapes and their classification.

pub mod classify;
pub mod events;
