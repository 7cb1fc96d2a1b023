//! Cross-crates utilities.

pub mod errors;
pub mod workqueue;
