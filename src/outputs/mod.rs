//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the run's `Payload` as the JSON artifact consumed by
//!   the news page

pub mod json;
